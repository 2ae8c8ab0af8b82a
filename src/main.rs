use anyhow::{Context, Result};
use clap::Parser;
use pxvw_lsp::config_io::DirectoryContext;
use pxvw_lsp::global_config::{GlobalConfigStore, DEFAULT_POLL_INTERVAL};
use pxvw_lsp::server::Backend;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tower_lsp::{LspService, Server};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// A language server that completes px lengths into vw units
#[derive(Parser, Debug)]
#[command(name = "pxvw-lsp")]
#[command(about = "px to vw completion language server", long_about = None)]
#[command(version)]
struct Args {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Path to log file for server diagnostics (default: system temp dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Initialize the global tracing subscriber with file logging.
///
/// stdout carries the protocol, so logs only ever go to the file. RUST_LOG
/// overrides the --log-level flag.
fn init_tracing(log_file: &std::path::Path, log_level: &str) -> Result<()> {
    let file = File::create(log_file)
        .with_context(|| format!("failed to create log file {}", log_file.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer().with_writer(Arc::new(file)).with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = args
        .log_file
        .unwrap_or_else(|| std::env::temp_dir().join("pxvw-lsp.log"));
    init_tracing(&log_file, &args.log_level)?;

    let dir_context = DirectoryContext::from_system();
    let global = Arc::new(GlobalConfigStore::new(
        dir_context.global_config_path(),
        DEFAULT_POLL_INTERVAL,
    ));
    global.start_watcher();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::new(client, Arc::clone(&global)));
    Server::new(stdin, stdout, socket).serve(service).await;

    global.shutdown();
    Ok(())
}
