//! Configuration file I/O.
//!
//! This module contains system directory detection and config loading
//! utilities. Loading is best-effort by design: a missing file is an
//! expected condition, and a malformed file is reported to the caller so it
//! can fall back to a lower-precedence layer. Nothing here is fatal.

use crate::config::{ConfigError, CssremConfig, PartialConfig};
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory holding the
/// user-global configuration.
const PRODUCT_DIR: &str = "pxvw-lsp";

/// File name of the user-global configuration.
const GLOBAL_CONFIG_FILENAME: &str = "config.json";

/// File name of the per-workspace project configuration.
pub const PROJECT_CONFIG_FILENAME: &str = ".cssrem";

/// Represents a configuration layer in the 3-level hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Hardcoded defaults embedded in the binary (lowest precedence)
    Default,
    /// User-global settings (~/.config/pxvw-lsp/config.json)
    Global,
    /// Workspace-root settings ($ROOT/.cssrem, highest precedence)
    Project,
}

impl ConfigLayer {
    /// Get the precedence level (higher = takes priority)
    pub fn precedence(self) -> u8 {
        match self {
            ConfigLayer::Default => 0,
            ConfigLayer::Global => 1,
            ConfigLayer::Project => 2,
        }
    }
}

/// Directory paths the server reads configuration from.
///
/// Only `main` should use `dirs::*` to construct this; all other code
/// receives it by parameter passing. Tests use isolated temp directories,
/// so parallel tests don't interfere with each other and no hidden global
/// state exists.
#[derive(Debug, Clone)]
pub struct DirectoryContext {
    /// Config directory for the user-global configuration, e.g.
    /// ~/.config/pxvw-lsp on Linux. `None` when the platform config
    /// directory cannot be determined; the server then runs with defaults
    /// only and no file watcher.
    pub config_dir: Option<PathBuf>,
}

impl DirectoryContext {
    /// Create a DirectoryContext from the system directories.
    /// This should ONLY be called from main().
    pub fn from_system() -> Self {
        Self {
            config_dir: dirs::config_dir().map(|dir| dir.join(PRODUCT_DIR)),
        }
    }

    /// Create a DirectoryContext for testing with a temp directory.
    pub fn for_testing(temp_dir: &Path) -> Self {
        Self {
            config_dir: Some(temp_dir.join("config").join(PRODUCT_DIR)),
        }
    }

    /// Get the user-global config file path, if a config directory exists.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| dir.join(GLOBAL_CONFIG_FILENAME))
    }
}

/// Get the project config file path for a workspace root.
pub fn project_config_path(root: &Path) -> PathBuf {
    root.join(PROJECT_CONFIG_FILENAME)
}

/// Load one configuration layer from a file.
///
/// Returns `Ok(None)` when the file does not exist. Errors are reported to
/// the caller for logging; callers fall back to lower layers, never abort.
pub fn load_partial(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let schema: CssremConfig = serde_json::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

    Ok(Some(schema.into_partial()))
}
