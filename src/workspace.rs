//! Workspace root index and effective-config resolution.

use crate::config::{EffectiveConfig, PartialConfig};
use crate::config_io::{self, ConfigLayer};
use crate::global_config::GlobalConfigStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// One workspace folder, with its project config layer if a `.cssrem`
/// file exists and parses.
#[derive(Debug)]
struct WorkspaceRoot {
    path: PathBuf,
    config: Option<PartialConfig>,
}

/// Resolves the effective configuration for any document path.
///
/// Roots are added and removed by workspace-folder notifications and read
/// by every completion request; the table lock is held only across the
/// root-matching step, never across composition.
pub struct ConfigResolver {
    roots: RwLock<Vec<WorkspaceRoot>>,
    global: Arc<GlobalConfigStore>,
}

impl ConfigResolver {
    pub fn new(global: Arc<GlobalConfigStore>) -> Self {
        Self {
            roots: RwLock::new(Vec::new()),
            global,
        }
    }

    /// Register a workspace root and load its project config.
    ///
    /// Loading is best-effort: a missing or malformed `.cssrem` leaves the
    /// root registered with no project layer. Re-adding an existing root
    /// reloads its config in place.
    pub fn add_root(&self, path: PathBuf) {
        let config = load_project_config(&path);

        let mut roots = self.roots.write().expect("workspace root lock poisoned");
        if let Some(existing) = roots.iter_mut().find(|root| root.path == path) {
            existing.config = config;
        } else {
            roots.push(WorkspaceRoot { path, config });
        }
    }

    /// Drop a workspace root. Unknown paths are ignored.
    pub fn remove_root(&self, path: &Path) {
        self.roots
            .write()
            .expect("workspace root lock poisoned")
            .retain(|root| root.path != path);
    }

    /// Compute the effective configuration for a document path.
    ///
    /// The project layer comes from the most specific (longest-prefix)
    /// root containing the path; its set fields are filled from the global
    /// snapshot and then from the application defaults. Total: absence of
    /// data at any layer degrades to the next lower one, never to an error.
    pub fn resolve_for(&self, document_path: &Path) -> EffectiveConfig {
        let project = {
            let roots = self.roots.read().expect("workspace root lock poisoned");
            roots
                .iter()
                .filter(|root| document_path.starts_with(&root.path))
                .max_by_key(|root| root.path.as_os_str().len())
                .and_then(|root| root.config)
        };

        let mut merged = project.unwrap_or_default();
        merged.merge_from(&self.global.get());
        merged.resolve()
    }
}

fn load_project_config(root: &Path) -> Option<PartialConfig> {
    let path = config_io::project_config_path(root);
    match config_io::load_partial(&path) {
        Ok(Some(partial)) => {
            tracing::info!(
                "Loaded {:?} config from {}: viewport={:?}, precision={:?}",
                ConfigLayer::Project,
                path.display(),
                partial.viewport_width,
                partial.unit_precision
            );
            Some(partial)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Failed to load {:?} config: {e}", ConfigLayer::Project);
            None
        }
    }
}
