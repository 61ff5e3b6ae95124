use std::path::PathBuf;

use super::config::ChoreConfig;

/// A discovered chore workspace
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory containing `.chore/`
    pub root: PathBuf,
    /// Path to the `.chore/` directory
    pub chore_dir: PathBuf,
    /// Parsed config.toml
    pub config: ChoreConfig,
}

impl Workspace {
    /// Resolve the remote database document path from config
    pub fn database_path(&self) -> PathBuf {
        let configured = PathBuf::from(&self.config.remote.database);
        if configured.is_absolute() {
            configured
        } else {
            self.chore_dir.join(configured)
        }
    }
}
