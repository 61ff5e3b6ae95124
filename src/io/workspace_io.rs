use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::ChoreConfig;
use crate::model::workspace::Workspace;

/// Name of the per-workspace directory
pub const CHORE_DIR: &str = ".chore";

/// Error type for workspace I/O operations
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a chore workspace: no .chore/ directory found (run `chore init`)")]
    NotAWorkspace,
    #[error("a chore workspace already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Discover the workspace by walking up from the given directory,
/// looking for a `.chore/config.toml`.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        let chore_dir = current.join(CHORE_DIR);
        if chore_dir.is_dir() && chore_dir.join("config.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

/// Load the workspace rooted at `root`.
pub fn load_workspace(root: &Path) -> Result<Workspace, WorkspaceError> {
    let chore_dir = root.join(CHORE_DIR);
    if !chore_dir.is_dir() {
        return Err(WorkspaceError::NotAWorkspace);
    }

    let config_path = chore_dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: ChoreConfig = toml::from_str(&config_text)?;

    Ok(Workspace {
        root: root.to_path_buf(),
        chore_dir,
        config,
    })
}

/// Create `.chore/config.toml` under `root` from the given config text.
/// Refuses to overwrite an existing workspace unless `force` is set.
pub fn init_workspace(root: &Path, config_text: &str, force: bool) -> Result<Workspace, WorkspaceError> {
    let chore_dir = root.join(CHORE_DIR);
    let config_path = chore_dir.join("config.toml");
    if config_path.exists() && !force {
        return Err(WorkspaceError::AlreadyExists(chore_dir));
    }

    // Validate before touching the disk
    let _: ChoreConfig = toml::from_str(config_text)?;

    fs::create_dir_all(&chore_dir)?;
    crate::io::recovery::atomic_write(&config_path, config_text.as_bytes())?;
    load_workspace(root)
}
