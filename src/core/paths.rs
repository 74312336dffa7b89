// src/core/paths.rs

use crate::constants::{RUNTIME_CONFIG_FILENAME, SITES_DIR, WORKSPACE_DIR};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
}

/// Returns the path to the ascend configuration directory (`~/.config/ascend`).
/// Unlike workspace directories, it is never created implicitly.
pub fn get_ascend_config_dir() -> Result<PathBuf, PathError> {
    dirs::config_dir()
        .map(|dir| dir.join("ascend"))
        .ok_or(PathError::ConfigDirNotFound)
}

/// Returns the path of the runtime configuration file.
pub fn get_runtime_config_path() -> Result<PathBuf, PathError> {
    Ok(get_ascend_config_dir()?.join(RUNTIME_CONFIG_FILENAME))
}

/// True if `dir` holds a `.ascend/` directory.
pub fn is_workspace_root(dir: &Path) -> bool {
    dir.join(WORKSPACE_DIR).is_dir()
}

/// Walks up from `start` and returns the nearest workspace root.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| is_workspace_root(dir))
        .map(|dir| dunce::simplified(dir).to_path_buf())
}

/// Returns `<root>/.ascend/sites/<site>`.
pub fn site_dir(root: &Path, site: &str) -> PathBuf {
    root.join(WORKSPACE_DIR).join(SITES_DIR).join(site)
}
