#![forbid(unsafe_code)]

use std::path::PathBuf;

pub const WORKSPACE_ENV: &str = "ARTVC_WORKSPACE";
pub const HOME_ENV: &str = "ARTVC_HOME";

/// Process-wide configuration, read once at startup and read-only after.
#[derive(Clone, Debug)]
pub struct Config {
    /// Workspace substituted into identifiers that omit one.
    pub default_workspace: Option<String>,
    /// Root directory holding the metadata store and the local content
    /// cache.
    pub storage_dir: PathBuf,
}

impl Config {
    pub fn new(default_workspace: Option<String>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_workspace,
            storage_dir: storage_dir.into(),
        }
    }

    pub fn from_env() -> Self {
        let default_workspace = std::env::var(WORKSPACE_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let storage_dir = std::env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".artvc"));
        Self {
            default_workspace,
            storage_dir,
        }
    }
}
