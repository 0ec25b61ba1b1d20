#![forbid(unsafe_code)]

use avc_core::identifier::ParseError;
use avc_core::lineage::StageDagError;
use avc_storage::StoreError;

#[derive(Debug)]
pub enum RegistryError {
    Parse(ParseError),
    Store(StoreError),
    Io(std::io::Error),
    Dag(StageDagError),
    Params(serde_json::Error),
    /// Identifier omitted the workspace and no default is configured.
    MissingWorkspace,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "parse: {err}"),
            Self::Store(err) => write!(f, "store: {err}"),
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Dag(err) => write!(f, "workflow dag: {err}"),
            Self::Params(err) => write!(f, "params: {err}"),
            Self::MissingWorkspace => {
                write!(f, "identifier has no workspace and no default workspace is configured")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<ParseError> for RegistryError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<StoreError> for RegistryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StageDagError> for RegistryError {
    fn from(value: StageDagError) -> Self {
        Self::Dag(value)
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Params(value)
    }
}
