#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    NotFound {
        workspace: String,
        name: String,
        reference: String,
    },
    AmbiguousVersion {
        workspace: String,
        name: String,
        prefix: String,
        candidates: Vec<String>,
    },
    MissingProducer {
        producer: String,
    },
    CycleDetected {
        producer: String,
        artifact: String,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound {
                workspace,
                name,
                reference,
            } => write!(f, "no record matches {workspace}.{name}@{reference}"),
            Self::AmbiguousVersion {
                workspace,
                name,
                prefix,
                candidates,
            } => write!(
                f,
                "version prefix {prefix:?} of {workspace}.{name} matches {} versions: {}",
                candidates.len(),
                candidates.join(", ")
            ),
            Self::MissingProducer { producer } => {
                write!(f, "lineage edge references unknown producer {producer}")
            }
            Self::CycleDetected { producer, artifact } => write!(
                f,
                "edge {producer} -> {artifact} would close a lineage cycle"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
