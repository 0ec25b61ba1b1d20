#![forbid(unsafe_code)]

use avc_core::identifier::Split;
use avc_core::lineage::{ArtifactKind, ArtifactRef};
use avc_storage::{ArtifactKey, DatasetRow};
use std::path::PathBuf;

/// A persisted dataset version. `parent` and `producing_workflow` are
/// identities only; the referenced records hydrate lazily through the
/// registry so deep lineage chains never load eagerly.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub workspace: String,
    pub name: String,
    pub version: String,
    pub tag: Option<i64>,
    pub split: Option<String>,
    pub parent: Option<ArtifactKey>,
    pub producing_workflow: Option<ArtifactKey>,
    pub file_ref: String,
    pub size: Option<i64>,
    pub log_message: String,
    pub created_at_ms: i64,
}

impl Dataset {
    pub(crate) fn from_row(row: DatasetRow) -> Self {
        Self {
            workspace: row.workspace,
            name: row.name,
            version: row.version,
            tag: row.tag,
            split: row.split,
            parent: row.parent,
            producing_workflow: row.producing_workflow,
            file_ref: row.file_ref,
            size: row.size,
            log_message: row.log_message,
            created_at_ms: row.created_at_ms,
        }
    }

    pub fn to_ref(&self) -> ArtifactRef {
        ArtifactRef::new(
            ArtifactKind::Dataset,
            &*self.workspace,
            &*self.name,
            &*self.version,
        )
    }

    pub fn created_at(&self) -> Option<String> {
        super::format_timestamp_ms(self.created_at_ms)
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}@{}", self.workspace, self.name, self.version)
    }
}

/// Unsaved dataset content plus its declared lineage.
#[derive(Clone, Debug)]
pub struct DatasetDraft {
    pub workspace: Option<String>,
    pub name: String,
    /// Local path of the data file; content is fingerprinted by streaming
    /// and the bytes go to the content backend on save.
    pub file_path: PathBuf,
    pub split: Option<Split>,
    pub parent: Option<ArtifactKey>,
    pub producing_workflow: Option<ArtifactKey>,
    pub log_message: String,
}

impl DatasetDraft {
    pub fn new(name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            workspace: None,
            name: name.into(),
            file_path: file_path.into(),
            split: None,
            parent: None,
            producing_workflow: None,
            log_message: String::new(),
        }
    }

    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn split(mut self, split: Split) -> Self {
        self.split = Some(split);
        self
    }

    pub fn parent(mut self, parent: ArtifactKey) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn producing_workflow(mut self, workflow: ArtifactKey) -> Self {
        self.producing_workflow = Some(workflow);
        self
    }

    pub fn log_message(mut self, message: impl Into<String>) -> Self {
        self.log_message = message.into();
        self
    }
}
