#![forbid(unsafe_code)]

use avc_core::lineage::{ArtifactKind, ArtifactRef};

/// `(workspace, name, version)` triplet identifying one persisted version,
/// without the entity kind (the referencing column set implies it).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactKey {
    pub workspace: String,
    pub name: String,
    pub version: String,
}

impl ArtifactKey {
    pub fn new(
        workspace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn to_ref(&self, kind: ArtifactKind) -> ArtifactRef {
        ArtifactRef::new(kind, &*self.workspace, &*self.name, &*self.version)
    }

    pub fn label(&self) -> String {
        format!("{}.{}@{}", self.workspace, self.name, self.version)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageRow {
    pub workspace: String,
    pub name: String,
    pub version: String,
    pub params_json: String,
    pub script_ref: String,
    pub entrypoint: String,
    pub created_at_ms: i64,
    pub tag: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetRow {
    pub workspace: String,
    pub name: String,
    pub version: String,
    pub split: Option<String>,
    pub parent: Option<ArtifactKey>,
    pub producing_workflow: Option<ArtifactKey>,
    pub file_ref: String,
    pub size: Option<i64>,
    pub log_message: String,
    pub created_at_ms: i64,
    pub tag: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowRow {
    pub workspace: String,
    pub name: String,
    pub version: String,
    pub created_at_ms: i64,
    pub tag: Option<i64>,
}
