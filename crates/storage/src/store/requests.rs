#![forbid(unsafe_code)]

use super::types::ArtifactKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveStageRequest {
    pub workspace: String,
    pub name: String,
    pub version: String,
    pub params_json: String,
    pub script_ref: String,
    pub entrypoint: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveDatasetRequest {
    pub workspace: String,
    pub name: String,
    pub version: String,
    pub split: Option<String>,
    pub parent: Option<ArtifactKey>,
    pub producing_workflow: Option<ArtifactKey>,
    pub file_ref: String,
    pub size: Option<i64>,
    pub log_message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveWorkflowRequest {
    pub workspace: String,
    pub name: String,
    pub version: String,
    /// Constituent stage versions in declaration order.
    pub stages: Vec<ArtifactKey>,
    /// Internal dependency edges as `(upstream_name, downstream_name)`
    /// pairs over the member stage names, in declaration order.
    pub edges: Vec<(String, String)>,
}

/// Listing filter. `name_pattern` and `version_pattern` are SQLite GLOB
/// patterns; a missing version pattern matches every version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRequest {
    pub workspace: String,
    pub name_pattern: String,
    pub version_pattern: Option<String>,
    pub include_unpublished: bool,
}
