#![forbid(unsafe_code)]

use crate::error::RegistryError;
use avc_core::lineage::{ArtifactKind, ArtifactRef};
use avc_storage::StageRow;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A persisted pipeline stage version: parameters plus a locator for the
/// externally stored script. The executor, not this crate, turns the
/// definition into runnable code.
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub workspace: String,
    pub name: String,
    pub version: String,
    pub tag: Option<i64>,
    pub params: BTreeMap<String, Value>,
    pub script_ref: String,
    pub entrypoint: String,
    pub created_at_ms: i64,
}

impl Stage {
    pub(crate) fn from_row(row: StageRow) -> Result<Self, RegistryError> {
        let params = serde_json::from_str(&row.params_json)?;
        Ok(Self {
            workspace: row.workspace,
            name: row.name,
            version: row.version,
            tag: row.tag,
            params,
            script_ref: row.script_ref,
            entrypoint: row.entrypoint,
            created_at_ms: row.created_at_ms,
        })
    }

    pub fn to_ref(&self) -> ArtifactRef {
        ArtifactRef::new(ArtifactKind::Stage, &*self.workspace, &*self.name, &*self.version)
    }

    pub fn created_at(&self) -> Option<String> {
        super::format_timestamp_ms(self.created_at_ms)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}@{}", self.workspace, self.name, self.version)
    }
}

/// The mutable working copy: everything a stage needs except a version,
/// which `save` derives from the content.
#[derive(Clone, Debug)]
pub struct StageDraft {
    pub workspace: Option<String>,
    pub name: String,
    pub params: BTreeMap<String, Value>,
    /// Local path of the script source; its content (not the path) enters
    /// the fingerprint, and the bytes go to the content backend on save.
    pub script_path: PathBuf,
    pub entrypoint: String,
}

impl StageDraft {
    pub fn new(name: impl Into<String>, script_path: impl Into<PathBuf>) -> Self {
        let script_path = script_path.into();
        let entrypoint = script_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            workspace: None,
            name: name.into(),
            params: BTreeMap::new(),
            script_path,
            entrypoint,
        }
    }

    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = entrypoint.into();
        self
    }
}
