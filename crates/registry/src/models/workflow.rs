#![forbid(unsafe_code)]

use super::Stage;
use avc_core::lineage::{ArtifactKind, ArtifactRef, StageDag, StageDagError};
use avc_storage::{ArtifactKey, WorkflowRow};

/// A persisted workflow version: ordered member stage versions and the
/// dependency edges between them.
#[derive(Clone, Debug, PartialEq)]
pub struct Workflow {
    pub workspace: String,
    pub name: String,
    pub version: String,
    pub tag: Option<i64>,
    pub created_at_ms: i64,
    pub stages: Vec<ArtifactKey>,
    pub edges: Vec<(String, String)>,
}

impl Workflow {
    pub(crate) fn from_row(
        row: WorkflowRow,
        stages: Vec<ArtifactKey>,
        edges: Vec<(String, String)>,
    ) -> Self {
        Self {
            workspace: row.workspace,
            name: row.name,
            version: row.version,
            tag: row.tag,
            created_at_ms: row.created_at_ms,
            stages,
            edges,
        }
    }

    pub fn to_ref(&self) -> ArtifactRef {
        ArtifactRef::new(
            ArtifactKind::Workflow,
            &*self.workspace,
            &*self.name,
            &*self.version,
        )
    }

    /// Rebuild the internal DAG from the persisted membership and edges.
    pub fn dag(&self) -> Result<StageDag, StageDagError> {
        let mut dag = StageDag::new();
        for stage in &self.stages {
            dag.add_stage(&*stage.name)?;
        }
        for (upstream, downstream) in &self.edges {
            dag.add_dependency(upstream, downstream)?;
        }
        Ok(dag)
    }

    pub fn created_at(&self) -> Option<String> {
        super::format_timestamp_ms(self.created_at_ms)
    }
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}@{}", self.workspace, self.name, self.version)
    }
}

/// Unsaved workflow composition produced by [`WorkflowBuilder`].
#[derive(Clone, Debug)]
pub struct WorkflowDraft {
    pub workspace: Option<String>,
    pub name: String,
    pub stages: Vec<ArtifactKey>,
    pub edges: Vec<(String, String)>,
}

/// Explicit DAG builder. Stages register in declaration order and every
/// dependency is an explicit call; edges that would close a cycle are
/// refused on the spot, so a finished draft is always acyclic.
#[derive(Clone, Debug)]
pub struct WorkflowBuilder {
    workspace: Option<String>,
    name: String,
    dag: StageDag,
    members: Vec<ArtifactKey>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            workspace: None,
            name: name.into(),
            dag: StageDag::new(),
            members: Vec::new(),
        }
    }

    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    /// Register a saved stage as a member. The stage's name keys the
    /// dependency edges.
    pub fn stage(&mut self, stage: &Stage) -> Result<(), StageDagError> {
        self.dag.add_stage(&*stage.name)?;
        self.members.push(ArtifactKey::new(
            &*stage.workspace,
            &*stage.name,
            &*stage.version,
        ));
        Ok(())
    }

    pub fn dependency(&mut self, upstream: &str, downstream: &str) -> Result<(), StageDagError> {
        self.dag.add_dependency(upstream, downstream)
    }

    pub fn build(self) -> WorkflowDraft {
        let edges = self
            .dag
            .edges()
            .map(|(up, down)| (up.to_string(), down.to_string()))
            .collect();
        WorkflowDraft {
            workspace: self.workspace,
            name: self.name,
            stages: self.members,
            edges,
        }
    }
}
