#![forbid(unsafe_code)]

use super::{Registry, VersionFilter, version_filter};
use crate::error::RegistryError;
use crate::fingerprint::workflow_fingerprint;
use crate::models::{PublishOutcome, VersionTree, Workflow, WorkflowDraft, group_records};
use avc_core::identifier::{self, VersionRef};
use avc_storage::{ArtifactKey, ListRequest, SaveWorkflowRequest, StoreError, WorkflowRow};

impl Registry {
    /// Persist a built workflow composition: the version row, ordered
    /// stage membership, internal edges and stage → workflow lineage, in
    /// one store transaction. Identity derives from the member stage
    /// versions and the edge set.
    pub fn save_workflow(
        &mut self,
        draft: &WorkflowDraft,
    ) -> Result<(Workflow, bool), RegistryError> {
        let workspace = self.workspace_for(draft.workspace.clone())?;
        let stage_labels = draft
            .stages
            .iter()
            .map(ArtifactKey::label)
            .collect::<Vec<_>>();
        let version = workflow_fingerprint(&workspace, &draft.name, &stage_labels, &draft.edges);

        if let Some(existing) = self
            .store
            .get_workflow_by_version(&workspace, &draft.name, &version)?
        {
            let workflow = self.hydrate_workflow(existing)?;
            return Ok((workflow, false));
        }

        let (row, created) = self.store.save_workflow(SaveWorkflowRequest {
            workspace,
            name: draft.name.clone(),
            version,
            stages: draft.stages.clone(),
            edges: draft.edges.clone(),
        })?;
        let workflow = Workflow::from_row(row, draft.stages.clone(), draft.edges.clone());
        Ok((workflow, created))
    }

    pub fn publish_workflow(
        &mut self,
        draft: &WorkflowDraft,
    ) -> Result<PublishOutcome<Workflow>, RegistryError> {
        let (mut workflow, _) = self.save_workflow(draft)?;
        let (tag, fresh) = self.store.tag_workflow(
            &workflow.workspace,
            &workflow.name,
            &workflow.version,
        )?;
        workflow.tag = Some(tag);
        Ok(PublishOutcome {
            record: workflow,
            tag,
            already_published: !fresh,
        })
    }

    pub fn get_workflow(
        &mut self,
        identifier: &str,
        version: Option<&str>,
    ) -> Result<Workflow, RegistryError> {
        let parsed = identifier::parse_get(identifier, version)?;
        let workspace = self.workspace_for(parsed.workspace)?;
        let reference = parsed.version.unwrap_or(VersionRef::Latest);
        let version = self
            .store
            .resolve_workflow_version(&workspace, &parsed.name, &reference)?;
        let row = self
            .store
            .get_workflow_by_version(&workspace, &parsed.name, &version)?
            .ok_or_else(|| {
                RegistryError::Store(StoreError::NotFound {
                    workspace: workspace.clone(),
                    name: parsed.name.clone(),
                    reference: version.clone(),
                })
            })?;
        self.hydrate_workflow(row)
    }

    pub fn find_workflows(
        &mut self,
        pattern: &str,
        include_unpublished: bool,
    ) -> Result<Vec<Workflow>, RegistryError> {
        let parsed = identifier::parse_list(pattern)?;
        let workspace = self.workspace_for(parsed.workspace)?;
        let name_pattern = parsed.name;
        let filter = version_filter(parsed.version, |reference| {
            self.store
                .resolve_workflow_version(&workspace, &name_pattern, reference)
        })?;
        let version_pattern = match filter {
            VersionFilter::NoMatch => return Ok(Vec::new()),
            VersionFilter::Any => None,
            VersionFilter::Pattern(pattern) => Some(pattern),
        };
        let rows = self.store.list_workflows(&ListRequest {
            workspace,
            name_pattern,
            version_pattern,
            include_unpublished,
        })?;
        rows.into_iter()
            .map(|row| self.hydrate_workflow(row))
            .collect()
    }

    pub fn find_workflows_tree(
        &mut self,
        pattern: &str,
        include_unpublished: bool,
    ) -> Result<VersionTree<Workflow>, RegistryError> {
        let workflows = self.find_workflows(pattern, include_unpublished)?;
        Ok(group_records(
            workflows,
            |workflow| workflow.name.clone(),
            |_| "-".to_string(),
        ))
    }

    /// Executor surface: member stage versions in declaration order.
    pub fn list_stages(
        &mut self,
        identifier: &str,
        version: Option<&str>,
    ) -> Result<Vec<ArtifactKey>, RegistryError> {
        Ok(self.get_workflow(identifier, version)?.stages)
    }

    /// Executor surface: stage names in execution order, computed from
    /// the stored edge set with declaration order breaking ties.
    pub fn topo_order(
        &mut self,
        identifier: &str,
        version: Option<&str>,
    ) -> Result<Vec<String>, RegistryError> {
        let workflow = self.get_workflow(identifier, version)?;
        Ok(workflow.dag()?.topo_order())
    }

    /// Lazily hydrate the workflow that produced a dataset, one hop only.
    pub fn producing_workflow(
        &mut self,
        dataset: &crate::models::Dataset,
    ) -> Result<Option<Workflow>, RegistryError> {
        let Some(producer) = &dataset.producing_workflow else {
            return Ok(None);
        };
        let row = self
            .store
            .get_workflow_by_version(&producer.workspace, &producer.name, &producer.version)?
            .ok_or_else(|| {
                RegistryError::Store(StoreError::NotFound {
                    workspace: producer.workspace.clone(),
                    name: producer.name.clone(),
                    reference: producer.version.clone(),
                })
            })?;
        Ok(Some(self.hydrate_workflow(row)?))
    }

    fn hydrate_workflow(&self, row: WorkflowRow) -> Result<Workflow, RegistryError> {
        let stages = self
            .store
            .workflow_stages(&row.workspace, &row.name, &row.version)?;
        let edges = self
            .store
            .workflow_edges(&row.workspace, &row.name, &row.version)?;
        Ok(Workflow::from_row(row, stages, edges))
    }
}
