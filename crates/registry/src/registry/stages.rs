#![forbid(unsafe_code)]

use super::{Registry, VersionFilter, version_filter};
use crate::error::RegistryError;
use crate::fingerprint::{sha256_file_hex, stage_fingerprint};
use crate::models::{PublishOutcome, Stage, StageDraft, VersionTree, group_records};
use avc_core::identifier::{self, VersionRef};
use avc_storage::{ListRequest, SaveStageRequest, StoreError};

impl Registry {
    /// Fingerprint the draft and persist it, or return the already-saved
    /// record untouched when the identical content exists. Script bytes
    /// reach the content backend only on first save.
    pub fn save_stage(&mut self, draft: &StageDraft) -> Result<(Stage, bool), RegistryError> {
        let workspace = self.workspace_for(draft.workspace.clone())?;
        let script_sha256 = sha256_file_hex(&draft.script_path)?;
        let version = stage_fingerprint(
            &workspace,
            &draft.name,
            &draft.params,
            &script_sha256,
            &draft.entrypoint,
        );

        if let Some(existing) = self
            .store
            .get_stage_by_version(&workspace, &draft.name, &version)?
        {
            return Ok((Stage::from_row(existing)?, false));
        }

        let script_ref = self.backend.store(&draft.script_path)?;
        let params_json = serde_json::to_string(&draft.params)?;
        let (row, created) = self.store.save_stage(SaveStageRequest {
            workspace,
            name: draft.name.clone(),
            version,
            params_json,
            script_ref,
            entrypoint: draft.entrypoint.clone(),
        })?;
        Ok((Stage::from_row(row)?, created))
    }

    /// Save plus next-tag allocation. Republishing an already-tagged
    /// version returns the existing tag with `already_published` set.
    pub fn publish_stage(
        &mut self,
        draft: &StageDraft,
    ) -> Result<PublishOutcome<Stage>, RegistryError> {
        let (mut stage, _) = self.save_stage(draft)?;
        let (tag, fresh) = self
            .store
            .tag_stage(&stage.workspace, &stage.name, &stage.version)?;
        stage.tag = Some(tag);
        Ok(PublishOutcome {
            record: stage,
            tag,
            already_published: !fresh,
        })
    }

    /// `identifier` follows the `[workspace.]name[@version]` grammar; a
    /// missing version means `latest`.
    pub fn get_stage(
        &mut self,
        identifier: &str,
        version: Option<&str>,
    ) -> Result<Stage, RegistryError> {
        let parsed = identifier::parse_get(identifier, version)?;
        let workspace = self.workspace_for(parsed.workspace)?;
        let reference = parsed.version.unwrap_or(VersionRef::Latest);
        let version = self
            .store
            .resolve_stage_version(&workspace, &parsed.name, &reference)?;
        let row = self
            .store
            .get_stage_by_version(&workspace, &parsed.name, &version)?
            .ok_or_else(|| {
                RegistryError::Store(StoreError::NotFound {
                    workspace: workspace.clone(),
                    name: parsed.name.clone(),
                    reference: version.clone(),
                })
            })?;
        Stage::from_row(row)
    }

    pub fn find_stages(
        &mut self,
        pattern: &str,
        include_unpublished: bool,
    ) -> Result<Vec<Stage>, RegistryError> {
        let parsed = identifier::parse_list(pattern)?;
        let workspace = self.workspace_for(parsed.workspace)?;
        let name_pattern = parsed.name;
        let filter = version_filter(parsed.version, |reference| {
            self.store
                .resolve_stage_version(&workspace, &name_pattern, reference)
        })?;
        let version_pattern = match filter {
            VersionFilter::NoMatch => return Ok(Vec::new()),
            VersionFilter::Any => None,
            VersionFilter::Pattern(pattern) => Some(pattern),
        };
        let rows = self.store.list_stages(&ListRequest {
            workspace,
            name_pattern,
            version_pattern,
            include_unpublished,
        })?;
        rows.into_iter().map(Stage::from_row).collect()
    }

    pub fn find_stages_tree(
        &mut self,
        pattern: &str,
        include_unpublished: bool,
    ) -> Result<VersionTree<Stage>, RegistryError> {
        let stages = self.find_stages(pattern, include_unpublished)?;
        Ok(group_records(
            stages,
            |stage| stage.name.clone(),
            |_| "-".to_string(),
        ))
    }

    /// Local path of the stage's script source, via the content backend.
    pub fn materialize_script(&self, stage: &Stage) -> Result<std::path::PathBuf, RegistryError> {
        Ok(self.backend.materialize(&stage.script_ref)?)
    }
}
