#![forbid(unsafe_code)]

use super::{Registry, VersionFilter, version_filter};
use crate::error::RegistryError;
use crate::fingerprint::{dataset_fingerprint, sha256_file_hex};
use crate::models::{Dataset, DatasetDraft, PublishOutcome, VersionTree, group_records};
use avc_core::identifier::{self, VersionRef};
use avc_storage::{ListRequest, SaveDatasetRequest, StoreError};
use std::path::PathBuf;

impl Registry {
    /// Fingerprint the data file together with the declared lineage and
    /// persist the version plus its lineage edges; identical content is
    /// an idempotent no-op. File bytes reach the content backend only on
    /// first save.
    pub fn save_dataset(&mut self, draft: &DatasetDraft) -> Result<(Dataset, bool), RegistryError> {
        let workspace = self.workspace_for(draft.workspace.clone())?;
        let file_sha256 = sha256_file_hex(&draft.file_path)?;
        let version = dataset_fingerprint(
            &workspace,
            &draft.name,
            &file_sha256,
            draft.parent.as_ref().map(|p| p.label()).as_deref(),
            draft
                .producing_workflow
                .as_ref()
                .map(|w| w.label())
                .as_deref(),
            &draft.log_message,
        );

        if let Some(existing) = self
            .store
            .get_dataset_by_version(&workspace, &draft.name, &version)?
        {
            return Ok((Dataset::from_row(existing), false));
        }

        let size = std::fs::metadata(&draft.file_path)?.len() as i64;
        let file_ref = self.backend.store(&draft.file_path)?;
        let (row, created) = self.store.save_dataset(SaveDatasetRequest {
            workspace,
            name: draft.name.clone(),
            version,
            split: draft.split.map(|split| split.as_str().to_string()),
            parent: draft.parent.clone(),
            producing_workflow: draft.producing_workflow.clone(),
            file_ref,
            size: Some(size),
            log_message: draft.log_message.clone(),
        })?;
        Ok((Dataset::from_row(row), created))
    }

    pub fn publish_dataset(
        &mut self,
        draft: &DatasetDraft,
    ) -> Result<PublishOutcome<Dataset>, RegistryError> {
        let (mut dataset, _) = self.save_dataset(draft)?;
        let (tag, fresh) = self
            .store
            .tag_dataset(&dataset.workspace, &dataset.name, &dataset.version)?;
        dataset.tag = Some(tag);
        Ok(PublishOutcome {
            record: dataset,
            tag,
            already_published: !fresh,
        })
    }

    /// `identifier` follows `[workspace.]name[@version][[split]]`; a
    /// missing version means `latest`. A split selector must match the
    /// stored record's split.
    pub fn get_dataset(
        &mut self,
        identifier: &str,
        version: Option<&str>,
    ) -> Result<Dataset, RegistryError> {
        let parsed = identifier::parse_get(identifier, version)?;
        let workspace = self.workspace_for(parsed.workspace)?;
        let reference = parsed.version.unwrap_or(VersionRef::Latest);
        let version = self
            .store
            .resolve_dataset_version(&workspace, &parsed.name, &reference)?;
        let row = self
            .store
            .get_dataset_by_version(&workspace, &parsed.name, &version)?
            .ok_or_else(|| {
                RegistryError::Store(StoreError::NotFound {
                    workspace: workspace.clone(),
                    name: parsed.name.clone(),
                    reference: version.clone(),
                })
            })?;
        let dataset = Dataset::from_row(row);
        if let Some(split) = parsed.split {
            if dataset.split.as_deref() != Some(split.as_str()) {
                return Err(RegistryError::Store(StoreError::NotFound {
                    workspace,
                    name: parsed.name,
                    reference: format!("{version}[{}]", split.as_str()),
                }));
            }
        }
        Ok(dataset)
    }

    pub fn find_datasets(
        &mut self,
        pattern: &str,
        include_unpublished: bool,
    ) -> Result<Vec<Dataset>, RegistryError> {
        let parsed = identifier::parse_list(pattern)?;
        let workspace = self.workspace_for(parsed.workspace)?;
        let name_pattern = parsed.name;
        let filter = version_filter(parsed.version, |reference| {
            self.store
                .resolve_dataset_version(&workspace, &name_pattern, reference)
        })?;
        let version_pattern = match filter {
            VersionFilter::NoMatch => return Ok(Vec::new()),
            VersionFilter::Any => None,
            VersionFilter::Pattern(pattern) => Some(pattern),
        };
        let rows = self.store.list_datasets(&ListRequest {
            workspace,
            name_pattern,
            version_pattern,
            include_unpublished,
        })?;
        let mut datasets = rows.into_iter().map(Dataset::from_row).collect::<Vec<_>>();
        if let Some(split) = parsed.split {
            datasets.retain(|dataset| dataset.split.as_deref() == Some(split.as_str()));
        }
        Ok(datasets)
    }

    /// Tree view: dataset name → split (`"-"` when unset) → versions in
    /// listing order.
    pub fn find_datasets_tree(
        &mut self,
        pattern: &str,
        include_unpublished: bool,
    ) -> Result<VersionTree<Dataset>, RegistryError> {
        let datasets = self.find_datasets(pattern, include_unpublished)?;
        Ok(group_records(
            datasets,
            |dataset| dataset.name.clone(),
            |dataset| dataset.split.clone().unwrap_or_else(|| "-".to_string()),
        ))
    }

    /// Lazily hydrate the parent dataset, one hop only.
    pub fn parent_dataset(&mut self, dataset: &Dataset) -> Result<Option<Dataset>, RegistryError> {
        let Some(parent) = &dataset.parent else {
            return Ok(None);
        };
        let row = self
            .store
            .get_dataset_by_version(&parent.workspace, &parent.name, &parent.version)?
            .ok_or_else(|| {
                RegistryError::Store(StoreError::NotFound {
                    workspace: parent.workspace.clone(),
                    name: parent.name.clone(),
                    reference: parent.version.clone(),
                })
            })?;
        Ok(Some(Dataset::from_row(row)))
    }

    /// Local path of the dataset's data file, via the content backend.
    pub fn materialize_dataset(&self, dataset: &Dataset) -> Result<PathBuf, RegistryError> {
        Ok(self.backend.materialize(&dataset.file_ref)?)
    }
}
