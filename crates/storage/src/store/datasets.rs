#![forbid(unsafe_code)]

use super::lineage::insert_lineage_edge_tx;
use super::*;
use avc_core::lineage::{ArtifactKind, ArtifactRef};
use rusqlite::{OptionalExtension, params};

const DATASET_COLUMNS: &str = "d.workspace, d.name, d.version, d.split, \
                               d.parent_workspace, d.parent_name, d.parent_version, \
                               d.workflow_workspace, d.workflow_name, d.workflow_version, \
                               d.file_ref, d.size, d.log_message, d.created_at_ms, t.tag";

fn dataset_row(row: &rusqlite::Row<'_>) -> Result<DatasetRow, rusqlite::Error> {
    let parent = match (
        row.get::<_, Option<String>>(4)?,
        row.get::<_, Option<String>>(5)?,
        row.get::<_, Option<String>>(6)?,
    ) {
        (Some(workspace), Some(name), Some(version)) => Some(ArtifactKey {
            workspace,
            name,
            version,
        }),
        _ => None,
    };
    let producing_workflow = match (
        row.get::<_, Option<String>>(7)?,
        row.get::<_, Option<String>>(8)?,
        row.get::<_, Option<String>>(9)?,
    ) {
        (Some(workspace), Some(name), Some(version)) => Some(ArtifactKey {
            workspace,
            name,
            version,
        }),
        _ => None,
    };
    Ok(DatasetRow {
        workspace: row.get(0)?,
        name: row.get(1)?,
        version: row.get(2)?,
        split: row.get(3)?,
        parent,
        producing_workflow,
        file_ref: row.get(10)?,
        size: row.get(11)?,
        log_message: row.get(12)?,
        created_at_ms: row.get(13)?,
        tag: row.get(14)?,
    })
}

pub(in crate::store) fn dataset_row_tx(
    tx: &Transaction<'_>,
    workspace: &str,
    name: &str,
    version: &str,
) -> Result<Option<DatasetRow>, StoreError> {
    let sql = format!(
        "SELECT {DATASET_COLUMNS} FROM datasets d \
         LEFT JOIN dataset_tags t \
           ON t.workspace = d.workspace AND t.name = d.name AND t.version = d.version \
         WHERE d.workspace=?1 AND d.name=?2 AND d.version=?3"
    );
    Ok(tx
        .query_row(&sql, params![workspace, name, version], dataset_row)
        .optional()?)
}

impl SqliteStore {
    /// Idempotent save. On first save the version row and its lineage
    /// edges (parent dataset, producing workflow) land in one
    /// transaction; a missing producer or a cycle rejects the whole
    /// artifact.
    pub fn save_dataset(
        &mut self,
        request: SaveDatasetRequest,
    ) -> Result<(DatasetRow, bool), StoreError> {
        let workspace = canonicalize_workspace(&request.workspace)?;
        let name = canonicalize_name(&request.name)?;
        let version = canonicalize_version(&request.version)?;

        let now_ms = now_ms();
        let tx = self.write_tx()?;
        ensure_workspace_tx(&tx, &workspace, now_ms)?;

        if let Some(existing) = dataset_row_tx(&tx, &workspace, &name, &version)? {
            tx.commit()?;
            return Ok((existing, false));
        }

        let this = ArtifactRef::new(ArtifactKind::Dataset, &*workspace, &*name, &*version);

        // Producers are checked before the row insert so the error names
        // the producer instead of a foreign-key failure.
        if let Some(parent) = &request.parent {
            let parent_ref = parent.to_ref(ArtifactKind::Dataset);
            if parent_ref == this {
                return Err(StoreError::CycleDetected {
                    producer: parent_ref.label(),
                    artifact: this.label(),
                });
            }
            if !artifact_exists_tx(&tx, &parent_ref)? {
                return Err(StoreError::MissingProducer {
                    producer: parent_ref.label(),
                });
            }
        }
        if let Some(workflow) = &request.producing_workflow {
            let workflow_ref = workflow.to_ref(ArtifactKind::Workflow);
            if !artifact_exists_tx(&tx, &workflow_ref)? {
                return Err(StoreError::MissingProducer {
                    producer: workflow_ref.label(),
                });
            }
        }

        tx.execute(
            "INSERT INTO datasets( \
               workspace, name, version, split, \
               parent_workspace, parent_name, parent_version, \
               workflow_workspace, workflow_name, workflow_version, \
               file_ref, size, log_message, created_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                workspace,
                name,
                version,
                request.split,
                request.parent.as_ref().map(|p| p.workspace.as_str()),
                request.parent.as_ref().map(|p| p.name.as_str()),
                request.parent.as_ref().map(|p| p.version.as_str()),
                request
                    .producing_workflow
                    .as_ref()
                    .map(|w| w.workspace.as_str()),
                request.producing_workflow.as_ref().map(|w| w.name.as_str()),
                request
                    .producing_workflow
                    .as_ref()
                    .map(|w| w.version.as_str()),
                request.file_ref,
                request.size,
                request.log_message,
                now_ms
            ],
        )?;

        if let Some(parent) = &request.parent {
            insert_lineage_edge_tx(&tx, &parent.to_ref(ArtifactKind::Dataset), &this)?;
        }
        if let Some(workflow) = &request.producing_workflow {
            insert_lineage_edge_tx(&tx, &workflow.to_ref(ArtifactKind::Workflow), &this)?;
        }

        tx.commit()?;
        Ok((
            DatasetRow {
                workspace,
                name,
                version,
                split: request.split,
                parent: request.parent,
                producing_workflow: request.producing_workflow,
                file_ref: request.file_ref,
                size: request.size,
                log_message: request.log_message,
                created_at_ms: now_ms,
                tag: None,
            },
            true,
        ))
    }

    pub fn dataset_exists(
        &self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<bool, StoreError> {
        let exists: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM datasets WHERE workspace=?1 AND name=?2 AND version=?3)",
            params![workspace, name, version],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    pub fn get_dataset_by_version(
        &self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<Option<DatasetRow>, StoreError> {
        let sql = format!(
            "SELECT {DATASET_COLUMNS} FROM datasets d \
             LEFT JOIN dataset_tags t \
               ON t.workspace = d.workspace AND t.name = d.name AND t.version = d.version \
             WHERE d.workspace=?1 AND d.name=?2 AND d.version=?3"
        );
        Ok(self
            .conn()
            .query_row(&sql, params![workspace, name, version], dataset_row)
            .optional()?)
    }

    pub fn list_datasets(&self, request: &ListRequest) -> Result<Vec<DatasetRow>, StoreError> {
        let sql = format!(
            "SELECT {DATASET_COLUMNS} FROM datasets d \
             LEFT JOIN dataset_tags t \
               ON t.workspace = d.workspace AND t.name = d.name AND t.version = d.version \
             WHERE d.workspace=?1 AND d.name GLOB ?2 \
               AND (?3 IS NULL OR d.version GLOB ?3) \
               AND (?4 OR t.tag IS NOT NULL) \
             ORDER BY d.name ASC, d.created_at_ms ASC, d.version ASC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                request.workspace,
                request.name_pattern,
                request.version_pattern,
                request.include_unpublished
            ],
            dataset_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
