#![forbid(unsafe_code)]

use super::lineage::insert_lineage_edge_tx;
use super::*;
use avc_core::lineage::{ArtifactKind, ArtifactRef};
use rusqlite::{OptionalExtension, params};

const WORKFLOW_COLUMNS: &str = "w.workspace, w.name, w.version, w.created_at_ms, t.tag";

fn workflow_row(row: &rusqlite::Row<'_>) -> Result<WorkflowRow, rusqlite::Error> {
    Ok(WorkflowRow {
        workspace: row.get(0)?,
        name: row.get(1)?,
        version: row.get(2)?,
        created_at_ms: row.get(3)?,
        tag: row.get(4)?,
    })
}

pub(in crate::store) fn workflow_row_tx(
    tx: &Transaction<'_>,
    workspace: &str,
    name: &str,
    version: &str,
) -> Result<Option<WorkflowRow>, StoreError> {
    let sql = format!(
        "SELECT {WORKFLOW_COLUMNS} FROM workflows w \
         LEFT JOIN workflow_tags t \
           ON t.workspace = w.workspace AND t.name = w.name AND t.version = w.version \
         WHERE w.workspace=?1 AND w.name=?2 AND w.version=?3"
    );
    Ok(tx
        .query_row(&sql, params![workspace, name, version], workflow_row)
        .optional()?)
}

impl SqliteStore {
    /// Idempotent save of a workflow version together with its ordered
    /// stage membership, internal dependency edges and the stage →
    /// workflow lineage edges, all in one transaction. Every member stage
    /// version must already be saved.
    pub fn save_workflow(
        &mut self,
        request: SaveWorkflowRequest,
    ) -> Result<(WorkflowRow, bool), StoreError> {
        let workspace = canonicalize_workspace(&request.workspace)?;
        let name = canonicalize_name(&request.name)?;
        let version = canonicalize_version(&request.version)?;
        if request.stages.is_empty() {
            return Err(StoreError::InvalidInput(
                "workflow must contain at least one stage",
            ));
        }

        let now_ms = now_ms();
        let tx = self.write_tx()?;
        ensure_workspace_tx(&tx, &workspace, now_ms)?;

        if let Some(existing) = workflow_row_tx(&tx, &workspace, &name, &version)? {
            tx.commit()?;
            return Ok((existing, false));
        }

        for stage in &request.stages {
            let stage_ref = stage.to_ref(ArtifactKind::Stage);
            if !artifact_exists_tx(&tx, &stage_ref)? {
                return Err(StoreError::MissingProducer {
                    producer: stage_ref.label(),
                });
            }
        }
        for (upstream, downstream) in &request.edges {
            let member = |stage_name: &str| request.stages.iter().any(|s| s.name == stage_name);
            if !member(upstream) || !member(downstream) {
                return Err(StoreError::InvalidInput(
                    "workflow edge references a stage that is not a member",
                ));
            }
        }

        tx.execute(
            "INSERT INTO workflows(workspace, name, version, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
            params![workspace, name, version, now_ms],
        )?;

        let this = ArtifactRef::new(ArtifactKind::Workflow, &*workspace, &*name, &*version);
        for (position, stage) in request.stages.iter().enumerate() {
            tx.execute(
                "INSERT INTO workflow_stages( \
                   workspace, name, version, position, stage_workspace, stage_name, stage_version) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    workspace,
                    name,
                    version,
                    position as i64,
                    stage.workspace,
                    stage.name,
                    stage.version
                ],
            )?;
            insert_lineage_edge_tx(&tx, &stage.to_ref(ArtifactKind::Stage), &this)?;
        }
        for (position, (upstream, downstream)) in request.edges.iter().enumerate() {
            tx.execute(
                "INSERT INTO workflow_edges(workspace, name, version, position, upstream, downstream) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![workspace, name, version, position as i64, upstream, downstream],
            )?;
        }

        tx.commit()?;
        Ok((
            WorkflowRow {
                workspace,
                name,
                version,
                created_at_ms: now_ms,
                tag: None,
            },
            true,
        ))
    }

    pub fn workflow_exists(
        &self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<bool, StoreError> {
        let exists: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM workflows WHERE workspace=?1 AND name=?2 AND version=?3)",
            params![workspace, name, version],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    pub fn get_workflow_by_version(
        &self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<Option<WorkflowRow>, StoreError> {
        let sql = format!(
            "SELECT {WORKFLOW_COLUMNS} FROM workflows w \
             LEFT JOIN workflow_tags t \
               ON t.workspace = w.workspace AND t.name = w.name AND t.version = w.version \
             WHERE w.workspace=?1 AND w.name=?2 AND w.version=?3"
        );
        Ok(self
            .conn()
            .query_row(&sql, params![workspace, name, version], workflow_row)
            .optional()?)
    }

    /// Member stage versions in declaration order.
    pub fn workflow_stages(
        &self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<Vec<ArtifactKey>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT stage_workspace, stage_name, stage_version FROM workflow_stages \
             WHERE workspace=?1 AND name=?2 AND version=?3 \
             ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![workspace, name, version], |row| {
            Ok(ArtifactKey {
                workspace: row.get(0)?,
                name: row.get(1)?,
                version: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Internal dependency edges in declaration order.
    pub fn workflow_edges(
        &self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT upstream, downstream FROM workflow_edges \
             WHERE workspace=?1 AND name=?2 AND version=?3 \
             ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![workspace, name, version], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_workflows(&self, request: &ListRequest) -> Result<Vec<WorkflowRow>, StoreError> {
        let sql = format!(
            "SELECT {WORKFLOW_COLUMNS} FROM workflows w \
             LEFT JOIN workflow_tags t \
               ON t.workspace = w.workspace AND t.name = w.name AND t.version = w.version \
             WHERE w.workspace=?1 AND w.name GLOB ?2 \
               AND (?3 IS NULL OR w.version GLOB ?3) \
               AND (?4 OR t.tag IS NOT NULL) \
             ORDER BY w.name ASC, w.created_at_ms ASC, w.version ASC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                request.workspace,
                request.name_pattern,
                request.version_pattern,
                request.include_unpublished
            ],
            workflow_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
