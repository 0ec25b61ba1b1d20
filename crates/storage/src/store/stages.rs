#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

const STAGE_COLUMNS: &str = "s.workspace, s.name, s.version, s.params_json, s.script_ref, \
                             s.entrypoint, s.created_at_ms, t.tag";

fn stage_row(row: &rusqlite::Row<'_>) -> Result<StageRow, rusqlite::Error> {
    Ok(StageRow {
        workspace: row.get(0)?,
        name: row.get(1)?,
        version: row.get(2)?,
        params_json: row.get(3)?,
        script_ref: row.get(4)?,
        entrypoint: row.get(5)?,
        created_at_ms: row.get(6)?,
        tag: row.get(7)?,
    })
}

pub(in crate::store) fn stage_row_tx(
    tx: &Transaction<'_>,
    workspace: &str,
    name: &str,
    version: &str,
) -> Result<Option<StageRow>, StoreError> {
    let sql = format!(
        "SELECT {STAGE_COLUMNS} FROM stages s \
         LEFT JOIN stage_tags t \
           ON t.workspace = s.workspace AND t.name = s.name AND t.version = s.version \
         WHERE s.workspace=?1 AND s.name=?2 AND s.version=?3"
    );
    Ok(tx
        .query_row(&sql, params![workspace, name, version], stage_row)
        .optional()?)
}

impl SqliteStore {
    /// Idempotent save: when the version row already exists the persisted
    /// record comes back untouched (same timestamp, same tag) and
    /// `created` is false.
    pub fn save_stage(&mut self, request: SaveStageRequest) -> Result<(StageRow, bool), StoreError> {
        let workspace = canonicalize_workspace(&request.workspace)?;
        let name = canonicalize_name(&request.name)?;
        let version = canonicalize_version(&request.version)?;
        if serde_json::from_str::<serde_json::Value>(&request.params_json).is_err() {
            return Err(StoreError::InvalidInput("params must be valid JSON"));
        }

        let now_ms = now_ms();
        let tx = self.write_tx()?;
        ensure_workspace_tx(&tx, &workspace, now_ms)?;

        if let Some(existing) = stage_row_tx(&tx, &workspace, &name, &version)? {
            tx.commit()?;
            return Ok((existing, false));
        }

        tx.execute(
            "INSERT INTO stages(workspace, name, version, params_json, script_ref, entrypoint, created_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                workspace,
                name,
                version,
                request.params_json,
                request.script_ref,
                request.entrypoint,
                now_ms
            ],
        )?;

        tx.commit()?;
        Ok((
            StageRow {
                workspace,
                name,
                version,
                params_json: request.params_json,
                script_ref: request.script_ref,
                entrypoint: request.entrypoint,
                created_at_ms: now_ms,
                tag: None,
            },
            true,
        ))
    }

    pub fn stage_exists(
        &self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<bool, StoreError> {
        let exists: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM stages WHERE workspace=?1 AND name=?2 AND version=?3)",
            params![workspace, name, version],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    pub fn get_stage_by_version(
        &self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<Option<StageRow>, StoreError> {
        let sql = format!(
            "SELECT {STAGE_COLUMNS} FROM stages s \
             LEFT JOIN stage_tags t \
               ON t.workspace = s.workspace AND t.name = s.name AND t.version = s.version \
             WHERE s.workspace=?1 AND s.name=?2 AND s.version=?3"
        );
        Ok(self
            .conn()
            .query_row(&sql, params![workspace, name, version], stage_row)
            .optional()?)
    }

    pub fn list_stages(&self, request: &ListRequest) -> Result<Vec<StageRow>, StoreError> {
        let sql = format!(
            "SELECT {STAGE_COLUMNS} FROM stages s \
             LEFT JOIN stage_tags t \
               ON t.workspace = s.workspace AND t.name = s.name AND t.version = s.version \
             WHERE s.workspace=?1 AND s.name GLOB ?2 \
               AND (?3 IS NULL OR s.version GLOB ?3) \
               AND (?4 OR t.tag IS NOT NULL) \
             ORDER BY s.name ASC, s.created_at_ms ASC, s.version ASC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                request.workspace,
                request.name_pattern,
                request.version_pattern,
                request.include_unpublished
            ],
            stage_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
