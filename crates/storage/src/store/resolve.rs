#![forbid(unsafe_code)]

//! Symbolic version resolution: `latest`/`HEAD`, `v<N>` tags and hex
//! prefixes each collapse to exactly one stored digest or fail with a
//! structured error. Pure queries, a couple of indexed lookups each.

use super::*;
use avc_core::identifier::VersionRef;
use avc_core::ids::VERSION_ID_LEN;
use avc_core::lineage::ArtifactKind;
use rusqlite::{OptionalExtension, params};

// One more row than needed to detect ambiguity, plus a few for the error
// message's candidate list.
const PREFIX_CANDIDATE_LIMIT: usize = 8;

impl SqliteStore {
    pub fn resolve_stage_version(
        &self,
        workspace: &str,
        name: &str,
        version: &VersionRef,
    ) -> Result<String, StoreError> {
        self.resolve_version(ArtifactKind::Stage, workspace, name, version)
    }

    pub fn resolve_dataset_version(
        &self,
        workspace: &str,
        name: &str,
        version: &VersionRef,
    ) -> Result<String, StoreError> {
        self.resolve_version(ArtifactKind::Dataset, workspace, name, version)
    }

    pub fn resolve_workflow_version(
        &self,
        workspace: &str,
        name: &str,
        version: &VersionRef,
    ) -> Result<String, StoreError> {
        self.resolve_version(ArtifactKind::Workflow, workspace, name, version)
    }

    fn resolve_version(
        &self,
        kind: ArtifactKind,
        workspace: &str,
        name: &str,
        version: &VersionRef,
    ) -> Result<String, StoreError> {
        let tables = tables_for(kind);
        match version {
            // `HEAD` has no persisted row of its own; both symbols mean
            // "the version owning the highest tag", NotFound when the
            // artifact has never been published.
            VersionRef::Latest | VersionRef::Head => {
                let sql = format!(
                    "SELECT version FROM {} WHERE workspace=?1 AND name=?2 ORDER BY tag DESC LIMIT 1",
                    tables.tag_table
                );
                self.conn()
                    .query_row(&sql, params![workspace, name], |row| row.get(0))
                    .optional()?
                    .ok_or_else(|| StoreError::NotFound {
                        workspace: workspace.to_string(),
                        name: name.to_string(),
                        reference: "latest".to_string(),
                    })
            }
            VersionRef::Tag(number) => {
                let sql = format!(
                    "SELECT version FROM {} WHERE workspace=?1 AND name=?2 AND tag=?3",
                    tables.tag_table
                );
                self.conn()
                    .query_row(&sql, params![workspace, name, *number as i64], |row| {
                        row.get(0)
                    })
                    .optional()?
                    .ok_or_else(|| StoreError::NotFound {
                        workspace: workspace.to_string(),
                        name: name.to_string(),
                        reference: format!("v{number}"),
                    })
            }
            VersionRef::Hex(prefix) => self.resolve_prefix(tables, workspace, name, prefix),
            VersionRef::Pattern(_) => Err(StoreError::InvalidInput(
                "glob pattern cannot resolve to a single version",
            )),
        }
    }

    fn resolve_prefix(
        &self,
        tables: KindTables,
        workspace: &str,
        name: &str,
        prefix: &str,
    ) -> Result<String, StoreError> {
        if prefix.len() == VERSION_ID_LEN {
            let sql = format!(
                "SELECT version FROM {} WHERE workspace=?1 AND name=?2 AND version=?3",
                tables.table
            );
            return self
                .conn()
                .query_row(&sql, params![workspace, name, prefix], |row| row.get(0))
                .optional()?
                .ok_or_else(|| StoreError::NotFound {
                    workspace: workspace.to_string(),
                    name: name.to_string(),
                    reference: prefix.to_string(),
                });
        }

        // Prefix scan over the (workspace, name, version) primary key;
        // LIKE on a literal prefix stays within the index range.
        let sql = format!(
            "SELECT version FROM {} WHERE workspace=?1 AND name=?2 AND version LIKE ?3 || '%' \
             ORDER BY version ASC LIMIT ?4",
            tables.table
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![workspace, name, prefix, PREFIX_CANDIDATE_LIMIT as i64],
            |row| row.get::<_, String>(0),
        )?;
        let candidates = rows.collect::<Result<Vec<_>, _>>()?;

        match candidates.len() {
            0 => Err(StoreError::NotFound {
                workspace: workspace.to_string(),
                name: name.to_string(),
                reference: prefix.to_string(),
            }),
            1 => Ok(candidates.into_iter().next().unwrap_or_default()),
            _ => Err(StoreError::AmbiguousVersion {
                workspace: workspace.to_string(),
                name: name.to_string(),
                prefix: prefix.to_string(),
                candidates,
            }),
        }
    }
}
