#![forbid(unsafe_code)]

mod datasets;
mod error;
mod lineage;
mod requests;
mod resolve;
mod stages;
mod support;
mod types;
mod workflows;

pub use error::StoreError;
pub use requests::*;
pub use types::*;

use avc_core::ids::{ArtifactName, VersionId, WorkspaceId};
use avc_core::lineage::{ArtifactKind, ArtifactRef};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE: &str = "artvc.db";

/// Durable metadata store for artifact versions, tags, workflow membership
/// and lineage edges. One store maps to one SQLite file; concurrent
/// callers open their own store on the same directory and serialize
/// through WAL plus immediate transactions.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        support::schema::install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub(in crate::store) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// All multi-statement mutations run through here so writers take the
    /// write lock up front instead of deadlocking on a deferred upgrade.
    pub(in crate::store) fn write_tx(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

pub(in crate::store) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

pub(in crate::store) fn ensure_workspace_tx(
    tx: &Transaction<'_>,
    workspace: &str,
    now_ms: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT OR IGNORE INTO workspaces(workspace, created_at_ms) VALUES (?1, ?2)",
        params![workspace, now_ms],
    )?;
    Ok(())
}

pub(in crate::store) fn canonicalize_workspace(raw: &str) -> Result<String, StoreError> {
    WorkspaceId::try_new(raw)
        .map(WorkspaceId::into_string)
        .map_err(|err| StoreError::InvalidInput(err.message()))
}

pub(in crate::store) fn canonicalize_name(raw: &str) -> Result<String, StoreError> {
    ArtifactName::try_new(raw)
        .map(ArtifactName::into_string)
        .map_err(|err| StoreError::InvalidInput(err.message()))
}

pub(in crate::store) fn canonicalize_version(raw: &str) -> Result<String, StoreError> {
    VersionId::try_new(raw)
        .map(VersionId::into_string)
        .map_err(|err| StoreError::InvalidInput(err.message()))
}

/// Version and tag table names for one entity kind. Table names are
/// compile-time constants, so interpolating them into SQL is safe.
#[derive(Clone, Copy, Debug)]
pub(in crate::store) struct KindTables {
    pub table: &'static str,
    pub tag_table: &'static str,
}

pub(in crate::store) fn tables_for(kind: ArtifactKind) -> KindTables {
    match kind {
        ArtifactKind::Stage => KindTables {
            table: "stages",
            tag_table: "stage_tags",
        },
        ArtifactKind::Dataset => KindTables {
            table: "datasets",
            tag_table: "dataset_tags",
        },
        ArtifactKind::Workflow => KindTables {
            table: "workflows",
            tag_table: "workflow_tags",
        },
    }
}

pub(in crate::store) fn artifact_exists_tx(
    tx: &Transaction<'_>,
    artifact: &ArtifactRef,
) -> Result<bool, StoreError> {
    let tables = tables_for(artifact.kind);
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE workspace=?1 AND name=?2 AND version=?3)",
        tables.table
    );
    let exists: i64 = tx.query_row(
        &sql,
        params![artifact.workspace, artifact.name, artifact.version],
        |row| row.get(0),
    )?;
    Ok(exists != 0)
}

/// max(tag)+1 for `(workspace, name)`, computed under the caller's
/// transaction so concurrent publishers cannot allocate the same number.
pub(in crate::store) fn next_tag_tx(
    tx: &Transaction<'_>,
    tag_table: &'static str,
    workspace: &str,
    name: &str,
) -> Result<i64, StoreError> {
    let sql =
        format!("SELECT COALESCE(MAX(tag), 0) + 1 FROM {tag_table} WHERE workspace=?1 AND name=?2");
    let next: i64 = tx.query_row(&sql, params![workspace, name], |row| row.get(0))?;
    Ok(next)
}

/// Tag already attached to this exact version, if any.
pub(in crate::store) fn version_tag_tx(
    tx: &Transaction<'_>,
    tag_table: &'static str,
    workspace: &str,
    name: &str,
    version: &str,
) -> Result<Option<i64>, StoreError> {
    use rusqlite::OptionalExtension;
    let sql =
        format!("SELECT tag FROM {tag_table} WHERE workspace=?1 AND name=?2 AND version=?3");
    Ok(tx
        .query_row(&sql, params![workspace, name, version], |row| row.get(0))
        .optional()?)
}

impl SqliteStore {
    /// Attach the next tag integer to an already-saved version. Returns
    /// `(tag, fresh)`; `fresh` is false when the version already owned a
    /// tag, which callers surface as an already-published warning rather
    /// than an error.
    pub(in crate::store) fn tag_artifact(
        &mut self,
        kind: ArtifactKind,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<(i64, bool), StoreError> {
        let workspace = canonicalize_workspace(workspace)?;
        let name = canonicalize_name(name)?;
        let version = canonicalize_version(version)?;
        let tables = tables_for(kind);

        let now_ms = now_ms();
        let tx = self.write_tx()?;

        let target = ArtifactRef::new(kind, &*workspace, &*name, &*version);
        if !artifact_exists_tx(&tx, &target)? {
            return Err(StoreError::NotFound {
                workspace,
                name,
                reference: version,
            });
        }

        if let Some(tag) = version_tag_tx(&tx, tables.tag_table, &workspace, &name, &version)? {
            tx.commit()?;
            return Ok((tag, false));
        }

        let tag = next_tag_tx(&tx, tables.tag_table, &workspace, &name)?;
        let sql = format!(
            "INSERT INTO {}(workspace, name, version, tag, created_at_ms) VALUES (?1, ?2, ?3, ?4, ?5)",
            tables.tag_table
        );
        tx.execute(&sql, params![workspace, name, version, tag, now_ms])?;
        tx.commit()?;
        Ok((tag, true))
    }

    pub fn tag_stage(
        &mut self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<(i64, bool), StoreError> {
        self.tag_artifact(ArtifactKind::Stage, workspace, name, version)
    }

    pub fn tag_dataset(
        &mut self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<(i64, bool), StoreError> {
        self.tag_artifact(ArtifactKind::Dataset, workspace, name, version)
    }

    pub fn tag_workflow(
        &mut self,
        workspace: &str,
        name: &str,
        version: &str,
    ) -> Result<(i64, bool), StoreError> {
        self.tag_artifact(ArtifactKind::Workflow, workspace, name, version)
    }
}
