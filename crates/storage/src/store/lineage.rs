#![forbid(unsafe_code)]

use super::*;
use avc_core::lineage::{ArtifactKind, ArtifactRef, LineageGraph};
use rusqlite::params;
use std::collections::{HashSet, VecDeque};

fn producers_of_tx(
    tx: &Transaction<'_>,
    artifact: &ArtifactRef,
) -> Result<Vec<ArtifactRef>, StoreError> {
    let mut stmt = tx.prepare(
        "SELECT producer_kind, producer_workspace, producer_name, producer_version \
         FROM lineage_edges \
         WHERE artifact_kind=?1 AND artifact_workspace=?2 AND artifact_name=?3 AND artifact_version=?4 \
         ORDER BY producer_kind, producer_workspace, producer_name, producer_version",
    )?;
    let mut rows = stmt.query(params![
        artifact.kind.as_str(),
        artifact.workspace,
        artifact.name,
        artifact.version
    ])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let kind_raw: String = row.get(0)?;
        let Some(kind) = ArtifactKind::parse(&kind_raw) else {
            return Err(StoreError::InvalidInput("unknown producer kind in store"));
        };
        out.push(ArtifactRef {
            kind,
            workspace: row.get(1)?,
            name: row.get(2)?,
            version: row.get(3)?,
        });
    }
    Ok(out)
}

/// Insert one `producer -> artifact` edge under the caller's transaction.
/// The producer row must already exist, and the edge is refused when it
/// would close a cycle; either failure rolls the whole transaction back
/// with it, so a rejected artifact leaves no partial rows behind.
pub(in crate::store) fn insert_lineage_edge_tx(
    tx: &Transaction<'_>,
    producer: &ArtifactRef,
    artifact: &ArtifactRef,
) -> Result<(), StoreError> {
    if !artifact_exists_tx(tx, producer)? {
        return Err(StoreError::MissingProducer {
            producer: producer.label(),
        });
    }
    if producer == artifact || is_ancestor_tx(tx, artifact, producer)? {
        return Err(StoreError::CycleDetected {
            producer: producer.label(),
            artifact: artifact.label(),
        });
    }
    tx.execute(
        "INSERT OR IGNORE INTO lineage_edges( \
           producer_kind, producer_workspace, producer_name, producer_version, \
           artifact_kind, artifact_workspace, artifact_name, artifact_version) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            producer.kind.as_str(),
            producer.workspace,
            producer.name,
            producer.version,
            artifact.kind.as_str(),
            artifact.workspace,
            artifact.name,
            artifact.version
        ],
    )?;
    Ok(())
}

fn is_ancestor_tx(
    tx: &Transaction<'_>,
    candidate: &ArtifactRef,
    artifact: &ArtifactRef,
) -> Result<bool, StoreError> {
    let mut seen = HashSet::new();
    seen.insert(artifact.clone());
    let mut queue = VecDeque::from([artifact.clone()]);
    while let Some(current) = queue.pop_front() {
        for producer in producers_of_tx(tx, &current)? {
            if &producer == candidate {
                return Ok(true);
            }
            if seen.insert(producer.clone()) {
                queue.push_back(producer);
            }
        }
    }
    Ok(false)
}

impl SqliteStore {
    /// Ancestry of one artifact version, nearest first. Builds the
    /// in-memory graph on demand from the edges reachable upward of the
    /// root; the full store is never loaded.
    pub fn ancestors(&mut self, root: &ArtifactRef) -> Result<Vec<ArtifactRef>, StoreError> {
        let graph = self.load_upward(root)?;
        Ok(graph.ancestors(root))
    }

    pub fn is_ancestor(
        &mut self,
        candidate: &ArtifactRef,
        artifact: &ArtifactRef,
    ) -> Result<bool, StoreError> {
        let graph = self.load_upward(artifact)?;
        Ok(graph.is_ancestor(candidate, artifact))
    }

    fn load_upward(&mut self, root: &ArtifactRef) -> Result<LineageGraph, StoreError> {
        let tx = self.conn.transaction()?;
        let mut graph = LineageGraph::new();
        let mut seen = HashSet::new();
        seen.insert(root.clone());
        let mut queue = VecDeque::from([root.clone()]);
        while let Some(current) = queue.pop_front() {
            for producer in producers_of_tx(&tx, &current)? {
                graph
                    .add_edge(&producer, &current)
                    // Insertion refuses cycles, so stored edges replay
                    // cleanly unless the file was tampered with.
                    .map_err(|_| StoreError::InvalidInput("lineage store contains a cycle"))?;
                if seen.insert(producer.clone()) {
                    queue.push_back(producer);
                }
            }
        }
        tx.commit()?;
        Ok(graph)
    }
}
