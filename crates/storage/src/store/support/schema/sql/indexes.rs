#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_lineage_by_artifact
          ON lineage_edges(artifact_kind, artifact_workspace, artifact_name, artifact_version);
        CREATE INDEX IF NOT EXISTS idx_lineage_by_producer
          ON lineage_edges(producer_kind, producer_workspace, producer_name, producer_version);
"#;
