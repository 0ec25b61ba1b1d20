#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS lineage_edges (
          producer_kind TEXT NOT NULL,
          producer_workspace TEXT NOT NULL,
          producer_name TEXT NOT NULL,
          producer_version TEXT NOT NULL,
          artifact_kind TEXT NOT NULL,
          artifact_workspace TEXT NOT NULL,
          artifact_name TEXT NOT NULL,
          artifact_version TEXT NOT NULL,
          PRIMARY KEY (
            producer_kind, producer_workspace, producer_name, producer_version,
            artifact_kind, artifact_workspace, artifact_name, artifact_version
          )
        );
"#;
