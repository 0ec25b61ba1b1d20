#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS workflows (
          workspace TEXT NOT NULL,
          name TEXT NOT NULL,
          version TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY (workspace, name, version)
        );

        CREATE TABLE IF NOT EXISTS workflow_tags (
          workspace TEXT NOT NULL,
          name TEXT NOT NULL,
          version TEXT NOT NULL,
          tag INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY (workspace, name, tag),
          UNIQUE (workspace, name, version),
          FOREIGN KEY (workspace, name, version) REFERENCES workflows (workspace, name, version)
        );

        CREATE TABLE IF NOT EXISTS workflow_stages (
          workspace TEXT NOT NULL,
          name TEXT NOT NULL,
          version TEXT NOT NULL,
          position INTEGER NOT NULL,
          stage_workspace TEXT NOT NULL,
          stage_name TEXT NOT NULL,
          stage_version TEXT NOT NULL,
          PRIMARY KEY (workspace, name, version, position),
          FOREIGN KEY (workspace, name, version) REFERENCES workflows (workspace, name, version),
          FOREIGN KEY (stage_workspace, stage_name, stage_version) REFERENCES stages (workspace, name, version)
        );

        CREATE TABLE IF NOT EXISTS workflow_edges (
          workspace TEXT NOT NULL,
          name TEXT NOT NULL,
          version TEXT NOT NULL,
          position INTEGER NOT NULL,
          upstream TEXT NOT NULL,
          downstream TEXT NOT NULL,
          PRIMARY KEY (workspace, name, version, upstream, downstream),
          FOREIGN KEY (workspace, name, version) REFERENCES workflows (workspace, name, version)
        );
"#;
