#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS datasets (
          workspace TEXT NOT NULL,
          name TEXT NOT NULL,
          version TEXT NOT NULL,
          split TEXT,
          parent_workspace TEXT,
          parent_name TEXT,
          parent_version TEXT,
          workflow_workspace TEXT,
          workflow_name TEXT,
          workflow_version TEXT,
          file_ref TEXT NOT NULL,
          size INTEGER,
          log_message TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY (workspace, name, version),
          FOREIGN KEY (parent_workspace, parent_name, parent_version)
            REFERENCES datasets (workspace, name, version),
          FOREIGN KEY (workflow_workspace, workflow_name, workflow_version)
            REFERENCES workflows (workspace, name, version)
        );

        CREATE TABLE IF NOT EXISTS dataset_tags (
          workspace TEXT NOT NULL,
          name TEXT NOT NULL,
          version TEXT NOT NULL,
          tag INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY (workspace, name, tag),
          UNIQUE (workspace, name, version),
          FOREIGN KEY (workspace, name, version) REFERENCES datasets (workspace, name, version)
        );
"#;
