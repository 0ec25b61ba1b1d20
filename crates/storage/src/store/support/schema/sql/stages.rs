#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS stages (
          workspace TEXT NOT NULL,
          name TEXT NOT NULL,
          version TEXT NOT NULL,
          params_json TEXT NOT NULL,
          script_ref TEXT NOT NULL,
          entrypoint TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY (workspace, name, version)
        );

        CREATE TABLE IF NOT EXISTS stage_tags (
          workspace TEXT NOT NULL,
          name TEXT NOT NULL,
          version TEXT NOT NULL,
          tag INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY (workspace, name, tag),
          UNIQUE (workspace, name, version),
          FOREIGN KEY (workspace, name, version) REFERENCES stages (workspace, name, version)
        );
"#;
