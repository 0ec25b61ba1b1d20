#![forbid(unsafe_code)]

//! Content fingerprinting. An artifact's version is the SHA-256 digest of
//! a canonical JSON rendering of its semantic fields only: serde_json
//! objects are BTreeMap-backed, so keys always serialize sorted and map
//! insertion order never leaks into the digest. Timestamps, local paths
//! and cache locations are not inputs.

use serde_json::{Value, json};
use sha2::Digest as _;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Read as _;
use std::path::Path;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    to_hex(hasher.finalize().as_slice())
}

/// Streaming file digest; large data files never load whole.
pub fn sha256_file_hex(path: &Path) -> Result<String, std::io::Error> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mut hasher = sha2::Sha256::new();

    let mut buf = [0u8; 16 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(to_hex(hasher.finalize().as_slice()))
}

fn to_hex(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

fn digest_value(value: &Value) -> String {
    sha256_hex(value.to_string().as_bytes())
}

pub fn stage_fingerprint(
    workspace: &str,
    name: &str,
    params: &BTreeMap<String, Value>,
    script_sha256: &str,
    entrypoint: &str,
) -> String {
    digest_value(&json!({
        "workspace": workspace,
        "name": name,
        "params": params,
        "script": script_sha256,
        "entrypoint": entrypoint,
    }))
}

pub fn dataset_fingerprint(
    workspace: &str,
    name: &str,
    file_sha256: &str,
    parent: Option<&str>,
    producing_workflow: Option<&str>,
    log_message: &str,
) -> String {
    digest_value(&json!({
        "workspace": workspace,
        "name": name,
        "file": file_sha256,
        "parent": parent,
        "workflow": producing_workflow,
        "log_message": log_message,
    }))
}

pub fn workflow_fingerprint(
    workspace: &str,
    name: &str,
    stages: &[String],
    edges: &[(String, String)],
) -> String {
    // Stage order is declaration order and part of the identity; edges
    // are a set, so they are sorted into canonical form first.
    let mut edges = edges.to_vec();
    edges.sort();
    digest_value(&json!({
        "workspace": workspace,
        "name": name,
        "stages": stages,
        "edges": edges,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn identical_semantic_content_yields_identical_digest() {
        let a = stage_fingerprint(
            "ws",
            "clean",
            &params(&[("lower", json!(true)), ("max_len", json!(128))]),
            "aa",
            "clean.py",
        );
        let b = stage_fingerprint(
            "ws",
            "clean",
            &params(&[("max_len", json!(128)), ("lower", json!(true))]),
            "aa",
            "clean.py",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn any_semantic_field_change_changes_the_digest() {
        let base = stage_fingerprint("ws", "clean", &params(&[("lower", json!(true))]), "aa", "clean.py");
        let flipped =
            stage_fingerprint("ws", "clean", &params(&[("lower", json!(false))]), "aa", "clean.py");
        let renamed =
            stage_fingerprint("ws", "scrub", &params(&[("lower", json!(true))]), "aa", "clean.py");
        let rescripted =
            stage_fingerprint("ws", "clean", &params(&[("lower", json!(true))]), "bb", "clean.py");
        assert_ne!(base, flipped);
        assert_ne!(base, renamed);
        assert_ne!(base, rescripted);
    }

    #[test]
    fn dataset_digest_covers_lineage_and_log() {
        let base = dataset_fingerprint("ws", "reviews", "cc", None, None, "");
        let with_parent =
            dataset_fingerprint("ws", "reviews", "cc", Some("ws.raw@dd"), None, "");
        let with_log = dataset_fingerprint("ws", "reviews", "cc", None, None, "rebalanced");
        assert_ne!(base, with_parent);
        assert_ne!(base, with_log);
        assert_eq!(base, dataset_fingerprint("ws", "reviews", "cc", None, None, ""));
    }

    #[test]
    fn workflow_digest_is_edge_order_independent_but_stage_order_sensitive() {
        let stages = vec!["ws.a@11".to_string(), "ws.b@22".to_string()];
        let forward = vec![("a".to_string(), "b".to_string())];
        let edges_a = vec![
            ("a".to_string(), "b".to_string()),
            ("a".to_string(), "c".to_string()),
        ];
        let edges_b = vec![
            ("a".to_string(), "c".to_string()),
            ("a".to_string(), "b".to_string()),
        ];
        assert_eq!(
            workflow_fingerprint("ws", "etl", &stages, &edges_a),
            workflow_fingerprint("ws", "etl", &stages, &edges_b)
        );

        let reversed_stages = vec!["ws.b@22".to_string(), "ws.a@11".to_string()];
        assert_ne!(
            workflow_fingerprint("ws", "etl", &stages, &forward),
            workflow_fingerprint("ws", "etl", &reversed_stages, &forward)
        );
    }

    #[test]
    fn file_digest_streams_and_tracks_content() {
        let dir = std::env::temp_dir().join(format!(
            "avc_fingerprint_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("data.csv");

        std::fs::write(&path, b"id,text\n1,good\n").expect("write file");
        let first = sha256_file_hex(&path).expect("hash file");
        let again = sha256_file_hex(&path).expect("hash file again");
        assert_eq!(first, again);
        assert_eq!(first, sha256_hex(b"id,text\n1,good\n"));

        std::fs::write(&path, b"id,text\n1,bad\n").expect("rewrite file");
        let changed = sha256_file_hex(&path).expect("hash changed file");
        assert_ne!(first, changed);
    }
}
