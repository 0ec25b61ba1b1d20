#![forbid(unsafe_code)]

use avc_core::lineage::{ArtifactKind, ArtifactRef};
use avc_storage::{
    ArtifactKey, SaveDatasetRequest, SaveStageRequest, SaveWorkflowRequest, SqliteStore, StoreError,
};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("avc_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn version(seed: u8) -> String {
    format!("{seed:02x}").repeat(32)
}

fn dataset_request(name: &str, version_str: &str) -> SaveDatasetRequest {
    SaveDatasetRequest {
        workspace: "ws".to_string(),
        name: name.to_string(),
        version: version_str.to_string(),
        split: None,
        parent: None,
        producing_workflow: None,
        file_ref: "aa11".to_string(),
        size: Some(100),
        log_message: String::new(),
    }
}

fn dataset_ref(name: &str, version_str: &str) -> ArtifactRef {
    ArtifactRef::new(ArtifactKind::Dataset, "ws", name, version_str)
}

#[test]
fn parent_edge_feeds_ancestor_queries() {
    let dir = temp_dir("parent_edge_feeds_ancestor_queries");
    let mut store = SqliteStore::open(&dir).expect("open store");

    let raw_version = version(0x01);
    store
        .save_dataset(dataset_request("raw", &raw_version))
        .expect("save raw");

    let reviews_version = version(0x02);
    let mut request = dataset_request("reviews", &reviews_version);
    request.parent = Some(ArtifactKey::new("ws", "raw", raw_version.clone()));
    store.save_dataset(request).expect("save reviews");

    let ancestors = store
        .ancestors(&dataset_ref("reviews", &reviews_version))
        .expect("ancestors");
    assert_eq!(ancestors, vec![dataset_ref("raw", &raw_version)]);

    assert!(store
        .is_ancestor(
            &dataset_ref("raw", &raw_version),
            &dataset_ref("reviews", &reviews_version)
        )
        .expect("is_ancestor"));
}

#[test]
fn missing_producer_rejects_the_whole_save() {
    let dir = temp_dir("missing_producer_rejects_the_whole_save");
    let mut store = SqliteStore::open(&dir).expect("open store");

    let orphan_version = version(0x03);
    let mut request = dataset_request("orphan", &orphan_version);
    request.parent = Some(ArtifactKey::new("ws", "ghost", version(0x04)));

    let err = store.save_dataset(request).expect_err("ghost parent rejected");
    assert!(matches!(err, StoreError::MissingProducer { .. }));

    // The dataset row rolled back with the failed edge.
    assert!(!store
        .dataset_exists("ws", "orphan", &orphan_version)
        .expect("exists query"));
}

#[test]
fn cyclic_edge_is_rejected_and_store_unchanged() {
    let dir = temp_dir("cyclic_edge_is_rejected_and_store_unchanged");
    let mut store = SqliteStore::open(&dir).expect("open store");

    let a_version = version(0x05);
    let b_version = version(0x06);
    store
        .save_dataset(dataset_request("a", &a_version))
        .expect("save a");

    let mut request = dataset_request("b", &b_version);
    request.parent = Some(ArtifactKey::new("ws", "a", a_version.clone()));
    store.save_dataset(request).expect("save b with parent a");

    // A second version of `a` whose parent is `b` is fine (no cycle at
    // the version level), but re-parenting the exact version `a` onto
    // `b` must close the loop and be refused.
    let mut request = dataset_request("a", &a_version);
    request.parent = Some(ArtifactKey::new("ws", "b", b_version.clone()));
    // `a@a_version` already exists, so this save is an idempotent no-op
    // and must not rewrite lineage.
    let (row, created) = store.save_dataset(request).expect("idempotent re-save");
    assert!(!created);
    assert_eq!(row.parent, None);

    // Constructing the reverse edge through a fresh version of `a` whose
    // own ancestry already contains it is the real cycle case: b's parent
    // chain reaches a@a_version, and a@a_version gaining parent b@...
    // would loop. Simulate by saving a dataset that lists itself.
    let mut request = dataset_request("self", &version(0x07));
    request.parent = Some(ArtifactKey::new("ws", "self", version(0x07)));
    let err = store.save_dataset(request).expect_err("self-parent refused");
    assert!(matches!(err, StoreError::CycleDetected { .. }));
    assert!(!store
        .dataset_exists("ws", "self", &version(0x07))
        .expect("exists query"));

    let ancestors = store
        .ancestors(&dataset_ref("b", &b_version))
        .expect("ancestors");
    assert_eq!(ancestors, vec![dataset_ref("a", &a_version)]);
}

#[test]
fn workflow_save_records_membership_edges_and_lineage() {
    let dir = temp_dir("workflow_save_records_membership_edges_and_lineage");
    let mut store = SqliteStore::open(&dir).expect("open store");

    let extract_version = version(0x08);
    let train_version = version(0x09);
    for (name, v) in [("extract", &extract_version), ("train", &train_version)] {
        store
            .save_stage(SaveStageRequest {
                workspace: "ws".to_string(),
                name: name.to_string(),
                version: v.clone(),
                params_json: "{}".to_string(),
                script_ref: "bb22".to_string(),
                entrypoint: format!("{name}.py"),
            })
            .expect("save stage");
    }

    let workflow_version = version(0x0a);
    store
        .save_workflow(SaveWorkflowRequest {
            workspace: "ws".to_string(),
            name: "etl".to_string(),
            version: workflow_version.clone(),
            stages: vec![
                ArtifactKey::new("ws", "extract", extract_version.clone()),
                ArtifactKey::new("ws", "train", train_version.clone()),
            ],
            edges: vec![("extract".to_string(), "train".to_string())],
        })
        .expect("save workflow");

    let stages = store
        .workflow_stages("ws", "etl", &workflow_version)
        .expect("workflow stages");
    assert_eq!(
        stages.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        vec!["extract", "train"]
    );

    let edges = store
        .workflow_edges("ws", "etl", &workflow_version)
        .expect("workflow edges");
    assert_eq!(edges, vec![("extract".to_string(), "train".to_string())]);

    let workflow_ref = ArtifactRef::new(ArtifactKind::Workflow, "ws", "etl", &*workflow_version);
    let ancestors = store.ancestors(&workflow_ref).expect("workflow ancestors");
    assert_eq!(ancestors.len(), 2);
    assert!(ancestors
        .iter()
        .all(|ancestor| ancestor.kind == ArtifactKind::Stage));

    // A produced dataset now sees the workflow and, transitively, its
    // stages.
    let produced_version = version(0x0b);
    let mut request = dataset_request("features", &produced_version);
    request.producing_workflow = Some(ArtifactKey::new("ws", "etl", workflow_version.clone()));
    store.save_dataset(request).expect("save produced dataset");

    let ancestors = store
        .ancestors(&dataset_ref("features", &produced_version))
        .expect("dataset ancestors");
    assert_eq!(ancestors.first(), Some(&workflow_ref));
    assert_eq!(ancestors.len(), 3);
}

#[test]
fn workflow_save_requires_saved_member_stages() {
    let dir = temp_dir("workflow_save_requires_saved_member_stages");
    let mut store = SqliteStore::open(&dir).expect("open store");

    let workflow_version = version(0x0c);
    let err = store
        .save_workflow(SaveWorkflowRequest {
            workspace: "ws".to_string(),
            name: "etl".to_string(),
            version: workflow_version.clone(),
            stages: vec![ArtifactKey::new("ws", "ghost", version(0x0d))],
            edges: Vec::new(),
        })
        .expect_err("unsaved member stage rejected");
    assert!(matches!(err, StoreError::MissingProducer { .. }));
    assert!(!store
        .workflow_exists("ws", "etl", &workflow_version)
        .expect("exists query"));
}
