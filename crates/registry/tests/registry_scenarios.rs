#![forbid(unsafe_code)]

use avc_core::identifier::Split;
use avc_registry::{
    Config, DatasetDraft, Registry, RegistryError, StageDraft, WorkflowBuilder,
};
use avc_storage::{ArtifactKey, StoreError};
use serde_json::json;
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("avc_registry_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn open_registry(dir: &PathBuf) -> Registry {
    Registry::open(Config::new(Some("ws".to_string()), dir.join("store"))).expect("open registry")
}

fn write_file(dir: &PathBuf, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture file");
    path
}

#[test]
fn saving_unchanged_stage_content_is_idempotent() {
    let dir = temp_dir("saving_unchanged_stage_content_is_idempotent");
    let mut registry = open_registry(&dir);
    let script = write_file(&dir, "clean.py", "def run(row): return row.lower()\n");

    let draft = StageDraft::new("clean", &script).param("lower", json!(true));
    let (first, created) = registry.save_stage(&draft).expect("first save");
    assert!(created);

    let (second, created) = registry.save_stage(&draft).expect("second save");
    assert!(!created);
    assert_eq!(second, first);

    // Changing a parameter mints a new version; the old one stays
    // retrievable by its original digest.
    let flipped = StageDraft::new("clean", &script).param("lower", json!(false));
    let (third, created) = registry.save_stage(&flipped).expect("changed save");
    assert!(created);
    assert_ne!(third.version, first.version);

    let old = registry
        .get_stage("ws.clean", Some(first.version.as_str()))
        .expect("old version by digest");
    assert_eq!(old.params["lower"], json!(true));
}

#[test]
fn publish_assigns_sequential_tags_and_latest_tracks_the_newest() {
    let dir = temp_dir("publish_assigns_sequential_tags_and_latest_tracks_the_newest");
    let mut registry = open_registry(&dir);
    let script = write_file(&dir, "clean.py", "def run(row): return row\n");

    for round in 1..=3i64 {
        let draft = StageDraft::new("clean", &script).param("max_len", json!(round * 64));
        let outcome = registry.publish_stage(&draft).expect("publish");
        assert_eq!(outcome.tag, round);
        assert!(!outcome.already_published);
    }

    let latest = registry.get_stage("ws.clean@latest", None).expect("latest");
    assert_eq!(latest.params["max_len"], json!(192));
    assert_eq!(latest.tag, Some(3));
    let stamp = latest.created_at().expect("timestamp renders");
    assert!(stamp.starts_with("20"), "unexpected stamp {stamp}");

    let second = registry.get_stage("ws.clean@v2", None).expect("v2");
    assert_eq!(second.params["max_len"], json!(128));

    // HEAD is an alias of latest.
    let head = registry.get_stage("ws.clean@HEAD", None).expect("HEAD");
    assert_eq!(head.version, latest.version);

    // A short digest prefix resolves the same record.
    let prefix = &latest.version[..10];
    let by_prefix = registry
        .get_stage(&format!("ws.clean@{prefix}"), None)
        .expect("prefix get");
    assert_eq!(by_prefix.version, latest.version);
}

#[test]
fn republishing_a_tagged_version_is_nonfatal() {
    let dir = temp_dir("republishing_a_tagged_version_is_nonfatal");
    let mut registry = open_registry(&dir);
    let script = write_file(&dir, "clean.py", "def run(row): return row\n");

    let draft = StageDraft::new("clean", &script);
    let first = registry.publish_stage(&draft).expect("first publish");
    assert_eq!((first.tag, first.already_published), (1, false));

    let again = registry.publish_stage(&draft).expect("second publish");
    assert_eq!((again.tag, again.already_published), (1, true));
    assert_eq!(again.record.version, first.record.version);
}

#[test]
fn dataset_parent_is_recorded_and_queryable() {
    let dir = temp_dir("dataset_parent_is_recorded_and_queryable");
    let mut registry = open_registry(&dir);

    let raw_file = write_file(&dir, "raw.csv", "id,text\n1,ok\n2,bad\n");
    let (raw, _) = registry
        .save_dataset(&DatasetDraft::new("raw", &raw_file))
        .expect("save raw");

    let reviews_file = write_file(&dir, "reviews.csv", "id,text\n1,ok\n");
    let draft = DatasetDraft::new("reviews", &reviews_file)
        .parent(ArtifactKey::new("ws", "raw", raw.version.clone()))
        .log_message("drop spam rows");
    let (reviews, created) = registry.save_dataset(&draft).expect("save reviews");
    assert!(created);

    let ancestors = registry.ancestors(&reviews.to_ref()).expect("ancestors");
    assert_eq!(ancestors, vec![raw.to_ref()]);

    // Lazy hydration of the one-hop parent.
    let parent = registry
        .parent_dataset(&reviews)
        .expect("parent query")
        .expect("parent present");
    assert_eq!(parent.version, raw.version);
    assert!(registry
        .parent_dataset(&raw)
        .expect("root parent query")
        .is_none());
}

#[test]
fn workflow_round_trip_with_producing_dataset() {
    let dir = temp_dir("workflow_round_trip_with_producing_dataset");
    let mut registry = open_registry(&dir);

    let extract_script = write_file(&dir, "extract.py", "def run(): ...\n");
    let train_script = write_file(&dir, "train.py", "def run(): ...\n");
    let (extract, _) = registry
        .save_stage(&StageDraft::new("extract", &extract_script))
        .expect("save extract");
    let (train, _) = registry
        .save_stage(&StageDraft::new("train", &train_script))
        .expect("save train");

    let mut builder = WorkflowBuilder::new("etl");
    builder.stage(&extract).expect("register extract");
    builder.stage(&train).expect("register train");
    builder.dependency("extract", "train").expect("edge");
    let outcome = registry
        .publish_workflow(&builder.build())
        .expect("publish workflow");
    assert_eq!(outcome.tag, 1);

    let order = registry.topo_order("ws.etl@latest", None).expect("topo order");
    assert_eq!(order, vec!["extract", "train"]);
    let members = registry.list_stages("ws.etl@v1", None).expect("list stages");
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name, "extract");

    let features_file = write_file(&dir, "features.csv", "id,vec\n1,0.5\n");
    let draft = DatasetDraft::new("features", &features_file)
        .producing_workflow(ArtifactKey::new(
            "ws",
            "etl",
            outcome.record.version.clone(),
        ));
    let (features, _) = registry.save_dataset(&draft).expect("save features");

    let producer = registry
        .producing_workflow(&features)
        .expect("producer query")
        .expect("producer present");
    assert_eq!(producer.version, outcome.record.version);

    let ancestors = registry.ancestors(&features.to_ref()).expect("ancestors");
    assert_eq!(ancestors.first(), Some(&outcome.record.to_ref()));
    // The workflow's member stages follow transitively.
    assert_eq!(ancestors.len(), 3);
}

#[test]
fn split_selector_filters_gets_and_shapes_the_tree_view() {
    let dir = temp_dir("split_selector_filters_gets_and_shapes_the_tree_view");
    let mut registry = open_registry(&dir);

    let train_file = write_file(&dir, "train.csv", "id,text\n1,alpha\n");
    let test_file = write_file(&dir, "test.csv", "id,text\n2,beta\n");
    let (train, _) = registry
        .save_dataset(&DatasetDraft::new("reviews", &train_file).split(Split::Train))
        .expect("save train split");
    let (test, _) = registry
        .save_dataset(&DatasetDraft::new("reviews", &test_file).split(Split::Test))
        .expect("save test split");
    assert_ne!(train.version, test.version);

    let tree = registry
        .find_datasets_tree("reviews*", true)
        .expect("tree view");
    let splits = tree.get("reviews").expect("name level");
    assert_eq!(splits.keys().collect::<Vec<_>>(), vec!["test", "train"]);
    assert_eq!(splits["train"].len(), 1);

    let fetched = registry
        .get_dataset(&format!("ws.reviews@{}[train]", train.version), None)
        .expect("get train split");
    assert_eq!(fetched.version, train.version);

    let err = registry
        .get_dataset(&format!("ws.reviews@{}[val]", train.version), None)
        .expect_err("wrong split");
    assert!(matches!(
        err,
        RegistryError::Store(StoreError::NotFound { .. })
    ));
}

#[test]
fn content_backend_round_trips_dataset_bytes() {
    let dir = temp_dir("content_backend_round_trips_dataset_bytes");
    let mut registry = open_registry(&dir);

    let file = write_file(&dir, "raw.csv", "id,text\n7,seven\n");
    let (dataset, _) = registry
        .save_dataset(&DatasetDraft::new("raw", &file))
        .expect("save");
    assert_eq!(dataset.size, Some(16));

    let path = registry.materialize_dataset(&dataset).expect("materialize");
    let bytes = std::fs::read(path).expect("read materialized file");
    assert_eq!(bytes, b"id,text\n7,seven\n");
}

#[test]
fn workspace_defaults_and_missing_workspace() {
    let dir = temp_dir("workspace_defaults_and_missing_workspace");
    let mut registry = open_registry(&dir);
    let script = write_file(&dir, "clean.py", "def run(row): return row\n");

    // Draft and identifier both omit the workspace; the configured
    // default fills in.
    let (stage, _) = registry
        .save_stage(&StageDraft::new("clean", &script))
        .expect("save without workspace");
    assert_eq!(stage.workspace, "ws");
    let fetched = registry
        .get_stage("clean", Some(stage.version.as_str()))
        .expect("get without workspace");
    assert_eq!(fetched.version, stage.version);

    // No default configured and none in the identifier: refused.
    let mut bare =
        Registry::open(Config::new(None, dir.join("bare"))).expect("open bare registry");
    let err = bare
        .get_stage("clean@latest", None)
        .expect_err("workspace required");
    assert!(matches!(err, RegistryError::MissingWorkspace));
}

#[test]
fn unknown_references_are_structured_errors() {
    let dir = temp_dir("unknown_references_are_structured_errors");
    let mut registry = open_registry(&dir);

    let err = registry
        .get_stage("ws.ghost@latest", None)
        .expect_err("nothing published");
    assert!(matches!(
        err,
        RegistryError::Store(StoreError::NotFound { .. })
    ));

    let err = registry
        .get_stage("ws.ghost@v7", None)
        .expect_err("unknown tag");
    assert!(matches!(
        err,
        RegistryError::Store(StoreError::NotFound { .. })
    ));

    let err = registry.get_stage("ws.gh ost", None).expect_err("bad name");
    assert!(matches!(err, RegistryError::Parse(_)));
}
