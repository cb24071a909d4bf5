//! Object storage through the factory: transfers and a shared JSON dictionary
//! edited by two writers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;

use skills_utils::hash::md5_hex;
use skills_utils::storage::file::FileObjectStoreConfig;
use skills_utils::storage::json_dict::{JsonDict, JsonDictConfig};
use skills_utils::storage::transfer::{download, list_files, upload, upload_dict};
use skills_utils::storage::{ObjectStore, ObjectStoreConfig, ObjectStoreFactory};

fn file_store(temp_dir: &TempDir) -> Arc<dyn ObjectStore> {
    let mut config = FileObjectStoreConfig::new(temp_dir.path().join("store"));
    config.auto_create_buckets = true;
    ObjectStoreFactory::create(ObjectStoreConfig::File(config)).unwrap()
}

fn manual_save() -> JsonDictConfig {
    JsonDictConfig {
        save_every_n_updates: 0,
        ..JsonDictConfig::default()
    }
}

#[test]
fn test_two_writers_merge_their_keys() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);

    let mut first = JsonDict::open(store.clone(), "caches/titles", manual_save()).unwrap();
    let mut second = JsonDict::open(store.clone(), "caches/titles", manual_save()).unwrap();

    first.insert("nurse", json!({"onet": "29-1141.00"})).unwrap();
    second.insert("welder", json!({"onet": "51-4121.06"})).unwrap();
    first.save().unwrap();
    second.save().unwrap();

    let reopened = JsonDict::open(store.clone(), "caches/titles", manual_save()).unwrap();
    let keys: Vec<&String> = reopened.keys().collect();
    assert_eq!(keys, vec!["nurse", "welder"]);

    // The stored entity tag is the MD5 of the body.
    let object = store
        .get_object_versioned("caches", "titles.json")
        .unwrap()
        .unwrap();
    assert_eq!(object.etag, md5_hex(std::str::from_utf8(&object.data).unwrap()));
}

#[test]
fn test_local_value_wins_on_save() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);

    let mut first = JsonDict::open(store.clone(), "caches/counts", manual_save()).unwrap();
    first.insert("a", 1).unwrap();
    first.save().unwrap();

    let mut second = JsonDict::open(store.clone(), "caches/counts", manual_save()).unwrap();
    second.insert("a", 2).unwrap();
    second.save().unwrap();

    first.insert("b", 3).unwrap();
    first.save().unwrap();

    let reopened = JsonDict::open(store, "caches/counts", manual_save()).unwrap();
    assert_eq!(reopened.get("a"), Some(&json!(1)));
    assert_eq!(reopened.get("b"), Some(&json!(3)));
}

#[test]
fn test_transfer_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);

    let local = temp_dir.path().join("2015Q1.csv");
    std::fs::write(&local, "title,count\nnurse,3\n").unwrap();
    let destination = upload(store.as_ref(), &local, "s3://reports/quarterly").unwrap();
    assert_eq!(destination.to_string(), "reports/quarterly/2015Q1.csv");

    let mut summaries = BTreeMap::new();
    summaries.insert("2015Q1".to_string(), json!({"rows": 1}));
    upload_dict(store.as_ref(), "reports/summaries", &summaries).unwrap();

    assert_eq!(
        list_files(store.as_ref(), "reports/quarterly/").unwrap(),
        vec!["2015Q1.csv"]
    );
    assert_eq!(
        list_files(store.as_ref(), "reports/summaries").unwrap(),
        vec!["2015Q1.json"]
    );

    let out = temp_dir.path().join("downloads/2015Q1.csv");
    let bytes = download(store.as_ref(), &out, "reports/quarterly/2015Q1.csv").unwrap();
    assert_eq!(bytes, 20);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "title,count\nnurse,3\n");

    let summary_bytes = store.get_object("reports", "summaries/2015Q1.json").unwrap();
    let summary: Value = serde_json::from_slice(&summary_bytes).unwrap();
    assert_eq!(summary, json!({"rows": 1}));
}
