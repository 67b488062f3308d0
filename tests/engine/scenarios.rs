//! Single-step scenarios

use crate::common::*;
use checkpointdb::{checkpoint_exists, classify, copy_checkpoint, is_content_hash};

#[test]
fn test_empty_store_classifies_new() {
    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();

    assert_eq!(store.get("Table", "db/t1").unwrap(), None);
    let hash = compute_content_hash(&fields(&[("name", Some("t1"))]));
    assert!(is_content_hash(&hash));

    let previous = store.get_value("Table", "db/t1").unwrap();
    assert_eq!(classify(previous.as_ref(), &hash), ChangeKind::New);
}

#[test]
fn test_matching_hash_is_unchanged_and_epoch_refreshes() {
    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();
    let hash = compute_content_hash(&fields(&[("name", Some("t1"))]));

    store.put("Table", "db/t1", &encode_epoch_value(100, &hash)).unwrap();

    let previous = store.get_value("Table", "db/t1").unwrap();
    assert_eq!(classify(previous.as_ref(), &hash), ChangeKind::Unchanged);

    store.put("Table", "db/t1", &encode_epoch_value(101, &hash)).unwrap();
    let refreshed = store.get_value("Table", "db/t1").unwrap().unwrap();
    assert_eq!(refreshed.epoch(), Some(101));
    assert_eq!(refreshed.hash(), hash);
}

#[test]
fn test_checkpoint_exists_after_one_put() {
    let ckpt = TestCheckpoint::new();
    assert!(!checkpoint_exists(&ckpt.path));

    let store = ckpt.open();
    store.put("Table", "db/t1", HASH_A).unwrap();
    store.close();
    assert!(checkpoint_exists(&ckpt.path));
}

#[test]
fn test_unswapped_copy_leaves_original() {
    let ckpt = TestCheckpoint::new();
    {
        let store = ckpt.open();
        store.put("Table", "db/t1", &encode_epoch_value(1, HASH_A)).unwrap();
        store.put("Table", "db/t2", &encode_epoch_value(1, HASH_A)).unwrap();
        store.close();
    }
    let before = snapshot_of(&ckpt.path);

    let copy = ckpt.sibling("copy");
    copy_checkpoint(&ckpt.path, &copy).unwrap();
    {
        let store = open_store(&copy);
        store.put("Table", "db/t1", &encode_epoch_value(2, HASH_B)).unwrap();
        store.delete("Table", "db/t2").unwrap();
        store.put("Table", "db/t3", &encode_epoch_value(2, HASH_B)).unwrap();
        store.close();
    }

    assert_eq!(snapshot_of(&ckpt.path), before);
    assert_ne!(snapshot_of(&copy), before);
}

#[test]
fn test_field_order_does_not_matter() {
    let ckpt = TestCheckpoint::new();
    let mut run = DiffRun::begin(&ckpt.path, ckpt.config(1)).unwrap();
    run.observe(
        "Table",
        "db/t1",
        &fields(&[("a", Some("1")), ("b", None), ("c", Some("3"))]),
    )
    .unwrap();
    run.finish().unwrap();

    let mut run = DiffRun::begin(&ckpt.path, ckpt.config(2)).unwrap();
    let kind = run
        .observe(
            "Table",
            "db/t1",
            &fields(&[("c", Some("3")), ("b", Some("")), ("a", Some("1"))]),
        )
        .unwrap();
    assert_eq!(kind, ChangeKind::Unchanged);
    run.finish().unwrap();
}
