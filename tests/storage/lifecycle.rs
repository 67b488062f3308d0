//! Checkpoint directory lifecycle

use std::fs;

use crate::common::*;
use checkpointdb::{
    checkpoint_exists, checkpoint_size, cleanup_incomplete_checkpoint, copy_checkpoint,
    swap_checkpoints,
};

#[test]
fn test_exists_after_first_put() {
    let ckpt = TestCheckpoint::new();
    assert!(!checkpoint_exists(&ckpt.path));

    let store = ckpt.open();
    store.put("Table", "db/t1", HASH_A).unwrap();
    store.close();
    assert!(checkpoint_exists(&ckpt.path));
    assert!(checkpoint_size(&ckpt.path).unwrap() > 0);
}

#[test]
fn test_copy_then_discard_leaves_source() {
    let ckpt = TestCheckpoint::new();
    {
        let store = ckpt.open();
        store.put("Table", "db/t1", &encode_epoch_value(1, HASH_A)).unwrap();
        store.close();
    }
    let before = snapshot_of(&ckpt.path);

    let working = ckpt.sibling("working");
    copy_checkpoint(&ckpt.path, &working).unwrap();
    {
        let store = open_store(&working);
        store.put("Table", "db/t2", HASH_B).unwrap();
        store.delete("Table", "db/t1").unwrap();
        store.close();
    }
    cleanup_incomplete_checkpoint(&working).unwrap();

    assert!(!working.exists());
    assert_eq!(snapshot_of(&ckpt.path), before);
}

#[test]
fn test_swap_is_last_writer_wins() {
    let ckpt = TestCheckpoint::new();
    let first = ckpt.sibling("first");
    let second = ckpt.sibling("second");

    for (dir, value) in [(&first, HASH_A), (&second, HASH_B)] {
        let store = open_store(dir);
        store.put("Table", "db/t1", value).unwrap();
        store.close();
    }

    swap_checkpoints(&first, &ckpt.path).unwrap();
    swap_checkpoints(&second, &ckpt.path).unwrap();

    assert_eq!(
        snapshot_of(&ckpt.path),
        vec![("Table:db/t1".to_string(), HASH_B.to_string())]
    );
    assert!(!first.exists() && !second.exists());
}

#[test]
fn test_working_path_is_a_sibling() {
    let ckpt = TestCheckpoint::new();
    let paths = CheckpointPaths::new(&ckpt.path);
    assert_eq!(paths.working().parent(), ckpt.path.parent());
    assert_ne!(paths.working(), ckpt.path.as_path());

    fs::create_dir_all(paths.working()).unwrap();
    cleanup_incomplete_checkpoint(paths.working()).unwrap();
    assert!(!paths.working().exists());
}
