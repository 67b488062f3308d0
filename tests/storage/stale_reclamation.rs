//! Epoch-based stale reclamation

use std::collections::BTreeSet;

use crate::common::*;

fn seed(store: &CheckpointStore, names: &[&str], epoch: u64) {
    for name in names {
        store
            .put("Table", name, &encode_epoch_value(epoch, HASH_A))
            .unwrap();
    }
}

#[test]
fn test_removes_exactly_old_epoch_keys() {
    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();

    seed(&store, &["a", "b", "c", "d"], 1);
    // A disjoint set rewritten at epoch 2
    seed(&store, &["c", "d", "e"], 2);

    let deleted: BTreeSet<String> = store
        .delete_stale_epochs(2)
        .unwrap()
        .map(|k| k.unwrap().qualified_name)
        .collect();
    assert_eq!(
        deleted,
        ["a", "b"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
    );

    let remaining: Vec<String> = store
        .keys()
        .unwrap()
        .map(|k| k.unwrap().qualified_name)
        .collect();
    assert_eq!(remaining, vec!["c", "d", "e"]);
    for name in ["c", "d", "e"] {
        assert_eq!(
            store.get_value("Table", name).unwrap().unwrap().epoch(),
            Some(2)
        );
    }

    // Running it again immediately yields nothing
    assert_eq!(store.delete_stale_epochs(2).unwrap().count(), 0);
}

#[test]
fn test_legacy_values_are_reclaimed() {
    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();

    store.put("Table", "legacy", HASH_A).unwrap();
    seed(&store, &["fresh"], 10);

    let deleted = store.purge_stale(10).unwrap();
    assert_eq!(deleted, vec![RecordKey::new("Table", "legacy")]);
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_partial_sweep_deletes_nothing() {
    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();
    seed(&store, &["a", "b", "c"], 1);

    let first = store.delete_stale_epochs(2).unwrap().next().unwrap().unwrap();
    assert_eq!(first, RecordKey::new("Table", "a"));

    assert_eq!(store.len().unwrap(), 3);
    assert_eq!(store.purge_stale(2).unwrap().len(), 3);
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_sweep_is_durable() {
    let ckpt = TestCheckpoint::new();
    {
        let store = ckpt.open();
        seed(&store, &["old"], 1);
        seed(&store, &["new"], 2);
        assert_eq!(store.purge_stale(2).unwrap().len(), 1);
        store.close();
    }
    assert_eq!(
        snapshot_of(&ckpt.path),
        vec![("Table:new".to_string(), encode_epoch_value(2, HASH_A))]
    );
}

#[test]
fn test_candidates_found_at_scan_time() {
    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();
    seed(&store, &["a"], 1);

    let sweep = store.delete_stale_epochs(2).unwrap();
    assert_eq!(sweep.total(), 1);
    drop(sweep);

    // Refreshing the key after an abandoned sweep keeps it alive.
    seed(&store, &["a"], 2);
    assert!(store.purge_stale(2).unwrap().is_empty());
}
