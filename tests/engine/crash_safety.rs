//! Copy-then-modify protocol under failure

use crate::common::*;

fn seeded(epoch: u64) -> TestCheckpoint {
    let ckpt = TestCheckpoint::new();
    let mut run = DiffRun::begin(&ckpt.path, ckpt.config(epoch)).unwrap();
    run.observe_all(
        vec![named("Table", "a", "a"), named("Table", "b", "b")],
        |_, _| {},
    )
    .unwrap();
    run.finish().unwrap();
    ckpt
}

#[test]
fn test_abort_keeps_live_checkpoint() {
    let ckpt = seeded(1);
    let before = snapshot_of(&ckpt.path);

    let mut run = DiffRun::begin(&ckpt.path, ckpt.config(2)).unwrap();
    run.observe("Table", "a", &fields(&[("name", Some("changed"))]))
        .unwrap();
    run.observe("Table", "c", &fields(&[])).unwrap();
    let working = run.store_dir().to_path_buf();
    run.abort().unwrap();

    assert!(!working.exists());
    assert_eq!(snapshot_of(&ckpt.path), before);
}

#[test]
fn test_dropped_run_keeps_live_checkpoint() {
    let ckpt = seeded(1);
    let before = snapshot_of(&ckpt.path);

    {
        let mut run = DiffRun::begin(&ckpt.path, ckpt.config(2)).unwrap();
        run.observe("Table", "a", &fields(&[])).unwrap();
        // Simulated failure: the run goes out of scope unfinished.
    }

    assert!(!CheckpointPaths::new(&ckpt.path).working().exists());
    assert_eq!(snapshot_of(&ckpt.path), before);
}

#[test]
fn test_failed_batch_keeps_live_checkpoint() {
    let ckpt = seeded(1);
    let before = snapshot_of(&ckpt.path);

    let mut run = DiffRun::begin(&ckpt.path, ckpt.config(2).with_flush_every(1)).unwrap();
    let result = run.observe_all(
        vec![
            named("Table", "a", "new-a"),
            TrackedRecord::new("Bad:Type", "x", fields(&[])),
        ],
        |_, _| {},
    );
    assert!(matches!(result, Err(checkpointdb::DiffError::InvalidRecord(_))));

    // The first record was flushed into the working copy only.
    assert_eq!(
        run.previous("Table", "a").unwrap().unwrap().epoch(),
        Some(2)
    );
    run.abort().unwrap();
    assert_eq!(snapshot_of(&ckpt.path), before);
}

#[test]
fn test_leftover_working_copy_is_replaced() {
    let ckpt = seeded(1);
    let working = CheckpointPaths::new(&ckpt.path).working().to_path_buf();

    // Debris from a crashed run that never cleaned up
    {
        let store = open_store(&working);
        store.put("Table", "debris", HASH_A).unwrap();
        store.close();
    }

    let run = DiffRun::begin(&ckpt.path, ckpt.config(1)).unwrap();
    assert_eq!(run.previous("Table", "debris").unwrap(), None);
    assert!(run.previous("Table", "a").unwrap().is_some());
    run.abort().unwrap();
}

#[test]
fn test_finished_run_replaces_checkpoint() {
    let ckpt = seeded(1);

    let mut run = DiffRun::begin(&ckpt.path, ckpt.config(2)).unwrap();
    run.observe("Table", "a", &fields(&[("name", Some("a"))]))
        .unwrap();
    let summary = run.finish().unwrap();

    assert_eq!(summary.deleted, vec![RecordKey::new("Table", "b")]);
    assert!(!CheckpointPaths::new(&ckpt.path).working().exists());
    assert_eq!(snapshot_of(&ckpt.path).len(), 1);
}
