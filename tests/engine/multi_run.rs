//! Diffs across successive runs

use crate::common::*;

fn run_once(ckpt: &TestCheckpoint, epoch: u64, records: Vec<TrackedRecord>) -> RunSummary {
    let mut run = DiffRun::begin(&ckpt.path, ckpt.config(epoch).with_flush_every(2)).unwrap();
    run.observe_all(records, |_, _| {}).unwrap();
    run.finish().unwrap()
}

#[test]
fn test_second_run_reports_every_kind() {
    let ckpt = TestCheckpoint::new();

    let first = run_once(
        &ckpt,
        100,
        vec![
            named("Table", "db/keep", "k"),
            named("Table", "db/change", "before"),
            named("Table", "db/drop", "d"),
            named("Column", "db/keep:c1", "c1"),
        ],
    );
    assert_eq!(first.stats.new, 4);
    assert_eq!(first.stats.observed(), 4);
    assert!(first.deleted.is_empty());

    let mut kinds = Vec::new();
    let mut run = DiffRun::begin(&ckpt.path, ckpt.config(200)).unwrap();
    run.observe_all(
        vec![
            named("Table", "db/keep", "k"),
            named("Table", "db/change", "after"),
            named("Column", "db/keep:c1", "c1"),
            named("Table", "db/added", "a"),
        ],
        |record, kind| kinds.push((record.key.to_string(), kind)),
    )
    .unwrap();
    let second = run.finish().unwrap();

    assert_eq!(
        kinds,
        vec![
            ("Table:db/keep".to_string(), ChangeKind::Unchanged),
            ("Table:db/change".to_string(), ChangeKind::Updated),
            ("Column:db/keep:c1".to_string(), ChangeKind::Unchanged),
            ("Table:db/added".to_string(), ChangeKind::New),
        ]
    );
    assert_eq!(second.stats.new, 1);
    assert_eq!(second.stats.updated, 1);
    assert_eq!(second.stats.unchanged, 2);
    assert_eq!(second.stats.deleted, 1);
    assert_eq!(second.deleted, vec![RecordKey::new("Table", "db/drop")]);
    assert!(second.has_changes());

    // Every surviving key carries the new epoch
    let store = ckpt.open();
    for entry in store.items().unwrap() {
        let (_, raw) = entry.unwrap();
        assert_eq!(StoredValue::parse(&raw).unwrap().epoch(), Some(200));
    }
    assert_eq!(store.len().unwrap(), 4);
    store.close();
}

#[test]
fn test_identical_run_has_no_changes() {
    let ckpt = TestCheckpoint::new();
    let records = || {
        (0..20)
            .map(|i| named("Table", &format!("db/t{}", i), "same"))
            .collect::<Vec<_>>()
    };

    run_once(&ckpt, 1, records());
    let second = run_once(&ckpt, 2, records());

    assert!(!second.has_changes());
    assert_eq!(second.stats.unchanged, 20);
}

#[test]
fn test_empty_run_deletes_everything() {
    let ckpt = TestCheckpoint::new();
    run_once(
        &ckpt,
        1,
        vec![named("Table", "a", "a"), named("Table", "b", "b")],
    );

    let mut streamed = Vec::new();
    let run = DiffRun::begin(&ckpt.path, ckpt.config(2)).unwrap();
    let stats = run.finish_with(|key| streamed.push(key)).unwrap();

    assert_eq!(stats.deleted, 2);
    assert_eq!(
        streamed,
        vec![RecordKey::new("Table", "a"), RecordKey::new("Table", "b")]
    );
    assert!(snapshot_of(&ckpt.path).is_empty());
}

#[test]
fn test_legacy_checkpoint_upgrades() {
    let ckpt = TestCheckpoint::new();
    let hash = compute_content_hash(&fields(&[("name", Some("t1"))]));
    {
        let store = ckpt.open();
        // Bare hashes from before epochs were stored
        store.put("Table", "db/t1", &hash).unwrap();
        store.put("Table", "db/gone", HASH_A).unwrap();
        store.close();
    }

    let mut run = DiffRun::begin(&ckpt.path, ckpt.config(5)).unwrap();
    let kind = run
        .observe("Table", "db/t1", &fields(&[("name", Some("t1"))]))
        .unwrap();
    assert_eq!(kind, ChangeKind::Unchanged);
    let summary = run.finish().unwrap();

    assert_eq!(summary.deleted, vec![RecordKey::new("Table", "db/gone")]);
    assert_eq!(
        snapshot_of(&ckpt.path),
        vec![("Table:db/t1".to_string(), encode_epoch_value(5, &hash))]
    );
}
