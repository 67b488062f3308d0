//! Batch path against the single-key path

use crate::common::*;
use checkpointdb::StoreError;

fn inputs(n: usize) -> Vec<(String, String, String)> {
    (0..n)
        .map(|i| {
            let type_name = if i % 3 == 0 { "Column" } else { "Table" };
            // Reverse order so flushes really have to sort.
            let qualified_name = format!("db/t{:04}", n - i);
            (type_name.to_string(), qualified_name, encode_epoch_value(7, HASH_A))
        })
        .collect()
}

#[test]
fn test_batch_and_single_puts_match() {
    let single = TestCheckpoint::new();
    let batched = TestCheckpoint::new();
    let records = inputs(2_500);

    let store = single.open();
    for (t, q, v) in &records {
        store.put(t, q, v).unwrap();
    }
    let expected = items_of(&store);
    store.close();

    let store = batched.open();
    let flushed = store
        .batch_transaction(BatchMode::Write, |batch| {
            let mut flushed = 0;
            for (t, q, v) in &records {
                batch.put(t, q, v)?;
                if batch.pending_len() >= 1_000 {
                    flushed += batch.flush_puts()?;
                }
            }
            flushed += batch.flush_puts()?;
            Ok::<_, StoreError>(flushed)
        })
        .unwrap();
    assert_eq!(flushed, records.len());
    assert_eq!(items_of(&store), expected);
    store.close();
}

#[test]
fn test_unflushed_tail_is_committed_on_ok() {
    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();

    store
        .batch_transaction(BatchMode::Write, |batch| {
            for (t, q, v) in inputs(42) {
                batch.put(&t, &q, &v)?;
            }
            assert_eq!(batch.pending_len(), 42);
            Ok::<_, StoreError>(())
        })
        .unwrap();

    assert_eq!(store.len().unwrap(), 42);
}

#[test]
fn test_error_discards_only_unflushed_puts() {
    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();

    let result = store.batch_transaction(BatchMode::Write, |batch| {
        batch.put("Table", "kept", HASH_A)?;
        batch.flush_puts()?;
        batch.put("Table", "lost", HASH_A)?;
        batch.delete("Table", "kept")?;
        Err::<(), _>(StoreError::TransactionClosed)
    });
    assert!(result.is_err());

    // The delete after the flush was aborted along with the pending put.
    assert_eq!(store.get("Table", "kept").unwrap().as_deref(), Some(HASH_A));
    assert_eq!(store.get("Table", "lost").unwrap(), None);
}

#[test]
fn test_batch_get_reads_committed_state() {
    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();
    store.put("Table", "db/t1", HASH_A).unwrap();

    store
        .batch_transaction(BatchMode::Read, |batch| {
            assert_eq!(batch.get("Table", "db/t1")?.as_deref(), Some(HASH_A));
            assert_eq!(batch.get_value("Table", "db/t1")?.map(|v| v.is_legacy()), Some(true));
            assert_eq!(batch.get("Table", "db/t2")?, None);
            Ok::<_, StoreError>(())
        })
        .unwrap();
}

#[test]
fn test_batch_error_type_can_be_callers() {
    #[derive(Debug)]
    enum PipelineError {
        Store(StoreError),
        Rejected,
    }
    impl From<StoreError> for PipelineError {
        fn from(e: StoreError) -> Self {
            PipelineError::Store(e)
        }
    }

    let ckpt = TestCheckpoint::new();
    let store = ckpt.open();
    let err = store
        .batch_transaction(BatchMode::Write, |batch| {
            batch.put("Table", "t", HASH_A)?;
            Err::<(), _>(PipelineError::Rejected)
        })
        .unwrap_err();
    assert!(matches!(err, PipelineError::Rejected));
    assert!(store.is_empty().unwrap());

    let err = store
        .batch_transaction(BatchMode::Read, |batch| {
            batch.put("Table", "t", HASH_A)?;
            Ok::<_, PipelineError>(())
        })
        .unwrap_err();
    assert!(matches!(err, PipelineError::Store(StoreError::ReadOnlyTransaction)));
}
