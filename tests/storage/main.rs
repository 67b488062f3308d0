//! Integration tests for the checkpoint store.
//!
//! These exercise the store through the public facade: single-key
//! semantics, the batch path, snapshot scans, stale reclamation and the
//! directory lifecycle around a closed store.

#[path = "../common/mod.rs"]
mod common;

mod batch_equivalence;
mod lifecycle;
mod stale_reclamation;
