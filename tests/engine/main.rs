//! Integration tests for diff runs.
//!
//! End-to-end scenarios over real checkpoint directories: first-use
//! classification, epoch refresh, existence checks, crash safety of the
//! copy-then-modify protocol, and diffs across several runs.

#[path = "../common/mod.rs"]
mod common;

mod crash_safety;
mod multi_run;
mod scenarios;
