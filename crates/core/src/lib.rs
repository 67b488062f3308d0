//! Core codecs for the checkpoint store
//!
//! This crate defines the pure, storage-independent pieces:
//! - Key codec: `(type_name, qualified_name)` ↔ composite byte key
//! - Content hasher: order-independent xxh3-128 fingerprint of a record's fields
//! - Value codec: `"{epoch}:{hash}"` with backward-compatible legacy hashes
//! - Error: decode/validation error hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod key;
pub mod value;

pub use error::{Error, Result};
pub use hash::{compute_content_hash, is_content_hash, CONTENT_HASH_LEN};
pub use key::{make_key, parse_key, KeyError, RecordKey, KEY_SEPARATOR};
pub use value::{encode_epoch_value, parse_epoch_value, StoredValue, ValueError};

/// Field map of one record: field name → optional value.
///
/// Any map works with [`compute_content_hash`]; this alias is the one the
/// rest of the workspace passes around.
pub type RecordFields = std::collections::HashMap<String, Option<String>>;
