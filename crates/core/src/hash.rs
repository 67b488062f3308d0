//! Content hashing for change detection
//!
//! A record's content hash is a 128-bit xxHash3 fingerprint of its fields,
//! rendered as 32 lowercase hex characters. The hash is computed over a
//! canonical form so that field order never matters:
//!
//! ```text
//! sort fields by name → "name=value" (None → "") → join with "|" → xxh3_128 → hex
//! ```
//!
//! This is a fingerprint, not a cryptographic digest. 128 bits keeps the
//! collision probability negligible at 10^8 records.

use xxhash_rust::xxh3::xxh3_128;

/// Length of a hex-encoded content hash.
pub const CONTENT_HASH_LEN: usize = 32;

/// Compute the content hash of a record's fields.
///
/// Accepts anything that iterates `(&String, &Option<String>)`, so both
/// `HashMap` and `BTreeMap` field maps work. Fields are sorted by name
/// before hashing; `None` and `Some("")` hash identically.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use checkpoint_core::hash::compute_content_hash;
///
/// let mut fields = HashMap::new();
/// fields.insert("name".to_string(), Some("t1".to_string()));
/// fields.insert("owner".to_string(), None);
///
/// let hash = compute_content_hash(&fields);
/// assert_eq!(hash.len(), 32);
/// ```
pub fn compute_content_hash<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a Option<String>)>,
{
    let mut pairs: Vec<(&str, &str)> = fields
        .into_iter()
        .map(|(name, value)| (name.as_str(), value.as_deref().unwrap_or("")))
        .collect();
    pairs.sort_unstable();

    let mut canonical = String::new();
    for (i, (name, value)) in pairs.iter().enumerate() {
        if i > 0 {
            canonical.push('|');
        }
        canonical.push_str(name);
        canonical.push('=');
        canonical.push_str(value);
    }

    hash_hex(canonical.as_bytes())
}

/// Hash raw bytes with xxh3-128 and hex-encode the result.
#[inline]
pub fn hash_hex(data: &[u8]) -> String {
    format!("{:032x}", xxh3_128(data))
}

/// Check that a string has the shape of a content hash (32 lowercase hex chars).
pub fn is_content_hash(s: &str) -> bool {
    s.len() == CONTENT_HASH_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
