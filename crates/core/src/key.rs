//! Composite record keys
//!
//! A tracked record is identified by the pair `(type_name, qualified_name)`.
//! The pair is stored as a single byte key:
//!
//! ```text
//! "{type_name}:{qualified_name}"   (UTF-8)
//! ```
//!
//! ## Contract
//!
//! - Decoding splits on the *first* `:`, so `qualified_name` may contain
//!   colons but `type_name` must not
//! - Keys sort bytewise, which groups all records of one type together and
//!   fixes the iteration order of full scans
//! - `make_key` / `parse_key` perform no validation; callers that accept
//!   external input should run [`RecordKey::validate`] first

use std::fmt;
use thiserror::Error;

/// Separator between the type name and the qualified name.
pub const KEY_SEPARATOR: char = ':';

/// Encode a `(type_name, qualified_name)` pair into its composite byte key.
///
/// # Examples
///
/// ```
/// use checkpoint_core::key::make_key;
///
/// assert_eq!(make_key("Table", "db/t1"), b"Table:db/t1".to_vec());
/// ```
pub fn make_key(type_name: &str, qualified_name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(type_name.len() + 1 + qualified_name.len());
    key.extend_from_slice(type_name.as_bytes());
    key.push(KEY_SEPARATOR as u8);
    key.extend_from_slice(qualified_name.as_bytes());
    key
}

/// Decode a composite byte key back into its `(type_name, qualified_name)` pair.
///
/// # Examples
///
/// ```
/// use checkpoint_core::key::parse_key;
///
/// let key = parse_key(b"Column:db/t1:c1").unwrap();
/// assert_eq!(key.type_name, "Column");
/// assert_eq!(key.qualified_name, "db/t1:c1");
///
/// assert!(parse_key(b"no-separator").is_err());
/// ```
pub fn parse_key(key: &[u8]) -> Result<RecordKey, KeyError> {
    let text = std::str::from_utf8(key).map_err(|_| KeyError::InvalidUtf8)?;
    let (type_name, qualified_name) = text
        .split_once(KEY_SEPARATOR)
        .ok_or_else(|| KeyError::MissingSeparator(text.to_string()))?;
    Ok(RecordKey::new(type_name, qualified_name))
}

/// Identity of one tracked record.
///
/// Ordering matches the byte order of the encoded key, so a sorted
/// `Vec<RecordKey>` lists records in the same order a full scan would.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Record type (must not contain `:`)
    pub type_name: String,
    /// Fully qualified record identifier (may contain `:`)
    pub qualified_name: String,
}

impl RecordKey {
    /// Create a record key. No validation is performed.
    pub fn new(type_name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        RecordKey {
            type_name: type_name.into(),
            qualified_name: qualified_name.into(),
        }
    }

    /// Encode into the composite byte key.
    pub fn encode(&self) -> Vec<u8> {
        make_key(&self.type_name, &self.qualified_name)
    }

    /// Decode from a composite byte key.
    pub fn decode(key: &[u8]) -> Result<Self, KeyError> {
        parse_key(key)
    }

    /// Check that the key survives an encode/decode round trip.
    ///
    /// Rules:
    /// - `type_name` is not empty and contains no `:`
    /// - `qualified_name` is not empty
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.type_name.is_empty() {
            return Err(KeyError::EmptyTypeName);
        }
        if self.type_name.contains(KEY_SEPARATOR) {
            return Err(KeyError::SeparatorInTypeName(self.type_name.clone()));
        }
        if self.qualified_name.is_empty() {
            return Err(KeyError::EmptyQualifiedName);
        }
        Ok(())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.type_name, KEY_SEPARATOR, self.qualified_name)
    }
}

impl PartialOrd for RecordKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Compare as the encoded key would: "a:x" vs "ab:x" must compare ':' against 'b'.
        let lhs = self
            .type_name
            .bytes()
            .chain(std::iter::once(KEY_SEPARATOR as u8))
            .chain(self.qualified_name.bytes());
        let rhs = other
            .type_name
            .bytes()
            .chain(std::iter::once(KEY_SEPARATOR as u8))
            .chain(other.qualified_name.bytes());
        // Ties only happen when a type name contains ':'; keep Ord consistent with Eq.
        lhs.cmp(rhs)
            .then_with(|| self.type_name.cmp(&other.type_name))
    }
}

/// Key encoding and validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Stored key bytes are not valid UTF-8
    #[error("Key is not valid UTF-8")]
    InvalidUtf8,

    /// Stored key has no `:` separator
    #[error("Malformed key '{0}': missing ':' separator")]
    MissingSeparator(String),

    /// Type name is empty
    #[error("Type name cannot be empty")]
    EmptyTypeName,

    /// Qualified name is empty
    #[error("Qualified name cannot be empty")]
    EmptyQualifiedName,

    /// Type name contains the key separator
    #[error("Type name '{0}' cannot contain ':'")]
    SeparatorInTypeName(String),
}

impl KeyError {
    /// Whether this error was raised while decoding stored data.
    ///
    /// Decode failures mean the checkpoint itself is damaged; validation
    /// failures mean the caller passed a bad record.
    pub fn is_corruption(&self) -> bool {
        matches!(self, KeyError::InvalidUtf8 | KeyError::MissingSeparator(_))
    }

    /// Short machine-readable reason
    pub fn reason_code(&self) -> &'static str {
        match self {
            KeyError::InvalidUtf8 => "invalid_utf8",
            KeyError::MissingSeparator(_) => "missing_separator",
            KeyError::EmptyTypeName => "empty_type_name",
            KeyError::EmptyQualifiedName => "empty_qualified_name",
            KeyError::SeparatorInTypeName(_) => "separator_in_type_name",
        }
    }
}
