//! Epoch-tagged stored values
//!
//! Every key in a checkpoint maps to a small UTF-8 string recording the
//! record's content hash and the epoch of the run that last saw it:
//!
//! ```text
//! current: "{epoch}:{hash}"     e.g. "1717171717:9f2c...e1"
//! legacy:  "{hash}"             (written before epochs existed)
//! ```
//!
//! Reads accept both forms; writes only ever produce the current form.
//! A legacy value has no epoch and is therefore always stale once a run
//! with epochs has completed.

use std::fmt;
use thiserror::Error;

/// Separator between epoch and hash in the current value form.
pub const VALUE_SEPARATOR: char = ':';

/// Encode an epoch-tagged value.
///
/// # Examples
///
/// ```
/// use checkpoint_core::value::encode_epoch_value;
///
/// assert_eq!(encode_epoch_value(100, "abc"), "100:abc");
/// ```
pub fn encode_epoch_value(epoch: u64, hash: &str) -> String {
    format!("{}{}{}", epoch, VALUE_SEPARATOR, hash)
}

/// Decode a stored value into `(epoch, hash)`.
///
/// Legacy bare-hash values decode to `(None, hash)`. A value whose
/// left-of-colon segment is not an integer is corrupt.
///
/// # Examples
///
/// ```
/// use checkpoint_core::value::parse_epoch_value;
///
/// assert_eq!(parse_epoch_value("7:abc").unwrap(), (Some(7), "abc".to_string()));
/// assert_eq!(parse_epoch_value("abc").unwrap(), (None, "abc".to_string()));
/// assert!(parse_epoch_value("x:abc").is_err());
/// ```
pub fn parse_epoch_value(value: &str) -> Result<(Option<u64>, String), ValueError> {
    let parsed = StoredValue::parse(value)?;
    Ok((parsed.epoch(), parsed.into_hash()))
}

/// A decoded stored value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoredValue {
    /// Bare hash written before epochs were introduced
    Legacy {
        /// Content hash
        hash: String,
    },
    /// Hash tagged with the epoch of the run that last saw the record
    Tagged {
        /// Epoch of the last run that touched the record
        epoch: u64,
        /// Content hash
        hash: String,
    },
}

impl StoredValue {
    /// Create an epoch-tagged value.
    pub fn tagged(epoch: u64, hash: impl Into<String>) -> Self {
        StoredValue::Tagged {
            epoch,
            hash: hash.into(),
        }
    }

    /// Parse a stored value string.
    pub fn parse(value: &str) -> Result<Self, ValueError> {
        match value.split_once(VALUE_SEPARATOR) {
            Some((epoch, hash)) => {
                let epoch = epoch
                    .parse::<u64>()
                    .map_err(|_| ValueError::InvalidEpoch(value.to_string()))?;
                Ok(StoredValue::Tagged {
                    epoch,
                    hash: hash.to_string(),
                })
            }
            None => Ok(StoredValue::Legacy {
                hash: value.to_string(),
            }),
        }
    }

    /// Parse a stored value from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValueError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ValueError::InvalidUtf8)?;
        Self::parse(text)
    }

    /// Encode to the storage form. Legacy values keep their bare form.
    pub fn encode(&self) -> String {
        match self {
            StoredValue::Legacy { hash } => hash.clone(),
            StoredValue::Tagged { epoch, hash } => encode_epoch_value(*epoch, hash),
        }
    }

    /// Epoch, or `None` for legacy values
    #[inline]
    pub fn epoch(&self) -> Option<u64> {
        match self {
            StoredValue::Legacy { .. } => None,
            StoredValue::Tagged { epoch, .. } => Some(*epoch),
        }
    }

    /// Content hash
    #[inline]
    pub fn hash(&self) -> &str {
        match self {
            StoredValue::Legacy { hash } | StoredValue::Tagged { hash, .. } => hash,
        }
    }

    /// Consume and return the content hash
    pub fn into_hash(self) -> String {
        match self {
            StoredValue::Legacy { hash } | StoredValue::Tagged { hash, .. } => hash,
        }
    }

    /// Whether this is a legacy (epoch-less) value
    pub fn is_legacy(&self) -> bool {
        matches!(self, StoredValue::Legacy { .. })
    }

    /// Whether a run at `current_epoch` should treat this value as stale.
    ///
    /// Legacy values are always stale.
    pub fn is_stale(&self, current_epoch: u64) -> bool {
        match self.epoch() {
            None => true,
            Some(epoch) => epoch < current_epoch,
        }
    }

    /// Re-stamp the value with a new epoch, keeping the hash.
    pub fn with_epoch(self, epoch: u64) -> Self {
        StoredValue::Tagged {
            epoch,
            hash: self.into_hash(),
        }
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Stored value decoding errors
///
/// Both variants indicate a damaged checkpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    /// Stored bytes are not valid UTF-8
    #[error("Stored value is not valid UTF-8")]
    InvalidUtf8,

    /// Left-of-colon segment is not an integer epoch
    #[error("Corrupt stored value '{0}': epoch is not an integer")]
    InvalidEpoch(String),
}
