//! Error types for checkpoint decoding
//!
//! Everything that can go wrong in this crate is a decoding or validation
//! failure. We use `thiserror` for `Display` and `Error` implementations.

use crate::key::KeyError;
use crate::value::ValueError;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for key and value codecs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Key encoding or validation failure
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// Stored value decoding failure
    #[error("Value error: {0}")]
    Value(#[from] ValueError),
}

impl Error {
    /// Whether the error means stored data is damaged.
    ///
    /// A corrupt checkpoint should not be trusted; callers usually rebuild it.
    pub fn is_corruption(&self) -> bool {
        match self {
            Error::Key(e) => e.is_corruption(),
            Error::Value(_) => true,
        }
    }
}
