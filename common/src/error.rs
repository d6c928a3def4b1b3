// common/src/error.rs
use thiserror::Error;

/// Failure of a cookie or session storage backend.
///
/// Stores never surface these to page code: a failed read is treated as an
/// absent entry and a failed write is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,

    #[error("storage quota exceeded writing {0}")]
    QuotaExceeded(String),

    #[error("malformed stored value for {key}: {reason}")]
    Malformed { key: String, reason: String },
}
