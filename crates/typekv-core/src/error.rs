use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open store at {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Store is closed")]
    Closed,

    #[error("Namespace binding error: {0}")]
    Ref(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Key not found")]
    NotFound,

    #[error("Write transaction failed: {0}")]
    Write(#[source] lmdb::Error),

    #[error("Read transaction failed: {0}")]
    Read(#[source] lmdb::Error),

    #[error("No reader slot available after {0:?}")]
    ReaderLimit(Duration),

    #[error("Failed to flush environment on close: {0}")]
    Close(#[source] lmdb::Error),
}

impl StoreError {
    pub fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        StoreError::Open {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    /// True for [`StoreError::Closed`].
    pub fn is_closed(&self) -> bool {
        matches!(self, StoreError::Closed)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_message() {
        let err = StoreError::open("/tmp/missing", "permission denied");
        assert_eq!(
            err.to_string(),
            "Failed to open store at /tmp/missing: permission denied"
        );
    }

    #[test]
    fn test_backend_errors_keep_source() {
        use std::error::Error as _;

        let err = StoreError::Write(lmdb::Error::MapFull);
        assert!(err.source().is_some());
        assert!(!err.is_not_found());
        assert!(StoreError::NotFound.is_not_found());
        assert!(StoreError::Closed.is_closed());
    }
}
