use thiserror::Error;

use parcelhub_core::{DomainError, ExpectedVersion, error::codes};

/// Storage failure, independent of the backing store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Optimistic concurrency check failed; nothing was written.
    #[error("optimistic concurrency check failed: expected {expected:?}, found {actual}")]
    Concurrency {
        expected: ExpectedVersion,
        actual: u64,
    },

    /// A tracking code is already taken.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// Internal lock poisoning.
    #[error("repository lock poisoned")]
    Poisoned,

    /// The store could not be reached.
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Concurrency { expected, actual } => {
                expected.check(actual).err().unwrap_or_else(|| {
                    DomainError::conflict(codes::CONCURRENT_MODIFICATION, "concurrent modification")
                })
            }
            RepositoryError::Duplicate(what) => {
                DomainError::conflict(codes::DUPLICATE_TRACKING_CODE, format!("duplicate {what}"))
            }
            other => DomainError::internal(other.to_string()),
        }
    }
}
