//! State-machine aggregates and the version they are stored at.

use crate::error::{codes, Conflict, DomainError, DomainResult};

/// Something stored as one record under its own id.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of state changes applied so far; repositories compare it on write.
    fn version(&self) -> u64;
}

/// Version a write expects to find in storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Unconditional write.
    Any,
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    /// `concurrent_modification` conflict when `actual` does not match.
    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            return Ok(());
        }
        let expected = match self {
            ExpectedVersion::Any => "any".to_string(),
            ExpectedVersion::Exact(v) => v.to_string(),
        };
        Err(DomainError::Conflict(
            Conflict::new(
                codes::CONCURRENT_MODIFICATION,
                "the record was modified by another request",
            )
            .expected(expected)
            .actual(actual.to_string()),
        ))
    }
}

/// Command in, events out; state only moves through `apply`.
///
/// `handle` validates against the current state and never mutates it.
/// `apply` is infallible and bumps `version` once per event. Neither does IO:
/// persistence and audit emission belong to the service layer.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_mismatch_is_a_concurrency_conflict() {
        assert!(ExpectedVersion::Any.check(7).is_ok());
        assert!(ExpectedVersion::Exact(3).check(3).is_ok());

        let err = ExpectedVersion::Exact(2).check(3).unwrap_err();
        let conflict = err.as_conflict().unwrap();
        assert_eq!(conflict.code, codes::CONCURRENT_MODIFICATION);
        assert_eq!(conflict.expected.as_deref(), Some("2"));
        assert_eq!(conflict.actual.as_deref(), Some("3"));
    }
}
