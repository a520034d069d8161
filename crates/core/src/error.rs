//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Stable conflict codes surfaced to callers.
pub mod codes {
    pub const INVALID_STATE: &str = "invalid_state";
    pub const ORIGIN_MISMATCH: &str = "origin_mismatch";
    pub const DESTINATION_MISMATCH: &str = "destination_mismatch";
    pub const VEHICLE_MISMATCH: &str = "vehicle_mismatch";
    pub const NO_MATCHING_PRICE_RULE: &str = "no_matching_price_rule";
    pub const MANUAL_PRICE_DISABLED: &str = "manual_price_disabled";
    pub const PRICING_UNAVAILABLE: &str = "pricing_unavailable";
    pub const PAY_IN_DESTINATION_DISABLED: &str = "pay_in_destination_disabled";
    pub const CASHBOX_CLOSED: &str = "cashbox_closed";
    pub const REPRINT_NOT_ALLOWED: &str = "reprint_not_allowed";
    pub const CONCURRENT_MODIFICATION: &str = "concurrent_modification";
    pub const DUPLICATE_TRACKING_CODE: &str = "duplicate_tracking_code";
}

/// Structured details of a conflict.
///
/// `expected`/`actual` let the caller decide whether a retry makes sense once
/// the underlying state has been corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Conflict {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl core::fmt::Display for Conflict {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        match (&self.expected, &self.actual) {
            (Some(e), Some(a)) => write!(f, " (expected: {e}, actual: {a})"),
            (Some(e), None) => write!(f, " (expected: {e})"),
            (None, Some(a)) => write!(f, " (actual: {a})"),
            (None, None) => Ok(()),
        }
    }
}

/// Coarse classification used by the transport layer to pick a status code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

/// Domain-level error.
///
/// Every exposed operation fails with exactly one of these. Infrastructure
/// errors are converted at the repository boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing tenant or actor identity.
    #[error("unauthorized")]
    Unauthorized,

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found for the tenant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Illegal transition, mismatch, or policy violation.
    #[error("conflict: {0}")]
    Conflict(Conflict),

    /// Well-formed input whose credential check failed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Conflict(Conflict::new(code, msg))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Conflict for a lifecycle edge that is not legal from the current status.
    pub fn invalid_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        let expected = expected.into();
        let actual = actual.into();
        Self::Conflict(
            Conflict::new(
                codes::INVALID_STATE,
                format!("parcel must be in status {expected}, current status is {actual}"),
            )
            .expected(expected)
            .actual(actual),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Unauthorized => ErrorKind::Unauthorized,
            DomainError::Validation(_) | DomainError::InvalidId(_) => ErrorKind::Validation,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::InvariantViolation(_) | DomainError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Conflict details, if this is a conflict.
    pub fn as_conflict(&self) -> Option<&Conflict> {
        match self {
            DomainError::Conflict(c) => Some(c),
            _ => None,
        }
    }
}
