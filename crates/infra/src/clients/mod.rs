//! Contracts for remote collaborators plus local stand-ins for tests/dev.

pub mod cashbox;
pub mod options;
pub mod qr;

use thiserror::Error;

pub use cashbox::{CashboxClient, StaticCashboxClient};
pub use options::{CachedTenantOptionsProvider, StaticOptionsProvider, TenantOptionsProvider};
pub use qr::{QrGenerator, TrackingUrlQrGenerator};

/// Failure talking to a remote collaborator.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },

    #[error("{service} rejected the request: {reason}")]
    Rejected { service: &'static str, reason: String },
}
