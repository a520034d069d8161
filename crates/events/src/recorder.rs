//! Append-only audit sink contracts.

use std::sync::Arc;

use thiserror::Error;

use parcelhub_core::{ParcelId, TenantId};

use crate::TrackingEvent;

#[derive(Debug, Error)]
pub enum RecorderError {
    /// Internal lock poisoning.
    #[error("tracking log lock poisoned")]
    Poisoned,

    /// The sink could not be reached.
    #[error("tracking sink unavailable: {0}")]
    Unavailable(String),
}

/// Append one audit event.
///
/// Callers treat this as fire-and-forget: a failure is logged and the
/// operation that produced the event still succeeds.
pub trait TrackingRecorder: Send + Sync {
    fn record(&self, event: TrackingEvent) -> Result<(), RecorderError>;
}

/// Read side of the audit trail.
pub trait TrackingReader: Send + Sync {
    /// Events of one parcel, oldest first.
    fn list_by_parcel(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
    ) -> Result<Vec<TrackingEvent>, RecorderError>;
}

impl<R> TrackingRecorder for Arc<R>
where
    R: TrackingRecorder + ?Sized,
{
    fn record(&self, event: TrackingEvent) -> Result<(), RecorderError> {
        (**self).record(event)
    }
}

impl<R> TrackingReader for Arc<R>
where
    R: TrackingReader + ?Sized,
{
    fn list_by_parcel(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
    ) -> Result<Vec<TrackingEvent>, RecorderError> {
        (**self).list_by_parcel(tenant_id, parcel_id)
    }
}
