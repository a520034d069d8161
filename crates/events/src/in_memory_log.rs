//! In-memory audit log for tests/dev.

use std::sync::Mutex;

use parcelhub_core::{ParcelId, TenantId};

use crate::recorder::{RecorderError, TrackingReader, TrackingRecorder};
use crate::{Event, TenantScoped, TrackingEvent};

/// Append-only list of audit events shared by every tenant.
///
/// Reads filter by tenant, so a parcel id from another tenant yields nothing.
#[derive(Debug, Default)]
pub struct InMemoryTrackingLog {
    events: Mutex<Vec<TrackingEvent>>,
}

impl InMemoryTrackingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events across all tenants.
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TrackingRecorder for InMemoryTrackingLog {
    fn record(&self, event: TrackingEvent) -> Result<(), RecorderError> {
        let mut events = self.events.lock().map_err(|_| RecorderError::Poisoned)?;
        tracing::trace!(
            tenant_id = %event.tenant_id,
            parcel_id = %event.parcel_id,
            event_type = event.event_type(),
            "tracking event appended"
        );
        events.push(event);
        Ok(())
    }
}

impl TrackingReader for InMemoryTrackingLog {
    fn list_by_parcel(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
    ) -> Result<Vec<TrackingEvent>, RecorderError> {
        let events = self.events.lock().map_err(|_| RecorderError::Poisoned)?;
        let mut out: Vec<TrackingEvent> = events
            .iter()
            .filter(|e| e.belongs_to(tenant_id) && e.parcel_id == parcel_id)
            .cloned()
            .collect();
        // Stable: equal timestamps keep insertion order.
        out.sort_by_key(|e| e.occurred_at);
        Ok(out)
    }
}
