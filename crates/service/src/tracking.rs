//! Audit trail reads and the parcel summary view.

use serde::{Deserialize, Serialize};

use parcelhub_core::{DomainError, DomainResult, ParcelId};
use parcelhub_events::TrackingEvent;
use parcelhub_parcels::{Parcel, ParcelItem, ParcelPayment};

use crate::context::RequestContext;
use crate::services::ParcelService;

/// Everything the counter screen shows for one parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelSummary {
    pub parcel: Parcel,
    pub items: Vec<ParcelItem>,
    pub payment: Option<ParcelPayment>,
    /// Oldest events first, capped by configuration.
    pub tracking: Vec<TrackingEvent>,
}

impl ParcelService {
    /// Audit events of a parcel, oldest first.
    pub fn list_tracking(&self, ctx: &RequestContext, parcel_id: ParcelId) -> DomainResult<Vec<TrackingEvent>> {
        self.load_parcel(ctx.tenant_id(), parcel_id)?;
        self.deps
            .tracking
            .list_by_parcel(ctx.tenant_id(), parcel_id)
            .map_err(|err| DomainError::internal(err.to_string()))
    }

    pub fn parcel_summary(&self, ctx: &RequestContext, parcel_id: ParcelId) -> DomainResult<ParcelSummary> {
        let parcel = self.load_parcel(ctx.tenant_id(), parcel_id)?;
        let items = self.deps.items.list_by_parcel(ctx.tenant_id(), parcel_id)?;
        let payment = self.deps.payments.get_by_parcel(ctx.tenant_id(), parcel_id)?;
        let mut tracking = self
            .deps
            .tracking
            .list_by_parcel(ctx.tenant_id(), parcel_id)
            .map_err(|err| DomainError::internal(err.to_string()))?;
        tracking.truncate(self.deps.config.summary_tracking_limit);

        Ok(ParcelSummary {
            parcel,
            items,
            payment,
            tracking,
        })
    }
}
