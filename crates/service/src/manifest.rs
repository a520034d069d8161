use tracing::debug;

use parcelhub_core::{DomainResult, OfficeId, VehicleId};
use parcelhub_infra::repository::{Page, ParcelFilter};
use parcelhub_parcels::{ManifestPreview, ParcelStatus};

use crate::context::RequestContext;
use crate::services::ParcelService;

impl ParcelService {
    /// Boarded parcels on a vehicle for one route. Read-only.
    pub fn manifest_preview(
        &self,
        ctx: &RequestContext,
        vehicle_id: VehicleId,
        origin_office_id: OfficeId,
        destination_office_id: OfficeId,
    ) -> DomainResult<ManifestPreview> {
        let filter = ParcelFilter {
            status: Some(ParcelStatus::Boarded),
            vehicle_id: Some(vehicle_id.clone()),
            origin_office_id: Some(origin_office_id.clone()),
            destination_office_id: Some(destination_office_id.clone()),
            ..ParcelFilter::default()
        };
        let page = self.deps.parcels.list(ctx.tenant_id(), &filter, Page::all())?;

        let preview = ManifestPreview::build(vehicle_id, origin_office_id, destination_office_id, &page.parcels);
        debug!(
            tenant_id = %ctx.tenant_id(),
            vehicle_id = %preview.vehicle_id,
            count = preview.totals.count_parcels,
            "manifest preview built"
        );
        Ok(preview)
    }
}
