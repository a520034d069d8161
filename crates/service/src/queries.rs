use parcelhub_core::{DomainResult, ParcelId};
use parcelhub_infra::repository::{Page, ParcelFilter, ParcelPage};
use parcelhub_parcels::Parcel;

use crate::context::RequestContext;
use crate::services::ParcelService;

impl ParcelService {
    pub fn get_parcel(&self, ctx: &RequestContext, parcel_id: ParcelId) -> DomainResult<Parcel> {
        self.load_parcel(ctx.tenant_id(), parcel_id)
    }

    /// Newest first; a zero `limit` means the configured default.
    pub fn list_parcels(
        &self,
        ctx: &RequestContext,
        filter: &ParcelFilter,
        limit: usize,
        offset: usize,
    ) -> DomainResult<ParcelPage> {
        let limit = if limit == 0 {
            self.deps.config.default_page_limit
        } else {
            limit
        };
        Ok(self
            .deps
            .parcels
            .list(ctx.tenant_id(), filter, Page::new(limit, offset))?)
    }
}
