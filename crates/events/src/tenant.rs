use parcelhub_core::TenantId;

use crate::TrackingEvent;

/// Marks records that belong to exactly one tenant.
///
/// Readers use it to filter shared storage so a record never leaks across the
/// tenant boundary.
pub trait TenantScoped {
    fn tenant_id(&self) -> &TenantId;

    fn belongs_to(&self, tenant_id: &TenantId) -> bool {
        self.tenant_id() == tenant_id
    }
}

impl TenantScoped for TrackingEvent {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}
