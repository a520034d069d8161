use std::sync::Arc;

use parcelhub_core::{ParcelId, TenantId};

use super::ClientError;

/// Label QR integration.
pub trait QrGenerator: Send + Sync {
    /// Returns a reference to the generated code (URL or storage key).
    fn generate(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
        tracking_code: &str,
    ) -> Result<String, ClientError>;
}

impl<Q> QrGenerator for Arc<Q>
where
    Q: QrGenerator + ?Sized,
{
    fn generate(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
        tracking_code: &str,
    ) -> Result<String, ClientError> {
        (**self).generate(tenant_id, parcel_id, tracking_code)
    }
}

/// Encodes the public tracking URL; no image is rendered.
#[derive(Debug, Clone)]
pub struct TrackingUrlQrGenerator {
    base_url: String,
}

impl TrackingUrlQrGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl QrGenerator for TrackingUrlQrGenerator {
    fn generate(
        &self,
        _tenant_id: &TenantId,
        _parcel_id: ParcelId,
        tracking_code: &str,
    ) -> Result<String, ClientError> {
        if tracking_code.trim().is_empty() {
            return Err(ClientError::Rejected {
                service: "qr",
                reason: "empty tracking code".to_string(),
            });
        }
        Ok(format!("{}/track/{}", self.base_url, tracking_code))
    }
}
