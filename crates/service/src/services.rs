//! Service wiring: the collaborators every operation goes through.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use parcelhub_core::{DomainError, DomainResult, ParcelId, TenantId};
use parcelhub_events::{Event, InMemoryTrackingLog, TrackingEvent, TrackingReader, TrackingRecorder};
use parcelhub_infra::clients::{
    CachedTenantOptionsProvider, CashboxClient, QrGenerator, StaticCashboxClient,
    StaticOptionsProvider, TenantOptionsProvider, TrackingUrlQrGenerator,
};
use parcelhub_infra::config::CoreConfig;
use parcelhub_infra::repository::{
    InMemoryParcelItemRepository, InMemoryParcelRepository, InMemoryPaymentRepository,
    InMemoryPriceRuleRepository, InMemoryPrintRepository, ParcelItemRepository, ParcelRepository,
    PaymentRepository, PriceRuleRepository, PrintRepository,
};
use parcelhub_parcels::{
    Parcel, ParcelOptions, RandomTrackingCodeGenerator, TrackingCodeGenerator,
};

const DEFAULT_TRACKING_BASE_URL: &str = "https://track.parcelhub.local";

/// Every port the services depend on.
#[derive(Clone)]
pub struct Dependencies {
    pub parcels: Arc<dyn ParcelRepository>,
    pub items: Arc<dyn ParcelItemRepository>,
    pub rules: Arc<dyn PriceRuleRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub prints: Arc<dyn PrintRepository>,
    pub options: Arc<dyn TenantOptionsProvider>,
    pub recorder: Arc<dyn TrackingRecorder>,
    pub tracking: Arc<dyn TrackingReader>,
    pub cashbox: Arc<dyn CashboxClient>,
    pub qr: Arc<dyn QrGenerator>,
    pub tracking_codes: Arc<dyn TrackingCodeGenerator>,
    pub config: CoreConfig,
}

impl Dependencies {
    /// In-memory adapters with default tenant options for every tenant.
    pub fn in_memory(config: CoreConfig) -> Self {
        Self::in_memory_with_options(config, StaticOptionsProvider::default())
    }

    /// In-memory adapters; `provider` sits behind the options cache.
    pub fn in_memory_with_options<P>(config: CoreConfig, provider: P) -> Self
    where
        P: TenantOptionsProvider + 'static,
    {
        let log = Arc::new(InMemoryTrackingLog::new());
        Self {
            parcels: Arc::new(InMemoryParcelRepository::new()),
            items: Arc::new(InMemoryParcelItemRepository::new()),
            rules: Arc::new(InMemoryPriceRuleRepository::new()),
            payments: Arc::new(InMemoryPaymentRepository::new()),
            prints: Arc::new(InMemoryPrintRepository::new()),
            options: Arc::new(CachedTenantOptionsProvider::new(
                provider,
                config.options_cache_ttl,
            )),
            recorder: log.clone(),
            tracking: log,
            cashbox: Arc::new(StaticCashboxClient::new()),
            qr: Arc::new(TrackingUrlQrGenerator::new(DEFAULT_TRACKING_BASE_URL)),
            tracking_codes: Arc::new(RandomTrackingCodeGenerator),
            config,
        }
    }
}

/// Entry point for every parcel operation.
///
/// Operations are grouped by concern across this crate's modules.
#[derive(Clone)]
pub struct ParcelService {
    pub(crate) deps: Dependencies,
}

impl ParcelService {
    pub fn new(deps: Dependencies) -> Self {
        Self { deps }
    }

    pub fn in_memory() -> Self {
        Self::new(Dependencies::in_memory(CoreConfig::default()))
    }

    pub fn config(&self) -> &CoreConfig {
        &self.deps.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Tenant policy for this operation; provider failures fall back to defaults.
    pub(crate) fn options_for(&self, tenant_id: &TenantId) -> ParcelOptions {
        match self.deps.options.fetch(tenant_id) {
            Ok(options) => options,
            Err(err) => {
                warn!(tenant_id = %tenant_id, error = %err, "tenant options unavailable, using defaults");
                ParcelOptions::default()
            }
        }
    }

    pub(crate) fn load_parcel(&self, tenant_id: &TenantId, parcel_id: ParcelId) -> DomainResult<Parcel> {
        self.deps
            .parcels
            .get(tenant_id, parcel_id)?
            .ok_or_else(|| DomainError::not_found(format!("parcel {parcel_id}")))
    }

    /// Record an audit event; failures are logged and swallowed.
    pub(crate) fn audit(&self, event: TrackingEvent) {
        let tenant_id = event.tenant_id.clone();
        let parcel_id = event.parcel_id;
        let event_type = event.event_type();
        let schema_version = event.version();
        match self.deps.recorder.record(event) {
            Ok(()) => debug!(
                tenant_id = %tenant_id,
                parcel_id = %parcel_id,
                event_type,
                schema_version,
                "audit event recorded"
            ),
            Err(err) => warn!(
                tenant_id = %tenant_id,
                parcel_id = %parcel_id,
                event_type,
                schema_version,
                error = %err,
                "audit event dropped"
            ),
        }
    }
}
