//! Tenant Options Gate: per-tenant policy behind a TTL cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use parcelhub_core::TenantId;
use parcelhub_parcels::ParcelOptions;

use super::ClientError;

pub const DEFAULT_OPTIONS_TTL_SECS: i64 = 60;

/// Source of a tenant's policy bundle.
pub trait TenantOptionsProvider: Send + Sync {
    fn fetch(&self, tenant_id: &TenantId) -> Result<ParcelOptions, ClientError>;
}

impl<P> TenantOptionsProvider for Arc<P>
where
    P: TenantOptionsProvider + ?Sized,
{
    fn fetch(&self, tenant_id: &TenantId) -> Result<ParcelOptions, ClientError> {
        (**self).fetch(tenant_id)
    }
}

/// Fixed options, optionally overridden per tenant.
#[derive(Debug, Clone, Default)]
pub struct StaticOptionsProvider {
    default: ParcelOptions,
    tenants: HashMap<TenantId, ParcelOptions>,
}

impl StaticOptionsProvider {
    pub fn new(default: ParcelOptions) -> Self {
        Self {
            default,
            tenants: HashMap::new(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId, options: ParcelOptions) -> Self {
        self.tenants.insert(tenant_id, options);
        self
    }
}

impl TenantOptionsProvider for StaticOptionsProvider {
    fn fetch(&self, tenant_id: &TenantId) -> Result<ParcelOptions, ClientError> {
        Ok(self
            .tenants
            .get(tenant_id)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    options: ParcelOptions,
    expires_at: DateTime<Utc>,
}

/// Caches another provider per tenant until `fetched_at + ttl`.
///
/// The lock covers map access only; the inner provider is called without it,
/// so two concurrent misses for one tenant may both call through.
#[derive(Debug)]
pub struct CachedTenantOptionsProvider<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<TenantId, CacheEntry>>,
}

impl<P> CachedTenantOptionsProvider<P>
where
    P: TenantOptionsProvider,
{
    /// A non-positive `ttl` falls back to 60 seconds.
    pub fn new(inner: P, ttl: Duration) -> Self {
        let ttl = if ttl > Duration::zero() {
            ttl
        } else {
            Duration::seconds(DEFAULT_OPTIONS_TTL_SECS)
        };
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lookup against an explicit clock.
    pub fn get_at(
        &self,
        tenant_id: &TenantId,
        now: DateTime<Utc>,
    ) -> Result<ParcelOptions, ClientError> {
        if let Some(hit) = self.cached(tenant_id, now) {
            return Ok(hit);
        }

        debug!(tenant_id = %tenant_id, "tenant options cache miss");
        let options = self.inner.fetch(tenant_id)?;

        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(
                    tenant_id.clone(),
                    CacheEntry {
                        options: options.clone(),
                        expires_at: now + self.ttl,
                    },
                );
            }
            Err(_) => warn!(tenant_id = %tenant_id, "tenant options cache lock poisoned"),
        }
        Ok(options)
    }

    /// Drop the cached entry of one tenant.
    pub fn invalidate(&self, tenant_id: &TenantId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(tenant_id);
        }
    }

    fn cached(&self, tenant_id: &TenantId, now: DateTime<Utc>) -> Option<ParcelOptions> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(tenant_id)
            .filter(|e| now < e.expires_at)
            .map(|e| e.options.clone())
    }
}

impl<P> TenantOptionsProvider for CachedTenantOptionsProvider<P>
where
    P: TenantOptionsProvider,
{
    fn fetch(&self, tenant_id: &TenantId) -> Result<ParcelOptions, ClientError> {
        self.get_at(tenant_id, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hands out options whose `max_prints` is the call number.
    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl TenantOptionsProvider for CountingProvider {
        fn fetch(&self, _tenant_id: &TenantId) -> Result<ParcelOptions, ClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(ClientError::Unavailable {
                    service: "tenant-options",
                    reason: "connection refused".to_string(),
                });
            }
            Ok(ParcelOptions {
                max_prints: n as i32,
                ..ParcelOptions::default()
            })
        }
    }

    fn test_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    #[test]
    fn serves_cached_value_until_expiry() {
        let gate = CachedTenantOptionsProvider::new(CountingProvider::default(), Duration::seconds(30));
        let t0 = test_time();

        assert_eq!(gate.get_at(&tenant("T1"), t0).unwrap().max_prints, 1);
        assert_eq!(
            gate.get_at(&tenant("T1"), t0 + Duration::seconds(29))
                .unwrap()
                .max_prints,
            1
        );
        assert_eq!(
            gate.get_at(&tenant("T1"), t0 + Duration::seconds(30))
                .unwrap()
                .max_prints,
            2
        );
    }

    #[test]
    fn one_entry_per_tenant() {
        let gate = CachedTenantOptionsProvider::new(CountingProvider::default(), Duration::seconds(30));
        let t0 = test_time();
        gate.get_at(&tenant("T1"), t0).unwrap();
        gate.get_at(&tenant("T2"), t0).unwrap();
        gate.get_at(&tenant("T1"), t0).unwrap();
        assert_eq!(gate.inner.calls.load(Ordering::SeqCst), 2);

        gate.invalidate(&tenant("T1"));
        gate.get_at(&tenant("T1"), t0).unwrap();
        assert_eq!(gate.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn non_positive_ttl_defaults_to_sixty_seconds() {
        let gate = CachedTenantOptionsProvider::new(CountingProvider::default(), Duration::zero());
        assert_eq!(gate.ttl(), Duration::seconds(60));
        let gate = CachedTenantOptionsProvider::new(CountingProvider::default(), Duration::seconds(-5));
        assert_eq!(gate.ttl(), Duration::seconds(60));
    }

    #[test]
    fn provider_failures_are_not_cached() {
        let gate = CachedTenantOptionsProvider::new(
            CountingProvider {
                fail: true,
                ..CountingProvider::default()
            },
            Duration::seconds(30),
        );
        assert!(gate.get_at(&tenant("T1"), test_time()).is_err());
        assert!(gate.get_at(&tenant("T1"), test_time()).is_err());
        assert_eq!(gate.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn static_provider_overrides_per_tenant() {
        let custom = ParcelOptions {
            allow_reprint: true,
            ..ParcelOptions::default()
        };
        let provider = StaticOptionsProvider::default().with_tenant(tenant("T1"), custom.clone());
        assert_eq!(provider.fetch(&tenant("T1")).unwrap(), custom);
        assert_eq!(provider.fetch(&tenant("T2")).unwrap(), ParcelOptions::default());
    }
}
