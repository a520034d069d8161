use std::collections::HashSet;
use std::sync::Arc;

use parcelhub_core::TenantId;

use super::ClientError;

/// Cash register integration, consulted by counter payments.
pub trait CashboxClient: Send + Sync {
    fn is_open(&self, tenant_id: &TenantId, cashbox_id: &str) -> Result<bool, ClientError>;
}

impl<C> CashboxClient for Arc<C>
where
    C: CashboxClient + ?Sized,
{
    fn is_open(&self, tenant_id: &TenantId, cashbox_id: &str) -> Result<bool, ClientError> {
        (**self).is_open(tenant_id, cashbox_id)
    }
}

/// Every cashbox is open except the ones listed as closed.
#[derive(Debug, Clone, Default)]
pub struct StaticCashboxClient {
    closed: HashSet<String>,
}

impl StaticCashboxClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_closed(mut self, cashbox_id: impl Into<String>) -> Self {
        self.closed.insert(cashbox_id.into());
        self
    }
}

impl CashboxClient for StaticCashboxClient {
    fn is_open(&self, _tenant_id: &TenantId, cashbox_id: &str) -> Result<bool, ClientError> {
        Ok(!self.closed.contains(cashbox_id))
    }
}
