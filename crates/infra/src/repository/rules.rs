use std::sync::Arc;

use parcelhub_core::{PriceRuleId, TenantId};
use parcelhub_pricing::{PriceQuery, PriceRule, find_best_match};

use crate::error::RepositoryError;
use crate::store::{InMemoryTenantStore, TenantStore};

pub trait PriceRuleRepository: Send + Sync {
    fn create(&self, rule: PriceRule) -> Result<PriceRule, RepositoryError>;

    /// `Ok(None)` when the rule does not exist under its tenant.
    fn update(&self, rule: PriceRule) -> Result<Option<PriceRule>, RepositoryError>;

    fn get(&self, tenant_id: &TenantId, rule_id: PriceRuleId) -> Result<Option<PriceRule>, RepositoryError>;

    /// Every rule of the tenant, active or not, oldest first.
    fn list(&self, tenant_id: &TenantId) -> Result<Vec<PriceRule>, RepositoryError>;

    fn find_best_match(
        &self,
        tenant_id: &TenantId,
        query: &PriceQuery,
    ) -> Result<Option<PriceRule>, RepositoryError>;
}

impl<R> PriceRuleRepository for Arc<R>
where
    R: PriceRuleRepository + ?Sized,
{
    fn create(&self, rule: PriceRule) -> Result<PriceRule, RepositoryError> {
        (**self).create(rule)
    }

    fn update(&self, rule: PriceRule) -> Result<Option<PriceRule>, RepositoryError> {
        (**self).update(rule)
    }

    fn get(&self, tenant_id: &TenantId, rule_id: PriceRuleId) -> Result<Option<PriceRule>, RepositoryError> {
        (**self).get(tenant_id, rule_id)
    }

    fn list(&self, tenant_id: &TenantId) -> Result<Vec<PriceRule>, RepositoryError> {
        (**self).list(tenant_id)
    }

    fn find_best_match(
        &self,
        tenant_id: &TenantId,
        query: &PriceQuery,
    ) -> Result<Option<PriceRule>, RepositoryError> {
        (**self).find_best_match(tenant_id, query)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPriceRuleRepository {
    store: InMemoryTenantStore<PriceRuleId, PriceRule>,
}

impl InMemoryPriceRuleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriceRuleRepository for InMemoryPriceRuleRepository {
    fn create(&self, rule: PriceRule) -> Result<PriceRule, RepositoryError> {
        self.store.upsert(&rule.tenant_id, rule.id, rule.clone())?;
        Ok(rule)
    }

    fn update(&self, rule: PriceRule) -> Result<Option<PriceRule>, RepositoryError> {
        let previous = self
            .store
            .replace(&rule.tenant_id, rule.id, rule.clone())?;
        Ok(previous.map(|_| rule))
    }

    fn get(&self, tenant_id: &TenantId, rule_id: PriceRuleId) -> Result<Option<PriceRule>, RepositoryError> {
        self.store.get(tenant_id, &rule_id)
    }

    fn list(&self, tenant_id: &TenantId) -> Result<Vec<PriceRule>, RepositoryError> {
        let mut rules = self.store.list_where(tenant_id, &|_: &PriceRule| true)?;
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rules)
    }

    fn find_best_match(
        &self,
        tenant_id: &TenantId,
        query: &PriceQuery,
    ) -> Result<Option<PriceRule>, RepositoryError> {
        let candidates = self
            .store
            .list_where(tenant_id, &|r: &PriceRule| r.active && r.shipment_type == query.shipment_type)?;
        Ok(find_best_match(&candidates, tenant_id, query).cloned())
    }
}
