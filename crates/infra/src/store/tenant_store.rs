use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use parcelhub_core::TenantId;

use crate::error::RepositoryError;

/// Tenant-isolated key/value store.
///
/// A key stored under one tenant is invisible to every other tenant.
pub trait TenantStore<K, V>: Send + Sync {
    fn get(&self, tenant_id: &TenantId, key: &K) -> Result<Option<V>, RepositoryError>;
    fn upsert(&self, tenant_id: &TenantId, key: K, value: V) -> Result<(), RepositoryError>;
    /// Overwrite an existing value; returns the previous one, or `None`
    /// (and writes nothing) when the key is absent.
    fn replace(&self, tenant_id: &TenantId, key: K, value: V) -> Result<Option<V>, RepositoryError>;
    fn remove(&self, tenant_id: &TenantId, key: &K) -> Result<Option<V>, RepositoryError>;
    /// Values of one tenant matching `keep`.
    fn list_where(
        &self,
        tenant_id: &TenantId,
        keep: &dyn Fn(&V) -> bool,
    ) -> Result<Vec<V>, RepositoryError>;
}

impl<K, V, S> TenantStore<K, V> for Arc<S>
where
    S: TenantStore<K, V> + ?Sized,
{
    fn get(&self, tenant_id: &TenantId, key: &K) -> Result<Option<V>, RepositoryError> {
        (**self).get(tenant_id, key)
    }

    fn upsert(&self, tenant_id: &TenantId, key: K, value: V) -> Result<(), RepositoryError> {
        (**self).upsert(tenant_id, key, value)
    }

    fn replace(&self, tenant_id: &TenantId, key: K, value: V) -> Result<Option<V>, RepositoryError> {
        (**self).replace(tenant_id, key, value)
    }

    fn remove(&self, tenant_id: &TenantId, key: &K) -> Result<Option<V>, RepositoryError> {
        (**self).remove(tenant_id, key)
    }

    fn list_where(
        &self,
        tenant_id: &TenantId,
        keep: &dyn Fn(&V) -> bool,
    ) -> Result<Vec<V>, RepositoryError> {
        (**self).list_where(tenant_id, keep)
    }
}

/// In-memory tenant-isolated store for tests/dev.
///
/// One lock per map, held only for the map access itself.
#[derive(Debug)]
pub struct InMemoryTenantStore<K, V> {
    inner: RwLock<HashMap<(TenantId, K), V>>,
}

impl<K, V> InMemoryTenantStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryTenantStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TenantStore<K, V> for InMemoryTenantStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, tenant_id: &TenantId, key: &K) -> Result<Option<V>, RepositoryError> {
        let map = self.inner.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(map.get(&(tenant_id.clone(), key.clone())).cloned())
    }

    fn upsert(&self, tenant_id: &TenantId, key: K, value: V) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().map_err(|_| RepositoryError::Poisoned)?;
        map.insert((tenant_id.clone(), key), value);
        Ok(())
    }

    fn replace(&self, tenant_id: &TenantId, key: K, value: V) -> Result<Option<V>, RepositoryError> {
        let mut map = self.inner.write().map_err(|_| RepositoryError::Poisoned)?;
        match map.get_mut(&(tenant_id.clone(), key)) {
            Some(slot) => Ok(Some(core::mem::replace(slot, value))),
            None => Ok(None),
        }
    }

    fn remove(&self, tenant_id: &TenantId, key: &K) -> Result<Option<V>, RepositoryError> {
        let mut map = self.inner.write().map_err(|_| RepositoryError::Poisoned)?;
        Ok(map.remove(&(tenant_id.clone(), key.clone())))
    }

    fn list_where(
        &self,
        tenant_id: &TenantId,
        keep: &dyn Fn(&V) -> bool,
    ) -> Result<Vec<V>, RepositoryError> {
        let map = self.inner.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(map
            .iter()
            .filter(|((t, _), v)| t == tenant_id && keep(v))
            .map(|(_, v)| v.clone())
            .collect())
    }
}
