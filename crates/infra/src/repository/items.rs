use std::sync::Arc;

use parcelhub_core::{ParcelId, ParcelItemId, TenantId};
use parcelhub_parcels::ParcelItem;

use crate::error::RepositoryError;
use crate::store::{InMemoryTenantStore, TenantStore};

pub trait ParcelItemRepository: Send + Sync {
    fn add(&self, item: ParcelItem) -> Result<ParcelItem, RepositoryError>;

    /// Items of one parcel, oldest first.
    fn list_by_parcel(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
    ) -> Result<Vec<ParcelItem>, RepositoryError>;

    /// Removes the item only if it belongs to `parcel_id`; returns it.
    fn delete(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
        item_id: ParcelItemId,
    ) -> Result<Option<ParcelItem>, RepositoryError>;
}

impl<R> ParcelItemRepository for Arc<R>
where
    R: ParcelItemRepository + ?Sized,
{
    fn add(&self, item: ParcelItem) -> Result<ParcelItem, RepositoryError> {
        (**self).add(item)
    }

    fn list_by_parcel(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
    ) -> Result<Vec<ParcelItem>, RepositoryError> {
        (**self).list_by_parcel(tenant_id, parcel_id)
    }

    fn delete(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
        item_id: ParcelItemId,
    ) -> Result<Option<ParcelItem>, RepositoryError> {
        (**self).delete(tenant_id, parcel_id, item_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryParcelItemRepository {
    store: InMemoryTenantStore<ParcelItemId, ParcelItem>,
}

impl InMemoryParcelItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParcelItemRepository for InMemoryParcelItemRepository {
    fn add(&self, item: ParcelItem) -> Result<ParcelItem, RepositoryError> {
        self.store.upsert(&item.tenant_id, item.id, item.clone())?;
        Ok(item)
    }

    fn list_by_parcel(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
    ) -> Result<Vec<ParcelItem>, RepositoryError> {
        let mut items = self
            .store
            .list_where(tenant_id, &|item: &ParcelItem| item.parcel_id == parcel_id)?;
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    fn delete(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
        item_id: ParcelItemId,
    ) -> Result<Option<ParcelItem>, RepositoryError> {
        match self.store.get(tenant_id, &item_id)? {
            Some(item) if item.parcel_id == parcel_id => self.store.remove(tenant_id, &item_id),
            _ => Ok(None),
        }
    }
}
