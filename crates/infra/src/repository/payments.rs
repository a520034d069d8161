use std::sync::Arc;

use parcelhub_core::{ParcelId, TenantId};
use parcelhub_parcels::ParcelPayment;

use crate::error::RepositoryError;
use crate::store::{InMemoryTenantStore, TenantStore};

/// At most one payment per parcel.
pub trait PaymentRepository: Send + Sync {
    fn get_by_parcel(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
    ) -> Result<Option<ParcelPayment>, RepositoryError>;

    fn upsert(&self, payment: ParcelPayment) -> Result<ParcelPayment, RepositoryError>;
}

impl<R> PaymentRepository for Arc<R>
where
    R: PaymentRepository + ?Sized,
{
    fn get_by_parcel(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
    ) -> Result<Option<ParcelPayment>, RepositoryError> {
        (**self).get_by_parcel(tenant_id, parcel_id)
    }

    fn upsert(&self, payment: ParcelPayment) -> Result<ParcelPayment, RepositoryError> {
        (**self).upsert(payment)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPaymentRepository {
    store: InMemoryTenantStore<ParcelId, ParcelPayment>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentRepository for InMemoryPaymentRepository {
    fn get_by_parcel(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
    ) -> Result<Option<ParcelPayment>, RepositoryError> {
        self.store.get(tenant_id, &parcel_id)
    }

    fn upsert(&self, payment: ParcelPayment) -> Result<ParcelPayment, RepositoryError> {
        self.store
            .upsert(&payment.tenant_id, payment.parcel_id, payment.clone())?;
        Ok(payment)
    }
}
