use std::sync::Arc;

use parcelhub_core::{ParcelId, PrintRecordId, TenantId};
use parcelhub_parcels::{DocumentType, PrintRecord};

use crate::error::RepositoryError;
use crate::store::{InMemoryTenantStore, TenantStore};

pub trait PrintRepository: Send + Sync {
    fn count_by_parcel_and_type(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
        document_type: DocumentType,
    ) -> Result<u32, RepositoryError>;

    fn add(&self, record: PrintRecord) -> Result<PrintRecord, RepositoryError>;
}

impl<R> PrintRepository for Arc<R>
where
    R: PrintRepository + ?Sized,
{
    fn count_by_parcel_and_type(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
        document_type: DocumentType,
    ) -> Result<u32, RepositoryError> {
        (**self).count_by_parcel_and_type(tenant_id, parcel_id, document_type)
    }

    fn add(&self, record: PrintRecord) -> Result<PrintRecord, RepositoryError> {
        (**self).add(record)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPrintRepository {
    store: InMemoryTenantStore<PrintRecordId, PrintRecord>,
}

impl InMemoryPrintRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrintRepository for InMemoryPrintRepository {
    fn count_by_parcel_and_type(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
        document_type: DocumentType,
    ) -> Result<u32, RepositoryError> {
        let records = self.store.list_where(tenant_id, &|r: &PrintRecord| {
            r.parcel_id == parcel_id && r.document_type == document_type
        })?;
        Ok(u32::try_from(records.len()).unwrap_or(u32::MAX))
    }

    fn add(&self, record: PrintRecord) -> Result<PrintRecord, RepositoryError> {
        self.store
            .upsert(&record.tenant_id, record.id, record.clone())?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn counts_per_parcel_and_document_type() {
        let repo = InMemoryPrintRepository::new();
        let tenant = TenantId::new("T1").unwrap();
        let parcel_id = ParcelId::new();

        for doc in [DocumentType::Label, DocumentType::Label, DocumentType::Receipt] {
            repo.add(PrintRecord::new(tenant.clone(), parcel_id, doc, None, Utc::now()))
                .unwrap();
        }
        repo.add(PrintRecord::new(
            tenant.clone(),
            ParcelId::new(),
            DocumentType::Label,
            None,
            Utc::now(),
        ))
        .unwrap();

        assert_eq!(
            repo.count_by_parcel_and_type(&tenant, parcel_id, DocumentType::Label)
                .unwrap(),
            2
        );
        assert_eq!(
            repo.count_by_parcel_and_type(&tenant, parcel_id, DocumentType::Guide)
                .unwrap(),
            0
        );
        let other = TenantId::new("T2").unwrap();
        assert_eq!(
            repo.count_by_parcel_and_type(&other, parcel_id, DocumentType::Label)
                .unwrap(),
            0
        );
    }
}
