use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parcelhub_core::{
    Aggregate, AggregateRoot, ExpectedVersion, OfficeId, ParcelId, PersonId, TenantId, VehicleId,
};
use parcelhub_parcels::{
    Parcel, ParcelArrived, ParcelBoarded, ParcelDelivered, ParcelDeparted, ParcelEvent,
    ParcelRegistered, ParcelStatus,
};

use crate::error::RepositoryError;

/// Listing filters; every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelFilter {
    pub status: Option<ParcelStatus>,
    pub vehicle_id: Option<VehicleId>,
    pub origin_office_id: Option<OfficeId>,
    pub destination_office_id: Option<OfficeId>,
    pub sender_person_id: Option<PersonId>,
    pub recipient_person_id: Option<PersonId>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
    /// Case-insensitive text over tracking code, notes and person ids.
    pub q: Option<String>,
}

impl ParcelFilter {
    pub fn matches(&self, parcel: &Parcel) -> bool {
        if self.status.is_some_and(|s| s != parcel.status()) {
            return false;
        }
        if self
            .vehicle_id
            .as_ref()
            .is_some_and(|v| parcel.boarded_vehicle_id.as_ref() != Some(v))
        {
            return false;
        }
        if self
            .origin_office_id
            .as_ref()
            .is_some_and(|o| o != &parcel.origin_office_id)
        {
            return false;
        }
        if self
            .destination_office_id
            .as_ref()
            .is_some_and(|d| d != &parcel.destination_office_id)
        {
            return false;
        }
        if self
            .sender_person_id
            .as_ref()
            .is_some_and(|p| p != &parcel.sender_person_id)
        {
            return false;
        }
        if self
            .recipient_person_id
            .as_ref()
            .is_some_and(|p| p != &parcel.recipient_person_id)
        {
            return false;
        }
        if self.created_from.is_some_and(|from| parcel.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| parcel.created_at > to) {
            return false;
        }
        match self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => text_matches(parcel, &q.to_lowercase()),
            None => true,
        }
    }
}

fn text_matches(parcel: &Parcel, needle: &str) -> bool {
    let haystacks = [
        Some(parcel.tracking_code.as_str()),
        parcel.notes.as_deref(),
        Some(parcel.sender_person_id.as_str()),
        Some(parcel.recipient_person_id.as_str()),
    ];
    haystacks
        .into_iter()
        .flatten()
        .any(|h| h.to_lowercase().contains(needle))
}

/// Offset pagination.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Everything, for internal aggregations.
    pub fn all() -> Self {
        Self {
            limit: usize::MAX,
            offset: 0,
        }
    }
}

/// One page of parcels plus the total matching the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelPage {
    pub parcels: Vec<Parcel>,
    pub total: usize,
}

/// Tenant-partitioned parcel persistence.
///
/// Each transition update checks `expected` against the stored version and
/// returns `Ok(None)` when the parcel does not exist under the event's tenant.
pub trait ParcelRepository: Send + Sync {
    /// Fails with `Duplicate` when the tracking code is already taken.
    fn create(&self, parcel: Parcel) -> Result<Parcel, RepositoryError>;

    fn get(&self, tenant_id: &TenantId, parcel_id: ParcelId) -> Result<Option<Parcel>, RepositoryError>;

    /// Tracking codes are unique across every tenant.
    fn exists_tracking_code(&self, tracking_code: &str) -> Result<bool, RepositoryError>;

    fn mark_registered(
        &self,
        event: &ParcelRegistered,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError>;

    fn mark_boarded(
        &self,
        event: &ParcelBoarded,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError>;

    fn mark_in_transit(
        &self,
        event: &ParcelDeparted,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError>;

    fn mark_arrived(
        &self,
        event: &ParcelArrived,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError>;

    fn mark_delivered(
        &self,
        event: &ParcelDelivered,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError>;

    /// Newest first.
    fn list(
        &self,
        tenant_id: &TenantId,
        filter: &ParcelFilter,
        page: Page,
    ) -> Result<ParcelPage, RepositoryError>;
}

impl<R> ParcelRepository for Arc<R>
where
    R: ParcelRepository + ?Sized,
{
    fn create(&self, parcel: Parcel) -> Result<Parcel, RepositoryError> {
        (**self).create(parcel)
    }

    fn get(&self, tenant_id: &TenantId, parcel_id: ParcelId) -> Result<Option<Parcel>, RepositoryError> {
        (**self).get(tenant_id, parcel_id)
    }

    fn exists_tracking_code(&self, tracking_code: &str) -> Result<bool, RepositoryError> {
        (**self).exists_tracking_code(tracking_code)
    }

    fn mark_registered(
        &self,
        event: &ParcelRegistered,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        (**self).mark_registered(event, expected)
    }

    fn mark_boarded(
        &self,
        event: &ParcelBoarded,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        (**self).mark_boarded(event, expected)
    }

    fn mark_in_transit(
        &self,
        event: &ParcelDeparted,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        (**self).mark_in_transit(event, expected)
    }

    fn mark_arrived(
        &self,
        event: &ParcelArrived,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        (**self).mark_arrived(event, expected)
    }

    fn mark_delivered(
        &self,
        event: &ParcelDelivered,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        (**self).mark_delivered(event, expected)
    }

    fn list(
        &self,
        tenant_id: &TenantId,
        filter: &ParcelFilter,
        page: Page,
    ) -> Result<ParcelPage, RepositoryError> {
        (**self).list(tenant_id, filter, page)
    }
}

#[derive(Debug, Default)]
struct ParcelTable {
    rows: HashMap<(TenantId, ParcelId), Parcel>,
    tracking_codes: HashSet<String>,
}

/// In-memory parcel repository for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryParcelRepository {
    table: RwLock<ParcelTable>,
}

impl InMemoryParcelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the version and apply the event under one write lock.
    fn transition(
        &self,
        tenant_id: &TenantId,
        parcel_id: ParcelId,
        expected: ExpectedVersion,
        event: ParcelEvent,
    ) -> Result<Option<Parcel>, RepositoryError> {
        let mut table = self.table.write().map_err(|_| RepositoryError::Poisoned)?;
        let Some(parcel) = table.rows.get_mut(&(tenant_id.clone(), parcel_id)) else {
            return Ok(None);
        };
        let actual = parcel.version();
        if !expected.matches(actual) {
            return Err(RepositoryError::Concurrency { expected, actual });
        }
        parcel.apply(&event);
        Ok(Some(parcel.clone()))
    }
}

impl ParcelRepository for InMemoryParcelRepository {
    fn create(&self, parcel: Parcel) -> Result<Parcel, RepositoryError> {
        let mut table = self.table.write().map_err(|_| RepositoryError::Poisoned)?;
        if table.tracking_codes.contains(&parcel.tracking_code) {
            return Err(RepositoryError::Duplicate(format!(
                "tracking code {}",
                parcel.tracking_code
            )));
        }
        table.tracking_codes.insert(parcel.tracking_code.clone());
        table
            .rows
            .insert((parcel.tenant_id.clone(), parcel.id), parcel.clone());
        Ok(parcel)
    }

    fn get(&self, tenant_id: &TenantId, parcel_id: ParcelId) -> Result<Option<Parcel>, RepositoryError> {
        let table = self.table.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(table.rows.get(&(tenant_id.clone(), parcel_id)).cloned())
    }

    fn exists_tracking_code(&self, tracking_code: &str) -> Result<bool, RepositoryError> {
        let table = self.table.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(table.tracking_codes.contains(tracking_code))
    }

    fn mark_registered(
        &self,
        event: &ParcelRegistered,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        self.transition(
            &event.tenant_id,
            event.parcel_id,
            expected,
            ParcelEvent::Registered(event.clone()),
        )
    }

    fn mark_boarded(
        &self,
        event: &ParcelBoarded,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        self.transition(
            &event.tenant_id,
            event.parcel_id,
            expected,
            ParcelEvent::Boarded(event.clone()),
        )
    }

    fn mark_in_transit(
        &self,
        event: &ParcelDeparted,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        self.transition(
            &event.tenant_id,
            event.parcel_id,
            expected,
            ParcelEvent::Departed(event.clone()),
        )
    }

    fn mark_arrived(
        &self,
        event: &ParcelArrived,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        self.transition(
            &event.tenant_id,
            event.parcel_id,
            expected,
            ParcelEvent::Arrived(event.clone()),
        )
    }

    fn mark_delivered(
        &self,
        event: &ParcelDelivered,
        expected: ExpectedVersion,
    ) -> Result<Option<Parcel>, RepositoryError> {
        self.transition(
            &event.tenant_id,
            event.parcel_id,
            expected,
            ParcelEvent::Delivered(event.clone()),
        )
    }

    fn list(
        &self,
        tenant_id: &TenantId,
        filter: &ParcelFilter,
        page: Page,
    ) -> Result<ParcelPage, RepositoryError> {
        let table = self.table.read().map_err(|_| RepositoryError::Poisoned)?;
        let mut matching: Vec<&Parcel> = table
            .rows
            .iter()
            .filter(|((t, _), p)| t == tenant_id && filter.matches(p))
            .map(|(_, p)| p)
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len();
        let parcels = matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect();
        Ok(ParcelPage { parcels, total })
    }
}
