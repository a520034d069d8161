//! Read-only manifest of parcels boarded on a vehicle for one route.

use serde::{Deserialize, Serialize};

use parcelhub_core::{OfficeId, ParcelId, PersonId, VehicleId};

use crate::parcel::{Parcel, ParcelStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestParcel {
    pub parcel_id: ParcelId,
    pub tracking_code: String,
    pub status: ParcelStatus,
    pub sender_person_id: PersonId,
    pub recipient_person_id: PersonId,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTotals {
    pub count_parcels: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPreview {
    pub vehicle_id: VehicleId,
    pub origin_office_id: OfficeId,
    pub destination_office_id: OfficeId,
    pub parcels: Vec<ManifestParcel>,
    pub totals: ManifestTotals,
}

impl ManifestPreview {
    /// Keep only boarded parcels on this vehicle and route.
    pub fn build<'a>(
        vehicle_id: VehicleId,
        origin_office_id: OfficeId,
        destination_office_id: OfficeId,
        parcels: impl IntoIterator<Item = &'a Parcel>,
    ) -> Self {
        let parcels: Vec<ManifestParcel> = parcels
            .into_iter()
            .filter(|p| {
                p.status() == ParcelStatus::Boarded
                    && p.boarded_vehicle_id.as_ref() == Some(&vehicle_id)
                    && p.origin_office_id == origin_office_id
                    && p.destination_office_id == destination_office_id
            })
            .map(|p| ManifestParcel {
                parcel_id: p.id,
                tracking_code: p.tracking_code.clone(),
                status: p.status(),
                sender_person_id: p.sender_person_id.clone(),
                recipient_person_id: p.recipient_person_id.clone(),
                notes: p.notes.clone(),
            })
            .collect();

        Self {
            totals: ManifestTotals {
                count_parcels: parcels.len(),
            },
            vehicle_id,
            origin_office_id,
            destination_office_id,
            parcels,
        }
    }
}
