//! Parcel creation and the lifecycle transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use parcelhub_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, ExpectedVersion, OfficeId, ParcelId,
    PersonId, VehicleId,
};
use parcelhub_events::Event;
use parcelhub_infra::RepositoryError;
use parcelhub_parcels::{
    ArriveParcel, BoardParcel, CreateParcel, DeliverParcel, DepartParcel, Parcel, ParcelCommand,
    ParcelEvent, RegisterParcel, ShipmentType, assign_tracking_code,
};

use crate::context::RequestContext;
use crate::services::ParcelService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateParcelRequest {
    pub shipment_type: ShipmentType,
    pub origin_office_id: OfficeId,
    pub destination_office_id: OfficeId,
    pub sender_person_id: PersonId,
    pub recipient_person_id: PersonId,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub package_key: String,
    #[serde(default)]
    pub package_key_confirm: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRequest {
    pub vehicle_id: VehicleId,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub departure_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartRequest {
    pub departure_office_id: OfficeId,
    #[serde(default)]
    pub vehicle_id: Option<VehicleId>,
    /// Defaults to the time of the request.
    #[serde(default)]
    pub departed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArriveRequest {
    pub destination_office_id: OfficeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverRequest {
    pub package_key: String,
}

impl ParcelService {
    /// Create a parcel in `CREATED` with a fresh tracking code.
    pub fn create_parcel(
        &self,
        ctx: &RequestContext,
        request: CreateParcelRequest,
    ) -> DomainResult<Parcel> {
        let options = self.options_for(ctx.tenant_id());
        let now = self.now();

        let cmd = CreateParcel {
            tenant_id: ctx.tenant_id().clone(),
            parcel_id: ParcelId::new(),
            tracking_code: String::new(),
            shipment_type: request.shipment_type,
            origin_office_id: request.origin_office_id,
            destination_office_id: request.destination_office_id,
            sender_person_id: request.sender_person_id,
            recipient_person_id: request.recipient_person_id,
            notes: request.notes,
            package_key: request.package_key,
            package_key_confirm: request.package_key_confirm,
            require_package_key: options.require_package_key,
            user_id: ctx.user_id().clone(),
            user_name: ctx.user_name().map(str::to_string),
            occurred_at: now,
        };

        let parcels = &self.deps.parcels;
        let (parcel, created) = assign_tracking_code(
            self.deps.tracking_codes.as_ref(),
            now,
            self.deps.config.tracking_code_attempts,
            |code: &str| {
                let created = Parcel::create(&CreateParcel {
                    tracking_code: code.to_string(),
                    ..cmd.clone()
                })?;
                if parcels.exists_tracking_code(code)? {
                    return Ok(None);
                }
                // Another create may take the code between the check and the insert.
                match parcels.create(Parcel::from_created(&created)) {
                    Ok(parcel) => Ok(Some((parcel, created))),
                    Err(RepositoryError::Duplicate(what)) => {
                        debug!(%what, "tracking code taken on insert");
                        Ok(None)
                    }
                    Err(err) => Err(err.into()),
                }
            },
        )?;
        self.audit(ParcelEvent::Created(created).to_tracking_event());

        info!(
            tenant_id = %parcel.tenant_id,
            parcel_id = %parcel.id,
            tracking_code = %parcel.tracking_code,
            "parcel created"
        );
        Ok(parcel)
    }

    pub fn register_parcel(&self, ctx: &RequestContext, parcel_id: ParcelId) -> DomainResult<Parcel> {
        let now = self.now();
        self.transition(
            ctx,
            parcel_id,
            ParcelCommand::Register(RegisterParcel {
                tenant_id: ctx.tenant_id().clone(),
                parcel_id,
                user_id: ctx.user_id().clone(),
                user_name: ctx.user_name().map(str::to_string),
                occurred_at: now,
            }),
        )
    }

    pub fn board_parcel(
        &self,
        ctx: &RequestContext,
        parcel_id: ParcelId,
        request: BoardRequest,
    ) -> DomainResult<Parcel> {
        let now = self.now();
        self.transition(
            ctx,
            parcel_id,
            ParcelCommand::Board(BoardParcel {
                tenant_id: ctx.tenant_id().clone(),
                parcel_id,
                vehicle_id: request.vehicle_id,
                trip_id: request.trip_id,
                departure_at: request.departure_at,
                user_id: ctx.user_id().clone(),
                user_name: ctx.user_name().map(str::to_string),
                occurred_at: now,
            }),
        )
    }

    pub fn depart_parcel(
        &self,
        ctx: &RequestContext,
        parcel_id: ParcelId,
        request: DepartRequest,
    ) -> DomainResult<Parcel> {
        let departed_at = request.departed_at.unwrap_or_else(|| self.now());
        self.transition(
            ctx,
            parcel_id,
            ParcelCommand::Depart(DepartParcel {
                tenant_id: ctx.tenant_id().clone(),
                parcel_id,
                departure_office_id: request.departure_office_id,
                vehicle_id: request.vehicle_id,
                user_id: ctx.user_id().clone(),
                user_name: ctx.user_name().map(str::to_string),
                occurred_at: departed_at,
            }),
        )
    }

    pub fn arrive_parcel(
        &self,
        ctx: &RequestContext,
        parcel_id: ParcelId,
        request: ArriveRequest,
    ) -> DomainResult<Parcel> {
        let now = self.now();
        self.transition(
            ctx,
            parcel_id,
            ParcelCommand::Arrive(ArriveParcel {
                tenant_id: ctx.tenant_id().clone(),
                parcel_id,
                destination_office_id: request.destination_office_id,
                user_id: ctx.user_id().clone(),
                user_name: ctx.user_name().map(str::to_string),
                occurred_at: now,
            }),
        )
    }

    pub fn deliver_parcel(
        &self,
        ctx: &RequestContext,
        parcel_id: ParcelId,
        request: DeliverRequest,
    ) -> DomainResult<Parcel> {
        let now = self.now();
        self.transition(
            ctx,
            parcel_id,
            ParcelCommand::Deliver(DeliverParcel {
                tenant_id: ctx.tenant_id().clone(),
                parcel_id,
                package_key: request.package_key,
                user_id: ctx.user_id().clone(),
                user_name: ctx.user_name().map(str::to_string),
                occurred_at: now,
            }),
        )
    }

    /// Load, decide, persist against the loaded version, then audit.
    fn transition(
        &self,
        ctx: &RequestContext,
        parcel_id: ParcelId,
        command: ParcelCommand,
    ) -> DomainResult<Parcel> {
        let mut parcel = self.load_parcel(ctx.tenant_id(), parcel_id)?;
        let events = parcel.handle(&command)?;

        for event in &events {
            let expected = ExpectedVersion::Exact(parcel.version());
            let stored = match event {
                ParcelEvent::Registered(e) => self.deps.parcels.mark_registered(e, expected)?,
                ParcelEvent::Boarded(e) => self.deps.parcels.mark_boarded(e, expected)?,
                ParcelEvent::Departed(e) => self.deps.parcels.mark_in_transit(e, expected)?,
                ParcelEvent::Arrived(e) => self.deps.parcels.mark_arrived(e, expected)?,
                ParcelEvent::Delivered(e) => self.deps.parcels.mark_delivered(e, expected)?,
                ParcelEvent::Created(_) => {
                    return Err(DomainError::internal("creation is not a transition"));
                }
            };
            parcel = stored.ok_or_else(|| DomainError::not_found(format!("parcel {parcel_id}")))?;

            self.audit(event.to_tracking_event());
            info!(
                tenant_id = %parcel.tenant_id,
                parcel_id = %parcel.id,
                event_type = event.event_type(),
                status = %parcel.status(),
                "parcel transitioned"
            );
        }

        Ok(parcel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use parcelhub_core::{TenantId, UserId, error::codes};
    use parcelhub_infra::config::CoreConfig;
    use parcelhub_infra::repository::{
        InMemoryParcelRepository, Page, ParcelFilter, ParcelPage, ParcelRepository,
    };
    use parcelhub_parcels::{
        ParcelArrived, ParcelBoarded, ParcelDelivered, ParcelDeparted, ParcelRegistered,
        ParcelStatus, TrackingCodeGenerator,
    };

    use crate::services::Dependencies;

    struct Scripted(Mutex<Vec<&'static str>>);

    impl TrackingCodeGenerator for Scripted {
        fn candidate(&self, _at: DateTime<Utc>) -> String {
            self.0.lock().unwrap().remove(0).to_string()
        }
    }

    /// Lookups always miss, so only the insert sees a taken code.
    struct StaleLookup(InMemoryParcelRepository);

    impl ParcelRepository for StaleLookup {
        fn create(&self, parcel: Parcel) -> Result<Parcel, RepositoryError> {
            self.0.create(parcel)
        }

        fn get(&self, tenant_id: &TenantId, parcel_id: ParcelId) -> Result<Option<Parcel>, RepositoryError> {
            self.0.get(tenant_id, parcel_id)
        }

        fn exists_tracking_code(&self, _tracking_code: &str) -> Result<bool, RepositoryError> {
            Ok(false)
        }

        fn mark_registered(
            &self,
            event: &ParcelRegistered,
            expected: ExpectedVersion,
        ) -> Result<Option<Parcel>, RepositoryError> {
            self.0.mark_registered(event, expected)
        }

        fn mark_boarded(
            &self,
            event: &ParcelBoarded,
            expected: ExpectedVersion,
        ) -> Result<Option<Parcel>, RepositoryError> {
            self.0.mark_boarded(event, expected)
        }

        fn mark_in_transit(
            &self,
            event: &ParcelDeparted,
            expected: ExpectedVersion,
        ) -> Result<Option<Parcel>, RepositoryError> {
            self.0.mark_in_transit(event, expected)
        }

        fn mark_arrived(
            &self,
            event: &ParcelArrived,
            expected: ExpectedVersion,
        ) -> Result<Option<Parcel>, RepositoryError> {
            self.0.mark_arrived(event, expected)
        }

        fn mark_delivered(
            &self,
            event: &ParcelDelivered,
            expected: ExpectedVersion,
        ) -> Result<Option<Parcel>, RepositoryError> {
            self.0.mark_delivered(event, expected)
        }

        fn list(
            &self,
            tenant_id: &TenantId,
            filter: &ParcelFilter,
            page: Page,
        ) -> Result<ParcelPage, RepositoryError> {
            self.0.list(tenant_id, filter, page)
        }
    }

    fn scripted_service(candidates: Vec<&'static str>, attempts: u32) -> ParcelService {
        let mut deps = Dependencies::in_memory(CoreConfig {
            tracking_code_attempts: attempts,
            ..CoreConfig::default()
        });
        deps.parcels = Arc::new(StaleLookup(InMemoryParcelRepository::new()));
        deps.tracking_codes = Arc::new(Scripted(Mutex::new(candidates)));
        ParcelService::new(deps)
    }

    fn ctx() -> RequestContext {
        RequestContext::new(TenantId::new("T1").unwrap(), UserId::new("clerk-1").unwrap())
            .with_user_name("Clerk One")
    }

    fn request() -> CreateParcelRequest {
        CreateParcelRequest {
            shipment_type: ShipmentType::Bus,
            origin_office_id: OfficeId::new("LIM").unwrap(),
            destination_office_id: OfficeId::new("CUZ").unwrap(),
            sender_person_id: PersonId::new("p-sender").unwrap(),
            recipient_person_id: PersonId::new("p-recipient").unwrap(),
            notes: Some("  fragile ".to_string()),
            package_key: "4821".to_string(),
            package_key_confirm: "4821".to_string(),
        }
    }

    #[test]
    fn create_records_creator_and_trims_notes() {
        let service = ParcelService::in_memory();
        let parcel = service.create_parcel(&ctx(), request()).unwrap();

        assert_eq!(parcel.status(), ParcelStatus::Created);
        assert_eq!(parcel.version(), 1);
        assert_eq!(parcel.notes.as_deref(), Some("fragile"));
        assert_eq!(parcel.created_by_user_name.as_deref(), Some("Clerk One"));
        assert!(parcel.package_key_hash().is_some());
    }

    #[test]
    fn transitions_bump_version_once_each() {
        let service = ParcelService::in_memory();
        let parcel = service.create_parcel(&ctx(), request()).unwrap();

        let parcel = service.register_parcel(&ctx(), parcel.id).unwrap();
        assert_eq!(parcel.version(), 2);

        let parcel = service
            .board_parcel(
                &ctx(),
                parcel.id,
                BoardRequest {
                    vehicle_id: VehicleId::new("BUS-7").unwrap(),
                    trip_id: None,
                    departure_at: None,
                },
            )
            .unwrap();
        assert_eq!(parcel.version(), 3);
        assert_eq!(parcel.status(), ParcelStatus::Boarded);
    }

    #[test]
    fn depart_from_wrong_office_is_origin_mismatch() {
        let service = ParcelService::in_memory();
        let parcel = service.create_parcel(&ctx(), request()).unwrap();
        service.register_parcel(&ctx(), parcel.id).unwrap();
        service
            .board_parcel(
                &ctx(),
                parcel.id,
                BoardRequest {
                    vehicle_id: VehicleId::new("BUS-7").unwrap(),
                    trip_id: None,
                    departure_at: None,
                },
            )
            .unwrap();

        let err = service
            .depart_parcel(
                &ctx(),
                parcel.id,
                DepartRequest {
                    departure_office_id: OfficeId::new("ARE").unwrap(),
                    vehicle_id: None,
                    departed_at: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.as_conflict().unwrap().code, codes::ORIGIN_MISMATCH);

        let stored = service.get_parcel(&ctx(), parcel.id).unwrap();
        assert_eq!(stored.status(), ParcelStatus::Boarded);
    }

    #[test]
    fn code_taken_on_insert_is_retried() {
        let service = scripted_service(vec!["QBAAAAAA", "QBAAAAAA", "QBABBBBB"], 5);
        let first = service.create_parcel(&ctx(), request()).unwrap();
        assert_eq!(first.tracking_code, "QBAAAAAA");

        let second = service.create_parcel(&ctx(), request()).unwrap();
        assert_eq!(second.tracking_code, "QBABBBBB");
        assert_eq!(second.version(), 1);
    }

    #[test]
    fn codes_taken_on_every_insert_exhaust_as_internal() {
        let service = scripted_service(vec!["QBAAAAAA", "QBAAAAAA", "QBAAAAAA"], 2);
        service.create_parcel(&ctx(), request()).unwrap();

        let err = service.create_parcel(&ctx(), request()).unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)), "got {err:?}");
    }

    #[test]
    fn blank_ids_are_rejected_when_decoding_requests() {
        let payload = serde_json::json!({
            "shipment_type": "BUS",
            "origin_office_id": "   ",
            "destination_office_id": "CUZ",
            "sender_person_id": "p-sender",
            "recipient_person_id": "p-recipient",
            "package_key": "4821",
            "package_key_confirm": "4821"
        });
        let err = serde_json::from_value::<CreateParcelRequest>(payload).unwrap_err();
        assert!(err.to_string().contains("office_id is required"));

        let board = serde_json::json!({ "vehicle_id": "" });
        assert!(serde_json::from_value::<BoardRequest>(board).is_err());
    }

    #[test]
    fn unknown_parcel_is_not_found() {
        let service = ParcelService::in_memory();
        let err = service.register_parcel(&ctx(), ParcelId::new()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
