use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parcelhub_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, OfficeId, ParcelId, PersonId, TenantId,
    UserId, VehicleId,
    error::{codes, Conflict},
};
use parcelhub_events::{Event, TrackingEvent, TrackingEventType};

use crate::package_key::PackageKeyHash;

/// Parcel lifecycle status.
///
/// Declared in lifecycle order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParcelStatus {
    Created,
    Registered,
    Boarded,
    InTransit,
    ArrivedAtDestination,
    Delivered,
}

impl ParcelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::Created => "CREATED",
            ParcelStatus::Registered => "REGISTERED",
            ParcelStatus::Boarded => "BOARDED",
            ParcelStatus::InTransit => "IN_TRANSIT",
            ParcelStatus::ArrivedAtDestination => "ARRIVED_AT_DESTINATION",
            ParcelStatus::Delivered => "DELIVERED",
        }
    }

    /// Items and payments can only change while the parcel is still at the counter.
    pub fn is_open_for_editing(&self) -> bool {
        matches!(self, ParcelStatus::Created | ParcelStatus::Registered)
    }
}

impl core::fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParcelStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Ok(ParcelStatus::Created),
            "REGISTERED" => Ok(ParcelStatus::Registered),
            "BOARDED" => Ok(ParcelStatus::Boarded),
            "IN_TRANSIT" => Ok(ParcelStatus::InTransit),
            "ARRIVED_AT_DESTINATION" => Ok(ParcelStatus::ArrivedAtDestination),
            "DELIVERED" => Ok(ParcelStatus::Delivered),
            other => Err(DomainError::validation(format!("unknown parcel status '{other}'"))),
        }
    }
}

/// How the parcel travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentType {
    /// Hold of a passenger bus.
    Bus,
    /// Dedicated cargo truck.
    Carguero,
}

impl ShipmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentType::Bus => "BUS",
            ShipmentType::Carguero => "CARGUERO",
        }
    }
}

impl core::fmt::Display for ShipmentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUS" => Ok(ShipmentType::Bus),
            "CARGUERO" => Ok(ShipmentType::Carguero),
            other => Err(DomainError::validation(format!(
                "shipment_type must be one of: BUS, CARGUERO (got '{other}')"
            ))),
        }
    }
}

/// Aggregate root: Parcel.
///
/// Stored as a whole record by repositories. State only changes through
/// `apply`, which also bumps `version` for optimistic concurrency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: ParcelId,
    pub tenant_id: TenantId,
    pub tracking_code: String,
    pub shipment_type: ShipmentType,
    pub origin_office_id: OfficeId,
    pub destination_office_id: OfficeId,
    pub sender_person_id: PersonId,
    pub recipient_person_id: PersonId,
    pub notes: Option<String>,
    package_key_hash: Option<PackageKeyHash>,
    status: ParcelStatus,

    pub created_by_user_id: UserId,
    pub created_by_user_name: Option<String>,
    pub created_at: DateTime<Utc>,

    pub registered_at: Option<DateTime<Utc>>,
    pub registered_by_user_id: Option<UserId>,

    pub boarded_vehicle_id: Option<VehicleId>,
    pub boarded_trip_id: Option<String>,
    pub boarded_departure_at: Option<DateTime<Utc>>,
    pub boarded_at: Option<DateTime<Utc>>,
    pub boarded_by_user_id: Option<UserId>,

    pub departed_at: Option<DateTime<Utc>>,
    pub departed_by_user_id: Option<UserId>,

    pub arrived_at: Option<DateTime<Utc>>,
    pub arrived_by_user_id: Option<UserId>,

    pub delivered_at: Option<DateTime<Utc>>,
    pub delivered_by_user_id: Option<UserId>,

    version: u64,
}

impl Parcel {
    /// Materialize a parcel from its creation event (version 1).
    pub fn from_created(event: &ParcelCreated) -> Self {
        let mut parcel = Self::seed(event);
        parcel.version = 1;
        parcel
    }

    fn seed(e: &ParcelCreated) -> Self {
        Self {
            id: e.parcel_id,
            tenant_id: e.tenant_id.clone(),
            tracking_code: e.tracking_code.clone(),
            shipment_type: e.shipment_type,
            origin_office_id: e.origin_office_id.clone(),
            destination_office_id: e.destination_office_id.clone(),
            sender_person_id: e.sender_person_id.clone(),
            recipient_person_id: e.recipient_person_id.clone(),
            notes: e.notes.clone(),
            package_key_hash: e.package_key_hash.clone(),
            status: ParcelStatus::Created,
            created_by_user_id: e.user_id.clone(),
            created_by_user_name: e.user_name.clone(),
            created_at: e.occurred_at,
            registered_at: None,
            registered_by_user_id: None,
            boarded_vehicle_id: None,
            boarded_trip_id: None,
            boarded_departure_at: None,
            boarded_at: None,
            boarded_by_user_id: None,
            departed_at: None,
            departed_by_user_id: None,
            arrived_at: None,
            arrived_by_user_id: None,
            delivered_at: None,
            delivered_by_user_id: None,
            version: 0,
        }
    }

    /// Decide creation of a new parcel.
    ///
    /// The tracking code is assigned by the caller (it needs a uniqueness
    /// check against storage); everything else is validated here.
    pub fn create(cmd: &CreateParcel) -> DomainResult<ParcelCreated> {
        let package_key_hash = PackageKeyHash::for_creation(
            &cmd.package_key,
            &cmd.package_key_confirm,
            cmd.require_package_key,
        )?;

        if cmd.tracking_code.trim().is_empty() {
            return Err(DomainError::internal("tracking code was not assigned"));
        }

        Ok(ParcelCreated {
            tenant_id: cmd.tenant_id.clone(),
            parcel_id: cmd.parcel_id,
            tracking_code: cmd.tracking_code.clone(),
            shipment_type: cmd.shipment_type,
            origin_office_id: cmd.origin_office_id.clone(),
            destination_office_id: cmd.destination_office_id.clone(),
            sender_person_id: cmd.sender_person_id.clone(),
            recipient_person_id: cmd.recipient_person_id.clone(),
            notes: cmd
                .notes
                .as_ref()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            package_key_hash,
            user_id: cmd.user_id.clone(),
            user_name: cmd.user_name.clone(),
            occurred_at: cmd.occurred_at,
        })
    }

    pub fn status(&self) -> ParcelStatus {
        self.status
    }

    pub fn package_key_hash(&self) -> Option<&PackageKeyHash> {
        self.package_key_hash.as_ref()
    }

    /// Guard for item and payment edits.
    pub fn ensure_open_for_editing(&self) -> DomainResult<()> {
        if self.status.is_open_for_editing() {
            Ok(())
        } else {
            Err(DomainError::invalid_state(
                format!("{} or {}", ParcelStatus::Created, ParcelStatus::Registered),
                self.status.as_str(),
            ))
        }
    }

    fn ensure_tenant(&self, tenant_id: &TenantId) -> DomainResult<()> {
        if &self.tenant_id != tenant_id {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_parcel_id(&self, parcel_id: ParcelId) -> DomainResult<()> {
        if self.id != parcel_id {
            return Err(DomainError::invariant("parcel_id mismatch"));
        }
        Ok(())
    }

    fn ensure_status(&self, expected: ParcelStatus) -> DomainResult<()> {
        if self.status != expected {
            return Err(DomainError::invalid_state(expected.as_str(), self.status.as_str()));
        }
        Ok(())
    }
}

impl AggregateRoot for Parcel {
    type Id = ParcelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateParcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateParcel {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub tracking_code: String,
    pub shipment_type: ShipmentType,
    pub origin_office_id: OfficeId,
    pub destination_office_id: OfficeId,
    pub sender_person_id: PersonId,
    pub recipient_person_id: PersonId,
    pub notes: Option<String>,
    pub package_key: String,
    pub package_key_confirm: String,
    /// Tenant policy in effect for this request.
    pub require_package_key: bool,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RegisterParcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterParcel {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: BoardParcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardParcel {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub vehicle_id: VehicleId,
    pub trip_id: Option<String>,
    /// Scheduled departure of the vehicle.
    pub departure_at: Option<DateTime<Utc>>,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DepartParcel. `occurred_at` is the departure time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartParcel {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub departure_office_id: OfficeId,
    pub vehicle_id: Option<VehicleId>,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ArriveParcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArriveParcel {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub destination_office_id: OfficeId,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeliverParcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverParcel {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    /// Raw credential presented by the recipient; never stored.
    pub package_key: String,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParcelCommand {
    Register(RegisterParcel),
    Board(BoardParcel),
    Depart(DepartParcel),
    Arrive(ArriveParcel),
    Deliver(DeliverParcel),
}

/// Event: ParcelCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelCreated {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub tracking_code: String,
    pub shipment_type: ShipmentType,
    pub origin_office_id: OfficeId,
    pub destination_office_id: OfficeId,
    pub sender_person_id: PersonId,
    pub recipient_person_id: PersonId,
    pub notes: Option<String>,
    pub package_key_hash: Option<PackageKeyHash>,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ParcelRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelRegistered {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ParcelBoarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelBoarded {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub vehicle_id: VehicleId,
    pub trip_id: Option<String>,
    pub departure_at: Option<DateTime<Utc>>,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ParcelDeparted (the parcel is now in transit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelDeparted {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub departure_office_id: OfficeId,
    /// Vehicle supplied with the departure, if any.
    pub vehicle_id: Option<VehicleId>,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ParcelArrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelArrived {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub destination_office_id: OfficeId,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ParcelDelivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelDelivered {
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParcelEvent {
    Created(ParcelCreated),
    Registered(ParcelRegistered),
    Boarded(ParcelBoarded),
    Departed(ParcelDeparted),
    Arrived(ParcelArrived),
    Delivered(ParcelDelivered),
}

impl ParcelEvent {
    pub fn tracking_type(&self) -> TrackingEventType {
        match self {
            ParcelEvent::Created(_) => TrackingEventType::ParcelCreated,
            ParcelEvent::Registered(_) => TrackingEventType::ParcelRegistered,
            ParcelEvent::Boarded(_) => TrackingEventType::ParcelBoarded,
            ParcelEvent::Departed(_) => TrackingEventType::ParcelInTransit,
            ParcelEvent::Arrived(_) => TrackingEventType::ParcelArrivedDestination,
            ParcelEvent::Delivered(_) => TrackingEventType::ParcelDelivered,
        }
    }

    pub fn parcel_id(&self) -> ParcelId {
        match self {
            ParcelEvent::Created(e) => e.parcel_id,
            ParcelEvent::Registered(e) => e.parcel_id,
            ParcelEvent::Boarded(e) => e.parcel_id,
            ParcelEvent::Departed(e) => e.parcel_id,
            ParcelEvent::Arrived(e) => e.parcel_id,
            ParcelEvent::Delivered(e) => e.parcel_id,
        }
    }

    /// Audit record for this transition, with its transition-specific metadata.
    pub fn to_tracking_event(&self) -> TrackingEvent {
        match self {
            ParcelEvent::Created(e) => TrackingEvent::new(
                e.tenant_id.clone(),
                e.parcel_id,
                self.tracking_type(),
                e.occurred_at,
                e.user_id.clone(),
                e.user_name.clone(),
            )
            .with("shipment_type", e.shipment_type.as_str())
            .with("origin_office_id", e.origin_office_id.as_str())
            .with("destination_office_id", e.destination_office_id.as_str()),
            ParcelEvent::Registered(e) => TrackingEvent::new(
                e.tenant_id.clone(),
                e.parcel_id,
                self.tracking_type(),
                e.occurred_at,
                e.user_id.clone(),
                e.user_name.clone(),
            ),
            ParcelEvent::Boarded(e) => TrackingEvent::new(
                e.tenant_id.clone(),
                e.parcel_id,
                self.tracking_type(),
                e.occurred_at,
                e.user_id.clone(),
                e.user_name.clone(),
            )
            .with("vehicle_id", e.vehicle_id.as_str())
            .with_opt("trip_id", e.trip_id.clone())
            .with_opt("departure_at", e.departure_at.map(|t| t.to_rfc3339())),
            ParcelEvent::Departed(e) => TrackingEvent::new(
                e.tenant_id.clone(),
                e.parcel_id,
                self.tracking_type(),
                e.occurred_at,
                e.user_id.clone(),
                e.user_name.clone(),
            )
            .with("departure_office_id", e.departure_office_id.as_str())
            .with_time("departed_at", e.occurred_at)
            .with("departed_by_user_id", e.user_id.as_str())
            .with_opt("vehicle_id", e.vehicle_id.as_ref().map(|v| v.as_str().to_string())),
            ParcelEvent::Arrived(e) => TrackingEvent::new(
                e.tenant_id.clone(),
                e.parcel_id,
                self.tracking_type(),
                e.occurred_at,
                e.user_id.clone(),
                e.user_name.clone(),
            )
            .with("destination_office_id", e.destination_office_id.as_str())
            .with_time("arrived_at", e.occurred_at)
            .with("arrived_by_user_id", e.user_id.as_str()),
            ParcelEvent::Delivered(e) => TrackingEvent::new(
                e.tenant_id.clone(),
                e.parcel_id,
                self.tracking_type(),
                e.occurred_at,
                e.user_id.clone(),
                e.user_name.clone(),
            )
            .with_time("delivered_at", e.occurred_at)
            .with("delivered_by_user_id", e.user_id.as_str()),
        }
    }
}

impl Event for ParcelEvent {
    fn event_type(&self) -> &'static str {
        self.tracking_type().as_str()
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ParcelEvent::Created(e) => e.occurred_at,
            ParcelEvent::Registered(e) => e.occurred_at,
            ParcelEvent::Boarded(e) => e.occurred_at,
            ParcelEvent::Departed(e) => e.occurred_at,
            ParcelEvent::Arrived(e) => e.occurred_at,
            ParcelEvent::Delivered(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Parcel {
    type Command = ParcelCommand;
    type Event = ParcelEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ParcelEvent::Created(e) => {
                *self = Parcel::seed(e);
            }
            ParcelEvent::Registered(e) => {
                self.status = ParcelStatus::Registered;
                self.registered_at = Some(e.occurred_at);
                self.registered_by_user_id = Some(e.user_id.clone());
            }
            ParcelEvent::Boarded(e) => {
                self.status = ParcelStatus::Boarded;
                self.boarded_vehicle_id = Some(e.vehicle_id.clone());
                self.boarded_trip_id = e.trip_id.clone();
                self.boarded_departure_at = e.departure_at;
                self.boarded_at = Some(e.occurred_at);
                self.boarded_by_user_id = Some(e.user_id.clone());
            }
            ParcelEvent::Departed(e) => {
                self.status = ParcelStatus::InTransit;
                self.departed_at = Some(e.occurred_at);
                self.departed_by_user_id = Some(e.user_id.clone());
                if self.boarded_vehicle_id.is_none() {
                    self.boarded_vehicle_id = e.vehicle_id.clone();
                }
            }
            ParcelEvent::Arrived(e) => {
                self.status = ParcelStatus::ArrivedAtDestination;
                self.arrived_at = Some(e.occurred_at);
                self.arrived_by_user_id = Some(e.user_id.clone());
            }
            ParcelEvent::Delivered(e) => {
                self.status = ParcelStatus::Delivered;
                self.delivered_at = Some(e.occurred_at);
                self.delivered_by_user_id = Some(e.user_id.clone());
            }
        }

        // +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ParcelCommand::Register(cmd) => self.handle_register(cmd),
            ParcelCommand::Board(cmd) => self.handle_board(cmd),
            ParcelCommand::Depart(cmd) => self.handle_depart(cmd),
            ParcelCommand::Arrive(cmd) => self.handle_arrive(cmd),
            ParcelCommand::Deliver(cmd) => self.handle_deliver(cmd),
        }
    }
}

impl Parcel {
    fn handle_register(&self, cmd: &RegisterParcel) -> DomainResult<Vec<ParcelEvent>> {
        self.ensure_tenant(&cmd.tenant_id)?;
        self.ensure_parcel_id(cmd.parcel_id)?;
        self.ensure_status(ParcelStatus::Created)?;

        Ok(vec![ParcelEvent::Registered(ParcelRegistered {
            tenant_id: cmd.tenant_id.clone(),
            parcel_id: cmd.parcel_id,
            user_id: cmd.user_id.clone(),
            user_name: cmd.user_name.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_board(&self, cmd: &BoardParcel) -> DomainResult<Vec<ParcelEvent>> {
        self.ensure_tenant(&cmd.tenant_id)?;
        self.ensure_parcel_id(cmd.parcel_id)?;
        self.ensure_status(ParcelStatus::Registered)?;

        Ok(vec![ParcelEvent::Boarded(ParcelBoarded {
            tenant_id: cmd.tenant_id.clone(),
            parcel_id: cmd.parcel_id,
            vehicle_id: cmd.vehicle_id.clone(),
            trip_id: cmd
                .trip_id
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            departure_at: cmd.departure_at,
            user_id: cmd.user_id.clone(),
            user_name: cmd.user_name.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_depart(&self, cmd: &DepartParcel) -> DomainResult<Vec<ParcelEvent>> {
        self.ensure_tenant(&cmd.tenant_id)?;
        self.ensure_parcel_id(cmd.parcel_id)?;
        // Status gates first: office mismatches are only reported for BOARDED parcels.
        self.ensure_status(ParcelStatus::Boarded)?;

        if cmd.departure_office_id != self.origin_office_id {
            return Err(DomainError::Conflict(
                Conflict::new(
                    codes::ORIGIN_MISMATCH,
                    "departure office does not match the parcel origin",
                )
                .expected(self.origin_office_id.as_str())
                .actual(cmd.departure_office_id.as_str()),
            ));
        }

        if let (Some(supplied), Some(boarded)) = (&cmd.vehicle_id, &self.boarded_vehicle_id) {
            if supplied != boarded {
                return Err(DomainError::Conflict(
                    Conflict::new(
                        codes::VEHICLE_MISMATCH,
                        "vehicle does not match the boarded vehicle",
                    )
                    .expected(boarded.as_str())
                    .actual(supplied.as_str()),
                ));
            }
        }

        Ok(vec![ParcelEvent::Departed(ParcelDeparted {
            tenant_id: cmd.tenant_id.clone(),
            parcel_id: cmd.parcel_id,
            departure_office_id: cmd.departure_office_id.clone(),
            vehicle_id: cmd.vehicle_id.clone(),
            user_id: cmd.user_id.clone(),
            user_name: cmd.user_name.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_arrive(&self, cmd: &ArriveParcel) -> DomainResult<Vec<ParcelEvent>> {
        self.ensure_tenant(&cmd.tenant_id)?;
        self.ensure_parcel_id(cmd.parcel_id)?;
        // Arrival advances straight from BOARDED; IN_TRANSIT is not a prerequisite.
        // Status gates first: office mismatches are only reported for BOARDED parcels.
        self.ensure_status(ParcelStatus::Boarded)?;

        if cmd.destination_office_id != self.destination_office_id {
            return Err(DomainError::Conflict(
                Conflict::new(
                    codes::DESTINATION_MISMATCH,
                    "arrival office does not match the parcel destination",
                )
                .expected(self.destination_office_id.as_str())
                .actual(cmd.destination_office_id.as_str()),
            ));
        }

        Ok(vec![ParcelEvent::Arrived(ParcelArrived {
            tenant_id: cmd.tenant_id.clone(),
            parcel_id: cmd.parcel_id,
            destination_office_id: cmd.destination_office_id.clone(),
            user_id: cmd.user_id.clone(),
            user_name: cmd.user_name.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deliver(&self, cmd: &DeliverParcel) -> DomainResult<Vec<ParcelEvent>> {
        self.ensure_tenant(&cmd.tenant_id)?;
        self.ensure_parcel_id(cmd.parcel_id)?;

        if cmd.package_key.trim().is_empty() {
            return Err(DomainError::validation("package_key is required"));
        }

        // Delivery may short-circuit transit and arrival.
        if !matches!(self.status, ParcelStatus::Registered | ParcelStatus::Boarded) {
            return Err(DomainError::invalid_state(
                format!("{} or {}", ParcelStatus::Registered, ParcelStatus::Boarded),
                self.status.as_str(),
            ));
        }

        let verified = self
            .package_key_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(&cmd.package_key));
        if !verified {
            return Err(DomainError::forbidden("invalid package key"));
        }

        Ok(vec![ParcelEvent::Delivered(ParcelDelivered {
            tenant_id: cmd.tenant_id.clone(),
            parcel_id: cmd.parcel_id,
            user_id: cmd.user_id.clone(),
            user_name: cmd.user_name.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_tenant_id() -> TenantId {
        TenantId::new("T1").unwrap()
    }

    fn test_user_id() -> UserId {
        UserId::new("clerk-1").unwrap()
    }

    fn office(s: &str) -> OfficeId {
        OfficeId::new(s).unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn create_cmd(parcel_id: ParcelId) -> CreateParcel {
        CreateParcel {
            tenant_id: test_tenant_id(),
            parcel_id,
            tracking_code: "QBAK7M2P".to_string(),
            shipment_type: ShipmentType::Bus,
            origin_office_id: office("LIM"),
            destination_office_id: office("CUZ"),
            sender_person_id: PersonId::new("p-sender").unwrap(),
            recipient_person_id: PersonId::new("p-recipient").unwrap(),
            notes: Some("  fragile ".to_string()),
            package_key: "abc123".to_string(),
            package_key_confirm: "abc123".to_string(),
            require_package_key: true,
            user_id: test_user_id(),
            user_name: Some("Clerk".to_string()),
            occurred_at: test_time(),
        }
    }

    fn created_parcel() -> Parcel {
        let parcel_id = ParcelId::new();
        let event = Parcel::create(&create_cmd(parcel_id)).unwrap();
        Parcel::from_created(&event)
    }

    fn run(parcel: &mut Parcel, cmd: ParcelCommand) -> DomainResult<()> {
        let events = parcel.handle(&cmd)?;
        for e in &events {
            parcel.apply(e);
        }
        Ok(())
    }

    fn register(parcel_id: ParcelId) -> ParcelCommand {
        ParcelCommand::Register(RegisterParcel {
            tenant_id: test_tenant_id(),
            parcel_id,
            user_id: test_user_id(),
            user_name: None,
            occurred_at: test_time(),
        })
    }

    fn board(parcel_id: ParcelId, vehicle: &str) -> ParcelCommand {
        ParcelCommand::Board(BoardParcel {
            tenant_id: test_tenant_id(),
            parcel_id,
            vehicle_id: VehicleId::new(vehicle).unwrap(),
            trip_id: Some("TRIP-9".to_string()),
            departure_at: None,
            user_id: test_user_id(),
            user_name: None,
            occurred_at: test_time(),
        })
    }

    fn depart(parcel_id: ParcelId, origin: &str, vehicle: Option<&str>) -> ParcelCommand {
        ParcelCommand::Depart(DepartParcel {
            tenant_id: test_tenant_id(),
            parcel_id,
            departure_office_id: office(origin),
            vehicle_id: vehicle.map(|v| VehicleId::new(v).unwrap()),
            user_id: test_user_id(),
            user_name: None,
            occurred_at: test_time(),
        })
    }

    fn arrive(parcel_id: ParcelId, destination: &str) -> ParcelCommand {
        ParcelCommand::Arrive(ArriveParcel {
            tenant_id: test_tenant_id(),
            parcel_id,
            destination_office_id: office(destination),
            user_id: test_user_id(),
            user_name: None,
            occurred_at: test_time(),
        })
    }

    fn deliver(parcel_id: ParcelId, key: &str) -> ParcelCommand {
        ParcelCommand::Deliver(DeliverParcel {
            tenant_id: test_tenant_id(),
            parcel_id,
            package_key: key.to_string(),
            user_id: test_user_id(),
            user_name: None,
            occurred_at: test_time(),
        })
    }

    fn expect_invalid_state(err: DomainError, expected: &str, actual: &str) {
        match err {
            DomainError::Conflict(c) if c.code == codes::INVALID_STATE => {
                assert_eq!(c.expected.as_deref(), Some(expected));
                assert_eq!(c.actual.as_deref(), Some(actual));
            }
            other => panic!("Expected invalid_state conflict, got {other:?}"),
        }
    }

    #[test]
    fn create_hashes_key_and_starts_in_created() {
        let parcel = created_parcel();
        assert_eq!(parcel.status(), ParcelStatus::Created);
        assert_eq!(parcel.version(), 1);
        assert_eq!(parcel.notes.as_deref(), Some("fragile"));
        let hash = parcel.package_key_hash().unwrap();
        assert!(hash.verify("abc123"));
        assert_ne!(hash.as_str(), "abc123");
    }

    #[test]
    fn create_rejects_mismatched_confirmation() {
        let mut cmd = create_cmd(ParcelId::new());
        cmd.package_key_confirm = "xyz999".to_string();
        match Parcel::create(&cmd).unwrap_err() {
            DomainError::Validation(msg) if msg.contains("do not match") => {}
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn create_without_key_is_allowed_when_policy_disables_requirement() {
        let mut cmd = create_cmd(ParcelId::new());
        cmd.package_key = String::new();
        cmd.package_key_confirm = String::new();
        cmd.require_package_key = false;
        let event = Parcel::create(&cmd).unwrap();
        assert!(event.package_key_hash.is_none());
    }

    #[test]
    fn register_from_created_emits_registered_event() {
        let parcel = created_parcel();
        let id = parcel.id;
        let events = parcel.handle(&register(id)).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ParcelEvent::Registered(e) => assert_eq!(e.parcel_id, parcel.id),
            _ => panic!("Expected Registered event"),
        }
    }

    #[test]
    fn skipping_a_state_is_an_invalid_state_conflict() {
        let parcel = created_parcel();
        let id = parcel.id;
        let err = parcel.handle(&board(id, "BUS-1")).unwrap_err();
        expect_invalid_state(err, "REGISTERED", "CREATED");
    }

    #[test]
    fn depart_requires_origin_office() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();
        run(&mut parcel, board(id, "BUS-1")).unwrap();

        let err = parcel.handle(&depart(id, "AQP", None)).unwrap_err();
        match err {
            DomainError::Conflict(c) if c.code == codes::ORIGIN_MISMATCH => {
                assert_eq!(c.expected.as_deref(), Some("LIM"));
                assert_eq!(c.actual.as_deref(), Some("AQP"));
            }
            other => panic!("Expected origin_mismatch, got {other:?}"),
        }
    }

    #[test]
    fn wrong_status_is_reported_before_office_mismatch() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();

        let err = parcel.handle(&depart(id, "AQP", None)).unwrap_err();
        expect_invalid_state(err, "BOARDED", "REGISTERED");
        let err = parcel.handle(&arrive(id, "AQP")).unwrap_err();
        expect_invalid_state(err, "BOARDED", "REGISTERED");
    }

    #[test]
    fn depart_rejects_other_vehicle() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();
        run(&mut parcel, board(id, "BUS-1")).unwrap();

        let err = parcel
            .handle(&depart(id, "LIM", Some("BUS-2")))
            .unwrap_err();
        assert_eq!(err.as_conflict().unwrap().code, codes::VEHICLE_MISMATCH);

        run(&mut parcel, depart(id, "LIM", Some("BUS-1"))).unwrap();
        assert_eq!(parcel.status(), ParcelStatus::InTransit);
        assert!(parcel.departed_at.is_some());
    }

    #[test]
    fn arrival_is_validated_against_boarded() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();
        run(&mut parcel, board(id, "BUS-1")).unwrap();

        let err = parcel.handle(&arrive(id, "LIM")).unwrap_err();
        assert_eq!(err.as_conflict().unwrap().code, codes::DESTINATION_MISMATCH);

        run(&mut parcel, arrive(id, "CUZ")).unwrap();
        assert_eq!(parcel.status(), ParcelStatus::ArrivedAtDestination);
    }

    #[test]
    fn arrival_after_departure_is_rejected() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();
        run(&mut parcel, board(id, "BUS-1")).unwrap();
        run(&mut parcel, depart(id, "LIM", None)).unwrap();

        let err = parcel.handle(&arrive(id, "CUZ")).unwrap_err();
        expect_invalid_state(err, "BOARDED", "IN_TRANSIT");
    }

    #[test]
    fn deliver_with_wrong_key_is_forbidden() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();

        match parcel.handle(&deliver(id, "nope")).unwrap_err() {
            DomainError::Forbidden(_) => {}
            other => panic!("Expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn deliver_twice_is_a_conflict_and_leaves_state_unchanged() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();
        run(&mut parcel, deliver(id, "abc123")).unwrap();
        assert_eq!(parcel.status(), ParcelStatus::Delivered);
        let snapshot = parcel.clone();

        let err = run(&mut parcel, deliver(id, "abc123")).unwrap_err();
        expect_invalid_state(err, "REGISTERED or BOARDED", "DELIVERED");
        assert_eq!(parcel, snapshot);
    }

    #[test]
    fn deliver_from_boarded_with_key_succeeds() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();
        run(&mut parcel, board(id, "BUS-1")).unwrap();

        run(&mut parcel, deliver(id, "abc123")).unwrap();
        assert_eq!(parcel.status(), ParcelStatus::Delivered);
        assert_eq!(parcel.version(), 4);
        assert!(parcel.delivered_at.is_some());
    }

    #[test]
    fn deliver_with_right_key_outside_registered_or_boarded_is_invalid_state() {
        let parcel = created_parcel();
        let id = parcel.id;
        let err = parcel.handle(&deliver(id, "abc123")).unwrap_err();
        expect_invalid_state(err, "REGISTERED or BOARDED", "CREATED");

        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();
        run(&mut parcel, board(id, "BUS-1")).unwrap();
        run(&mut parcel, depart(id, "LIM", None)).unwrap();
        let err = parcel.handle(&deliver(id, "abc123")).unwrap_err();
        expect_invalid_state(err, "REGISTERED or BOARDED", "IN_TRANSIT");
    }

    #[test]
    fn deliver_without_stored_hash_is_forbidden() {
        let mut cmd = create_cmd(ParcelId::new());
        cmd.package_key = String::new();
        cmd.package_key_confirm = String::new();
        cmd.require_package_key = false;
        let mut parcel = Parcel::from_created(&Parcel::create(&cmd).unwrap());
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();

        match parcel.handle(&deliver(id, "anything")).unwrap_err() {
            DomainError::Forbidden(_) => {}
            other => panic!("Expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn tenant_mismatch_is_an_invariant_violation() {
        let parcel = created_parcel();
        let cmd = ParcelCommand::Register(RegisterParcel {
            tenant_id: TenantId::new("T2").unwrap(),
            parcel_id: parcel.id,
            user_id: test_user_id(),
            user_name: None,
            occurred_at: test_time(),
        });
        match parcel.handle(&cmd).unwrap_err() {
            DomainError::InvariantViolation(msg) if msg.contains("tenant") => {}
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn version_increments_on_apply() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        assert_eq!(parcel.version(), 1);
        run(&mut parcel, register(id)).unwrap();
        assert_eq!(parcel.version(), 2);
        run(&mut parcel, board(id, "BUS-1")).unwrap();
        assert_eq!(parcel.version(), 3);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let parcel = created_parcel();
        let id = parcel.id;
        let before = parcel.clone();
        let events1 = parcel.handle(&register(id)).unwrap();
        assert_eq!(parcel, before);
        assert_eq!(events1.len(), 1);
    }

    #[test]
    fn boarded_audit_event_carries_vehicle_and_trip() {
        let mut parcel = created_parcel();
        let id = parcel.id;
        run(&mut parcel, register(id)).unwrap();
        let events = parcel.handle(&board(id, "BUS-1")).unwrap();
        let audit = events[0].to_tracking_event();
        assert_eq!(audit.event_type, TrackingEventType::ParcelBoarded);
        assert_eq!(events[0].event_type(), audit.event_type.as_str());
        assert_eq!(events[0].occurred_at(), audit.occurred_at);
        assert_eq!(audit.metadata["vehicle_id"], "BUS-1");
        assert_eq!(audit.metadata["trip_id"], "TRIP-9");
        assert!(!audit.metadata.contains_key("departure_at"));
    }

    #[test]
    fn status_parses_wire_names() {
        assert_eq!(
            "arrived_at_destination".parse::<ParcelStatus>().unwrap(),
            ParcelStatus::ArrivedAtDestination
        );
        assert!("LOST".parse::<ParcelStatus>().is_err());
        assert!("plane".parse::<ShipmentType>().is_err());
    }

    fn all_commands(parcel_id: ParcelId) -> Vec<(ParcelCommand, ParcelStatus)> {
        vec![
            (register(parcel_id), ParcelStatus::Created),
            (board(parcel_id, "BUS-1"), ParcelStatus::Registered),
            (depart(parcel_id, "LIM", None), ParcelStatus::Boarded),
            (arrive(parcel_id, "CUZ"), ParcelStatus::Boarded),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Any command sequence only ever moves status forward. A command
        /// succeeds exactly when the parcel is in a status that accepts it,
        /// and a rejected one names the status it needed.
        #[test]
        fn status_never_moves_backwards(steps in prop::collection::vec(0usize..5, 1..12)) {
            let mut parcel = created_parcel();
            let id = parcel.id;
            for step in steps {
                let before = parcel.status();
                let (cmd, required) = if step == 4 {
                    (deliver(id, "abc123"), None)
                } else {
                    let (cmd, required) = all_commands(id).swap_remove(step);
                    (cmd, Some(required))
                };
                let accepted = match required {
                    Some(required) => before == required,
                    None => matches!(before, ParcelStatus::Registered | ParcelStatus::Boarded),
                };
                let result = run(&mut parcel, cmd);
                prop_assert_eq!(result.is_ok(), accepted);
                match result {
                    Ok(()) => prop_assert!(parcel.status() > before),
                    Err(err) => {
                        prop_assert_eq!(parcel.status(), before);
                        let conflict = err.as_conflict().cloned();
                        prop_assert!(conflict.is_some());
                        let conflict = conflict.unwrap();
                        prop_assert_eq!(conflict.code.as_str(), codes::INVALID_STATE);
                        let expected = required
                            .map(|r| r.as_str().to_string())
                            .unwrap_or_else(|| "REGISTERED or BOARDED".to_string());
                        prop_assert_eq!(conflict.expected, Some(expected));
                    }
                }
            }
        }
    }
}
