//! `parcelhub-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the parcel and
//! pricing crates (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{Conflict, DomainError, DomainResult, ErrorKind};
pub use id::{
    OfficeId, ParcelId, ParcelItemId, PaymentId, PersonId, PriceRuleId, PrintRecordId, TenantId,
    TrackingEventId, UserId, VehicleId,
};
pub use value_object::{Currency, ValueObject};
