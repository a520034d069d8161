//! Strongly-typed identifiers used across the domain.
//!
//! Tenant, user, office, person and vehicle identifiers come from outside
//! the system and are opaque trimmed strings. Entities owned by this system
//! use UUIDv7.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a tenant (multi-tenant boundary).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

/// Identifier of a user (actor identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// Identifier of a branch office (origin, destination, counter).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OfficeId(String);

/// Identifier of a sender or recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonId(String);

/// Identifier of a vehicle a parcel is boarded on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VehicleId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Build an identifier from raw input; surrounding whitespace is dropped.
            pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{} is required", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_string_newtype!(TenantId, "tenant_id");
impl_string_newtype!(UserId, "user_id");
impl_string_newtype!(OfficeId, "office_id");
impl_string_newtype!(PersonId, "person_id");
impl_string_newtype!(VehicleId, "vehicle_id");

/// Identifier of a parcel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelId(Uuid);

/// Identifier of an item inside a parcel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelItemId(Uuid);

/// Identifier of a price rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceRuleId(Uuid);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrintRecordId(Uuid);

/// Identifier of an audit (tracking) event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingEventId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(ParcelId, "parcel_id");
impl_uuid_newtype!(ParcelItemId, "item_id");
impl_uuid_newtype!(PriceRuleId, "price_rule_id");
impl_uuid_newtype!(PaymentId, "payment_id");
impl_uuid_newtype!(PrintRecordId, "print_id");
impl_uuid_newtype!(TrackingEventId, "tracking_event_id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ids_are_trimmed() {
        let office = OfficeId::new("  LIM-01 ").unwrap();
        assert_eq!(office.as_str(), "LIM-01");
    }

    #[test]
    fn blank_string_ids_are_rejected() {
        match TenantId::new("   ") {
            Err(DomainError::InvalidId(msg)) if msg.contains("tenant_id") => {}
            other => panic!("Expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn string_ids_deserialize_through_validation() {
        let office: OfficeId = serde_json::from_str("\" LIM-01 \"").unwrap();
        assert_eq!(office.as_str(), "LIM-01");
        assert_eq!(serde_json::to_string(&office).unwrap(), "\"LIM-01\"");

        let err = serde_json::from_str::<TenantId>("\"  \"").unwrap_err();
        assert!(err.to_string().contains("tenant_id is required"));
        assert!(serde_json::from_str::<VehicleId>("\"\"").is_err());
        assert!(serde_json::from_str::<PersonId>("\"\\t\"").is_err());
    }

    #[test]
    fn uuid_ids_round_trip_through_display() {
        let id = ParcelId::new();
        let parsed: ParcelId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<ParcelId>().is_err());
    }
}
