use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use parcelhub_core::{ParcelId, TenantId, TrackingEventId, UserId};

use crate::Event;

/// Transition-specific details attached to an audit event.
pub type Metadata = BTreeMap<String, JsonValue>;

/// Kind of parcel activity recorded in the audit trail.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingEventType {
    ParcelCreated,
    ParcelRegistered,
    ParcelBoarded,
    ParcelInTransit,
    ParcelArrivedDestination,
    ParcelDelivered,
    ParcelItemAdded,
    ParcelItemRemoved,
}

impl TrackingEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingEventType::ParcelCreated => "PARCEL_CREATED",
            TrackingEventType::ParcelRegistered => "PARCEL_REGISTERED",
            TrackingEventType::ParcelBoarded => "PARCEL_BOARDED",
            TrackingEventType::ParcelInTransit => "PARCEL_IN_TRANSIT",
            TrackingEventType::ParcelArrivedDestination => "PARCEL_ARRIVED_DESTINATION",
            TrackingEventType::ParcelDelivered => "PARCEL_DELIVERED",
            TrackingEventType::ParcelItemAdded => "PARCEL_ITEM_ADDED",
            TrackingEventType::ParcelItemRemoved => "PARCEL_ITEM_REMOVED",
        }
    }
}

impl core::fmt::Display for TrackingEventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable entry of a parcel's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub id: TrackingEventId,
    pub tenant_id: TenantId,
    pub parcel_id: ParcelId,
    pub event_type: TrackingEventType,
    pub occurred_at: DateTime<Utc>,
    pub user_id: UserId,
    pub user_name: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl TrackingEvent {
    pub fn new(
        tenant_id: TenantId,
        parcel_id: ParcelId,
        event_type: TrackingEventType,
        occurred_at: DateTime<Utc>,
        user_id: UserId,
        user_name: Option<String>,
    ) -> Self {
        Self {
            id: TrackingEventId::new(),
            tenant_id,
            parcel_id,
            event_type,
            occurred_at,
            user_id,
            user_name,
            metadata: Metadata::new(),
        }
    }

    /// Attach one metadata entry.
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Attach a metadata entry only when a value is present.
    pub fn with_opt<V: Into<JsonValue>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Attach a timestamp in RFC 3339.
    pub fn with_time(self, key: &str, at: DateTime<Utc>) -> Self {
        self.with(key, at.to_rfc3339())
    }
}

impl Event for TrackingEvent {
    fn event_type(&self) -> &'static str {
        self.event_type.as_str()
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
