use chrono::{DateTime, Utc};

/// A fact about a parcel that already happened.
///
/// `event_type` is the wire name stored in the audit trail, e.g.
/// `PARCEL_BOARDED`. `version` is the payload schema version.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the transition, not the time it was recorded.
    fn occurred_at(&self) -> DateTime<Utc>;
}
