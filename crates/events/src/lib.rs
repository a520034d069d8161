//! Audit events for parcel activity and the sink they are recorded into.

pub mod event;
pub mod in_memory_log;
pub mod recorder;
pub mod tenant;
pub mod tracking;

pub use event::Event;
pub use in_memory_log::InMemoryTrackingLog;
pub use recorder::{RecorderError, TrackingReader, TrackingRecorder};
pub use tenant::TenantScoped;
pub use tracking::{Metadata, TrackingEvent, TrackingEventType};
