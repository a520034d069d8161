//! Application services for the parcel platform.
//!
//! The transport layer authenticates a [`RequestContext`] and calls one
//! method per operation on [`ParcelService`]. Each method reads through the
//! repositories, resolves tenant policy once, applies domain rules and emits
//! its audit event best-effort.

pub mod context;
pub mod documents;
pub mod items;
pub mod lifecycle;
pub mod manifest;
pub mod payments;
pub mod pricing;
pub mod queries;
pub mod services;
pub mod tracking;

pub use context::RequestContext;
pub use documents::PrintResult;
pub use lifecycle::{ArriveRequest, BoardRequest, CreateParcelRequest, DeliverRequest, DepartRequest};
pub use services::{Dependencies, ParcelService};
pub use tracking::ParcelSummary;
