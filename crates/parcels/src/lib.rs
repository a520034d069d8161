//! `parcelhub-parcels`: the parcel aggregate and everything attached to it.
//!
//! Pure domain code: lifecycle state machine, package-key credential,
//! tracking codes, items and their weights, payments, print records and the
//! manifest preview. Persistence and audit emission live elsewhere.

pub mod document;
pub mod item;
pub mod manifest;
pub mod options;
pub mod package_key;
pub mod parcel;
pub mod payment;
pub mod tracking_code;

pub use document::{DocumentType, PrintDecision, PrintRecord, decide_print};
pub use item::{Dimensions, NewParcelItem, ParcelItem, PriceSource, WeightBreakdown, compute_weights};
pub use manifest::{ManifestParcel, ManifestPreview, ManifestTotals};
pub use options::ParcelOptions;
pub use package_key::PackageKeyHash;
pub use parcel::{
    ArriveParcel, BoardParcel, CreateParcel, DeliverParcel, DepartParcel, Parcel, ParcelArrived,
    ParcelBoarded, ParcelCommand, ParcelCreated, ParcelDelivered, ParcelDeparted, ParcelEvent,
    ParcelRegistered, ParcelStatus, RegisterParcel, ShipmentType,
};
pub use payment::{
    ParcelPayment, PaymentChannel, PaymentInput, PaymentStatus, PaymentType,
};
pub use tracking_code::{RandomTrackingCodeGenerator, TrackingCodeGenerator, assign_tracking_code};
