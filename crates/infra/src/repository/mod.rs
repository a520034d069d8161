//! Repository contracts and their in-memory reference implementations.
//!
//! Every read and write is scoped by tenant: an id stored under another
//! tenant behaves exactly like a missing one.

pub mod items;
pub mod parcels;
pub mod payments;
pub mod prints;
pub mod rules;

pub use items::{InMemoryParcelItemRepository, ParcelItemRepository};
pub use parcels::{InMemoryParcelRepository, Page, ParcelFilter, ParcelPage, ParcelRepository};
pub use payments::{InMemoryPaymentRepository, PaymentRepository};
pub use prints::{InMemoryPrintRepository, PrintRepository};
pub use rules::{InMemoryPriceRuleRepository, PriceRuleRepository};
