//! Tenant-partitioned storage primitives shared by the in-memory repositories.

pub mod tenant_store;

pub use tenant_store::{InMemoryTenantStore, TenantStore};
