//! Infrastructure layer: repositories, tenant options, external clients, config.
//!
//! Everything here sits behind a trait so the service layer can swap the
//! in-memory reference implementations for durable ones.

pub mod clients;
pub mod config;
pub mod error;
pub mod repository;
pub mod store;

pub use error::RepositoryError;
