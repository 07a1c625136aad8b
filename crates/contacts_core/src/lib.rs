//! Contact address-book core.
//! This crate owns the contact entity rules and the storage backends behind
//! the uniform `ContactDao` contract.

pub mod dao;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;

pub use dao::factory::{global, init_global, BackendKind, DaoConfig, DaoFactory, FactoryError};
pub use dao::mem_dao::MemContactDao;
pub use dao::sqlite_dao::SqliteContactDao;
pub use dao::{ContactDao, StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactError, ContactId, UNSET_CONTACT_ID};
pub use service::contact_service::{seed_samples, ContactService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
