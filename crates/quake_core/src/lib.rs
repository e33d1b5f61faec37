//! Core domain logic for earthquake records.
//! This crate owns the record model and the store that persists it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{init_logging, logging_status, LoggingError};
pub use model::earthquake::Earthquake;
pub use model::{Persistable, RecordId, StoreToken};
pub use repo::earthquake_repo::{EarthquakeRepository, SqliteEarthquakeRepository};
pub use repo::store::{ListQuery, SqliteStore};
pub use repo::{RepoError, RepoResult};
pub use service::earthquake_service::{
    EarthquakeService, MagnitudeReport, ServiceError, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
