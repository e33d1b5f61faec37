//! Earthquake use-case service.
//!
//! # Responsibility
//! - Look up single records and magnitude reports as field mappings.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Every payload record is produced by `Persistable::to_dict`.
//! - Service layer remains storage-agnostic.

use crate::model::earthquake::Earthquake;
use crate::model::{Persistable, RecordId};
use crate::repo::earthquake_repo::EarthquakeRepository;
use crate::repo::RepoError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    NotFound { id: RecordId },
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "Earthquake {id} not found."),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound { id },
            other => Self::Repo(other),
        }
    }
}

/// Earthquakes at or above a magnitude threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagnitudeReport {
    pub count: usize,
    pub quakes: Vec<Map<String, Value>>,
}

impl MagnitudeReport {
    /// Builds the report payload from stored records, in the given order.
    pub fn from_records<T: Persistable>(records: &[T]) -> Self {
        let quakes = records.iter().map(T::to_dict).collect::<Vec<_>>();
        Self {
            count: quakes.len(),
            quakes,
        }
    }
}

/// Use-case service wrapper for earthquake lookups.
pub struct EarthquakeService<R: EarthquakeRepository> {
    repo: R,
}

impl<R: EarthquakeRepository> EarthquakeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves a new fully populated record and returns it with its id.
    pub fn record_quake(
        &self,
        magnitude: f64,
        location: impl Into<String>,
        year: i64,
    ) -> ServiceResult<Earthquake> {
        let mut quake = Earthquake::with_fields(magnitude, location, year);
        self.repo.save_earthquake(&mut quake)?;
        Ok(quake)
    }

    /// Returns the field mapping of one stored record.
    ///
    /// # Errors
    /// - `NotFound` when no record has `id`.
    pub fn record(&self, id: RecordId) -> ServiceResult<Map<String, Value>> {
        match self.repo.get_earthquake(id)? {
            Some(quake) => Ok(quake.to_dict()),
            None => Err(ServiceError::NotFound { id }),
        }
    }

    /// Returns every record with `magnitude >= min_magnitude`.
    ///
    /// An empty match is a report with `count == 0`, not an error.
    pub fn magnitude_report(&self, min_magnitude: f64) -> ServiceResult<MagnitudeReport> {
        let quakes = self.repo.earthquakes_with_min_magnitude(min_magnitude)?;
        Ok(MagnitudeReport::from_records(&quakes))
    }
}
