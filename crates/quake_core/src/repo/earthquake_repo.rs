//! Earthquake repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable earthquake APIs over the generic record store.
//! - Keep SQL conditions inside the persistence boundary.

use crate::model::earthquake::Earthquake;
use crate::model::RecordId;
use crate::repo::store::{ListQuery, SqliteStore};
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Connection;

/// Repository interface for earthquake records.
pub trait EarthquakeRepository {
    fn save_earthquake(&self, quake: &mut Earthquake) -> RepoResult<RecordId>;
    fn get_earthquake(&self, id: RecordId) -> RepoResult<Option<Earthquake>>;
    fn list_earthquakes(&self, query: &ListQuery) -> RepoResult<Vec<Earthquake>>;
    fn earthquakes_with_min_magnitude(&self, min_magnitude: f64)
        -> RepoResult<Vec<Earthquake>>;
    fn delete_earthquake(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed earthquake repository.
pub struct SqliteEarthquakeRepository<'conn> {
    store: SqliteStore<'conn>,
}

impl<'conn> SqliteEarthquakeRepository<'conn> {
    /// Creates a repository over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            store: SqliteStore::try_new(conn)?,
        })
    }

    pub fn store(&self) -> &SqliteStore<'conn> {
        &self.store
    }
}

impl EarthquakeRepository for SqliteEarthquakeRepository<'_> {
    fn save_earthquake(&self, quake: &mut Earthquake) -> RepoResult<RecordId> {
        self.store.save(quake)
    }

    fn get_earthquake(&self, id: RecordId) -> RepoResult<Option<Earthquake>> {
        self.store.get(id)
    }

    fn list_earthquakes(&self, query: &ListQuery) -> RepoResult<Vec<Earthquake>> {
        self.store.list(query)
    }

    fn earthquakes_with_min_magnitude(
        &self,
        min_magnitude: f64,
    ) -> RepoResult<Vec<Earthquake>> {
        // Unset magnitudes never match: NULL >= x is NULL in SQLite.
        self.store
            .query_where("magnitude >= ?", vec![Value::Real(min_magnitude)])
    }

    fn delete_earthquake(&self, id: RecordId) -> RepoResult<()> {
        self.store.delete::<Earthquake>(id)
    }
}
