//! Earthquake record model.
//!
//! # Responsibility
//! - Define the in-memory shape of one recorded earthquake.
//! - Expose the field mapping used by service payloads.
//!
//! # Invariants
//! - `id` is `None` until the store saves the record.
//! - Construction never validates field ranges.

use crate::model::{Persistable, RecordId, StoreToken};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use serde_json::Map;

/// One earthquake observation.
///
/// Every scalar field is optional so a record can be built up field by field
/// before it is saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Earthquake {
    /// Written out for payloads, never read back: decoded records are unsaved.
    #[serde(skip_deserializing)]
    id: Option<RecordId>,
    /// Moment magnitude, usually within 0.0..=10.0.
    pub magnitude: Option<f64>,
    /// Free-form place label.
    pub location: Option<String>,
    /// Calendar year of the event.
    pub year: Option<i64>,
}

impl Earthquake {
    /// Creates an unsaved record with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unsaved record with all scalar fields set.
    pub fn with_fields(magnitude: f64, location: impl Into<String>, year: i64) -> Self {
        Self {
            id: None,
            magnitude: Some(magnitude),
            location: Some(location.into()),
            year: Some(year),
        }
    }

    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }
}

impl Persistable for Earthquake {
    const TABLE: &'static str = "earthquakes";
    const COLUMNS: &'static [&'static str] = &["magnitude", "location", "year"];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            self.magnitude.map_or(Value::Null, Value::Real),
            self.location.clone().map_or(Value::Null, Value::Text),
            self.year.map_or(Value::Null, Value::Integer),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let id = match row.get::<_, Option<i64>>("id")? {
            Some(id) => id,
            None => {
                return Err(RepoError::InvalidData(
                    "missing id value in earthquakes.id".to_string(),
                ));
            }
        };

        Ok(Self {
            id: Some(id),
            magnitude: row.get("magnitude")?,
            location: row.get("location")?,
            year: row.get("year")?,
        })
    }

    /// Unset fields and non-finite magnitudes map to `null`.
    fn to_dict(&self) -> Map<String, serde_json::Value> {
        let mut dict = Map::new();
        dict.insert("id".to_string(), serde_json::Value::from(self.id));
        dict.insert(
            "magnitude".to_string(),
            serde_json::Value::from(self.magnitude),
        );
        dict.insert(
            "location".to_string(),
            serde_json::Value::from(self.location.clone()),
        );
        dict.insert("year".to_string(), serde_json::Value::from(self.year));
        dict
    }

    fn assign_id(&mut self, id: RecordId, _token: StoreToken) {
        self.id = Some(id);
    }
}
