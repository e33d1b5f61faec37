//! Record models and the capability the store requires from them.
//!
//! # Responsibility
//! - Define the `Persistable` contract shared by every stored record type.
//! - Keep identity assignment under store control.
//!
//! # Invariants
//! - A record built in memory has no id until the store saves it.
//! - An id is assigned once, by the store, through `Persistable::assign_id`.

pub mod earthquake;

use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde_json::Map;

/// Surrogate key generated by the store on first insert.
pub type RecordId = i64;

/// Proof that an id assignment originates from the store.
///
/// Only code inside this crate can construct it, so application code cannot
/// move a record from unsaved to saved on its own.
#[derive(Debug)]
pub struct StoreToken(());

impl StoreToken {
    pub(crate) fn new() -> Self {
        Self(())
    }
}

/// Capability a record type must provide to be managed by `SqliteStore`.
pub trait Persistable: Sized {
    /// Backing table name.
    const TABLE: &'static str;
    /// Non-id columns, in the same order as `column_values`.
    const COLUMNS: &'static [&'static str];

    /// Store-assigned id, `None` before the first save.
    fn id(&self) -> Option<RecordId>;

    /// Bind values for `COLUMNS`.
    fn column_values(&self) -> Vec<Value>;

    /// Decodes one row selected as `id` followed by `COLUMNS`.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Field name to value mapping covering every declared attribute.
    fn to_dict(&self) -> Map<String, serde_json::Value>;

    /// Records the id generated by the store.
    fn assign_id(&mut self, id: RecordId, token: StoreToken);

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}
