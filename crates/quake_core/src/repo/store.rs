//! Generic SQLite store for `Persistable` records.
//!
//! # Responsibility
//! - Insert, update, load and delete any `Persistable` record type.
//! - Own the transition of a record id from unset to set.
//!
//! # Invariants
//! - `save` assigns an id only after the INSERT succeeded.
//! - `save_all` assigns ids only after the whole batch committed.
//! - The store refuses connections that did not run migrations.

use crate::db::migrations::{latest_version, schema_version};
use crate::model::{Persistable, RecordId, StoreToken};
use crate::repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// Pagination options for listing records.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

/// SQLite-backed store shared by all record repositories.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not the latest.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version = schema_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    /// Inserts a new record or updates an already saved one.
    ///
    /// Returns the record id. New records get their id assigned in place.
    pub fn save<T: Persistable>(&self, record: &mut T) -> RepoResult<RecordId> {
        match record.id() {
            Some(id) => {
                self.update(record, id)?;
                Ok(id)
            }
            None => {
                let id = self.insert(record)?;
                record.assign_id(id, StoreToken::new());
                Ok(id)
            }
        }
    }

    /// Saves every record in one transaction.
    ///
    /// On error the transaction rolls back and no record receives an id.
    pub fn save_all<T: Persistable>(&self, records: &mut [T]) -> RepoResult<Vec<RecordId>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records.iter() {
            let id = match record.id() {
                Some(id) => {
                    self.update(record, id)?;
                    id
                }
                None => self.insert(record)?,
            };
            ids.push(id);
        }
        tx.commit()?;

        for (record, id) in records.iter_mut().zip(&ids) {
            if record.id().is_none() {
                record.assign_id(*id, StoreToken::new());
            }
        }

        debug!(
            "event=record_save_batch module=store status=ok table={} count={}",
            T::TABLE,
            ids.len()
        );
        Ok(ids)
    }

    /// Loads one record by id.
    pub fn get<T: Persistable>(&self, id: RecordId) -> RepoResult<Option<T>> {
        let mut records = self.query_where::<T>("id = ?", vec![Value::Integer(id)])?;
        Ok(records.pop())
    }

    /// Lists records ordered by id.
    pub fn list<T: Persistable>(&self, query: &ListQuery) -> RepoResult<Vec<T>> {
        let mut sql = format!("{} ORDER BY id ASC", select_sql::<T>());
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.fetch(&sql, bind_values)
    }

    /// Deletes one record by id.
    pub fn delete<T: Persistable>(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", T::TABLE),
            [id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        debug!(
            "event=record_delete module=store status=ok table={} id={}",
            T::TABLE,
            id
        );
        Ok(())
    }

    /// Counts stored records of one type.
    pub fn count<T: Persistable>(&self) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", T::TABLE),
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
    }

    /// Selects records matching a SQL condition with `?` placeholders.
    pub(crate) fn query_where<T: Persistable>(
        &self,
        condition: &str,
        bind_values: Vec<Value>,
    ) -> RepoResult<Vec<T>> {
        let sql = format!("{} WHERE {condition} ORDER BY id ASC", select_sql::<T>());
        self.fetch(&sql, bind_values)
    }

    fn fetch<T: Persistable>(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(T::from_row(row)?);
        }

        Ok(records)
    }

    fn insert<T: Persistable>(&self, record: &T) -> RepoResult<RecordId> {
        let placeholders = (1..=T::COLUMNS.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            T::TABLE,
            T::COLUMNS.join(", ")
        );

        self.conn
            .execute(&sql, params_from_iter(record.column_values()))?;
        let id = self.conn.last_insert_rowid();

        debug!(
            "event=record_save module=store status=ok op=insert table={} id={}",
            T::TABLE,
            id
        );
        Ok(id)
    }

    fn update<T: Persistable>(&self, record: &T, id: RecordId) -> RepoResult<()> {
        let assignments = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE id = ?{};",
            T::TABLE,
            T::COLUMNS.len() + 1
        );

        let mut bind_values = record.column_values();
        bind_values.push(Value::Integer(id));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        debug!(
            "event=record_save module=store status=ok op=update table={} id={}",
            T::TABLE,
            id
        );
        Ok(())
    }
}

fn select_sql<T: Persistable>() -> String {
    format!("SELECT id, {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
}
