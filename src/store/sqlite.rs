// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, params};

use super::{Collection, Filter, Record, RemoteStore, StoreError, merge_patch, record_id};

/// Document store over SQLite: one `(id, record)` table per collection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Expects the schema from [`crate::db::init_schema`] to exist.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut conn = Connection::open_in_memory()?;
        crate::db::init_schema(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn load(&self, collection: Collection, id: &str) -> Result<Option<Record>, StoreError> {
        let sql = format!("SELECT record FROM {} WHERE id=?1", collection.name());
        let raw: Option<String> = self
            .conn
            .query_row(&sql, params![id], |r| r.get(0))
            .optional()?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }
}

impl RemoteStore for SqliteStore {
    fn select(
        &self,
        collection: Collection,
        filter: Option<&Filter>,
    ) -> Result<Vec<Record>, StoreError> {
        let sql = format!("SELECT record FROM {} ORDER BY rowid", collection.name());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            let record: Record = serde_json::from_str(&row?)?;
            if filter.is_none_or(|f| f.matches(&record)) {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn insert(&mut self, collection: Collection, records: &[Record]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let sql = format!(
                "INSERT INTO {}(id, record) VALUES (?1, ?2)",
                collection.name()
            );
            let mut stmt = tx.prepare(&sql)?;
            for record in records {
                let id = record_id(collection, record)?;
                let body = serde_json::to_string(record)?;
                match stmt.execute(params![id, body]) {
                    Ok(_) => {}
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        return Err(StoreError::Duplicate { collection, id });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn update(
        &mut self,
        collection: Collection,
        patch: &Record,
        id: &str,
    ) -> Result<(), StoreError> {
        let mut record = self.load(collection, id)?.ok_or_else(|| StoreError::NoMatch {
            collection,
            id: id.to_string(),
        })?;
        merge_patch(&mut record, patch);
        let sql = format!("UPDATE {} SET record=?1 WHERE id=?2", collection.name());
        self.conn
            .execute(&sql, params![serde_json::to_string(&record)?, id])?;
        Ok(())
    }

    fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id=?1", collection.name());
        self.conn.execute(&sql, params![id])?;
        Ok(())
    }
}
