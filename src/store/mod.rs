// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Generic CRUD access to the named remote collections.
//!
//! Records cross this boundary as snake_case JSON objects; converting them
//! to domain types is the job of [`crate::mapping`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::{MemoryStore, WriteKind, WriteLogEntry};
pub use sqlite::SqliteStore;

pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Buckets,
    Transactions,
    Goals,
    Rules,
    Orders,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Buckets,
        Collection::Transactions,
        Collection::Goals,
        Collection::Rules,
        Collection::Orders,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Buckets => "buckets",
            Self::Transactions => "transactions",
            Self::Goals => "goals",
            Self::Rules => "rules",
            Self::Orders => "orders",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Equality match on one top-level field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.get(&self.field) == Some(&self.value)
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0} record has no string \"id\"")]
    MissingId(Collection),
    #[error("{collection} record \"{id}\" already exists")]
    Duplicate { collection: Collection, id: String },
    #[error("no {collection} record matches id \"{id}\"")]
    NoMatch { collection: Collection, id: String },
    #[error("{0}")]
    Rejected(String),
}

pub trait RemoteStore {
    fn select(
        &self,
        collection: Collection,
        filter: Option<&Filter>,
    ) -> Result<Vec<Record>, StoreError>;

    /// Inserts every record or none of them.
    fn insert(&mut self, collection: Collection, records: &[Record]) -> Result<(), StoreError>;

    /// Merges `patch` into the record whose `id` equals `id`.
    fn update(&mut self, collection: Collection, patch: &Record, id: &str)
    -> Result<(), StoreError>;

    /// Deleting an id that does not exist is not an error.
    fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

pub(crate) fn record_id(collection: Collection, record: &Record) -> Result<String, StoreError> {
    record
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StoreError::MissingId(collection))
}

pub(crate) fn merge_patch(target: &mut Record, patch: &Record) {
    for (k, v) in patch {
        if k == "id" {
            continue;
        }
        target.insert(k.clone(), v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn filter_matches_on_exact_value() {
        let r = rec(json!({"id": "t1", "bucket_id": "3"}));
        assert!(Filter::eq("bucket_id", "3").matches(&r));
        assert!(!Filter::eq("bucket_id", "4").matches(&r));
        assert!(!Filter::eq("missing", "3").matches(&r));
    }

    #[test]
    fn merge_patch_never_rewrites_id() {
        let mut r = rec(json!({"id": "1", "current_balance": "10"}));
        merge_patch(&mut r, &rec(json!({"id": "2", "current_balance": "20"})));
        assert_eq!(r["id"], "1");
        assert_eq!(r["current_balance"], "20");
    }
}
