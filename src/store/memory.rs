// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, VecDeque};

use super::{Collection, Filter, Record, RemoteStore, StoreError, merge_patch, record_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteLogEntry {
    pub kind: WriteKind,
    pub collection: Collection,
    pub id: String,
}

/// In-process store with a write log and scripted write failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: BTreeMap<Collection, Vec<Record>>,
    log: Vec<WriteLogEntry>,
    faults: VecDeque<(WriteKind, Collection)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next matching write fail. Faults queue up in call order
    /// and each one is consumed by the first write it matches.
    pub fn fail_next(&mut self, kind: WriteKind, collection: Collection) {
        self.faults.push_back((kind, collection));
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Successful writes only, oldest first.
    pub fn write_log(&self) -> &[WriteLogEntry] {
        &self.log
    }

    pub fn writes_to(&self, kind: WriteKind, collection: Collection) -> usize {
        self.log
            .iter()
            .filter(|e| e.kind == kind && e.collection == collection)
            .count()
    }

    pub fn get(&self, collection: Collection, id: &str) -> Option<&Record> {
        self.collections
            .get(&collection)?
            .iter()
            .find(|r| r.get("id").and_then(|v| v.as_str()) == Some(id))
    }

    fn take_fault(&mut self, kind: WriteKind, collection: Collection) -> Result<(), StoreError> {
        if let Some(pos) = self
            .faults
            .iter()
            .position(|f| *f == (kind, collection))
        {
            self.faults.remove(pos);
            return Err(StoreError::Rejected(format!(
                "injected {:?} failure on {}",
                kind, collection
            )));
        }
        Ok(())
    }

    fn position(&self, collection: Collection, id: &str) -> Option<usize> {
        self.collections
            .get(&collection)?
            .iter()
            .position(|r| r.get("id").and_then(|v| v.as_str()) == Some(id))
    }
}

impl RemoteStore for MemoryStore {
    fn select(
        &self,
        collection: Collection,
        filter: Option<&Filter>,
    ) -> Result<Vec<Record>, StoreError> {
        let rows = self.collections.get(&collection).map(Vec::as_slice).unwrap_or(&[]);
        Ok(rows
            .iter()
            .filter(|r| filter.is_none_or(|f| f.matches(r)))
            .cloned()
            .collect())
    }

    fn insert(&mut self, collection: Collection, records: &[Record]) -> Result<(), StoreError> {
        self.take_fault(WriteKind::Insert, collection)?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = record_id(collection, record)?;
            if self.position(collection, &id).is_some() || ids.contains(&id) {
                return Err(StoreError::Duplicate { collection, id });
            }
            ids.push(id);
        }
        let rows = self.collections.entry(collection).or_default();
        rows.extend(records.iter().cloned());
        for id in ids {
            self.log.push(WriteLogEntry {
                kind: WriteKind::Insert,
                collection,
                id,
            });
        }
        Ok(())
    }

    fn update(
        &mut self,
        collection: Collection,
        patch: &Record,
        id: &str,
    ) -> Result<(), StoreError> {
        self.take_fault(WriteKind::Update, collection)?;
        let pos = self
            .position(collection, id)
            .ok_or_else(|| StoreError::NoMatch {
                collection,
                id: id.to_string(),
            })?;
        if let Some(rows) = self.collections.get_mut(&collection) {
            merge_patch(&mut rows[pos], patch);
        }
        self.log.push(WriteLogEntry {
            kind: WriteKind::Update,
            collection,
            id: id.to_string(),
        });
        Ok(())
    }

    fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.take_fault(WriteKind::Delete, collection)?;
        if let Some(rows) = self.collections.get_mut(&collection) {
            rows.retain(|r| r.get("id").and_then(|v| v.as_str()) != Some(id));
        }
        self.log.push(WriteLogEntry {
            kind: WriteKind::Delete,
            collection,
            id: id.to_string(),
        });
        Ok(())
    }
}
