// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod advise;
pub mod buckets;
pub mod doctor;
pub mod exporter;
pub mod goals;
pub mod plans;
pub mod profile;
pub mod reports;
pub mod rules;
pub mod transactions;

use anyhow::{Result, anyhow};

use crate::ledger::Ledger;
use crate::store::RemoteStore;

/// Accepts a bucket id or a case-insensitive bucket name.
pub fn resolve_bucket<S: RemoteStore>(ledger: &Ledger<S>, key: &str) -> Result<String> {
    let key = key.trim();
    if let Some(b) = ledger.bucket(key) {
        return Ok(b.id.clone());
    }
    let mut named = ledger
        .buckets()
        .iter()
        .filter(|b| b.name.eq_ignore_ascii_case(key));
    match (named.next(), named.next()) {
        (Some(b), None) => Ok(b.id.clone()),
        (Some(_), Some(_)) => Err(anyhow!("Bucket name '{}' is ambiguous; use its id", key)),
        (None, _) => Err(anyhow!("Bucket '{}' not found", key)),
    }
}
