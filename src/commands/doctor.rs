// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::audit::audit;
use crate::ledger::{Ledger, Repair};
use crate::store::RemoteStore;
use crate::utils::{get_setting, pretty_table, set_setting};

const REPAIRS_KEY: &str = "pending_repairs";

/// Repairs journaled by earlier runs, oldest first.
pub fn load_repairs(conn: &Connection) -> Result<Vec<Repair>> {
    match get_setting(conn, REPAIRS_KEY)? {
        Some(raw) => serde_json::from_str(&raw).context("Stored repair journal is not valid JSON"),
        None => Ok(Vec::new()),
    }
}

pub fn save_repairs(conn: &Connection, repairs: &[Repair]) -> Result<()> {
    set_setting(conn, REPAIRS_KEY, &serde_json::to_string(repairs)?)
}

pub fn handle<S: RemoteStore>(ledger: &mut Ledger<S>) -> Result<()> {
    let journaled = ledger.pending_repairs().len();
    if journaled > 0 {
        let still = ledger.retry_repairs();
        println!("Replayed {} of {} journaled writes", journaled - still, journaled);
        if still < journaled {
            ledger.refresh()?;
        }
    }

    let mut rows: Vec<Vec<String>> = audit(ledger.state())
        .into_iter()
        .map(|i| vec![i.kind.to_string(), i.detail])
        .collect();
    for r in ledger.pending_repairs() {
        rows.push(vec![
            "unrepaired_write".into(),
            format!("{} {:?}", r.collection, r.op),
        ]);
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
