// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;

use anyhow::{Result, bail};
use serde_json::json;

use crate::ledger::Ledger;
use crate::models::Transaction;
use crate::store::RemoteStore;
use crate::utils::arg;

pub fn handle<S: RemoteStore>(ledger: &Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let fmt = arg(sub, "format")?.to_lowercase();
            let out = arg(sub, "out")?;
            let file = std::fs::File::create(out)?;
            let n = write_transactions(ledger, &fmt, file)?;
            println!("Exported {} transactions to {}", n, out);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Oldest first. Returns the number of rows written.
pub fn write_transactions<S: RemoteStore, W: Write>(
    ledger: &Ledger<S>,
    fmt: &str,
    out: W,
) -> Result<usize> {
    let mut txs: Vec<&Transaction> = ledger.transactions().iter().collect();
    txs.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    let bucket_name = |t: &Transaction| {
        ledger
            .bucket(&t.bucket_id)
            .map_or_else(String::new, |b| b.name.clone())
    };

    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record([
                "id", "date", "type", "amount", "category", "bucket_id", "bucket", "note",
            ])?;
            for &t in &txs {
                wtr.write_record([
                    t.id.clone(),
                    t.date.to_string(),
                    t.kind.to_string(),
                    t.amount.to_string(),
                    t.category.clone(),
                    t.bucket_id.clone(),
                    bucket_name(t),
                    t.note.clone(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = txs
                .iter()
                .map(|&t| {
                    json!({
                        "id": t.id, "date": t.date, "type": t.kind, "amount": t.amount,
                        "category": t.category, "bucketId": t.bucket_id,
                        "bucket": bucket_name(t), "note": t.note
                    })
                })
                .collect();
            serde_json::to_writer_pretty(out, &items)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    Ok(txs.len())
}
