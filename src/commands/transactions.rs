// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use super::resolve_bucket;
use crate::ledger::{Ledger, NewTransaction};
use crate::models::{Transaction, TransactionType};
use crate::store::RemoteStore;
use crate::utils::{
    arg, fmt_money, maybe_print_json, opt_arg, parse_date, parse_decimal, parse_month,
    pretty_table,
};

pub fn handle<S: RemoteStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("edit", sub)) => edit(ledger, sub)?,
        Some(("rm", sub)) => {
            let removed = ledger.apply_delete(arg(sub, "id")?)?;
            println!(
                "Deleted {} {} and reverted bucket {}",
                removed.kind,
                fmt_money(&removed.amount),
                removed.bucket_id
            );
        }
        _ => {}
    }
    Ok(())
}

fn add<S: RemoteStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(arg(sub, "amount")?)?;
    let kind: TransactionType = arg(sub, "type")?.parse()?;
    let bucket_id = resolve_bucket(ledger, arg(sub, "bucket")?)?;
    let date = match opt_arg(sub, "date") {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    let tx = ledger.record_transaction(NewTransaction {
        amount,
        kind,
        category: arg(sub, "category")?.to_string(),
        bucket_id,
        date,
        note: opt_arg(sub, "note").map(str::to_string),
    })?;
    let balance = ledger
        .bucket(&tx.bucket_id)
        .map(|b| fmt_money(&b.current_balance))
        .unwrap_or_default();
    println!(
        "Recorded {} {} on {} ({}); bucket balance now {}",
        tx.kind,
        fmt_money(&tx.amount),
        tx.date,
        tx.id,
        balance
    );
    Ok(())
}

fn edit<S: RemoteStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = arg(sub, "id")?;
    let current = ledger
        .transaction(id)
        .cloned()
        .with_context(|| format!("Transaction '{}' not found", id))?;
    let mut updated = current.clone();
    if let Some(a) = opt_arg(sub, "amount") {
        updated.amount = parse_decimal(a)?;
    }
    if let Some(t) = opt_arg(sub, "type") {
        updated.kind = t.parse()?;
    }
    if let Some(c) = opt_arg(sub, "category") {
        updated.category = c.to_string();
    }
    if let Some(b) = opt_arg(sub, "bucket") {
        updated.bucket_id = resolve_bucket(ledger, b)?;
    }
    if let Some(d) = opt_arg(sub, "date") {
        updated.date = parse_date(d)?;
    }
    updated.note = match opt_arg(sub, "note") {
        Some(n) => n.to_string(),
        None if current.note.trim().is_empty() => "Updated Transaction".to_string(),
        None => current.note,
    };
    ledger.apply_edit(updated)?;
    println!("Updated transaction {}", id);
    Ok(())
}

fn list<S: RemoteStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(ledger, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.clone(),
                    r.date.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.bucket.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Type", "Amount", "Category", "Bucket", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub bucket: String,
    pub note: String,
}

pub fn query_rows<S: RemoteStore>(
    ledger: &Ledger<S>,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let bucket_id = opt_arg(sub, "bucket")
        .map(|b| resolve_bucket(ledger, b))
        .transpose()?;
    let month = opt_arg(sub, "month").map(parse_month).transpose()?;
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);

    let keep = |t: &&Transaction| {
        bucket_id.as_ref().is_none_or(|id| &t.bucket_id == id)
            && month
                .as_ref()
                .is_none_or(|m| t.date.format("%Y-%m").to_string() == *m)
    };
    Ok(ledger
        .transactions()
        .iter()
        .filter(keep)
        .take(limit)
        .map(|t| TransactionRow {
            id: t.id.clone(),
            date: t.date.to_string(),
            kind: t.kind.to_string(),
            amount: fmt_money(&t.amount),
            category: t.category.clone(),
            bucket: ledger
                .bucket(&t.bucket_id)
                .map_or_else(|| t.bucket_id.clone(), |b| b.name.clone()),
            note: t.note.clone(),
        })
        .collect())
}
