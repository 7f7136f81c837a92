// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rust_decimal::Decimal;

use super::resolve_bucket;
use crate::ledger::{BucketEdit, Ledger, NewBucket};
use crate::store::RemoteStore;
use crate::utils::{arg, fmt_money, maybe_print_json, opt_arg, parse_decimal, pretty_table};

pub fn handle<S: RemoteStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("edit", sub)) => edit(ledger, sub)?,
        Some(("rm", sub)) => {
            let id = resolve_bucket(ledger, arg(sub, "id")?)?;
            let removed = ledger.delete_bucket(&id)?;
            println!("Removed bucket '{}'", removed.name);
        }
        _ => {}
    }
    Ok(())
}

fn add<S: RemoteStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let fixed_amount = opt_arg(sub, "fixed").map(parse_decimal).transpose()?;
    let opening_balance = opt_arg(sub, "balance")
        .map(parse_decimal)
        .transpose()?
        .unwrap_or(Decimal::ZERO);
    let bucket = ledger.create_bucket(NewBucket {
        name: arg(sub, "name")?.to_string(),
        target_percentage: sub.get_one::<u8>("target-pct").copied(),
        fixed_amount,
        icon: opt_arg(sub, "icon").unwrap_or("food").to_string(),
        opening_balance,
    })?;
    println!("Added bucket '{}' ({})", bucket.name, bucket.id);
    Ok(())
}

fn edit<S: RemoteStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = resolve_bucket(ledger, arg(sub, "id")?)?;
    let Some(current) = ledger.bucket(&id).cloned() else {
        return Ok(());
    };
    let fixed_amount = match opt_arg(sub, "fixed") {
        Some(s) => Some(parse_decimal(s)?),
        None => current.fixed_amount,
    };
    let updated = ledger.update_bucket(
        &id,
        BucketEdit {
            name: opt_arg(sub, "name").unwrap_or(&current.name).to_string(),
            target_percentage: sub
                .get_one::<u8>("target-pct")
                .copied()
                .or(current.target_percentage),
            fixed_amount,
            icon: opt_arg(sub, "icon").unwrap_or(&current.icon).to_string(),
        },
    )?;
    println!("Updated bucket '{}'", updated.name);
    Ok(())
}

fn list<S: RemoteStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &ledger.buckets())? {
        return Ok(());
    }
    let rows = ledger
        .buckets()
        .iter()
        .map(|b| {
            vec![
                b.id.clone(),
                b.name.clone(),
                fmt_money(&b.current_balance),
                b.target_percentage
                    .map(|p| format!("{}%", p))
                    .unwrap_or_default(),
                b.fixed_amount.map(|f| fmt_money(&f)).unwrap_or_default(),
                b.icon.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Name", "Balance", "Target", "Fixed", "Icon"], rows)
    );
    println!("Total: {}", fmt_money(&ledger.total_balance()));
    Ok(())
}
