// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::ledger::Ledger;
use crate::models::{SubscriptionTier, plan_catalog};
use crate::store::SqliteStore;
use crate::utils::{arg, fmt_money, opt_arg, pretty_table};

pub fn handle(ledger: &mut Ledger<SqliteStore>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", _)) => {
            let current = ledger.profile().map(|p| p.subscription);
            let rows = plan_catalog()
                .into_iter()
                .map(|p| {
                    let mut name = p.name.clone();
                    if p.is_popular {
                        name.push_str(" *");
                    }
                    vec![
                        p.tier.to_string(),
                        name,
                        fmt_money(&p.raw_price),
                        p.features.join(", "),
                        if current == Some(p.tier) { "current" } else { "" }.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Tier", "Plan", "Price", "Features", ""], rows)
            );
        }
        Some(("buy", sub)) => {
            let tier: SubscriptionTier = arg(sub, "tier")?.parse()?;
            let email = opt_arg(sub, "email").unwrap_or_default();
            match ledger.place_order(email, tier)? {
                Some(order) => println!(
                    "Order {} placed: {} for {} ({})",
                    order.id,
                    order.plan_name,
                    fmt_money(&order.price),
                    order.email
                ),
                None => println!("Switched to the {} plan", tier),
            }
            if let Some(profile) = ledger.profile().cloned() {
                super::profile::save(ledger.store().connection(), &profile)?;
            }
        }
        _ => {}
    }
    Ok(())
}
