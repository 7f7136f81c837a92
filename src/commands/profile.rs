// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use rusqlite::Connection;

use crate::ledger::Ledger;
use crate::models::{SubscriptionTier, UserProfile};
use crate::store::SqliteStore;
use crate::utils::{arg, fmt_money, get_setting, parse_decimal, set_setting};

const PROFILE_KEY: &str = "profile";

pub fn load(conn: &Connection) -> Result<Option<UserProfile>> {
    get_setting(conn, PROFILE_KEY)?
        .map(|raw| serde_json::from_str(&raw).context("Stored profile is not valid JSON"))
        .transpose()
}

pub fn save(conn: &Connection, profile: &UserProfile) -> Result<()> {
    set_setting(conn, PROFILE_KEY, &serde_json::to_string(profile)?)
}

pub fn handle(ledger: &mut Ledger<SqliteStore>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let name = arg(sub, "name")?;
            if name.is_empty() {
                bail!("Profile name cannot be empty");
            }
            let monthly_income = parse_decimal(arg(sub, "income")?)?;
            if monthly_income.is_sign_negative() {
                bail!("Monthly income cannot be negative");
            }
            let payday = sub.get_one::<u8>("payday").copied().unwrap_or(1);
            if !(1..=31).contains(&payday) {
                bail!("Payday must be a day of the month (1-31), got {}", payday);
            }
            let subscription = ledger
                .profile()
                .map_or(SubscriptionTier::Starter, |p| p.subscription);
            let profile = UserProfile {
                name: name.to_string(),
                monthly_income,
                subscription,
                payday,
            };
            save(ledger.store().connection(), &profile)?;
            ledger.set_profile(profile);
            println!("Profile saved for {}", name);
        }
        Some(("show", _)) => match ledger.profile() {
            Some(p) => {
                println!("Name:         {}", p.name);
                println!("Income:       {}", fmt_money(&p.monthly_income));
                println!("Payday:       {}", p.payday);
                println!("Subscription: {}", p.subscription);
            }
            None => println!("No profile yet; run `bucketwise profile set`"),
        },
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn profile_survives_reload() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.connection();
        assert!(load(conn).unwrap().is_none());
        let p = UserProfile {
            name: "Alex".into(),
            monthly_income: Decimal::new(5000, 0),
            subscription: SubscriptionTier::Pro,
            payday: 25,
        };
        save(conn, &p).unwrap();
        assert_eq!(load(conn).unwrap(), Some(p));
    }
}
