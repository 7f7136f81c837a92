// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};

use crate::ledger::Ledger;
use crate::recommend::{Recommender, match_recommendations};
use crate::store::RemoteStore;
use crate::utils::{maybe_print_json, opt_arg, parse_decimal, pretty_table};

pub fn handle<S: RemoteStore>(
    ledger: &mut Ledger<S>,
    m: &clap::ArgMatches,
    advisor: &dyn Recommender,
) -> Result<()> {
    let income = match opt_arg(m, "income") {
        Some(s) => parse_decimal(s)?,
        None => match ledger.profile() {
            Some(p) => p.monthly_income,
            None => bail!("No monthly income known; pass --income or run `bucketwise profile set`"),
        },
    };
    let recs = advisor.recommend(income, ledger.goals(), ledger.buckets());
    if recs.is_empty() {
        println!("No advice available right now; your buckets are unchanged.");
        return Ok(());
    }

    let matches = if m.get_flag("apply") {
        ledger.apply_recommendations(&recs)?
    } else {
        match_recommendations(&recs, ledger.buckets())
    };
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &matches)? {
        return Ok(());
    }
    let rows = matches
        .iter()
        .map(|mt| {
            vec![
                mt.recommendation.bucket_name.clone(),
                format!("{}%", mt.recommendation.suggested_percentage),
                mt.recommendation.reasoning.clone(),
                if mt.is_applicable() { "yes" } else { "bucket not found" }.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Bucket", "Suggested", "Reasoning", "Applicable"], rows)
    );
    if m.get_flag("apply") {
        let applied = matches.iter().filter(|mt| mt.is_applicable()).count();
        println!("Applied {} of {} suggestions", applied, matches.len());
    }
    Ok(())
}
