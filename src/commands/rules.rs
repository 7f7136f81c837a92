// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::resolve_bucket;
use crate::ledger::{Ledger, NewRule};
use crate::models::RuleType;
use crate::store::RemoteStore;
use crate::utils::{arg, parse_decimal, pretty_table};

pub fn handle<S: RemoteStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind: RuleType = arg(sub, "type")?.parse()?;
            let target_bucket_id = resolve_bucket(ledger, arg(sub, "bucket")?)?;
            let rule = ledger.create_rule(NewRule {
                name: arg(sub, "name")?.to_string(),
                kind,
                value: parse_decimal(arg(sub, "value")?)?,
                target_bucket_id,
            })?;
            println!(
                "Added rule '{}': {} {} -> {}",
                rule.name, rule.kind, rule.value, rule.target_bucket_id
            );
        }
        Some(("list", _)) => {
            let data = ledger
                .rules()
                .iter()
                .map(|r| {
                    let value = match r.kind {
                        RuleType::Percentage => format!("{}%", r.value),
                        RuleType::Fixed => r.value.to_string(),
                    };
                    vec![
                        r.id.clone(),
                        r.name.clone(),
                        r.kind.to_string(),
                        value,
                        ledger
                            .bucket(&r.target_bucket_id)
                            .map_or_else(|| r.target_bucket_id.clone(), |b| b.name.clone()),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["ID", "Name", "Type", "Value", "Target Bucket"], data)
            );
        }
        Some(("rm", sub)) => {
            let rule = ledger.delete_rule(arg(sub, "id")?)?;
            println!("Removed rule '{}'", rule.name);
        }
        _ => {}
    }
    Ok(())
}
