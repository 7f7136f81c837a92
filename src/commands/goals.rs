// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use super::resolve_bucket;
use crate::goals::{self, GoalProgress};
use crate::ledger::{GoalDraft, Ledger};
use crate::models::Goal;
use crate::store::RemoteStore;
use crate::utils::{arg, fmt_money, maybe_print_json, opt_arg, parse_date, parse_decimal, pretty_table};

pub fn handle<S: RemoteStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let draft = GoalDraft {
                name: arg(sub, "name")?.to_string(),
                target_amount: parse_decimal(arg(sub, "target")?)?,
                deadline: parse_date(arg(sub, "deadline")?)?,
                icon: opt_arg(sub, "icon").unwrap_or("target").to_string(),
                bucket_id: resolve_bucket(ledger, arg(sub, "bucket")?)?,
            };
            let goal = ledger.create_goal(draft)?;
            println!("Added goal '{}' ({})", goal.name, goal.id);
        }
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("edit", sub)) => edit(ledger, sub)?,
        Some(("progress", sub)) => {
            let amount = parse_decimal(arg(sub, "amount")?)?;
            let goal = ledger.update_goal_progress(arg(sub, "id")?, amount)?;
            let p = goals::progress(&goal, Local::now().date_naive());
            println!(
                "{}: {} of {} ({}%)",
                goal.name,
                fmt_money(&goal.current_amount),
                fmt_money(&goal.target_amount),
                p.percent
            );
        }
        Some(("rm", sub)) => {
            let goal = ledger.delete_goal(arg(sub, "id")?)?;
            println!("Removed goal '{}'", goal.name);
        }
        _ => {}
    }
    Ok(())
}

fn edit<S: RemoteStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = arg(sub, "id")?;
    let current = ledger
        .goal(id)
        .cloned()
        .with_context(|| format!("Goal '{}' not found", id))?;
    let draft = GoalDraft {
        name: opt_arg(sub, "name").unwrap_or(&current.name).to_string(),
        target_amount: opt_arg(sub, "target")
            .map(parse_decimal)
            .transpose()?
            .unwrap_or(current.target_amount),
        deadline: opt_arg(sub, "deadline")
            .map(parse_date)
            .transpose()?
            .unwrap_or(current.deadline),
        icon: opt_arg(sub, "icon").unwrap_or(&current.icon).to_string(),
        bucket_id: match opt_arg(sub, "bucket") {
            Some(b) => resolve_bucket(ledger, b)?,
            None => current.bucket_id.clone(),
        },
    };
    let goal = ledger.update_goal(id, draft)?;
    println!("Updated goal '{}'", goal.name);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalView<'a> {
    #[serde(flatten)]
    goal: &'a Goal,
    progress: GoalProgress,
}

fn list<S: RemoteStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let today = Local::now().date_naive();
    let views: Vec<GoalView> = ledger
        .goals()
        .iter()
        .map(|g| GoalView {
            goal: g,
            progress: goals::progress(g, today),
        })
        .collect();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &views)? {
        return Ok(());
    }
    let rows = views
        .iter()
        .map(|v| {
            vec![
                v.goal.id.clone(),
                v.goal.name.clone(),
                format!(
                    "{} / {}",
                    fmt_money(&v.goal.current_amount),
                    fmt_money(&v.goal.target_amount)
                ),
                format!("{}%", v.progress.percent),
                v.goal.deadline.to_string(),
                if v.progress.achieved {
                    "achieved".to_string()
                } else {
                    format!("{}/mo", fmt_money(&v.progress.monthly_target))
                },
                ledger
                    .bucket(&v.goal.bucket_id)
                    .map_or_else(|| v.goal.bucket_id.clone(), |b| b.name.clone()),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Saved", "Progress", "Deadline", "Needed", "Bucket"],
            rows,
        )
    );
    Ok(())
}
