// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Local;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::Ledger;
use crate::models::TransactionType;
use crate::store::RemoteStore;
use crate::utils::{fmt_money, maybe_print_json, opt_arg, parse_month, pretty_table};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketLine {
    pub id: String,
    pub name: String,
    pub balance: Decimal,
    pub target_percentage: Option<u8>,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub month: String,
    pub total_balance: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub buckets: Vec<BucketLine>,
}

/// Balances as of now plus income and expense dated within `month` (YYYY-MM).
pub fn summary<S: RemoteStore>(ledger: &Ledger<S>, month: &str) -> Summary {
    let in_month: Vec<_> = ledger
        .transactions()
        .iter()
        .filter(|t| t.date.format("%Y-%m").to_string() == month)
        .collect();
    let sum = |bucket: Option<&str>, kind: TransactionType| -> Decimal {
        in_month
            .iter()
            .filter(|t| t.kind == kind && bucket.is_none_or(|b| t.bucket_id == b))
            .map(|t| t.amount)
            .sum()
    };
    let buckets = ledger
        .buckets()
        .iter()
        .map(|b| BucketLine {
            id: b.id.clone(),
            name: b.name.clone(),
            balance: b.current_balance,
            target_percentage: b.target_percentage,
            income: sum(Some(&b.id), TransactionType::Income),
            expense: sum(Some(&b.id), TransactionType::Expense),
        })
        .collect();
    let income = sum(None, TransactionType::Income);
    let expense = sum(None, TransactionType::Expense);
    Summary {
        month: month.to_string(),
        total_balance: ledger.total_balance(),
        income,
        expense,
        net: income - expense,
        buckets,
    }
}

pub fn handle<S: RemoteStore>(ledger: &Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("summary", sub)) = m.subcommand() {
        let month = match opt_arg(sub, "month") {
            Some(s) => parse_month(s)?,
            None => Local::now().format("%Y-%m").to_string(),
        };
        let report = summary(ledger, &month);
        if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
            return Ok(());
        }
        let rows = report
            .buckets
            .iter()
            .map(|b| {
                vec![
                    b.name.clone(),
                    fmt_money(&b.balance),
                    b.target_percentage
                        .map(|p| format!("{}%", p))
                        .unwrap_or_default(),
                    fmt_money(&b.income),
                    fmt_money(&b.expense),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Bucket", "Balance", "Target", "In", "Out"], rows)
        );
        println!("Total balance: {}", fmt_money(&report.total_balance));
        println!(
            "{}: income {}, expense {}, net {}",
            report.month,
            fmt_money(&report.income),
            fmt_money(&report.expense),
            fmt_money(&report.net)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::NewTransaction;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn record(ledger: &mut Ledger<MemoryStore>, amount: i64, kind: TransactionType, day: (i32, u32, u32)) {
        let category = match kind {
            TransactionType::Income => "Salary",
            TransactionType::Expense => "Food & Dining",
        };
        ledger
            .record_transaction(NewTransaction {
                amount: Decimal::from(amount),
                kind,
                category: category.into(),
                bucket_id: "3".into(),
                date: NaiveDate::from_ymd_opt(day.0, day.1, day.2).unwrap(),
                note: None,
            })
            .unwrap();
    }

    #[test]
    fn summary_only_counts_the_requested_month() {
        let mut ledger = Ledger::new(MemoryStore::new());
        ledger.seed_defaults().unwrap();
        record(&mut ledger, 1000, TransactionType::Income, (2025, 3, 1));
        record(&mut ledger, 200, TransactionType::Expense, (2025, 3, 15));
        record(&mut ledger, 50, TransactionType::Expense, (2025, 4, 2));

        let s = summary(&ledger, "2025-03");
        assert_eq!(s.income, Decimal::from(1000));
        assert_eq!(s.expense, Decimal::from(200));
        assert_eq!(s.net, Decimal::from(800));
        let daily = s.buckets.iter().find(|b| b.id == "3").unwrap();
        assert_eq!(daily.balance, Decimal::from(8500 + 1000 - 200 - 50));
        assert_eq!(s.total_balance, ledger.total_balance());
    }
}
