// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::LedgerState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

fn issue(kind: &'static str, detail: String) -> Issue {
    Issue { kind, detail }
}

/// Consistency problems in a loaded ledger that the write path cannot
/// prevent on its own (records written by other clients, manual edits).
pub fn audit(state: &LedgerState) -> Vec<Issue> {
    let known = |id: &str| state.buckets.iter().any(|b| b.id == id);
    let mut out = Vec::new();

    for t in &state.transactions {
        if !known(&t.bucket_id) {
            out.push(issue(
                "txn_orphan_bucket",
                format!("{} -> {}", t.id, t.bucket_id),
            ));
        }
        if t.amount <= Decimal::ZERO {
            out.push(issue("txn_non_positive_amount", format!("{} {}", t.id, t.amount)));
        }
    }
    for g in &state.goals {
        if !known(&g.bucket_id) {
            out.push(issue(
                "goal_orphan_bucket",
                format!("{} -> {}", g.id, g.bucket_id),
            ));
        }
        if g.target_amount <= Decimal::ZERO {
            out.push(issue("goal_zero_target", g.id.clone()));
        }
    }
    for r in &state.rules {
        if !known(&r.target_bucket_id) {
            out.push(issue(
                "rule_orphan_bucket",
                format!("{} -> {}", r.id, r.target_bucket_id),
            ));
        }
    }
    let mut pct_total: u32 = 0;
    for b in &state.buckets {
        let pct = b.target_percentage.unwrap_or(0);
        if pct > 100 {
            out.push(issue("bucket_pct_out_of_range", format!("{} {}", b.id, pct)));
        }
        pct_total += u32::from(pct);
    }
    if pct_total > 100 {
        out.push(issue("bucket_pct_over_allocated", format!("{}%", pct_total)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Goal, TransactionType, Transaction, default_buckets};
    use chrono::NaiveDate;

    #[test]
    fn seeded_state_is_clean() {
        let state = LedgerState {
            buckets: default_buckets(),
            ..Default::default()
        };
        assert!(audit(&state).is_empty());
    }

    #[test]
    fn orphans_and_zero_targets_are_reported() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let state = LedgerState {
            buckets: default_buckets(),
            transactions: vec![Transaction {
                id: "t1".into(),
                amount: Decimal::ONE,
                kind: TransactionType::Expense,
                category: "Others".into(),
                bucket_id: "gone".into(),
                date: d,
                note: String::new(),
            }],
            goals: vec![Goal {
                id: "g1".into(),
                name: "Trip".into(),
                target_amount: Decimal::ZERO,
                current_amount: Decimal::ZERO,
                deadline: d,
                icon: "travel".into(),
                bucket_id: "1".into(),
            }],
            ..Default::default()
        };
        let kinds: Vec<_> = audit(&state).into_iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec!["txn_orphan_bucket", "goal_zero_target"]);
    }
}
