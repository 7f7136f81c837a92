// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bucket-balance deltas for transaction create, edit and delete.
//!
//! A bucket's balance is the sum of the signed amounts of the transactions
//! applied to it. Every mutation is expressed as deltas so that an edit is
//! exactly "reverse the old transaction, then apply the new one".

use rust_decimal::Decimal;

use crate::error::{BudgetError, Result};
use crate::models::{Bucket, Transaction, TransactionType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDelta {
    pub bucket_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub bucket_id: String,
    pub before: Decimal,
    pub after: Decimal,
}

pub fn signed_amount(tx: &Transaction) -> Decimal {
    match tx.kind {
        TransactionType::Income => tx.amount,
        TransactionType::Expense => -tx.amount,
    }
}

pub fn create_deltas(tx: &Transaction) -> Vec<BalanceDelta> {
    vec![BalanceDelta {
        bucket_id: tx.bucket_id.clone(),
        amount: signed_amount(tx),
    }]
}

pub fn reversal_deltas(tx: &Transaction) -> Vec<BalanceDelta> {
    vec![BalanceDelta {
        bucket_id: tx.bucket_id.clone(),
        amount: -signed_amount(tx),
    }]
}

/// Reversal of `old` followed by application of `new`, one entry per
/// bucket whose balance actually moves.
pub fn edit_deltas(old: &Transaction, new: &Transaction) -> Vec<BalanceDelta> {
    let mut out = reversal_deltas(old);
    for d in create_deltas(new) {
        match out.iter_mut().find(|e| e.bucket_id == d.bucket_id) {
            Some(existing) => existing.amount += d.amount,
            None => out.push(d),
        }
    }
    out.retain(|d| !d.amount.is_zero());
    out
}

/// Resolves deltas against current balances. Deltas are applied in order,
/// so a bucket named twice sees its first change before the second.
pub fn plan_balances(buckets: &[Bucket], deltas: &[BalanceDelta]) -> Result<Vec<BalanceChange>> {
    let mut changes: Vec<BalanceChange> = Vec::with_capacity(deltas.len());
    for d in deltas {
        if let Some(c) = changes.iter_mut().find(|c| c.bucket_id == d.bucket_id) {
            c.after += d.amount;
            continue;
        }
        let bucket = buckets
            .iter()
            .find(|b| b.id == d.bucket_id)
            .ok_or_else(|| {
                BudgetError::validation(format!("bucket '{}' does not exist", d.bucket_id))
            })?;
        changes.push(BalanceChange {
            bucket_id: d.bucket_id.clone(),
            before: bucket.current_balance,
            after: bucket.current_balance + d.amount,
        });
    }
    Ok(changes)
}

/// Writes the planned balances into `buckets`.
pub fn commit_changes(buckets: &mut [Bucket], changes: &[BalanceChange]) {
    for c in changes {
        if let Some(b) = buckets.iter_mut().find(|b| b.id == c.bucket_id) {
            b.current_balance = c.after;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bucket(id: &str, balance: i64) -> Bucket {
        Bucket {
            id: id.into(),
            name: format!("Bucket {id}"),
            current_balance: Decimal::from(balance),
            target_percentage: None,
            fixed_amount: None,
            icon: "food".into(),
        }
    }

    fn tx(bucket_id: &str, kind: TransactionType, amount: i64) -> Transaction {
        Transaction {
            id: "t1".into(),
            amount: Decimal::from(amount),
            kind,
            category: "Others".into(),
            bucket_id: bucket_id.into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            note: String::new(),
        }
    }

    #[test]
    fn expense_reverses_to_positive_delta() {
        let t = tx("a", TransactionType::Expense, 200);
        assert_eq!(create_deltas(&t)[0].amount, Decimal::from(-200));
        assert_eq!(reversal_deltas(&t)[0].amount, Decimal::from(200));
    }

    #[test]
    fn edit_on_same_bucket_composes_into_one_delta() {
        let old = tx("a", TransactionType::Expense, 200);
        let new = tx("a", TransactionType::Expense, 50);
        assert_eq!(
            edit_deltas(&old, &new),
            vec![BalanceDelta {
                bucket_id: "a".into(),
                amount: Decimal::from(150)
            }]
        );
    }

    #[test]
    fn edit_moving_buckets_touches_each_once() {
        let old = tx("a", TransactionType::Expense, 50);
        let new = tx("b", TransactionType::Expense, 50);
        let deltas = edit_deltas(&old, &new);
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].bucket_id, "a");
        assert_eq!(deltas[0].amount, Decimal::from(50));
        assert_eq!(deltas[1].bucket_id, "b");
        assert_eq!(deltas[1].amount, Decimal::from(-50));
    }

    #[test]
    fn identical_edit_yields_no_deltas() {
        let t = tx("a", TransactionType::Income, 75);
        assert!(edit_deltas(&t, &t).is_empty());
    }

    #[test]
    fn flipping_type_doubles_the_swing() {
        let old = tx("a", TransactionType::Income, 100);
        let new = tx("a", TransactionType::Expense, 100);
        assert_eq!(edit_deltas(&old, &new)[0].amount, Decimal::from(-200));
    }

    #[test]
    fn plan_rejects_unknown_bucket() {
        let buckets = vec![bucket("a", 10)];
        let deltas = create_deltas(&tx("zz", TransactionType::Income, 1));
        assert!(matches!(
            plan_balances(&buckets, &deltas),
            Err(BudgetError::Validation(_))
        ));
    }

    #[test]
    fn plan_then_commit_updates_balances() {
        let mut buckets = vec![bucket("a", 1000), bucket("b", 500)];
        let old = tx("a", TransactionType::Expense, 50);
        let new = tx("b", TransactionType::Expense, 50);
        let changes = plan_balances(&buckets, &edit_deltas(&old, &new)).unwrap();
        commit_changes(&mut buckets, &changes);
        assert_eq!(buckets[0].current_balance, Decimal::from(1050));
        assert_eq!(buckets[1].current_balance, Decimal::from(450));
    }
}
