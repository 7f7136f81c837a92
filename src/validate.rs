// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;

use crate::error::{BudgetError, Result};
use crate::models::{Bucket, Category, Goal, Rule, RuleType, Transaction};

fn require_bucket(buckets: &[Bucket], id: &str) -> Result<()> {
    if buckets.iter().any(|b| b.id == id) {
        Ok(())
    } else {
        Err(BudgetError::validation(format!(
            "bucket '{}' does not exist",
            id
        )))
    }
}

fn require_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BudgetError::validation(format!("{} name is required", what)));
    }
    Ok(())
}

pub fn transaction(tx: &Transaction, buckets: &[Bucket], categories: &[Category]) -> Result<()> {
    if tx.id.trim().is_empty() {
        return Err(BudgetError::validation("transaction id is required"));
    }
    if tx.amount <= Decimal::ZERO {
        return Err(BudgetError::validation(format!(
            "amount must be positive, got {}",
            tx.amount
        )));
    }
    let known = categories
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(tx.category.trim()) && c.kind.accepts(tx.kind));
    if !known {
        return Err(BudgetError::validation(format!(
            "'{}' is not a recognized {} category",
            tx.category, tx.kind
        )));
    }
    require_bucket(buckets, &tx.bucket_id)
}

pub fn bucket(b: &Bucket) -> Result<()> {
    require_name("bucket", &b.name)?;
    if let Some(pct) = b.target_percentage {
        if pct > 100 {
            return Err(BudgetError::validation(format!(
                "target percentage must be 0-100, got {}",
                pct
            )));
        }
    }
    if let Some(fixed) = b.fixed_amount {
        if fixed < Decimal::ZERO {
            return Err(BudgetError::validation("fixed amount cannot be negative"));
        }
    }
    Ok(())
}

pub fn goal(g: &Goal, buckets: &[Bucket]) -> Result<()> {
    require_name("goal", &g.name)?;
    if g.target_amount <= Decimal::ZERO {
        return Err(BudgetError::validation("goal target amount must be positive"));
    }
    if g.current_amount < Decimal::ZERO {
        return Err(BudgetError::validation(
            "goal current amount cannot be negative",
        ));
    }
    require_bucket(buckets, &g.bucket_id)
}

pub fn rule(r: &Rule, buckets: &[Bucket]) -> Result<()> {
    require_name("rule", &r.name)?;
    if r.value <= Decimal::ZERO {
        return Err(BudgetError::validation("rule value must be positive"));
    }
    if r.kind == RuleType::Percentage && r.value > Decimal::ONE_HUNDRED {
        return Err(BudgetError::validation(format!(
            "percentage rule cannot exceed 100, got {}",
            r.value
        )));
    }
    require_bucket(buckets, &r.target_bucket_id)
}
