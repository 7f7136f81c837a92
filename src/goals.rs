// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Point-in-time goal progress, recomputed on every read.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::Goal;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub percent: u8,
    pub remaining: Decimal,
    pub months_left: u32,
    pub monthly_target: Decimal,
    pub achieved: bool,
}

fn round_whole(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Percent complete, clamped to 0..=100. The stored amount is never clamped.
/// Caller guarantees a positive target (enforced when the goal is created).
pub fn percent_complete(goal: &Goal) -> u8 {
    if goal.target_amount <= Decimal::ZERO {
        return 0;
    }
    let saved = goal.current_amount.min(goal.target_amount).max(Decimal::ZERO);
    let pct = round_whole(saved / goal.target_amount * Decimal::ONE_HUNDRED);
    pct.to_u8().unwrap_or(100).min(100)
}

/// Whole calendar months until the deadline, never less than one.
pub fn months_left(deadline: NaiveDate, today: NaiveDate) -> u32 {
    let months = (deadline.year() - today.year()) * 12
        + (deadline.month() as i32 - today.month() as i32);
    months.max(1) as u32
}

pub fn monthly_target(goal: &Goal, today: NaiveDate) -> Decimal {
    let remaining = goal.target_amount - goal.current_amount;
    round_whole(remaining / Decimal::from(months_left(goal.deadline, today)))
}

pub fn progress(goal: &Goal, today: NaiveDate) -> GoalProgress {
    let percent = percent_complete(goal);
    GoalProgress {
        percent,
        remaining: goal.target_amount - goal.current_amount,
        months_left: months_left(goal.deadline, today),
        monthly_target: monthly_target(goal, today),
        achieved: percent >= 100,
    }
}
