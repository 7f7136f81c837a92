// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BudgetError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub id: String,
    pub name: String,
    pub current_balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_percentage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_amount: Option<Decimal>,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amount: Decimal, // always >= 0, direction comes from `kind`
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub bucket_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: NaiveDate,
    pub icon: String,
    pub bucket_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RuleType,
    pub value: Decimal,
    pub target_bucket_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub monthly_limit: Decimal,
    pub current_spending: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionTier {
    Starter,
    Pro,
    Lifetime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub monthly_income: Decimal,
    pub subscription: SubscriptionTier,
    pub payday: u8, // day of month
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryKind {
    Income,
    Expense,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub tier: SubscriptionTier,
    pub name: String,
    pub raw_price: Decimal,
    pub features: Vec<String>,
    pub is_popular: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub plan_name: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub bucket_name: String,
    pub suggested_percentage: u8,
    pub reasoning: String,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "PERCENTAGE",
            Self::Fixed => "FIXED",
        }
    }
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "STARTER",
            Self::Pro => "PRO",
            Self::Lifetime => "LIFETIME",
        }
    }
}

impl CategoryKind {
    pub fn accepts(&self, kind: TransactionType) -> bool {
        matches!(
            (self, kind),
            (Self::Both, _)
                | (Self::Income, TransactionType::Income)
                | (Self::Expense, TransactionType::Expense)
        )
    }
}

macro_rules! text_enum {
    ($ty:ty, $what:literal, [$($text:literal => $variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = BudgetError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(BudgetError::validation(format!(
                        "unknown {} '{}'",
                        $what, other
                    ))),
                }
            }
        }
    };
}

text_enum!(TransactionType, "transaction type", [
    "INCOME" => TransactionType::Income,
    "EXPENSE" => TransactionType::Expense,
]);
text_enum!(RuleType, "rule type", [
    "PERCENTAGE" => RuleType::Percentage,
    "FIXED" => RuleType::Fixed,
]);
text_enum!(SubscriptionTier, "subscription tier", [
    "STARTER" => SubscriptionTier::Starter,
    "PRO" => SubscriptionTier::Pro,
    "LIFETIME" => SubscriptionTier::Lifetime,
]);

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog used to decide whether a transaction category is recognized.
pub fn default_categories() -> Vec<Category> {
    let expense = [
        "Food & Dining",
        "Transport",
        "Rent/Housing",
        "Utilities",
        "Entertainment",
        "Shopping",
        "Education",
        "Healthcare",
        "Travel",
    ];
    let income = ["Salary", "Freelance", "Investment", "Gift"];

    let mut out: Vec<Category> = expense
        .iter()
        .map(|n| Category {
            name: n.to_string(),
            kind: CategoryKind::Expense,
        })
        .collect();
    out.extend(income.iter().map(|n| Category {
        name: n.to_string(),
        kind: CategoryKind::Income,
    }));
    out.push(Category {
        name: "Others".to_string(),
        kind: CategoryKind::Both,
    });
    out
}

/// Buckets written on first run so goals and transactions have valid targets.
pub fn default_buckets() -> Vec<Bucket> {
    [
        ("1", "Education", 5000, "education", 10),
        ("2", "Emergency", 12000, "emergency", 20),
        ("3", "Daily Expenses", 8500, "food", 50),
        ("4", "Dream Car", 15000, "car", 15),
        ("5", "New Home", 45000, "home", 5),
    ]
    .into_iter()
    .map(|(id, name, balance, icon, pct)| Bucket {
        id: id.to_string(),
        name: name.to_string(),
        current_balance: Decimal::from(balance),
        target_percentage: Some(pct),
        fixed_amount: Some(Decimal::ZERO),
        icon: icon.to_string(),
    })
    .collect()
}

pub fn plan_catalog() -> Vec<Plan> {
    vec![
        Plan {
            tier: SubscriptionTier::Starter,
            name: "Starter".into(),
            raw_price: Decimal::ZERO,
            features: vec![
                "Up to 5 buckets".into(),
                "Manual transactions".into(),
                "Basic goals".into(),
            ],
            is_popular: false,
        },
        Plan {
            tier: SubscriptionTier::Pro,
            name: "Pro".into(),
            raw_price: Decimal::new(499, 2),
            features: vec![
                "Unlimited buckets".into(),
                "Allocation rules".into(),
                "AI allocation advice".into(),
            ],
            is_popular: true,
        },
        Plan {
            tier: SubscriptionTier::Lifetime,
            name: "Lifetime".into(),
            raw_price: Decimal::new(4900, 2),
            features: vec![
                "Everything in Pro".into(),
                "One-time payment".into(),
            ],
            is_popular: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_parses_case_insensitively() {
        assert_eq!(
            " income ".parse::<TransactionType>().unwrap(),
            TransactionType::Income
        );
        assert!(matches!(
            "refund".parse::<TransactionType>(),
            Err(BudgetError::Validation(_))
        ));
    }

    #[test]
    fn category_kind_both_accepts_either_direction() {
        assert!(CategoryKind::Both.accepts(TransactionType::Income));
        assert!(CategoryKind::Both.accepts(TransactionType::Expense));
        assert!(!CategoryKind::Income.accepts(TransactionType::Expense));
    }

    #[test]
    fn transaction_serializes_type_as_wire_name() {
        let tx = Transaction {
            id: "t1".into(),
            amount: Decimal::new(120, 0),
            kind: TransactionType::Expense,
            category: "Food & Dining".into(),
            bucket_id: "3".into(),
            date: NaiveDate::from_ymd_opt(2023, 10, 2).unwrap(),
            note: "Lunch".into(),
        };
        let v = serde_json::to_value(&tx).unwrap();
        assert_eq!(v["type"], "EXPENSE");
        assert_eq!(v["bucketId"], "3");
        assert_eq!(v["date"], "2023-10-02");
    }

    #[test]
    fn default_buckets_have_distinct_ids() {
        let buckets = default_buckets();
        let ids: std::collections::BTreeSet<_> = buckets.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids.len(), buckets.len());
        assert_eq!(buckets.len(), 5);
    }
}
