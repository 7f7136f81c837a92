// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bidirectional mapping between domain objects (camelCase) and remote
//! records (snake_case). Keys absent from [`FIELD_MAP`] are spelled the
//! same on both sides.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BudgetError, Result};
use crate::models::{Bucket, Goal, Order, Rule, Transaction};
use crate::store::{Collection, Record};

/// `(domain, remote)` key pairs.
pub const FIELD_MAP: [(&str, &str); 10] = [
    ("targetPercentage", "target_percentage"),
    ("fixedAmount", "fixed_amount"),
    ("currentBalance", "current_balance"),
    ("bucketId", "bucket_id"),
    ("targetAmount", "target_amount"),
    ("currentAmount", "current_amount"),
    ("targetBucketId", "target_bucket_id"),
    ("userName", "user_name"),
    ("planName", "plan_name"),
    ("createdAt", "created_at"),
];

pub fn remote_key(domain: &str) -> &str {
    FIELD_MAP
        .iter()
        .find(|(d, _)| *d == domain)
        .map_or(domain, |(_, r)| *r)
}

pub fn domain_key(remote: &str) -> &str {
    FIELD_MAP
        .iter()
        .find(|(_, r)| *r == remote)
        .map_or(remote, |(d, _)| *d)
}

/// Builds an update patch from domain-side keys.
pub fn patch(fields: &[(&str, Value)]) -> Record {
    fields
        .iter()
        .map(|(k, v)| (remote_key(k).to_string(), v.clone()))
        .collect()
}

pub trait RemoteEntity: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn to_record(&self) -> Result<Record> {
        let value = serde_json::to_value(self).map_err(|e| malformed(Self::COLLECTION, e))?;
        match value {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (remote_key(&k).to_string(), v))
                .collect()),
            _ => Err(BudgetError::MalformedRecord {
                collection: Self::COLLECTION,
                message: "entity did not serialize to an object".into(),
            }),
        }
    }

    fn from_record(record: &Record) -> Result<Self> {
        let map: serde_json::Map<String, Value> = record
            .iter()
            .map(|(k, v)| (domain_key(k).to_string(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(map)).map_err(|e| malformed(Self::COLLECTION, e))
    }
}

fn malformed(collection: Collection, e: serde_json::Error) -> BudgetError {
    BudgetError::MalformedRecord {
        collection,
        message: e.to_string(),
    }
}

/// Maps every record, failing on the first malformed one.
pub fn from_records<T: RemoteEntity>(records: &[Record]) -> Result<Vec<T>> {
    records.iter().map(T::from_record).collect()
}

macro_rules! remote_entity {
    ($ty:ty, $collection:expr) => {
        impl RemoteEntity for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

remote_entity!(Bucket, Collection::Buckets);
remote_entity!(Transaction, Collection::Transactions);
remote_entity!(Goal, Collection::Goals);
remote_entity!(Rule, Collection::Rules);
remote_entity!(Order, Collection::Orders);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RuleType, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn key_lookups_are_inverse() {
        for (d, r) in FIELD_MAP {
            assert_eq!(remote_key(d), r);
            assert_eq!(domain_key(r), d);
        }
        assert_eq!(remote_key("name"), "name");
        assert_eq!(domain_key("icon"), "icon");
    }

    #[test]
    fn bucket_record_uses_snake_case_keys() {
        let b = Bucket {
            id: "1".into(),
            name: "Education".into(),
            current_balance: Decimal::new(500050, 2),
            target_percentage: Some(10),
            fixed_amount: Some(Decimal::ZERO),
            icon: "education".into(),
        };
        let rec = b.to_record().unwrap();
        assert_eq!(rec["current_balance"], "5000.50");
        assert_eq!(rec["target_percentage"], 10);
        assert!(rec.contains_key("fixed_amount"));
        assert!(!rec.contains_key("currentBalance"));
    }

    #[test]
    fn remote_records_with_numeric_amounts_are_read() {
        let rec = json!({
            "id": "t9",
            "amount": 45000,
            "type": "INCOME",
            "category": "Salary",
            "bucket_id": "3",
            "date": "2023-10-01",
            "note": "Monthly Salary",
            "created_at": "2023-10-01T00:00:00Z"
        });
        let tx = Transaction::from_record(rec.as_object().unwrap()).unwrap();
        assert_eq!(tx.amount, Decimal::from(45000));
        assert_eq!(tx.kind, TransactionType::Income);
        assert_eq!(tx.bucket_id, "3");
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2023, 10, 1).unwrap());
    }

    #[test]
    fn rule_maps_target_bucket_id() {
        let rule = Rule {
            id: "r1".into(),
            name: "Emergency Auto-Save".into(),
            kind: RuleType::Percentage,
            value: Decimal::from(20),
            target_bucket_id: "2".into(),
        };
        let rec = rule.to_record().unwrap();
        assert_eq!(rec["target_bucket_id"], "2");
        assert_eq!(Rule::from_record(&rec).unwrap(), rule);
    }

    #[test]
    fn malformed_record_names_collection() {
        let rec = json!({"id": "g1", "name": "Car"});
        let err = Goal::from_record(rec.as_object().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            BudgetError::MalformedRecord {
                collection: Collection::Goals,
                ..
            }
        ));
    }

    #[test]
    fn patch_maps_domain_keys() {
        let p = patch(&[("currentBalance", json!("800")), ("name", json!("A"))]);
        assert_eq!(p["current_balance"], "800");
        assert_eq!(p["name"], "A");
    }
}
