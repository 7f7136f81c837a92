// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::Cell;

use bucketwise::commands::{advise, doctor, exporter, resolve_bucket, transactions};
use bucketwise::ledger::{Ledger, NewTransaction};
use bucketwise::models::{Bucket, Goal, Recommendation, TransactionType};
use bucketwise::recommend::Recommender;
use bucketwise::store::{Collection, MemoryStore, RemoteStore, SqliteStore, WriteKind};
use bucketwise::cli;
use chrono::NaiveDate;
use rust_decimal::Decimal;

fn seeded() -> Ledger<MemoryStore> {
    let mut ledger = Ledger::new(MemoryStore::new());
    ledger.seed_defaults().unwrap();
    for (i, bucket) in ["3", "3", "1"].into_iter().enumerate() {
        ledger
            .record_transaction(NewTransaction {
                amount: Decimal::from(10 * (i as i64 + 1)),
                kind: TransactionType::Expense,
                category: "Food & Dining".into(),
                bucket_id: bucket.into(),
                date: NaiveDate::from_ymd_opt(2025, 1, i as u32 + 1).unwrap(),
                note: None,
            })
            .unwrap();
    }
    ledger
}

fn sub_matches<'a>(m: &'a clap::ArgMatches, path: &[&str]) -> &'a clap::ArgMatches {
    let mut cur = m;
    for name in path {
        cur = match cur.subcommand() {
            Some((n, sub)) if n == *name => sub,
            _ => panic!("no {} subcommand", name),
        };
    }
    cur
}

#[test]
fn list_limit_respected() {
    let ledger = seeded();
    let matches = cli::build_cli().get_matches_from(["bucketwise", "tx", "list", "--limit", "2"]);
    let list_m = sub_matches(&matches, &["tx", "list"]);
    let rows = transactions::query_rows(&ledger, list_m).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2025-01-03");
}

#[test]
fn list_filters_by_bucket_name() {
    let ledger = seeded();
    let matches = cli::build_cli().get_matches_from([
        "bucketwise",
        "tx",
        "list",
        "--bucket",
        "daily expenses",
        "--month",
        "2025-01",
    ]);
    let rows = transactions::query_rows(&ledger, sub_matches(&matches, &["tx", "list"])).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.bucket == "Daily Expenses"));
}

#[test]
fn bucket_lookup_by_id_or_name() {
    let ledger = seeded();
    assert_eq!(resolve_bucket(&ledger, "2").unwrap(), "2");
    assert_eq!(resolve_bucket(&ledger, " dream car ").unwrap(), "4");
    assert!(resolve_bucket(&ledger, "Yacht").is_err());
}

#[test]
fn cli_rejects_out_of_range_percentage() {
    let res = cli::build_cli().try_get_matches_from([
        "bucketwise",
        "bucket",
        "add",
        "--name",
        "Fun",
        "--target-pct",
        "300",
    ]);
    assert!(res.is_err());
}

#[test]
fn export_csv_is_oldest_first() {
    let ledger = seeded();
    let mut buf = Vec::new();
    let n = exporter::write_transactions(&ledger, "csv", &mut buf).unwrap();
    assert_eq!(n, 3);
    let mut rdr = csv::Reader::from_reader(buf.as_slice());
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[1], "date");
    let dates: Vec<String> = rdr
        .records()
        .map(|r| r.unwrap()[1].to_string())
        .collect();
    assert_eq!(dates, ["2025-01-01", "2025-01-02", "2025-01-03"]);
}

#[test]
fn export_json_and_unknown_format() {
    let ledger = seeded();
    let mut buf = Vec::new();
    exporter::write_transactions(&ledger, "json", &mut buf).unwrap();
    let items: Vec<serde_json::Value> = serde_json::from_slice(&buf).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[2]["bucket"], "Education");
    assert_eq!(items[0]["type"], "EXPENSE");

    assert!(exporter::write_transactions(&ledger, "xml", Vec::new()).is_err());
}

struct Canned {
    recs: Vec<Recommendation>,
    calls: Cell<usize>,
}

impl Recommender for Canned {
    fn recommend(&self, _income: Decimal, _goals: &[Goal], _buckets: &[Bucket]) -> Vec<Recommendation> {
        self.calls.set(self.calls.get() + 1);
        self.recs.clone()
    }
}

fn rec(name: &str, pct: u8) -> Recommendation {
    Recommendation {
        bucket_name: name.into(),
        suggested_percentage: pct,
        reasoning: "because".into(),
    }
}

#[test]
fn advise_apply_skips_unknown_buckets() {
    let mut ledger = Ledger::new(MemoryStore::new());
    ledger.seed_defaults().unwrap();
    ledger.delete_bucket("2").unwrap();
    let advisor = Canned {
        recs: vec![rec("Emergency", 30), rec("daily expenses", 40)],
        calls: Cell::new(0),
    };
    let matches = cli::build_cli().get_matches_from([
        "bucketwise",
        "advise",
        "--income",
        "5000",
        "--apply",
        "--json",
    ]);
    advise::handle(&mut ledger, sub_matches(&matches, &["advise"]), &advisor).unwrap();
    assert_eq!(advisor.calls.get(), 1);
    assert_eq!(ledger.bucket("3").unwrap().target_percentage, Some(40));
    assert_eq!(ledger.bucket("1").unwrap().target_percentage, Some(10));
    assert_eq!(
        ledger.store().writes_to(WriteKind::Update, Collection::Buckets),
        1
    );
}

#[test]
fn advise_without_income_fails_before_calling_out() {
    let mut ledger = Ledger::new(MemoryStore::new());
    ledger.seed_defaults().unwrap();
    let advisor = Canned {
        recs: vec![rec("Emergency", 30)],
        calls: Cell::new(0),
    };
    let matches = cli::build_cli().get_matches_from(["bucketwise", "advise"]);
    assert!(advise::handle(&mut ledger, sub_matches(&matches, &["advise"]), &advisor).is_err());
    assert_eq!(advisor.calls.get(), 0);
}

#[test]
fn empty_advice_changes_nothing() {
    let mut ledger = Ledger::new(MemoryStore::new());
    ledger.seed_defaults().unwrap();
    let before = ledger.buckets().to_vec();
    let advisor = Canned {
        recs: Vec::new(),
        calls: Cell::new(0),
    };
    let matches =
        cli::build_cli().get_matches_from(["bucketwise", "advise", "--income", "100", "--apply"]);
    advise::handle(&mut ledger, sub_matches(&matches, &["advise"]), &advisor).unwrap();
    assert_eq!(ledger.buckets(), before.as_slice());
}

#[test]
fn repair_journal_survives_a_restart() {
    let settings = SqliteStore::open_in_memory().unwrap();
    let conn = settings.connection();
    assert!(doctor::load_repairs(conn).unwrap().is_empty());

    let mut ledger = seeded();
    {
        let store = ledger.store_mut();
        store.fail_next(WriteKind::Update, Collection::Buckets);
        store.fail_next(WriteKind::Delete, Collection::Transactions);
    }
    let orphan = NewTransaction {
        amount: Decimal::from(15),
        kind: TransactionType::Expense,
        category: "Food & Dining".into(),
        bucket_id: "3".into(),
        date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        note: None,
    };
    assert!(ledger.record_transaction(orphan).is_err());
    assert_eq!(ledger.pending_repairs().len(), 1);

    doctor::save_repairs(conn, ledger.pending_repairs()).unwrap();
    let loaded = doctor::load_repairs(conn).unwrap();
    assert_eq!(loaded, ledger.pending_repairs());

    // A new session starts with an empty journal until it is restored.
    ledger.restore_repairs(Vec::new());
    ledger.restore_repairs(loaded);
    doctor::handle(&mut ledger).unwrap();
    assert!(ledger.pending_repairs().is_empty());
    let remote = ledger.store().select(Collection::Transactions, None).unwrap();
    assert_eq!(remote.len(), 3);
    assert_eq!(ledger.transactions().len(), 3);

    doctor::save_repairs(conn, ledger.pending_repairs()).unwrap();
    assert!(doctor::load_repairs(conn).unwrap().is_empty());
}
