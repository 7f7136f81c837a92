// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io;
use std::sync::{Arc, Mutex};

use bucketwise::error::BudgetError;
use bucketwise::ledger::{Ledger, NewBucket, NewTransaction};
use bucketwise::models::TransactionType;
use bucketwise::store::{Collection, MemoryStore, WriteKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured(sink: &SharedBuffer) -> String {
    let bytes = sink.0.lock().expect("lock output").clone();
    String::from_utf8(bytes).expect("utf8 log output")
}

#[test]
fn failed_compensating_write_logs_a_warning() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .with_max_level(Level::WARN)
        .finish();

    let err = tracing::subscriber::with_default(subscriber, || {
        let mut ledger = Ledger::new(MemoryStore::new());
        let bucket = ledger
            .create_bucket(NewBucket {
                name: "A".into(),
                icon: "food".into(),
                opening_balance: Decimal::from(1000),
                ..Default::default()
            })
            .expect("bucket");
        ledger
            .store_mut()
            .fail_next(WriteKind::Update, Collection::Buckets);
        ledger
            .store_mut()
            .fail_next(WriteKind::Delete, Collection::Transactions);
        ledger
            .record_transaction(NewTransaction {
                amount: Decimal::from(40),
                kind: TransactionType::Expense,
                category: "Food & Dining".into(),
                bucket_id: bucket.id,
                date: NaiveDate::from_ymd_opt(2025, 3, 10).expect("date"),
                note: None,
            })
            .expect_err("undo should fail")
    });
    assert!(matches!(err, BudgetError::InconsistentRemote { pending: 1, .. }));

    let text = captured(&sink);
    let line = text
        .lines()
        .find(|l| l.contains("compensating write failed"))
        .expect("warning line");
    assert!(line.contains("WARN"));
    assert!(line.contains("collection=transactions"));
}

#[test]
fn clean_rollback_stays_quiet_at_warn() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .with_max_level(Level::WARN)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut ledger = Ledger::new(MemoryStore::new());
        ledger
            .store_mut()
            .fail_next(WriteKind::Insert, Collection::Buckets);
        let err = ledger
            .create_bucket(NewBucket {
                name: "A".into(),
                icon: "food".into(),
                ..Default::default()
            })
            .expect_err("insert should fail");
        assert!(err.is_remote_write());
    });

    assert!(captured(&sink).is_empty());
}
