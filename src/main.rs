// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;
use tracing_subscriber::EnvFilter;

use bucketwise::ledger::Ledger;
use bucketwise::recommend::{GeminiConfig, GeminiRecommender};
use bucketwise::store::SqliteStore;
use bucketwise::{cli, commands, db};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bucketwise=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let conn = db::open_or_init()?;
    let profile = commands::profile::load(&conn)?;
    let repairs = commands::doctor::load_repairs(&conn)?;
    let mut ledger = Ledger::load(SqliteStore::new(conn))?;
    ledger.restore_repairs(repairs);
    let seeded = ledger.seed_defaults()?;
    if let Some(p) = profile {
        ledger.set_profile(p);
    }

    let outcome = dispatch(&matches, &mut ledger, seeded);
    commands::doctor::save_repairs(ledger.store().connection(), ledger.pending_repairs())?;
    outcome
}

fn dispatch(matches: &ArgMatches, ledger: &mut Ledger<SqliteStore>, seeded: usize) -> Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
            if seeded > 0 {
                println!("Seeded {} default buckets", seeded);
            }
        }
        Some(("bucket", sub)) => commands::buckets::handle(ledger, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(ledger, sub)?,
        Some(("goal", sub)) => commands::goals::handle(ledger, sub)?,
        Some(("rules", sub)) => commands::rules::handle(ledger, sub)?,
        Some(("profile", sub)) => commands::profile::handle(ledger, sub)?,
        Some(("plan", sub)) => commands::plans::handle(ledger, sub)?,
        Some(("advise", sub)) => {
            let advisor = GeminiRecommender::new(GeminiConfig::from_env());
            commands::advise::handle(ledger, sub, &advisor)?
        }
        Some(("report", sub)) => commands::reports::handle(ledger, sub)?,
        Some(("export", sub)) => commands::exporter::handle(ledger, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(ledger)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
