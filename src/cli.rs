// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn req(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn bucket_cmd() -> Command {
    Command::new("bucket")
        .about("Manage buckets (envelopes)")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Create a bucket")
                .arg(req("name"))
                .arg(opt("icon").default_value("food"))
                .arg(opt("target-pct").value_parser(value_parser!(u8)))
                .arg(opt("fixed").help("Fixed monthly amount"))
                .arg(opt("balance").help("Opening balance (default 0)")),
        )
        .subcommand(json_flags(Command::new("list").about("List buckets")))
        .subcommand(
            Command::new("edit")
                .about("Rename or re-target a bucket; the balance is not editable")
                .arg(req("id").help("Bucket id or name"))
                .arg(opt("name"))
                .arg(opt("icon"))
                .arg(opt("target-pct").value_parser(value_parser!(u8)))
                .arg(opt("fixed")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an unreferenced bucket")
                .arg(req("id").help("Bucket id or name")),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and manage transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record a transaction and update its bucket")
                .arg(req("amount"))
                .arg(req("type").help("INCOME or EXPENSE"))
                .arg(req("category"))
                .arg(req("bucket").help("Bucket id or name"))
                .arg(opt("date").help("YYYY-MM-DD (default today)"))
                .arg(opt("note")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List transactions, newest first")
                .arg(opt("bucket"))
                .arg(opt("month").help("YYYY-MM"))
                .arg(opt("limit").value_parser(value_parser!(usize))),
        ))
        .subcommand(
            Command::new("edit")
                .about("Edit a transaction, moving its balance effect as needed")
                .arg(req("id"))
                .arg(opt("amount"))
                .arg(opt("type"))
                .arg(opt("category"))
                .arg(opt("bucket"))
                .arg(opt("date"))
                .arg(opt("note")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a transaction and revert its balance effect")
                .arg(req("id")),
        )
}

fn goal_cmd() -> Command {
    let fields = |c: Command, required: bool| {
        let mk = |n: &'static str| if required { req(n) } else { opt(n) };
        c.arg(mk("name"))
            .arg(mk("target"))
            .arg(mk("deadline").help("YYYY-MM-DD"))
            .arg(mk("bucket").help("Bucket id or name"))
            .arg(opt("icon"))
    };
    Command::new("goal")
        .about("Savings goals")
        .subcommand_required(true)
        .subcommand(fields(Command::new("add").about("Create a goal"), true))
        .subcommand(json_flags(Command::new("list").about("List goals with progress")))
        .subcommand(fields(
            Command::new("edit").about("Edit a goal").arg(req("id")),
            false,
        ))
        .subcommand(
            Command::new("progress")
                .about("Set the amount saved toward a goal")
                .arg(req("id"))
                .arg(req("amount")),
        )
        .subcommand(Command::new("rm").about("Delete a goal").arg(req("id")))
}

fn rules_cmd() -> Command {
    Command::new("rules")
        .about("Allocation rules (stored, not executed)")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(req("type").help("PERCENTAGE or FIXED"))
                .arg(req("value"))
                .arg(req("bucket").help("Target bucket id or name")),
        )
        .subcommand(Command::new("list"))
        .subcommand(Command::new("rm").arg(req("id")))
}

pub fn build_cli() -> Command {
    Command::new("bucketwise")
        .about("Envelope budgeting with buckets, goals and allocation advice")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Create the database and seed default buckets"))
        .subcommand(bucket_cmd())
        .subcommand(tx_cmd())
        .subcommand(goal_cmd())
        .subcommand(rules_cmd())
        .subcommand(
            Command::new("profile")
                .about("Session profile used for advice and checkout")
                .subcommand_required(true)
                .subcommand(
                    Command::new("set")
                        .arg(req("name"))
                        .arg(req("income").help("Monthly income"))
                        .arg(opt("payday").value_parser(value_parser!(u8)).default_value("1")),
                )
                .subcommand(Command::new("show")),
        )
        .subcommand(
            Command::new("plan")
                .about("Subscription plans")
                .subcommand_required(true)
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("buy")
                        .arg(req("tier").help("STARTER, PRO or LIFETIME"))
                        .arg(opt("email")),
                ),
        )
        .subcommand(json_flags(
            Command::new("advise")
                .about("Ask the AI advisor for an allocation plan")
                .arg(opt("income").help("Override the profile's monthly income"))
                .arg(
                    Arg::new("apply")
                        .long("apply")
                        .action(ArgAction::SetTrue)
                        .help("Write matched percentages to buckets"),
                ),
        ))
        .subcommand(
            Command::new("report")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("summary")
                        .about("Balances and monthly income/expense")
                        .arg(opt("month").help("YYYY-MM (default current month)")),
                )),
        )
        .subcommand(
            Command::new("export")
                .subcommand_required(true)
                .subcommand(
                    Command::new("transactions")
                        .arg(opt("format").default_value("csv").help("csv|json"))
                        .arg(req("out")),
                ),
        )
        .subcommand(Command::new("doctor").about("Check for dangling references"))
}
