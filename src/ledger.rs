// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Application state and the operations that mutate it.
//!
//! Every mutation follows the same shape: validate against the local view,
//! update the local view optimistically, then run the remote writes in
//! order. Each remote write carries a compensating write. When a write
//! fails, the earlier writes of the same operation are undone in reverse
//! order and the local view is restored from its snapshot. Undo writes
//! that fail as well are kept as [`Repair`]s for [`Ledger::retry_repairs`].
//! A repair is dropped once a later operation writes the same record, since
//! that write already brought the record back in line with the local view.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{BudgetError, Result};
use crate::mapping::{self, RemoteEntity};
use crate::models::{
    Bucket, Budget, Category, Goal, Order, Recommendation, Rule, RuleType, SubscriptionTier,
    Transaction, TransactionType, UserProfile, default_buckets, default_categories,
    plan_catalog,
};
use crate::reconcile::{
    BalanceChange, commit_changes, create_deltas, edit_deltas, plan_balances, reversal_deltas,
};
use crate::recommend::{RecommendationMatch, match_recommendations};
use crate::store::{Collection, Record, RemoteStore, StoreError};
use crate::validate;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerState {
    pub buckets: Vec<Bucket>,
    pub transactions: Vec<Transaction>, // newest first
    pub goals: Vec<Goal>,
    pub rules: Vec<Rule>,
    pub budgets: Vec<Budget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum WriteOp {
    Insert(Record),
    Update { id: String, patch: Record },
    Delete { id: String },
}

impl WriteOp {
    /// Id of the record the write targets.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            WriteOp::Insert(record) => record.get("id").and_then(Value::as_str),
            WriteOp::Update { id, .. } | WriteOp::Delete { id } => Some(id),
        }
    }
}

/// A compensating write that could not be applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    pub collection: Collection,
    pub op: WriteOp,
}

impl Repair {
    fn touches(&self, collection: Collection, id: Option<&str>) -> bool {
        self.collection == collection && id.is_some() && self.op.target_id() == id
    }
}

struct Step {
    collection: Collection,
    forward: WriteOp,
    undo: WriteOp,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub kind: TransactionType,
    pub category: String,
    pub bucket_id: String,
    pub date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewBucket {
    pub name: String,
    pub target_percentage: Option<u8>,
    pub fixed_amount: Option<Decimal>,
    pub icon: String,
    pub opening_balance: Decimal,
}

/// Editable bucket fields. The balance only moves through transactions.
#[derive(Debug, Clone)]
pub struct BucketEdit {
    pub name: String,
    pub target_percentage: Option<u8>,
    pub fixed_amount: Option<Decimal>,
    pub icon: String,
}

#[derive(Debug, Clone)]
pub struct GoalDraft {
    pub name: String,
    pub target_amount: Decimal,
    pub deadline: NaiveDate,
    pub icon: String,
    pub bucket_id: String,
}

#[derive(Debug, Clone)]
pub struct NewRule {
    pub name: String,
    pub kind: RuleType,
    pub value: Decimal,
    pub target_bucket_id: String,
}

pub struct Ledger<S: RemoteStore> {
    store: S,
    state: LedgerState,
    categories: Vec<Category>,
    profile: Option<UserProfile>,
    repairs: Vec<Repair>,
}

const GUEST: &str = "Guest User";

fn sort_newest_first(txs: &mut [Transaction]) {
    txs.sort_by(|a, b| b.date.cmp(&a.date));
}

fn new_id(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

fn exec<S: RemoteStore>(
    store: &mut S,
    collection: Collection,
    op: &WriteOp,
) -> std::result::Result<(), StoreError> {
    match op {
        WriteOp::Insert(record) => store.insert(collection, std::slice::from_ref(record)),
        WriteOp::Update { id, patch } => store.update(collection, patch, id),
        WriteOp::Delete { id } => store.delete(collection, id),
    }
}

fn insert_step<T: RemoteEntity>(entity: &T) -> Result<Step> {
    Ok(Step {
        collection: T::COLLECTION,
        forward: WriteOp::Insert(entity.to_record()?),
        undo: WriteOp::Delete {
            id: entity.id().to_string(),
        },
    })
}

fn delete_step<T: RemoteEntity>(entity: &T) -> Result<Step> {
    Ok(Step {
        collection: T::COLLECTION,
        forward: WriteOp::Delete {
            id: entity.id().to_string(),
        },
        undo: WriteOp::Insert(entity.to_record()?),
    })
}

fn without_id(mut record: Record) -> Record {
    record.remove("id");
    record
}

/// Full-record update from `old` to `new`.
fn replace_step<T: RemoteEntity>(old: &T, new: &T) -> Result<Step> {
    Ok(Step {
        collection: T::COLLECTION,
        forward: WriteOp::Update {
            id: old.id().to_string(),
            patch: without_id(new.to_record()?),
        },
        undo: WriteOp::Update {
            id: old.id().to_string(),
            patch: without_id(old.to_record()?),
        },
    })
}

fn field_step(
    collection: Collection,
    id: &str,
    forward: &[(&str, Value)],
    undo: &[(&str, Value)],
) -> Step {
    Step {
        collection,
        forward: WriteOp::Update {
            id: id.to_string(),
            patch: mapping::patch(forward),
        },
        undo: WriteOp::Update {
            id: id.to_string(),
            patch: mapping::patch(undo),
        },
    }
}

fn balance_steps(changes: &[BalanceChange]) -> Vec<Step> {
    changes
        .iter()
        .map(|c| {
            field_step(
                Collection::Buckets,
                &c.bucket_id,
                &[("currentBalance", json!(c.after))],
                &[("currentBalance", json!(c.before))],
            )
        })
        .collect()
}

impl<S: RemoteStore> Ledger<S> {
    /// Empty local view over `store`; call [`Ledger::refresh`] to read it.
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: LedgerState::default(),
            categories: default_categories(),
            profile: None,
            repairs: Vec::new(),
        }
    }

    pub fn load(store: S) -> Result<Self> {
        let mut ledger = Self::new(store);
        ledger.refresh()?;
        Ok(ledger)
    }

    pub fn refresh(&mut self) -> Result<()> {
        let buckets = self.fetch::<Bucket>()?;
        let mut transactions = self.fetch::<Transaction>()?;
        // Later records first within a day, matching local inserts.
        transactions.reverse();
        sort_newest_first(&mut transactions);
        let goals = self.fetch::<Goal>()?;
        let rules = self.fetch::<Rule>()?;
        self.state.buckets = buckets;
        self.state.transactions = transactions;
        self.state.goals = goals;
        self.state.rules = rules;
        Ok(())
    }

    fn fetch<T: RemoteEntity>(&self) -> Result<Vec<T>> {
        let records = self
            .store
            .select(T::COLLECTION, None)
            .map_err(BudgetError::RemoteRead)?;
        mapping::from_records(&records)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.state.buckets
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn goals(&self) -> &[Goal] {
        &self.state.goals
    }

    pub fn rules(&self) -> &[Rule] {
        &self.state.rules
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.state.budgets
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn bucket(&self, id: &str) -> Option<&Bucket> {
        self.state.buckets.iter().find(|b| b.id == id)
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.state.transactions.iter().find(|t| t.id == id)
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.state.goals.iter().find(|g| g.id == id)
    }

    pub fn total_balance(&self) -> Decimal {
        self.state.buckets.iter().map(|b| b.current_balance).sum()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
    }

    pub fn pending_repairs(&self) -> &[Repair] {
        &self.repairs
    }

    /// Adopts repairs journaled by an earlier session.
    pub fn restore_repairs(&mut self, repairs: Vec<Repair>) {
        self.repairs = repairs;
    }

    /// Replays journaled repairs in order; returns how many still fail.
    pub fn retry_repairs(&mut self) -> usize {
        let pending = std::mem::take(&mut self.repairs);
        for repair in pending {
            if let Err(e) = exec(&mut self.store, repair.collection, &repair.op) {
                tracing::warn!(collection = %repair.collection, "repair still failing: {e}");
                self.repairs.push(repair);
            }
        }
        self.repairs.len()
    }

    fn run_steps(&mut self, steps: &[Step]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            tracing::debug!(collection = %step.collection, "remote write {} of {}", i + 1, steps.len());
            let Err(err) = exec(&mut self.store, step.collection, &step.forward) else {
                continue;
            };
            let mut pending = 0;
            for done in steps[..i].iter().rev() {
                if let Err(undo_err) = exec(&mut self.store, done.collection, &done.undo) {
                    tracing::warn!(
                        collection = %done.collection,
                        "compensating write failed, remote store is inconsistent until repaired: {undo_err}"
                    );
                    self.repairs.push(Repair {
                        collection: done.collection,
                        op: done.undo.clone(),
                    });
                    pending += 1;
                }
            }
            return Err(if pending == 0 {
                BudgetError::RemoteWrite(err)
            } else {
                BudgetError::InconsistentRemote {
                    source: err,
                    pending,
                }
            });
        }
        self.forget_superseded(steps);
        Ok(())
    }

    fn forget_superseded(&mut self, steps: &[Step]) {
        self.repairs.retain(|r| {
            let stale = steps
                .iter()
                .any(|s| r.touches(s.collection, s.forward.target_id()));
            if stale {
                tracing::debug!(collection = %r.collection, "dropping superseded repair");
            }
            !stale
        });
    }

    /// Applies `mutate` to the local view, then the remote steps; restores
    /// the local view if any remote step fails.
    fn transact(&mut self, steps: Vec<Step>, mutate: impl FnOnce(&mut LedgerState)) -> Result<()> {
        let snapshot = self.state.clone();
        mutate(&mut self.state);
        if let Err(e) = self.run_steps(&steps) {
            self.state = snapshot;
            return Err(e);
        }
        Ok(())
    }

    /// Writes the default buckets when the remote bucket collection is empty.
    /// Returns the number of buckets inserted.
    pub fn seed_defaults(&mut self) -> Result<usize> {
        let existing = self
            .store
            .select(Collection::Buckets, None)
            .map_err(BudgetError::RemoteRead)?;
        if !existing.is_empty() {
            tracing::debug!("{} buckets present, skipping seed", existing.len());
            return Ok(0);
        }
        let defaults = default_buckets();
        let records = defaults
            .iter()
            .map(|b| b.to_record())
            .collect::<Result<Vec<_>>>()?;
        self.store
            .insert(Collection::Buckets, &records)
            .map_err(BudgetError::RemoteWrite)?;
        let n = defaults.len();
        self.state.buckets.extend(defaults);
        tracing::info!("seeded {n} default buckets");
        Ok(n)
    }

    // -- transactions -----------------------------------------------------

    pub fn apply_create(&mut self, tx: Transaction) -> Result<Transaction> {
        validate::transaction(&tx, &self.state.buckets, &self.categories)?;
        if self.transaction(&tx.id).is_some() {
            return Err(BudgetError::validation(format!(
                "transaction '{}' already exists",
                tx.id
            )));
        }
        let changes = plan_balances(&self.state.buckets, &create_deltas(&tx))?;
        let mut steps = vec![insert_step(&tx)?];
        steps.extend(balance_steps(&changes));

        let created = tx.clone();
        self.transact(steps, |state| {
            state.transactions.insert(0, created);
            sort_newest_first(&mut state.transactions);
            commit_changes(&mut state.buckets, &changes);
        })?;
        Ok(tx)
    }

    /// Same resulting balances as deleting the stored transaction with this
    /// id and creating `updated`. Returns the previous version.
    pub fn apply_edit(&mut self, updated: Transaction) -> Result<Transaction> {
        let old = self
            .transaction(&updated.id)
            .cloned()
            .ok_or_else(|| BudgetError::NotFound(updated.id.clone()))?;
        validate::transaction(&updated, &self.state.buckets, &self.categories)?;
        let changes = plan_balances(&self.state.buckets, &edit_deltas(&old, &updated))?;
        let mut steps = vec![replace_step(&old, &updated)?];
        steps.extend(balance_steps(&changes));

        let replacement = updated.clone();
        self.transact(steps, |state| {
            if let Some(t) = state.transactions.iter_mut().find(|t| t.id == replacement.id) {
                *t = replacement;
            }
            sort_newest_first(&mut state.transactions);
            commit_changes(&mut state.buckets, &changes);
        })?;
        Ok(old)
    }

    pub fn apply_delete(&mut self, id: &str) -> Result<Transaction> {
        let old = self
            .transaction(id)
            .cloned()
            .ok_or_else(|| BudgetError::NotFound(id.to_string()))?;
        let changes = plan_balances(&self.state.buckets, &reversal_deltas(&old))?;
        let mut steps = vec![delete_step(&old)?];
        steps.extend(balance_steps(&changes));

        self.transact(steps, |state| {
            state.transactions.retain(|t| t.id != old.id);
            commit_changes(&mut state.buckets, &changes);
        })?;
        Ok(old)
    }

    pub fn record_transaction(&mut self, draft: NewTransaction) -> Result<Transaction> {
        let note = draft
            .note
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "New Transaction".to_string());
        self.apply_create(Transaction {
            id: new_id("t"),
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category,
            bucket_id: draft.bucket_id,
            date: draft.date,
            note,
        })
    }

    // -- buckets ----------------------------------------------------------

    pub fn create_bucket(&mut self, draft: NewBucket) -> Result<Bucket> {
        let bucket = Bucket {
            id: new_id("b"),
            name: draft.name.trim().to_string(),
            current_balance: draft.opening_balance,
            target_percentage: draft.target_percentage,
            fixed_amount: Some(draft.fixed_amount.unwrap_or(Decimal::ZERO)),
            icon: draft.icon,
        };
        validate::bucket(&bucket)?;
        let steps = vec![insert_step(&bucket)?];
        let created = bucket.clone();
        self.transact(steps, |state| state.buckets.push(created))?;
        Ok(bucket)
    }

    pub fn update_bucket(&mut self, id: &str, edit: BucketEdit) -> Result<Bucket> {
        let old = self
            .bucket(id)
            .cloned()
            .ok_or_else(|| BudgetError::NotFound(id.to_string()))?;
        let updated = Bucket {
            name: edit.name.trim().to_string(),
            target_percentage: edit.target_percentage,
            fixed_amount: edit.fixed_amount,
            icon: edit.icon,
            ..old.clone()
        };
        validate::bucket(&updated)?;
        let fields = |b: &Bucket| {
            vec![
                ("name", json!(b.name)),
                ("targetPercentage", json!(b.target_percentage)),
                ("fixedAmount", json!(b.fixed_amount)),
                ("icon", json!(b.icon)),
            ]
        };
        let steps = vec![field_step(
            Collection::Buckets,
            id,
            &fields(&updated),
            &fields(&old),
        )];
        let replacement = updated.clone();
        self.transact(steps, |state| {
            if let Some(b) = state.buckets.iter_mut().find(|b| b.id == replacement.id) {
                *b = replacement;
            }
        })?;
        Ok(updated)
    }

    /// Refused while any transaction, goal or rule still points at the bucket.
    pub fn delete_bucket(&mut self, id: &str) -> Result<Bucket> {
        let bucket = self
            .bucket(id)
            .cloned()
            .ok_or_else(|| BudgetError::NotFound(id.to_string()))?;
        let txs = self.state.transactions.iter().filter(|t| t.bucket_id == id).count();
        let goals = self.state.goals.iter().filter(|g| g.bucket_id == id).count();
        let rules = self
            .state
            .rules
            .iter()
            .filter(|r| r.target_bucket_id == id)
            .count();
        if txs + goals + rules > 0 {
            return Err(BudgetError::validation(format!(
                "bucket '{}' is still referenced by {} transaction(s), {} goal(s) and {} rule(s)",
                bucket.name, txs, goals, rules
            )));
        }
        let steps = vec![delete_step(&bucket)?];
        self.transact(steps, |state| state.buckets.retain(|b| b.id != id))?;
        Ok(bucket)
    }

    // -- goals ------------------------------------------------------------

    pub fn create_goal(&mut self, draft: GoalDraft) -> Result<Goal> {
        let goal = Goal {
            id: new_id("g"),
            name: draft.name.trim().to_string(),
            target_amount: draft.target_amount,
            current_amount: Decimal::ZERO,
            deadline: draft.deadline,
            icon: draft.icon,
            bucket_id: draft.bucket_id,
        };
        validate::goal(&goal, &self.state.buckets)?;
        let steps = vec![insert_step(&goal)?];
        let created = goal.clone();
        self.transact(steps, |state| state.goals.push(created))?;
        Ok(goal)
    }

    /// Leaves `current_amount` untouched.
    pub fn update_goal(&mut self, id: &str, draft: GoalDraft) -> Result<Goal> {
        let old = self
            .goal(id)
            .cloned()
            .ok_or_else(|| BudgetError::NotFound(id.to_string()))?;
        let updated = Goal {
            name: draft.name.trim().to_string(),
            target_amount: draft.target_amount,
            deadline: draft.deadline,
            icon: draft.icon,
            bucket_id: draft.bucket_id,
            ..old.clone()
        };
        validate::goal(&updated, &self.state.buckets)?;
        let steps = vec![replace_step(&old, &updated)?];
        self.replace_goal(steps, updated)
    }

    pub fn update_goal_progress(&mut self, id: &str, current_amount: Decimal) -> Result<Goal> {
        let old = self
            .goal(id)
            .cloned()
            .ok_or_else(|| BudgetError::NotFound(id.to_string()))?;
        let updated = Goal {
            current_amount,
            ..old.clone()
        };
        validate::goal(&updated, &self.state.buckets)?;
        let steps = vec![field_step(
            Collection::Goals,
            id,
            &[("currentAmount", json!(updated.current_amount))],
            &[("currentAmount", json!(old.current_amount))],
        )];
        self.replace_goal(steps, updated)
    }

    fn replace_goal(&mut self, steps: Vec<Step>, updated: Goal) -> Result<Goal> {
        let replacement = updated.clone();
        self.transact(steps, |state| {
            if let Some(g) = state.goals.iter_mut().find(|g| g.id == replacement.id) {
                *g = replacement;
            }
        })?;
        Ok(updated)
    }

    pub fn delete_goal(&mut self, id: &str) -> Result<Goal> {
        let goal = self
            .goal(id)
            .cloned()
            .ok_or_else(|| BudgetError::NotFound(id.to_string()))?;
        let steps = vec![delete_step(&goal)?];
        self.transact(steps, |state| state.goals.retain(|g| g.id != id))?;
        Ok(goal)
    }

    // -- rules ------------------------------------------------------------

    pub fn create_rule(&mut self, draft: NewRule) -> Result<Rule> {
        let rule = Rule {
            id: new_id("r"),
            name: draft.name.trim().to_string(),
            kind: draft.kind,
            value: draft.value,
            target_bucket_id: draft.target_bucket_id,
        };
        validate::rule(&rule, &self.state.buckets)?;
        let steps = vec![insert_step(&rule)?];
        let created = rule.clone();
        self.transact(steps, |state| state.rules.push(created))?;
        Ok(rule)
    }

    pub fn delete_rule(&mut self, id: &str) -> Result<Rule> {
        let rule = self
            .state
            .rules
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| BudgetError::NotFound(id.to_string()))?;
        let steps = vec![delete_step(&rule)?];
        self.transact(steps, |state| state.rules.retain(|r| r.id != id))?;
        Ok(rule)
    }

    // -- session-only state -----------------------------------------------

    /// Inserts or replaces the budget for `budget.category`.
    pub fn set_budget(&mut self, budget: Budget) -> Result<()> {
        if budget.monthly_limit < Decimal::ZERO || budget.current_spending < Decimal::ZERO {
            return Err(BudgetError::validation("budget amounts cannot be negative"));
        }
        match self
            .state
            .budgets
            .iter_mut()
            .find(|b| b.category.eq_ignore_ascii_case(&budget.category))
        {
            Some(existing) => *existing = budget,
            None => self.state.budgets.push(budget),
        }
        Ok(())
    }

    /// Records an order for paid tiers, then upgrades the session profile.
    /// A paid order without a profile starts a "Guest User" profile. The
    /// free tier switches without an order.
    pub fn place_order(&mut self, email: &str, tier: SubscriptionTier) -> Result<Option<Order>> {
        let order = if tier == SubscriptionTier::Starter {
            None
        } else {
            let email = email.trim();
            if email.is_empty() || !email.contains('@') {
                return Err(BudgetError::validation(format!(
                    "'{}' is not a valid email",
                    email
                )));
            }
            let plan = plan_catalog()
                .into_iter()
                .find(|p| p.tier == tier)
                .ok_or_else(|| BudgetError::NotFound(tier.to_string()))?;
            let order = Order {
                id: new_id("o"),
                user_name: self
                    .profile
                    .as_ref()
                    .map_or_else(|| GUEST.to_string(), |p| p.name.clone()),
                email: email.to_string(),
                plan_name: plan.name,
                price: plan.raw_price,
                created_at: Utc::now(),
            };
            self.transact(vec![insert_step(&order)?], |_| {})?;
            Some(order)
        };
        match self.profile.as_mut() {
            Some(profile) => profile.subscription = tier,
            None if order.is_some() => {
                self.profile = Some(UserProfile {
                    name: GUEST.to_string(),
                    monthly_income: Decimal::ZERO,
                    subscription: tier,
                    payday: 1,
                });
            }
            None => {}
        }
        Ok(order)
    }

    /// Sets the target percentage of every bucket a recommendation names.
    /// Entries naming no bucket are returned unapplied.
    pub fn apply_recommendations(
        &mut self,
        recs: &[Recommendation],
    ) -> Result<Vec<RecommendationMatch>> {
        let matches = match_recommendations(recs, &self.state.buckets);
        let mut steps = Vec::new();
        for m in matches.iter().filter(|m| m.is_applicable()) {
            let Some(bucket) = m.bucket_id.as_deref().and_then(|id| self.bucket(id)) else {
                continue;
            };
            steps.push(field_step(
                Collection::Buckets,
                &bucket.id,
                &[(
                    "targetPercentage",
                    json!(m.recommendation.suggested_percentage),
                )],
                &[("targetPercentage", json!(bucket.target_percentage))],
            ));
        }
        if steps.is_empty() {
            return Ok(matches);
        }
        let applied = matches.clone();
        self.transact(steps, |state| {
            for m in &applied {
                if let Some(b) = m
                    .bucket_id
                    .as_deref()
                    .and_then(|id| state.buckets.iter_mut().find(|b| b.id == id))
                {
                    b.target_percentage = Some(m.recommendation.suggested_percentage);
                }
            }
        })?;
        Ok(matches)
    }
}
