//! Adjustment ledger: the only writer of stock quantities.
//!
//! ```text
//! command
//!   ↓
//! 1. load record, check lifecycle preconditions
//!   ↓
//! 2. apply signed deltas to the catalog (all-or-nothing, rolled back on failure)
//!   ↓
//! 3. handle command on the aggregate, apply resulting events
//!   ↓
//! 4. persist with an exact expected record version (catalog rolled back on failure)
//!   ↓
//! 5. publish envelopes to the bus
//! ```
//!
//! Steps 2-4 of `approve`, `reverse` and every auto-approve path run under one
//! ledger-wide lock, so two approvals never interleave their catalog writes.

use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use stockledger_adjustments::{
    AdjustmentCommand, AdjustmentDrafted, AdjustmentEvent, AdjustmentStatus, AppliedDelta,
    ApproveAdjustment, DiscardAdjustment, RejectAdjustment, ReverseAdjustment, StockAdjustment,
    SubmitAdjustment,
};
use stockledger_catalog::{ApplyMode, ProductRepo, Sku, StockChange};
use stockledger_core::{
    AdjustmentId, Aggregate, AggregateRoot, DomainError, EventId, ExpectedVersion,
};
use stockledger_events::{EventBus, EventEnvelope};

use crate::config::LedgerConfig;
use crate::projections::adjustment_report::{self, AdjustmentFilter, AdjustmentSummary};
use crate::repo::{AdjustmentRepo, RepoError};

const AGGREGATE_TYPE: &str = "stock_adjustment";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("adjustment store failure: {0}")]
    Store(RepoError),
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Concurrency(msg) => LedgerError::Domain(DomainError::conflict(msg)),
            RepoError::NotFound(what) => LedgerError::Domain(DomainError::not_found(format!("adjustment {what}"))),
            other => LedgerError::Store(other),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

pub struct AdjustmentLedger<P, R, B> {
    catalog: P,
    repo: R,
    bus: B,
    config: LedgerConfig,
    apply_lock: Mutex<()>,
}

impl<P, R, B> AdjustmentLedger<P, R, B>
where
    P: ProductRepo,
    R: AdjustmentRepo,
    B: EventBus<EventEnvelope<AdjustmentEvent>>,
{
    pub fn new(catalog: P, repo: R, bus: B, config: LedgerConfig) -> Self {
        Self {
            catalog,
            repo,
            bus,
            config,
            apply_lock: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &P {
        &self.catalog
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Persist a builder-produced draft as-is. No catalog effect.
    #[tracing::instrument(skip(self, draft), fields(adjustment_id = %draft.id_typed()))]
    pub fn save_draft(&self, draft: StockAdjustment) -> LedgerResult<StockAdjustment> {
        let (draft, events) = self.prepare_draft(draft)?;
        self.repo.insert(draft.clone())?;

        info!(adjustment_no = %draft.adjustment_no(), status = %draft.status(), "draft saved");
        self.publish(&draft, events);
        Ok(draft)
    }

    /// Persist a draft and submit it in one step.
    ///
    /// Manual policy stores it Pending. Auto-approve applies it and stores it Approved;
    /// if the catalog rejects the deltas nothing is stored.
    #[tracing::instrument(skip(self, draft), fields(adjustment_id = %draft.id_typed()))]
    pub fn create(&self, draft: StockAdjustment) -> LedgerResult<StockAdjustment> {
        let actor = draft.created_by().to_string();
        let (mut adj, mut events) = self.prepare_draft(draft)?;
        events.extend(self.execute(&mut adj, submit_command(&actor))?);

        if !self.config.auto_approve() {
            self.repo.insert(adj.clone())?;
            info!(adjustment_no = %adj.adjustment_no(), status = %adj.status(), "adjustment created");
            self.publish(&adj, events);
            return Ok(adj);
        }

        let _guard = self.lock()?;
        let changes = self.approve_in_place(&mut adj, &actor, &mut events)?;
        if let Err(e) = self.repo.insert(adj.clone()) {
            self.rollback(&changes);
            return Err(e.into());
        }

        info!(adjustment_no = %adj.adjustment_no(), status = %adj.status(), "adjustment created and auto-approved");
        self.publish(&adj, events);
        Ok(adj)
    }

    /// `Draft → Pending`, or `Draft → Approved` under auto-approve.
    #[tracing::instrument(skip(self))]
    pub fn submit(&self, id: AdjustmentId, actor: &str) -> LedgerResult<StockAdjustment> {
        if self.config.auto_approve() {
            let _guard = self.lock()?;
            let mut adj = self.load(id)?;
            let before = adj.version();
            let mut events = self.execute(&mut adj, submit_command(actor))?;
            let changes = self.approve_in_place(&mut adj, actor, &mut events)?;
            self.persist_or_rollback(&adj, before, &changes)?;

            info!(adjustment_no = %adj.adjustment_no(), status = %adj.status(), "adjustment submitted and auto-approved");
            self.publish_from(&adj, before, events);
            return Ok(adj);
        }

        let mut adj = self.load(id)?;
        let before = adj.version();
        let events = self.execute(&mut adj, submit_command(actor))?;
        self.repo.update(adj.clone(), ExpectedVersion::Exact(before))?;

        info!(adjustment_no = %adj.adjustment_no(), status = %adj.status(), "adjustment submitted");
        self.publish_from(&adj, before, events);
        Ok(adj)
    }

    /// Apply a Pending adjustment's deltas to the catalog, all-or-nothing.
    #[tracing::instrument(skip(self))]
    pub fn approve(&self, id: AdjustmentId, approver: &str) -> LedgerResult<StockAdjustment> {
        let _guard = self.lock()?;
        let mut adj = self.load(id)?;
        let before = adj.version();
        let mut events = Vec::new();

        let changes = self.approve_with(&mut adj, approver, false, &mut events)?;
        self.persist_or_rollback(&adj, before, &changes)?;

        info!(adjustment_no = %adj.adjustment_no(), status = %adj.status(), "adjustment approved");
        self.publish_from(&adj, before, events);
        Ok(adj)
    }

    /// Decide a Pending adjustment without touching stock.
    #[tracing::instrument(skip(self))]
    pub fn reject(&self, id: AdjustmentId, approver: &str) -> LedgerResult<StockAdjustment> {
        let mut adj = self.load(id)?;
        let before = adj.version();
        let events = self.execute(
            &mut adj,
            AdjustmentCommand::Reject(RejectAdjustment {
                rejected_by: approver.to_string(),
                occurred_at: Utc::now(),
            }),
        )?;
        self.repo.update(adj.clone(), ExpectedVersion::Exact(before))?;

        info!(adjustment_no = %adj.adjustment_no(), status = %adj.status(), "adjustment rejected");
        self.publish_from(&adj, before, events);
        Ok(adj)
    }

    /// Undo an Approved adjustment by applying the inverse of what its approval
    /// actually applied. Runs in clamp mode; clamps land in the audit notes.
    #[tracing::instrument(skip(self))]
    pub fn reverse(&self, id: AdjustmentId, actor: &str) -> LedgerResult<StockAdjustment> {
        let _guard = self.lock()?;
        let mut adj = self.load(id)?;
        let before = adj.version();

        adj.ensure_can_reverse()?;
        ensure_actor("reversedBy", actor)?;

        let changes = self.apply_plan(&adj.reversal_plan(), ApplyMode::Clamp)?;
        let applied = applied_deltas(&changes);
        for d in applied.iter().filter(|d| d.is_clamped()) {
            warn!(sku = %d.sku, requested = d.requested, applied = d.applied, "reversal clamped at zero");
        }

        let events = match self.execute(
            &mut adj,
            AdjustmentCommand::Reverse(ReverseAdjustment {
                reversed_by: actor.to_string(),
                applied,
                occurred_at: Utc::now(),
            }),
        ) {
            Ok(events) => events,
            Err(e) => {
                self.rollback(&changes);
                return Err(e);
            }
        };
        self.persist_or_rollback(&adj, before, &changes)?;

        info!(adjustment_no = %adj.adjustment_no(), status = %adj.status(), "adjustment reversed");
        self.publish_from(&adj, before, events);
        Ok(adj)
    }

    /// Remove a Draft. Any other status is an invalid transition.
    #[tracing::instrument(skip(self))]
    pub fn delete_draft(&self, id: AdjustmentId) -> LedgerResult<StockAdjustment> {
        let adj = self.load(id)?;
        let before = adj.version();

        let mut discarded = adj.clone();
        let events = self.execute(
            &mut discarded,
            AdjustmentCommand::Discard(DiscardAdjustment {
                occurred_at: Utc::now(),
            }),
        )?;
        let removed = self.repo.remove(id, ExpectedVersion::Exact(before))?;

        info!(adjustment_no = %removed.adjustment_no(), "draft deleted");
        self.publish_from(&discarded, before, events);
        Ok(removed)
    }

    pub fn get(&self, id: AdjustmentId) -> LedgerResult<StockAdjustment> {
        self.load(id)
    }

    pub fn list(&self, filter: &AdjustmentFilter) -> LedgerResult<Vec<StockAdjustment>> {
        filter.validate()?;
        let records = self.repo.list()?;
        Ok(adjustment_report::filter_records(&records, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn summary(&self, filter: &AdjustmentFilter) -> LedgerResult<AdjustmentSummary> {
        filter.validate()?;
        Ok(adjustment_report::summarize(&self.repo.list()?, filter))
    }

    fn lock(&self) -> LedgerResult<std::sync::MutexGuard<'_, ()>> {
        self.apply_lock
            .lock()
            .map_err(|_| DomainError::invariant("ledger lock poisoned").into())
    }

    fn load(&self, id: AdjustmentId) -> LedgerResult<StockAdjustment> {
        self.repo
            .get(id)?
            .ok_or_else(|| DomainError::not_found(format!("adjustment {id}")).into())
    }

    fn next_number(&self, date: NaiveDate) -> LedgerResult<String> {
        let seq = self.repo.next_sequence()?;
        Ok(format!(
            "{}-{}-{seq:04}",
            self.config.number_prefix.trim(),
            date.format("%Y%m%d")
        ))
    }

    /// Validate, number, and stamp the `Drafted` event onto a builder draft.
    fn prepare_draft(
        &self,
        mut draft: StockAdjustment,
    ) -> LedgerResult<(StockAdjustment, Vec<AdjustmentEvent>)> {
        if draft.status() != AdjustmentStatus::Draft {
            return Err(DomainError::invalid_transition(draft.status(), "save").into());
        }
        draft.validate()?;
        if draft.adjustment_no().is_empty() {
            let no = self.next_number(draft.date())?;
            draft.assign_number(no)?;
        }

        let event = AdjustmentEvent::Drafted(AdjustmentDrafted {
            adjustment_id: draft.id_typed(),
            adjustment_no: draft.adjustment_no().to_string(),
            occurred_at: Utc::now(),
        });
        draft.apply(&event);
        Ok((draft, vec![event]))
    }

    /// `handle` + `apply` on the in-memory copy.
    fn execute(
        &self,
        adj: &mut StockAdjustment,
        command: AdjustmentCommand,
    ) -> LedgerResult<Vec<AdjustmentEvent>> {
        let events = adj.handle(&command)?;
        for event in &events {
            adj.apply(event);
        }
        Ok(events)
    }

    /// Auto-approve path: the record was just submitted in memory.
    fn approve_in_place(
        &self,
        adj: &mut StockAdjustment,
        actor: &str,
        events: &mut Vec<AdjustmentEvent>,
    ) -> LedgerResult<Vec<StockChange>> {
        self.approve_with(adj, actor, true, events)
    }

    fn approve_with(
        &self,
        adj: &mut StockAdjustment,
        approver: &str,
        auto_approve: bool,
        events: &mut Vec<AdjustmentEvent>,
    ) -> LedgerResult<Vec<StockChange>> {
        adj.ensure_can_approve(auto_approve)?;
        ensure_actor("approvedBy", approver)?;
        adj.validate()?;

        let mode = if adj.allow_negative() {
            ApplyMode::Clamp
        } else {
            self.config.apply_mode
        };
        let changes = self.apply_plan(&adj.approval_plan(), mode)?;

        let command = AdjustmentCommand::Approve(ApproveAdjustment {
            approved_by: approver.to_string(),
            applied: applied_deltas(&changes),
            auto_approve,
            occurred_at: Utc::now(),
        });
        match self.execute(adj, command) {
            Ok(approved) => {
                events.extend(approved);
                Ok(changes)
            }
            Err(e) => {
                self.rollback(&changes);
                Err(e)
            }
        }
    }

    /// Apply each signed delta in order. On the first failure every change already
    /// made in this call is undone and the error is returned.
    fn apply_plan(&self, plan: &[(Sku, i64)], mode: ApplyMode) -> LedgerResult<Vec<StockChange>> {
        let mut changes = Vec::with_capacity(plan.len());

        for (sku, delta) in plan {
            let result = match mode {
                ApplyMode::Strict => self.catalog.get(sku).and_then(|product| {
                    self.catalog.apply_delta(
                        sku,
                        *delta,
                        ApplyMode::Strict,
                        ExpectedVersion::Exact(product.version()),
                    )
                }),
                ApplyMode::Clamp => {
                    self.catalog
                        .apply_delta(sku, *delta, ApplyMode::Clamp, ExpectedVersion::Any)
                }
            };

            match result {
                Ok(change) => {
                    debug!(
                        sku = %change.sku,
                        previous = change.previous_quantity,
                        new = change.new_quantity,
                        applied = change.applied_delta,
                        "stock delta applied"
                    );
                    changes.push(change);
                }
                Err(e) => {
                    warn!(sku = %sku, delta = *delta, error = %e, applied_so_far = changes.len(), "delta rejected, rolling back");
                    self.rollback(&changes);
                    return Err(e.into());
                }
            }
        }

        Ok(changes)
    }

    fn rollback(&self, changes: &[StockChange]) {
        for change in changes.iter().rev().filter(|c| c.applied_delta != 0) {
            if let Err(e) = self.catalog.apply_delta(
                &change.sku,
                -change.applied_delta,
                ApplyMode::Clamp,
                ExpectedVersion::Any,
            ) {
                error!(sku = %change.sku, delta = -change.applied_delta, error = %e, "rollback of stock delta failed");
            }
        }
    }

    fn persist_or_rollback(
        &self,
        adj: &StockAdjustment,
        before: u64,
        changes: &[StockChange],
    ) -> LedgerResult<()> {
        if let Err(e) = self.repo.update(adj.clone(), ExpectedVersion::Exact(before)) {
            warn!(error = %e, "persisting adjustment failed, rolling back stock");
            self.rollback(changes);
            return Err(e.into());
        }
        Ok(())
    }

    fn publish(&self, adj: &StockAdjustment, events: Vec<AdjustmentEvent>) {
        let first = adj.version().saturating_sub(events.len() as u64);
        self.publish_from(adj, first, events);
    }

    /// Publish `events` with sequence numbers `before + 1, before + 2, ...`.
    fn publish_from(&self, adj: &StockAdjustment, before: u64, events: Vec<AdjustmentEvent>) {
        for (offset, event) in events.into_iter().enumerate() {
            let envelope = EventEnvelope::new(
                EventId::new(),
                *adj.id_typed().as_uuid(),
                AGGREGATE_TYPE,
                before + offset as u64 + 1,
                event,
            );
            if let Err(e) = self.bus.publish(envelope) {
                warn!(adjustment_id = %adj.id_typed(), error = ?e, "event publication failed");
            }
        }
    }
}

fn submit_command(actor: &str) -> AdjustmentCommand {
    AdjustmentCommand::Submit(SubmitAdjustment {
        submitted_by: actor.to_string(),
        occurred_at: Utc::now(),
    })
}

fn applied_deltas(changes: &[StockChange]) -> Vec<AppliedDelta> {
    changes
        .iter()
        .map(|c| AppliedDelta {
            sku: c.sku.clone(),
            requested: c.requested_delta,
            applied: c.applied_delta,
        })
        .collect()
}

fn ensure_actor(field: &str, actor: &str) -> Result<(), DomainError> {
    if actor.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}
