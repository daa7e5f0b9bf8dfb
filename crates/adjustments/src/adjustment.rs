use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_catalog::Sku;
use stockledger_core::{AdjustmentId, Aggregate, AggregateRoot, DomainError, DomainResult, money};
use stockledger_events::Event;

use crate::item::AdjustmentItem;
use crate::reason::{AdjustmentReason, AdjustmentType};
use crate::validation;

/// Adjustment status lifecycle.
///
/// `Draft → Pending → {Approved, Rejected}`, `Approved → Reversed`, plus
/// `Draft → Approved` when the ledger runs with auto-approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Reversed,
}

impl AdjustmentStatus {
    pub fn label(self) -> &'static str {
        match self {
            AdjustmentStatus::Draft => "Draft",
            AdjustmentStatus::Pending => "Pending",
            AdjustmentStatus::Approved => "Approved",
            AdjustmentStatus::Rejected => "Rejected",
            AdjustmentStatus::Reversed => "Reversed",
        }
    }

    /// Statuses that carry `approvedBy` / `approvedDate`.
    pub fn is_decided(self) -> bool {
        matches!(
            self,
            AdjustmentStatus::Approved | AdjustmentStatus::Rejected | AdjustmentStatus::Reversed
        )
    }

    pub fn parse(raw: &str) -> DomainResult<Self> {
        match raw.trim().to_lowercase().as_str() {
            "draft" => Ok(AdjustmentStatus::Draft),
            "pending" => Ok(AdjustmentStatus::Pending),
            "approved" => Ok(AdjustmentStatus::Approved),
            "rejected" => Ok(AdjustmentStatus::Rejected),
            "reversed" => Ok(AdjustmentStatus::Reversed),
            other => Err(DomainError::validation(format!("unknown status '{other}'"))),
        }
    }
}

impl core::fmt::Display for AdjustmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Stock change actually made for one SKU by an approval or a reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDelta {
    pub sku: Sku,
    /// Signed delta asked of the catalog.
    pub requested: i64,
    /// Signed delta the catalog applied (differs from `requested` when clamped).
    pub applied: i64,
}

impl AppliedDelta {
    pub fn is_clamped(&self) -> bool {
        self.requested != self.applied
    }
}

/// Aggregate root: StockAdjustment (one ledger entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    id: AdjustmentId,
    adjustment_no: String,
    date: NaiveDate,
    adjustment_type: AdjustmentType,
    reason: AdjustmentReason,
    status: AdjustmentStatus,
    items: Vec<AdjustmentItem>,
    total_quantity: i64,
    total_value: Decimal,
    created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    approved_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    allow_negative: bool,
    #[serde(default)]
    applied_deltas: Vec<AppliedDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reversed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reversed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    audit_notes: Vec<String>,
    #[serde(default)]
    version: u64,
}

/// Inputs for a new draft (produced by `AdjustmentBuilder::build`).
#[derive(Debug, Clone)]
pub(crate) struct DraftParts {
    pub adjustment_type: AdjustmentType,
    pub reason: AdjustmentReason,
    pub items: Vec<AdjustmentItem>,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: String,
    pub allow_negative: bool,
    pub created_at: DateTime<Utc>,
}

impl StockAdjustment {
    pub(crate) fn new_draft(parts: DraftParts) -> DomainResult<Self> {
        let total_quantity = validation::sum_quantities(&parts.items)?;
        let total_value = money::sum_totals(parts.items.iter().map(AdjustmentItem::total_cost))?;

        let draft = Self {
            id: AdjustmentId::new(),
            adjustment_no: String::new(),
            date: parts.date,
            adjustment_type: parts.adjustment_type,
            reason: parts.reason,
            status: AdjustmentStatus::Draft,
            items: parts.items,
            total_quantity,
            total_value,
            created_by: parts.created_by.trim().to_string(),
            approved_by: None,
            approved_date: None,
            notes: parts.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            created_at: parts.created_at,
            updated_at: parts.created_at,
            allow_negative: parts.allow_negative,
            applied_deltas: Vec::new(),
            reversed_by: None,
            reversed_date: None,
            audit_notes: Vec::new(),
            version: 0,
        };
        draft.validate()?;
        Ok(draft)
    }

    pub fn id_typed(&self) -> AdjustmentId {
        self.id
    }

    pub fn adjustment_no(&self) -> &str {
        &self.adjustment_no
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn adjustment_type(&self) -> AdjustmentType {
        self.adjustment_type
    }

    pub fn reason(&self) -> AdjustmentReason {
        self.reason
    }

    pub fn status(&self) -> AdjustmentStatus {
        self.status
    }

    pub fn items(&self) -> &[AdjustmentItem] {
        &self.items
    }

    pub fn total_quantity(&self) -> i64 {
        self.total_quantity
    }

    pub fn total_value(&self) -> Decimal {
        self.total_value
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn approved_by(&self) -> Option<&str> {
        self.approved_by.as_deref()
    }

    pub fn approved_date(&self) -> Option<DateTime<Utc>> {
        self.approved_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn allow_negative(&self) -> bool {
        self.allow_negative
    }

    pub fn applied_deltas(&self) -> &[AppliedDelta] {
        &self.applied_deltas
    }

    pub fn reversed_by(&self) -> Option<&str> {
        self.reversed_by.as_deref()
    }

    pub fn reversed_date(&self) -> Option<DateTime<Utc>> {
        self.reversed_date
    }

    pub fn audit_notes(&self) -> &[String] {
        &self.audit_notes
    }

    /// Sum of signed deltas the catalog actually applied on approval.
    pub fn net_applied(&self) -> i64 {
        self.applied_deltas
            .iter()
            .fold(0i64, |acc, d| acc.saturating_add(d.applied))
    }

    /// Give a draft its human-readable number. Only once, only while Draft.
    pub fn assign_number(&mut self, adjustment_no: impl Into<String>) -> DomainResult<()> {
        if self.status != AdjustmentStatus::Draft {
            return Err(DomainError::invalid_transition(self.status, "number"));
        }
        if !self.adjustment_no.is_empty() {
            return Err(DomainError::invariant("adjustment number already assigned"));
        }
        let no = adjustment_no.into();
        validation::ensure_not_blank("adjustmentNo", &no)?;
        self.adjustment_no = no;
        Ok(())
    }

    /// Full structural validation: item rules, vocabulary, derived totals.
    pub fn validate(&self) -> DomainResult<()> {
        validation::ensure_items_present(&self.items)?;
        validation::ensure_unique_skus(&self.items)?;
        validation::ensure_reason_allowed(self.adjustment_type, Some(self.reason))?;
        validation::ensure_not_blank("createdBy", &self.created_by)?;

        for item in &self.items {
            if !item.is_consistent(self.adjustment_type) {
                return Err(DomainError::invariant(format!(
                    "item {} has inconsistent derived fields",
                    item.sku()
                )));
            }
        }

        let qty = validation::sum_quantities(&self.items)?;
        let value = money::sum_totals(self.items.iter().map(AdjustmentItem::total_cost))?;
        if qty != self.total_quantity || value != self.total_value {
            return Err(DomainError::invariant("totals do not match items"));
        }
        Ok(())
    }

    /// Signed per-SKU deltas an approval applies.
    pub fn approval_plan(&self) -> Vec<(Sku, i64)> {
        self.items
            .iter()
            .map(|i| (i.sku().clone(), self.adjustment_type.signed(i.adjustment_quantity())))
            .collect()
    }

    /// Inverse of what the approval actually applied. SKUs whose approval was
    /// clamped to nothing need no reversal.
    pub fn reversal_plan(&self) -> Vec<(Sku, i64)> {
        self.applied_deltas
            .iter()
            .filter(|d| d.applied != 0)
            .map(|d| (d.sku.clone(), -d.applied))
            .collect()
    }

    fn ensure_status(&self, expected: &[AdjustmentStatus], action: &str) -> DomainResult<()> {
        if expected.contains(&self.status) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(self.status, action))
        }
    }

    fn ensure_matches_plan(
        plan: &[(Sku, i64)],
        applied: &[AppliedDelta],
        what: &str,
    ) -> DomainResult<()> {
        let matches = plan.len() == applied.len()
            && plan
                .iter()
                .zip(applied)
                .all(|((sku, delta), a)| *sku == a.sku && *delta == a.requested);
        if !matches {
            return Err(DomainError::invariant(format!(
                "{what} deltas do not match the adjustment"
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for StockAdjustment {
    type Id = AdjustmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SubmitAdjustment (Draft → Pending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAdjustment {
    pub submitted_by: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveAdjustment (Pending → Approved, or Draft → Approved when
/// `auto_approve` is set). `applied` holds the catalog outcome, one per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveAdjustment {
    pub approved_by: String,
    pub applied: Vec<AppliedDelta>,
    pub auto_approve: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectAdjustment (Pending → Rejected).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectAdjustment {
    pub rejected_by: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReverseAdjustment (Approved → Reversed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseAdjustment {
    pub reversed_by: String,
    pub applied: Vec<AppliedDelta>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DiscardAdjustment (remove a saved Draft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardAdjustment {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentCommand {
    Submit(SubmitAdjustment),
    Approve(ApproveAdjustment),
    Reject(RejectAdjustment),
    Reverse(ReverseAdjustment),
    Discard(DiscardAdjustment),
}

/// Event: AdjustmentDrafted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentDrafted {
    pub adjustment_id: AdjustmentId,
    pub adjustment_no: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AdjustmentSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSubmitted {
    pub adjustment_id: AdjustmentId,
    pub submitted_by: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AdjustmentApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentApproved {
    pub adjustment_id: AdjustmentId,
    pub approved_by: String,
    pub applied: Vec<AppliedDelta>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AdjustmentRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRejected {
    pub adjustment_id: AdjustmentId,
    pub rejected_by: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AdjustmentReversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentReversed {
    pub adjustment_id: AdjustmentId,
    pub reversed_by: String,
    pub applied: Vec<AppliedDelta>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AdjustmentDiscarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentDiscarded {
    pub adjustment_id: AdjustmentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentEvent {
    Drafted(AdjustmentDrafted),
    Submitted(AdjustmentSubmitted),
    Approved(AdjustmentApproved),
    Rejected(AdjustmentRejected),
    Reversed(AdjustmentReversed),
    Discarded(AdjustmentDiscarded),
}

impl AdjustmentEvent {
    pub fn adjustment_id(&self) -> AdjustmentId {
        match self {
            AdjustmentEvent::Drafted(e) => e.adjustment_id,
            AdjustmentEvent::Submitted(e) => e.adjustment_id,
            AdjustmentEvent::Approved(e) => e.adjustment_id,
            AdjustmentEvent::Rejected(e) => e.adjustment_id,
            AdjustmentEvent::Reversed(e) => e.adjustment_id,
            AdjustmentEvent::Discarded(e) => e.adjustment_id,
        }
    }
}

impl Event for AdjustmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AdjustmentEvent::Drafted(_) => "stock.adjustment.drafted",
            AdjustmentEvent::Submitted(_) => "stock.adjustment.submitted",
            AdjustmentEvent::Approved(_) => "stock.adjustment.approved",
            AdjustmentEvent::Rejected(_) => "stock.adjustment.rejected",
            AdjustmentEvent::Reversed(_) => "stock.adjustment.reversed",
            AdjustmentEvent::Discarded(_) => "stock.adjustment.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AdjustmentEvent::Drafted(e) => e.occurred_at,
            AdjustmentEvent::Submitted(e) => e.occurred_at,
            AdjustmentEvent::Approved(e) => e.occurred_at,
            AdjustmentEvent::Rejected(e) => e.occurred_at,
            AdjustmentEvent::Reversed(e) => e.occurred_at,
            AdjustmentEvent::Discarded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockAdjustment {
    type Command = AdjustmentCommand;
    type Event = AdjustmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AdjustmentEvent::Drafted(_) | AdjustmentEvent::Discarded(_) => {}
            AdjustmentEvent::Submitted(e) => {
                self.status = AdjustmentStatus::Pending;
                self.updated_at = e.occurred_at;
            }
            AdjustmentEvent::Approved(e) => {
                self.status = AdjustmentStatus::Approved;
                self.approved_by = Some(e.approved_by.clone());
                self.approved_date = Some(e.occurred_at);
                self.applied_deltas = e.applied.clone();
                for d in e.applied.iter().filter(|d| d.is_clamped()) {
                    self.audit_notes.push(format!(
                        "approval of {} clamped at zero: requested {}, applied {}",
                        d.sku, d.requested, d.applied
                    ));
                }
                self.updated_at = e.occurred_at;
            }
            AdjustmentEvent::Rejected(e) => {
                self.status = AdjustmentStatus::Rejected;
                self.approved_by = Some(e.rejected_by.clone());
                self.approved_date = Some(e.occurred_at);
                self.updated_at = e.occurred_at;
            }
            AdjustmentEvent::Reversed(e) => {
                self.status = AdjustmentStatus::Reversed;
                self.reversed_by = Some(e.reversed_by.clone());
                self.reversed_date = Some(e.occurred_at);
                for d in e.applied.iter().filter(|d| d.is_clamped()) {
                    self.audit_notes.push(format!(
                        "reversal of {} clamped at zero: requested {}, applied {}",
                        d.sku, d.requested, d.applied
                    ));
                }
                self.updated_at = e.occurred_at;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AdjustmentCommand::Submit(cmd) => self.handle_submit(cmd),
            AdjustmentCommand::Approve(cmd) => self.handle_approve(cmd),
            AdjustmentCommand::Reject(cmd) => self.handle_reject(cmd),
            AdjustmentCommand::Reverse(cmd) => self.handle_reverse(cmd),
            AdjustmentCommand::Discard(cmd) => self.handle_discard(cmd),
        }
    }
}

impl StockAdjustment {
    /// Precondition check for an approval, before any catalog delta is applied.
    pub fn ensure_can_approve(&self, auto_approve: bool) -> DomainResult<()> {
        if auto_approve {
            self.ensure_status(&[AdjustmentStatus::Draft, AdjustmentStatus::Pending], "approve")
        } else {
            self.ensure_status(&[AdjustmentStatus::Pending], "approve")
        }
    }

    /// Precondition check for a reversal, before any catalog delta is applied.
    pub fn ensure_can_reverse(&self) -> DomainResult<()> {
        self.ensure_status(&[AdjustmentStatus::Approved], "reverse")
    }

    fn handle_submit(&self, cmd: &SubmitAdjustment) -> DomainResult<Vec<AdjustmentEvent>> {
        self.ensure_status(&[AdjustmentStatus::Draft], "submit")?;
        validation::ensure_not_blank("submittedBy", &cmd.submitted_by)?;
        self.validate()?;

        Ok(vec![AdjustmentEvent::Submitted(AdjustmentSubmitted {
            adjustment_id: self.id,
            submitted_by: cmd.submitted_by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveAdjustment) -> DomainResult<Vec<AdjustmentEvent>> {
        self.ensure_can_approve(cmd.auto_approve)?;
        validation::ensure_not_blank("approvedBy", &cmd.approved_by)?;
        self.validate()?;
        Self::ensure_matches_plan(&self.approval_plan(), &cmd.applied, "approval")?;

        Ok(vec![AdjustmentEvent::Approved(AdjustmentApproved {
            adjustment_id: self.id,
            approved_by: cmd.approved_by.clone(),
            applied: cmd.applied.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectAdjustment) -> DomainResult<Vec<AdjustmentEvent>> {
        self.ensure_status(&[AdjustmentStatus::Pending], "reject")?;
        validation::ensure_not_blank("rejectedBy", &cmd.rejected_by)?;

        Ok(vec![AdjustmentEvent::Rejected(AdjustmentRejected {
            adjustment_id: self.id,
            rejected_by: cmd.rejected_by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reverse(&self, cmd: &ReverseAdjustment) -> DomainResult<Vec<AdjustmentEvent>> {
        self.ensure_can_reverse()?;
        validation::ensure_not_blank("reversedBy", &cmd.reversed_by)?;
        Self::ensure_matches_plan(&self.reversal_plan(), &cmd.applied, "reversal")?;

        Ok(vec![AdjustmentEvent::Reversed(AdjustmentReversed {
            adjustment_id: self.id,
            reversed_by: cmd.reversed_by.clone(),
            applied: cmd.applied.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_discard(&self, cmd: &DiscardAdjustment) -> DomainResult<Vec<AdjustmentEvent>> {
        self.ensure_status(&[AdjustmentStatus::Draft], "delete")?;

        Ok(vec![AdjustmentEvent::Discarded(AdjustmentDiscarded {
            adjustment_id: self.id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
