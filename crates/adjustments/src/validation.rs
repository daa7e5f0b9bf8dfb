//! Validation rules shared by the builder, the aggregate and the ledger.

use std::collections::HashSet;

use stockledger_catalog::Sku;
use stockledger_core::{DomainError, DomainResult};

use crate::item::AdjustmentItem;
use crate::reason::{AdjustmentReason, AdjustmentType};

pub fn ensure_positive_magnitude(sku: &Sku, magnitude: i64) -> DomainResult<()> {
    if magnitude <= 0 {
        return Err(DomainError::validation(format!(
            "adjustment quantity for {sku} must be greater than zero"
        )));
    }
    Ok(())
}

pub fn ensure_not_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

pub fn ensure_reason_allowed(
    adjustment_type: AdjustmentType,
    reason: Option<AdjustmentReason>,
) -> DomainResult<AdjustmentReason> {
    let reason = reason.ok_or_else(|| DomainError::validation("reason is required"))?;
    if !reason.allowed_for(adjustment_type) {
        return Err(DomainError::validation(format!(
            "'{reason}' is not a valid {} reason",
            adjustment_type.label().to_lowercase()
        )));
    }
    Ok(reason)
}

pub fn ensure_items_present(items: &[AdjustmentItem]) -> DomainResult<()> {
    if items.is_empty() {
        return Err(DomainError::validation("adjustment must contain at least one item"));
    }
    Ok(())
}

/// Duplicate SKUs are rejected, never merged.
pub fn ensure_unique_skus(items: &[AdjustmentItem]) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.sku()) {
            return Err(DomainError::validation(format!(
                "{} appears more than once in the adjustment",
                item.sku()
            )));
        }
    }
    Ok(())
}

/// Sum of line magnitudes, refusing totals that do not fit the quantity range.
pub fn sum_quantities(items: &[AdjustmentItem]) -> DomainResult<i64> {
    items
        .iter()
        .try_fold(0i64, |acc, i| acc.checked_add(i.adjustment_quantity()))
        .ok_or_else(|| DomainError::validation("total quantity is out of range"))
}

/// Decrease staging guard: the magnitude must fit in the live quantity unless
/// negative stock was explicitly allowed.
pub fn ensure_stock_available(
    sku: &Sku,
    magnitude: i64,
    available: i64,
    allow_negative: bool,
) -> DomainResult<()> {
    if !allow_negative && magnitude > available {
        return Err(DomainError::insufficient_stock(sku.as_str(), magnitude, available));
    }
    Ok(())
}
