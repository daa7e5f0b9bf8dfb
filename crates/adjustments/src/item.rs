use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_catalog::{Product, Sku};
use stockledger_core::{DomainError, DomainResult, ValueObject, money};

use crate::reason::AdjustmentType;
use crate::validation;

/// One line of a stock adjustment.
///
/// Name, stock and cost are snapshots taken from the catalog when the line was
/// staged. They are never refreshed from the live product, so a recorded
/// adjustment keeps describing what was true at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentItem {
    sku: Sku,
    name: String,
    current_stock: i64,
    adjustment_quantity: i64,
    new_stock: i64,
    unit_cost: Decimal,
    total_cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl ValueObject for AdjustmentItem {}

impl AdjustmentItem {
    /// Snapshot `product` and compute the projected stock and line cost.
    pub fn snapshot(
        product: &Product,
        adjustment_type: AdjustmentType,
        magnitude: i64,
        reason: Option<String>,
    ) -> DomainResult<Self> {
        validation::ensure_positive_magnitude(product.sku(), magnitude)?;

        let current_stock = product.quantity();
        let new_stock = current_stock
            .checked_add(adjustment_type.signed(magnitude))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "adjusting {} by {magnitude} leaves stock out of range",
                    product.sku()
                ))
            })?;
        Ok(Self {
            sku: product.sku().clone(),
            name: product.name().to_string(),
            current_stock,
            adjustment_quantity: magnitude,
            new_stock,
            unit_cost: product.unit_cost(),
            total_cost: money::line_total(magnitude, product.unit_cost())?,
            reason: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
        })
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_stock(&self) -> i64 {
        self.current_stock
    }

    /// Magnitude (always > 0); the sign comes from the adjustment type.
    pub fn adjustment_quantity(&self) -> i64 {
        self.adjustment_quantity
    }

    pub fn new_stock(&self) -> i64 {
        self.new_stock
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Re-derive the computed fields and compare (guards deserialized records).
    pub(crate) fn is_consistent(&self, adjustment_type: AdjustmentType) -> bool {
        self.adjustment_quantity > 0
            && self
                .current_stock
                .checked_add(adjustment_type.signed(self.adjustment_quantity))
                == Some(self.new_stock)
            && money::line_total(self.adjustment_quantity, self.unit_cost).ok() == Some(self.total_cost)
    }
}
