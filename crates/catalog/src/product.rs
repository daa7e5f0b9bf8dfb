use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{AggregateRoot, DomainError, DomainResult, money};

/// Stock keeping unit, the catalog's unique product key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Parse a SKU, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for Sku {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// How a signed delta is applied when it would take stock below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    /// `quantity = max(0, quantity + delta)`; the clamped amount is reported.
    Clamp,
    /// Fail with `InsufficientStock` instead of clamping.
    Strict,
}

/// Outcome of one applied delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    pub sku: Sku,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub requested_delta: i64,
    pub applied_delta: i64,
    /// Row version after the change.
    pub version: u64,
}

impl StockChange {
    pub fn is_clamped(&self) -> bool {
        self.applied_delta != self.requested_delta
    }

    /// Units that could not be removed because stock hit zero.
    pub fn clamped_units(&self) -> i64 {
        self.requested_delta.abs() - self.applied_delta.abs()
    }
}

/// Catalog row: current stock and costing for one SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    sku: Sku,
    name: String,
    quantity: i64,
    unit_cost: Decimal,
    reorder_level: i64,
    #[serde(default)]
    version: u64,
}

impl Product {
    pub fn new(sku: Sku, name: impl Into<String>, quantity: i64, unit_cost: Decimal) -> Self {
        Self {
            sku,
            name: name.into(),
            quantity,
            unit_cost,
            reorder_level: 0,
            version: 0,
        }
    }

    pub fn with_reorder_level(mut self, reorder_level: i64) -> Self {
        self.reorder_level = reorder_level;
        self
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn reorder_level(&self) -> i64 {
        self.reorder_level
    }

    /// At or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        if self.reorder_level < 0 {
            return Err(DomainError::validation("reorderLevel cannot be negative"));
        }
        money::ensure_non_negative("unitCost", self.unit_cost)
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Apply a signed delta to `quantity` and bump the row version.
    ///
    /// Returns the change on success; on failure the product is left untouched.
    pub fn apply_delta(&mut self, delta: i64, mode: ApplyMode) -> DomainResult<StockChange> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }

        let target = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| DomainError::invariant(format!("quantity overflow for {}", self.sku)))?;

        let new_quantity = if target < 0 {
            match mode {
                ApplyMode::Strict => {
                    return Err(DomainError::insufficient_stock(
                        self.sku.as_str(),
                        delta.abs(),
                        self.quantity,
                    ));
                }
                ApplyMode::Clamp => 0,
            }
        } else {
            target
        };

        let change = StockChange {
            sku: self.sku.clone(),
            previous_quantity: self.quantity,
            new_quantity,
            requested_delta: delta,
            applied_delta: new_quantity - self.quantity,
            version: self.version + 1,
        };

        self.quantity = new_quantity;
        self.version = change.version;
        Ok(change)
    }
}

impl AggregateRoot for Product {
    type Id = Sku;

    fn id(&self) -> &Self::Id {
        &self.sku
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(quantity: i64) -> Product {
        Product::new(Sku::parse("SKU-100").unwrap(), "Widget", quantity, dec!(20))
    }

    #[test]
    fn sku_is_trimmed_and_non_empty() {
        assert_eq!(Sku::parse("  A-1 ").unwrap().as_str(), "A-1");
        assert!(matches!(Sku::parse("   "), Err(DomainError::Validation(_))));
    }

    #[test]
    fn clamp_mode_stops_at_zero_and_reports_clamped_units() {
        let mut p = product(5);
        let change = p.apply_delta(-8, ApplyMode::Clamp).unwrap();

        assert_eq!(p.quantity(), 0);
        assert_eq!(change.applied_delta, -5);
        assert!(change.is_clamped());
        assert_eq!(change.clamped_units(), 3);
        assert_eq!(p.version(), 1);
    }

    #[test]
    fn strict_mode_fails_without_mutating() {
        let mut p = product(5);
        let err = p.apply_delta(-8, ApplyMode::Strict).unwrap_err();

        assert_eq!(err, DomainError::insufficient_stock("SKU-100", 8, 5));
        assert_eq!(p.quantity(), 5);
        assert_eq!(p.version(), 0);
    }

    #[test]
    fn zero_delta_is_rejected() {
        let mut p = product(5);
        assert!(matches!(p.apply_delta(0, ApplyMode::Clamp), Err(DomainError::Validation(_))));
    }

    #[test]
    fn low_stock_is_inclusive_of_reorder_level() {
        assert!(product(10).with_reorder_level(10).is_low_stock());
        assert!(!product(11).with_reorder_level(10).is_low_stock());
    }

    #[test]
    fn validate_rejects_negative_cost() {
        let p = Product::new(Sku::parse("X").unwrap(), "X", 1, dec!(-1));
        assert!(p.validate().is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Clamp mode never produces negative stock, and the applied delta is
            /// exactly the observed change in quantity.
            #[test]
            fn clamp_never_goes_negative(start in 0i64..10_000, delta in -20_000i64..20_000) {
                prop_assume!(delta != 0);
                let mut p = product(start);
                let change = p.apply_delta(delta, ApplyMode::Clamp).unwrap();
                prop_assert!(p.quantity() >= 0);
                prop_assert_eq!(p.quantity() - start, change.applied_delta);
            }
        }
    }
}
