//! Staging area for a not-yet-submitted adjustment.
//!
//! Every mutator validates first and only then touches staged state, so a failed
//! call leaves the builder exactly as it was.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use stockledger_catalog::{ProductRepo, Sku};
use stockledger_core::{DomainError, DomainResult, money};

use crate::adjustment::{DraftParts, StockAdjustment};
use crate::item::AdjustmentItem;
use crate::reason::{AdjustmentReason, AdjustmentType};
use crate::validation;

#[derive(Debug, Clone)]
pub struct AdjustmentBuilder {
    adjustment_type: AdjustmentType,
    reason: Option<AdjustmentReason>,
    items: Vec<AdjustmentItem>,
    allow_negative: bool,
}

impl AdjustmentBuilder {
    pub fn new(adjustment_type: AdjustmentType) -> Self {
        Self {
            adjustment_type,
            reason: None,
            items: Vec::new(),
            allow_negative: false,
        }
    }

    /// Allow Decrease lines larger than the live quantity. The catalog clamps the
    /// applied quantity at zero when such an adjustment is approved.
    pub fn allow_negative(mut self, allow: bool) -> Self {
        self.allow_negative = allow;
        self
    }

    pub fn adjustment_type(&self) -> AdjustmentType {
        self.adjustment_type
    }

    pub fn reason(&self) -> Option<AdjustmentReason> {
        self.reason
    }

    pub fn items(&self) -> &[AdjustmentItem] {
        &self.items
    }

    pub fn total_quantity(&self) -> DomainResult<i64> {
        validation::sum_quantities(&self.items)
    }

    pub fn total_value(&self) -> DomainResult<Decimal> {
        money::sum_totals(self.items.iter().map(AdjustmentItem::total_cost))
    }

    pub fn set_reason(&mut self, reason: AdjustmentReason) -> DomainResult<()> {
        self.reason = Some(validation::ensure_reason_allowed(self.adjustment_type, Some(reason))?);
        Ok(())
    }

    /// Set the reason from its display label.
    pub fn set_reason_label(&mut self, label: &str) -> DomainResult<()> {
        let reason = AdjustmentReason::parse_for(self.adjustment_type, label)?;
        self.set_reason(reason)
    }

    /// Switching direction drops the reason and every staged line: both the reason
    /// vocabulary and the sign of each line depend on the type.
    pub fn change_type(&mut self, adjustment_type: AdjustmentType) {
        if adjustment_type == self.adjustment_type {
            return;
        }
        self.adjustment_type = adjustment_type;
        self.reason = None;
        self.items.clear();
    }

    /// Stage one line, snapshotting the product as it is right now.
    pub fn add_item<C>(
        &mut self,
        catalog: &C,
        sku: &str,
        magnitude: i64,
        item_reason: Option<String>,
    ) -> DomainResult<&AdjustmentItem>
    where
        C: ProductRepo + ?Sized,
    {
        let sku = Sku::parse(sku)?;
        validation::ensure_positive_magnitude(&sku, magnitude)?;

        if self.items.iter().any(|i| *i.sku() == sku) {
            return Err(DomainError::validation(format!(
                "{sku} is already part of this adjustment"
            )));
        }

        let product = catalog.get(&sku)?;
        if self.adjustment_type == AdjustmentType::Decrease {
            validation::ensure_stock_available(&sku, magnitude, product.quantity(), self.allow_negative)?;
        }

        let item = AdjustmentItem::snapshot(&product, self.adjustment_type, magnitude, item_reason)?;
        self.items.push(item);
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn remove_item(&mut self, sku: &str) -> DomainResult<AdjustmentItem> {
        let sku = Sku::parse(sku)?;
        let idx = self
            .items
            .iter()
            .position(|i| *i.sku() == sku)
            .ok_or_else(|| DomainError::not_found(format!("staged item {sku}")))?;
        Ok(self.items.remove(idx))
    }

    /// Produce a Draft. The builder keeps its state, so a failed build can be fixed
    /// and retried.
    pub fn build(
        &self,
        date: NaiveDate,
        notes: Option<String>,
        created_by: &str,
    ) -> DomainResult<StockAdjustment> {
        validation::ensure_items_present(&self.items)?;
        let reason = validation::ensure_reason_allowed(self.adjustment_type, self.reason)?;
        validation::ensure_not_blank("createdBy", created_by)?;

        StockAdjustment::new_draft(DraftParts {
            adjustment_type: self.adjustment_type,
            reason,
            items: self.items.clone(),
            date,
            notes,
            created_by: created_by.to_string(),
            allow_negative: self.allow_negative,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::AdjustmentStatus;
    use rust_decimal_macros::dec;
    use stockledger_catalog::{InMemoryProductRepo, Product};

    fn catalog() -> InMemoryProductRepo {
        InMemoryProductRepo::with_products([
            Product::new(Sku::parse("SKU-100").unwrap(), "Widget", 50, dec!(20)),
            Product::new(Sku::parse("A").unwrap(), "Alpha", 0, dec!(10)),
            Product::new(Sku::parse("B").unwrap(), "Beta", 0, dec!(50)),
        ])
        .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn decrease_line_snapshots_live_stock() {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Decrease);
        let item = b.add_item(&catalog, "SKU-100", 10, None).unwrap();

        assert_eq!(item.current_stock(), 50);
        assert_eq!(item.new_stock(), 40);
        assert_eq!(item.total_cost(), dec!(200));
    }

    #[test]
    fn two_lines_sum_quantity_and_value() {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Increase);
        b.set_reason(AdjustmentReason::SupplierBonus).unwrap();
        b.add_item(&catalog, "A", 5, None).unwrap();
        b.add_item(&catalog, "B", 3, None).unwrap();

        let adj = b.build(date(), None, "clerk").unwrap();
        assert_eq!(adj.total_quantity(), 8);
        assert_eq!(adj.total_value(), dec!(200));
        assert_eq!(adj.status(), AdjustmentStatus::Draft);
    }

    #[test]
    fn duplicate_sku_is_rejected_not_merged() {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Increase);
        b.add_item(&catalog, "A", 5, None).unwrap();

        let err = b.add_item(&catalog, "A", 2, None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(b.items().len(), 1);
        assert_eq!(b.total_quantity().unwrap(), 5);
    }

    #[test]
    fn unknown_sku_and_bad_magnitude_fail_without_staging() {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Increase);

        assert!(matches!(b.add_item(&catalog, "ZZZ", 1, None), Err(DomainError::NotFound(_))));
        assert!(matches!(b.add_item(&catalog, "A", 0, None), Err(DomainError::Validation(_))));
        assert!(b.items().is_empty());
    }

    #[test]
    fn decrease_beyond_stock_needs_override() {
        let catalog = catalog();
        let mut strict = AdjustmentBuilder::new(AdjustmentType::Decrease);
        let err = strict.add_item(&catalog, "SKU-100", 60, None).unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock("SKU-100", 60, 50));

        let mut lenient = AdjustmentBuilder::new(AdjustmentType::Decrease).allow_negative(true);
        let item = lenient.add_item(&catalog, "SKU-100", 60, None).unwrap();
        assert_eq!(item.new_stock(), -10);
    }

    #[test]
    fn huge_magnitudes_fail_instead_of_overflowing() {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Increase);
        b.set_reason(AdjustmentReason::Other).unwrap();

        let err = b.add_item(&catalog, "SKU-100", i64::MAX, None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(b.items().is_empty());

        let half = i64::MAX / 2 + 1;
        b.add_item(&catalog, "A", half, None).unwrap();
        b.add_item(&catalog, "B", half, None).unwrap();
        assert!(b.total_quantity().is_err());
        assert!(matches!(b.build(date(), None, "clerk"), Err(DomainError::Validation(_))));
    }

    #[test]
    fn change_type_clears_reason_and_items() {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Increase);
        b.set_reason(AdjustmentReason::SupplierBonus).unwrap();
        b.add_item(&catalog, "A", 5, None).unwrap();

        b.change_type(AdjustmentType::Decrease);
        assert_eq!(b.reason(), None);
        assert!(b.items().is_empty());
        assert!(b.set_reason(AdjustmentReason::SupplierBonus).is_err());
        assert!(b.set_reason_label("Damaged Goods").is_ok());
    }

    #[test]
    fn remove_item_unstages_the_line() {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Increase);
        b.add_item(&catalog, "A", 5, None).unwrap();

        assert_eq!(b.remove_item("A").unwrap().sku().as_str(), "A");
        assert!(b.items().is_empty());
        assert!(matches!(b.remove_item("A"), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn build_requires_items_reason_and_author() {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Increase);
        assert!(b.build(date(), None, "clerk").is_err());

        b.add_item(&catalog, "A", 1, None).unwrap();
        assert_eq!(
            b.build(date(), None, "clerk").unwrap_err(),
            DomainError::validation("reason is required")
        );

        b.set_reason(AdjustmentReason::Other).unwrap();
        assert!(b.build(date(), None, "  ").is_err());
        assert!(b.build(date(), Some("count on aisle 4".into()), "clerk").is_ok());
    }

    #[test]
    fn snapshot_is_not_refreshed_by_later_catalog_changes() {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Increase);
        b.set_reason(AdjustmentReason::Other).unwrap();
        b.add_item(&catalog, "SKU-100", 1, None).unwrap();
        let adj = b.build(date(), None, "clerk").unwrap();

        catalog
            .put(Product::new(Sku::parse("SKU-100").unwrap(), "Renamed", 50, dec!(99)))
            .unwrap();

        assert_eq!(adj.items()[0].name(), "Widget");
        assert_eq!(adj.items()[0].unit_cost(), dec!(20));
    }

    proptest::proptest! {
        #[test]
        fn totals_are_exact_sums_of_lines(
            lines in proptest::collection::vec((1i64..1_000, 0i64..100_000), 1..8),
        ) {
            let catalog = InMemoryProductRepo::with_products(lines.iter().enumerate().map(|(i, (_, cents))| {
                Product::new(Sku::parse(&format!("P{i}")).unwrap(), "Part", 0, Decimal::new(*cents, 2))
            }))
            .unwrap();

            let mut b = AdjustmentBuilder::new(AdjustmentType::Increase);
            b.set_reason(AdjustmentReason::ProductionOutput).unwrap();
            for (i, (qty, _)) in lines.iter().enumerate() {
                b.add_item(&catalog, &format!("P{i}"), *qty, None).unwrap();
            }
            let adj = b.build(date(), None, "clerk").unwrap();

            let qty: i64 = lines.iter().map(|(q, _)| q).sum();
            let value: Decimal = lines.iter().map(|(q, c)| Decimal::from(*q) * Decimal::new(*c, 2)).sum();
            proptest::prop_assert_eq!(adj.total_quantity(), qty);
            proptest::prop_assert_eq!(adj.total_value(), value);
            proptest::prop_assert!(adj.validate().is_ok());
        }
    }
}
