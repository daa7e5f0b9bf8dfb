//! Adjustment report projection.
//!
//! Pure functions over a slice of records: filtering for list screens and exports,
//! and the totals shown on the adjustments summary.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_adjustments::{AdjustmentStatus, AdjustmentType, StockAdjustment};
use stockledger_core::{DomainError, DomainResult};

/// Record selection. Every criterion is optional; dates are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentFilter {
    pub status: Option<AdjustmentStatus>,
    #[serde(rename = "type")]
    pub adjustment_type: Option<AdjustmentType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AdjustmentFilter {
    pub fn validate(&self) -> DomainResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(DomainError::validation(format!(
                    "date range is empty: {from} is after {to}"
                )));
            }
        }
        Ok(())
    }

    pub fn matches(&self, adjustment: &StockAdjustment) -> bool {
        self.status.is_none_or(|s| adjustment.status() == s)
            && self
                .adjustment_type
                .is_none_or(|t| adjustment.adjustment_type() == t)
            && self.from.is_none_or(|d| adjustment.date() >= d)
            && self.to.is_none_or(|d| adjustment.date() <= d)
    }
}

pub fn filter_records<'a>(
    records: &'a [StockAdjustment],
    filter: &AdjustmentFilter,
) -> Vec<&'a StockAdjustment> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub count: usize,
    pub quantity: i64,
    pub value: Decimal,
}

impl Totals {
    fn add(&mut self, adjustment: &StockAdjustment) {
        self.count += 1;
        self.quantity = self.quantity.saturating_add(adjustment.total_quantity());
        self.value = self.value.saturating_add(adjustment.total_value());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentSummary {
    pub increase: Totals,
    pub decrease: Totals,
    /// Keyed by status label (`Draft`, `Pending`, ...); only statuses that occur.
    pub by_status: BTreeMap<String, Totals>,
    pub grand_total: Totals,
    /// Signed stock movement still in effect: applied deltas of Approved records.
    pub net_stock_effect: i64,
}

pub fn summarize(records: &[StockAdjustment], filter: &AdjustmentFilter) -> AdjustmentSummary {
    let mut summary = AdjustmentSummary::default();

    for record in records.iter().filter(|r| filter.matches(r)) {
        match record.adjustment_type() {
            AdjustmentType::Increase => summary.increase.add(record),
            AdjustmentType::Decrease => summary.decrease.add(record),
        }
        summary
            .by_status
            .entry(record.status().label().to_string())
            .or_default()
            .add(record);
        summary.grand_total.add(record);

        if record.status() == AdjustmentStatus::Approved {
            summary.net_stock_effect = summary.net_stock_effect.saturating_add(record.net_applied());
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stockledger_adjustments::{AdjustmentBuilder, AdjustmentReason};
    use stockledger_catalog::{InMemoryProductRepo, Product, Sku};

    fn catalog() -> InMemoryProductRepo {
        InMemoryProductRepo::with_products([
            Product::new(Sku::parse("A").unwrap(), "Alpha", 100, dec!(10)),
            Product::new(Sku::parse("B").unwrap(), "Beta", 100, dec!(2.50)),
        ])
        .unwrap()
    }

    fn draft(t: AdjustmentType, sku: &str, qty: i64, day: u32) -> StockAdjustment {
        let catalog = catalog();
        let mut b = AdjustmentBuilder::new(t);
        b.set_reason(AdjustmentReason::Other).unwrap();
        b.add_item(&catalog, sku, qty, None).unwrap();
        b.build(NaiveDate::from_ymd_opt(2024, 6, day).unwrap(), None, "clerk")
            .unwrap()
    }

    #[test]
    fn filter_by_type_and_inclusive_range() {
        let records = vec![
            draft(AdjustmentType::Increase, "A", 1, 1),
            draft(AdjustmentType::Decrease, "A", 2, 10),
            draft(AdjustmentType::Increase, "B", 3, 20),
        ];

        let filter = AdjustmentFilter {
            adjustment_type: Some(AdjustmentType::Increase),
            from: NaiveDate::from_ymd_opt(2024, 6, 1),
            to: NaiveDate::from_ymd_opt(2024, 6, 20),
            ..Default::default()
        };
        let hits = filter_records(&records, &filter);
        assert_eq!(hits.len(), 2);

        let only_draft = AdjustmentFilter {
            status: Some(AdjustmentStatus::Pending),
            ..Default::default()
        };
        assert!(filter_records(&records, &only_draft).is_empty());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let filter = AdjustmentFilter {
            from: NaiveDate::from_ymd_opt(2024, 6, 2),
            to: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..Default::default()
        };
        assert!(matches!(filter.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn summary_totals_by_type_and_status() {
        let records = vec![
            draft(AdjustmentType::Increase, "A", 5, 1),
            draft(AdjustmentType::Increase, "B", 4, 2),
            draft(AdjustmentType::Decrease, "A", 3, 3),
        ];

        let summary = summarize(&records, &AdjustmentFilter::default());
        assert_eq!(summary.increase.count, 2);
        assert_eq!(summary.increase.quantity, 9);
        assert_eq!(summary.increase.value, dec!(60));
        assert_eq!(summary.decrease.value, dec!(30));
        assert_eq!(summary.grand_total.count, 3);
        assert_eq!(summary.grand_total.value, dec!(90));
        assert_eq!(summary.by_status["Draft"].count, 3);
        assert_eq!(summary.net_stock_effect, 0);
    }

    #[test]
    fn filter_deserializes_from_query_style_keys() {
        let filter: AdjustmentFilter = serde_json::from_value(serde_json::json!({
            "status": "approved",
            "type": "decrease",
            "from": "2024-06-01"
        }))
        .unwrap();

        assert_eq!(filter.status, Some(AdjustmentStatus::Approved));
        assert_eq!(filter.adjustment_type, Some(AdjustmentType::Decrease));
        assert_eq!(filter.to, None);
    }
}
