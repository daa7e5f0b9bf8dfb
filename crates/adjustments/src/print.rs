//! Structured accessors for exporters (print layouts, CSV writers).
//!
//! Rendering (HTML, labels, CSV quoting) belongs to the consumers; this module only
//! fixes which values they get and how numbers are formatted.

use serde::Serialize;

use stockledger_core::money;

use crate::adjustment::StockAdjustment;
use crate::reason::AdjustmentType;

/// CSV header, in column order.
pub const CSV_COLUMNS: [&str; 9] = [
    "Adjustment No",
    "Date",
    "Type",
    "Reason",
    "Items",
    "Total Qty",
    "Total Value",
    "Status",
    "Created By",
];

/// Values for one CSV row, aligned with [`CSV_COLUMNS`].
pub fn csv_record(adjustment: &StockAdjustment) -> [String; 9] {
    [
        adjustment.adjustment_no().to_string(),
        adjustment.date().format("%Y-%m-%d").to_string(),
        adjustment.adjustment_type().label().to_string(),
        adjustment.reason().label().to_string(),
        adjustment.items().len().to_string(),
        adjustment.total_quantity().to_string(),
        money::format_amount(adjustment.total_value()),
        adjustment.status().label().to_string(),
        adjustment.created_by().to_string(),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintLine {
    pub line_no: usize,
    pub sku: String,
    pub name: String,
    pub current_stock: i64,
    /// Signed, e.g. `+5` or `-10`.
    pub adjustment: String,
    pub new_stock: i64,
    pub unit_cost: String,
    pub total_cost: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintView {
    pub adjustment_no: String,
    pub date: String,
    pub adjustment_type: String,
    pub reason: String,
    pub status: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub lines: Vec<PrintLine>,
    pub total_quantity: i64,
    pub total_value: String,
    /// Net signed effect on stock, e.g. `-13`. Once decided, this is what the
    /// catalog actually applied, which is smaller than requested when clamped.
    pub net_effect: String,
    pub audit_notes: Vec<String>,
}

fn signed_label(adjustment_type: AdjustmentType, magnitude: i64) -> String {
    format!("{:+}", adjustment_type.signed(magnitude))
}

pub fn serialize_for_print(adjustment: &StockAdjustment) -> PrintView {
    let t = adjustment.adjustment_type();
    let net_effect = if adjustment.applied_deltas().is_empty() {
        signed_label(t, adjustment.total_quantity())
    } else {
        format!("{:+}", adjustment.net_applied())
    };
    let lines = adjustment
        .items()
        .iter()
        .enumerate()
        .map(|(idx, item)| PrintLine {
            line_no: idx + 1,
            sku: item.sku().to_string(),
            name: item.name().to_string(),
            current_stock: item.current_stock(),
            adjustment: signed_label(t, item.adjustment_quantity()),
            new_stock: item.new_stock(),
            unit_cost: money::format_amount(item.unit_cost()),
            total_cost: money::format_amount(item.total_cost()),
            reason: item.reason().map(str::to_string),
        })
        .collect();

    PrintView {
        adjustment_no: adjustment.adjustment_no().to_string(),
        date: adjustment.date().format("%Y-%m-%d").to_string(),
        adjustment_type: t.label().to_string(),
        reason: adjustment.reason().label().to_string(),
        status: adjustment.status().label().to_string(),
        created_by: adjustment.created_by().to_string(),
        approved_by: adjustment.approved_by().map(str::to_string),
        approved_date: adjustment
            .approved_date()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string()),
        notes: adjustment.notes().map(str::to_string),
        lines,
        total_quantity: adjustment.total_quantity(),
        total_value: money::format_amount(adjustment.total_value()),
        net_effect,
        audit_notes: adjustment.audit_notes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AdjustmentBuilder;
    use crate::reason::AdjustmentReason;
    use crate::adjustment::{AdjustmentCommand, AppliedDelta, ApproveAdjustment};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use stockledger_catalog::{InMemoryProductRepo, Product, Sku};
    use stockledger_core::Aggregate;

    fn adjustment() -> StockAdjustment {
        let catalog = InMemoryProductRepo::with_products([
            Product::new(Sku::parse("A").unwrap(), "Alpha", 20, dec!(10)),
            Product::new(Sku::parse("B").unwrap(), "Beta", 20, dec!(50)),
        ])
        .unwrap();
        let mut b = AdjustmentBuilder::new(AdjustmentType::Decrease);
        b.set_reason(AdjustmentReason::DamagedGoods).unwrap();
        b.add_item(&catalog, "A", 5, Some("crushed".into())).unwrap();
        b.add_item(&catalog, "B", 3, None).unwrap();
        let mut adj = b
            .build(NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(), None, "dana")
            .unwrap();
        adj.assign_number("ADJ-20240209-0007").unwrap();
        adj
    }

    #[test]
    fn csv_record_matches_column_layout() {
        let row = csv_record(&adjustment());
        assert_eq!(row.len(), CSV_COLUMNS.len());
        assert_eq!(
            row,
            [
                "ADJ-20240209-0007",
                "2024-02-09",
                "Decrease",
                "Damaged Goods",
                "2",
                "8",
                "200.00",
                "Draft",
                "dana",
            ]
            .map(String::from)
        );
    }

    #[test]
    fn print_view_signs_lines_by_type() {
        let view = serialize_for_print(&adjustment());
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[0].adjustment, "-5");
        assert_eq!(view.lines[0].new_stock, 15);
        assert_eq!(view.lines[0].reason.as_deref(), Some("crushed"));
        assert_eq!(view.lines[1].total_cost, "150.00");
        assert_eq!(view.net_effect, "-8");
        assert_eq!(view.total_value, "200.00");
        assert!(view.approved_by.is_none());
    }

    #[test]
    fn clamped_approval_prints_the_applied_effect() {
        let mut adj = adjustment();
        let applied = adj
            .approval_plan()
            .into_iter()
            .map(|(sku, d)| {
                let applied = if sku.as_str() == "A" { -2 } else { d };
                AppliedDelta { sku, requested: d, applied }
            })
            .collect();
        let events = adj
            .handle(&AdjustmentCommand::Approve(ApproveAdjustment {
                approved_by: "manager".into(),
                applied,
                auto_approve: true,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        for e in &events {
            adj.apply(e);
        }

        let view = serialize_for_print(&adj);
        assert_eq!(view.net_effect, "-5");
        assert_eq!(view.total_quantity, 8);
        assert_eq!(view.lines[0].adjustment, "-5");
        assert_eq!(view.audit_notes.len(), 1);
    }
}
