use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use stockledger_adjustments::{AdjustmentType, CSV_COLUMNS, StockAdjustment, csv_record};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProductRequest {
    pub name: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
    #[serde(default)]
    pub reorder_level: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentLineRequest {
    pub sku: String,
    /// Magnitude, always positive.
    pub quantity: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdjustmentRequest {
    pub adjustment_type: AdjustmentType,
    /// Reason label, e.g. "Damaged Goods".
    pub reason: String,
    /// Defaults to today (UTC).
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub allow_negative: bool,
    /// Save as Draft instead of submitting.
    #[serde(default)]
    pub draft: bool,
    pub items: Vec<AdjustmentLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: String,
}

// -------------------------
// Response mapping
// -------------------------

pub fn csv_rows_to_json(records: &[StockAdjustment]) -> serde_json::Value {
    let rows = records.iter().map(csv_record).collect::<Vec<_>>();
    serde_json::json!({
        "columns": CSV_COLUMNS,
        "rows": rows,
    })
}

pub fn list_to_json<T: serde::Serialize>(items: &[T]) -> serde_json::Value {
    serde_json::json!({ "items": items })
}
