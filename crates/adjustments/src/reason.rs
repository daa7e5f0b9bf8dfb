use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult};

/// Direction of an adjustment. Item quantities are magnitudes; the sign comes from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Increase,
    Decrease,
}

impl AdjustmentType {
    pub fn sign(self) -> i64 {
        match self {
            AdjustmentType::Increase => 1,
            AdjustmentType::Decrease => -1,
        }
    }

    /// Signed stock effect of `magnitude` units.
    pub fn signed(self, magnitude: i64) -> i64 {
        self.sign() * magnitude
    }

    pub fn label(self) -> &'static str {
        match self {
            AdjustmentType::Increase => "Increase",
            AdjustmentType::Decrease => "Decrease",
        }
    }

    /// Parse `increase` / `decrease` (case-insensitive).
    pub fn parse(raw: &str) -> DomainResult<Self> {
        match raw.trim().to_lowercase().as_str() {
            "increase" => Ok(AdjustmentType::Increase),
            "decrease" => Ok(AdjustmentType::Decrease),
            other => Err(DomainError::validation(format!(
                "adjustment type must be increase or decrease (got '{other}')"
            ))),
        }
    }
}

impl core::fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed reason vocabulary. Serialized as its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjustmentReason {
    #[serde(rename = "Stock Count – Found Extra")]
    StockCountFoundExtra,
    #[serde(rename = "Supplier Bonus")]
    SupplierBonus,
    #[serde(rename = "Return from Customer")]
    ReturnFromCustomer,
    #[serde(rename = "Production Output")]
    ProductionOutput,
    #[serde(rename = "Stock Count – Missing")]
    StockCountMissing,
    #[serde(rename = "Damaged Goods")]
    DamagedGoods,
    #[serde(rename = "Expired Products")]
    ExpiredProducts,
    #[serde(rename = "Theft/Loss")]
    TheftLoss,
    #[serde(rename = "Internal Use")]
    InternalUse,
    #[serde(rename = "Return to Supplier")]
    ReturnToSupplier,
    #[serde(rename = "Data Entry Correction")]
    DataEntryCorrection,
    #[serde(rename = "Other")]
    Other,
}

const INCREASE_REASONS: &[AdjustmentReason] = &[
    AdjustmentReason::StockCountFoundExtra,
    AdjustmentReason::SupplierBonus,
    AdjustmentReason::ReturnFromCustomer,
    AdjustmentReason::ProductionOutput,
    AdjustmentReason::DataEntryCorrection,
    AdjustmentReason::Other,
];

const DECREASE_REASONS: &[AdjustmentReason] = &[
    AdjustmentReason::StockCountMissing,
    AdjustmentReason::DamagedGoods,
    AdjustmentReason::ExpiredProducts,
    AdjustmentReason::TheftLoss,
    AdjustmentReason::InternalUse,
    AdjustmentReason::ReturnToSupplier,
    AdjustmentReason::DataEntryCorrection,
    AdjustmentReason::Other,
];

impl AdjustmentReason {
    pub fn label(self) -> &'static str {
        match self {
            AdjustmentReason::StockCountFoundExtra => "Stock Count – Found Extra",
            AdjustmentReason::SupplierBonus => "Supplier Bonus",
            AdjustmentReason::ReturnFromCustomer => "Return from Customer",
            AdjustmentReason::ProductionOutput => "Production Output",
            AdjustmentReason::StockCountMissing => "Stock Count – Missing",
            AdjustmentReason::DamagedGoods => "Damaged Goods",
            AdjustmentReason::ExpiredProducts => "Expired Products",
            AdjustmentReason::TheftLoss => "Theft/Loss",
            AdjustmentReason::InternalUse => "Internal Use",
            AdjustmentReason::ReturnToSupplier => "Return to Supplier",
            AdjustmentReason::DataEntryCorrection => "Data Entry Correction",
            AdjustmentReason::Other => "Other",
        }
    }

    /// Reasons selectable for `adjustment_type`, in display order.
    pub fn vocabulary(adjustment_type: AdjustmentType) -> &'static [AdjustmentReason] {
        match adjustment_type {
            AdjustmentType::Increase => INCREASE_REASONS,
            AdjustmentType::Decrease => DECREASE_REASONS,
        }
    }

    pub fn allowed_for(self, adjustment_type: AdjustmentType) -> bool {
        Self::vocabulary(adjustment_type).contains(&self)
    }

    /// Resolve a label within the vocabulary of `adjustment_type`.
    pub fn parse_for(adjustment_type: AdjustmentType, label: &str) -> DomainResult<Self> {
        let wanted = label.trim();
        Self::vocabulary(adjustment_type)
            .iter()
            .copied()
            .find(|r| r.label() == wanted)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "'{wanted}' is not a valid {} reason",
                    adjustment_type.label().to_lowercase()
                ))
            })
    }
}

impl core::fmt::Display for AdjustmentReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_follows_type() {
        assert_eq!(AdjustmentType::Increase.signed(5), 5);
        assert_eq!(AdjustmentType::Decrease.signed(5), -5);
    }

    #[test]
    fn reasons_are_scoped_to_their_type() {
        assert!(AdjustmentReason::SupplierBonus.allowed_for(AdjustmentType::Increase));
        assert!(!AdjustmentReason::SupplierBonus.allowed_for(AdjustmentType::Decrease));
        assert!(AdjustmentReason::DamagedGoods.allowed_for(AdjustmentType::Decrease));
        assert!(AdjustmentReason::Other.allowed_for(AdjustmentType::Increase));
        assert!(AdjustmentReason::Other.allowed_for(AdjustmentType::Decrease));
    }

    #[test]
    fn parse_for_rejects_labels_from_the_other_vocabulary() {
        assert_eq!(
            AdjustmentReason::parse_for(AdjustmentType::Decrease, "Theft/Loss").unwrap(),
            AdjustmentReason::TheftLoss
        );
        let err = AdjustmentReason::parse_for(AdjustmentType::Increase, "Theft/Loss").unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("increase")));
    }

    #[test]
    fn reason_serializes_as_label() {
        let json = serde_json::to_string(&AdjustmentReason::StockCountFoundExtra).unwrap();
        assert_eq!(json, "\"Stock Count – Found Extra\"");
        for r in INCREASE_REASONS.iter().chain(DECREASE_REASONS) {
            assert_eq!(serde_json::to_value(r).unwrap(), serde_json::json!(r.label()));
        }
    }

    #[test]
    fn type_parse_is_case_insensitive() {
        assert_eq!(AdjustmentType::parse("Decrease").unwrap(), AdjustmentType::Decrease);
        assert!(AdjustmentType::parse("sideways").is_err());
    }
}
