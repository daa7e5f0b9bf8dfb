//! Fixed-point money helpers.
//!
//! Monetary values are `rust_decimal::Decimal`; floats never touch money. Rounding
//! happens once per line (`line_total`); totals are plain sums of already-rounded
//! line values and are never rounded again.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult};

/// Number of decimal places kept on monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// `quantity × unit_cost`, rounded to `MONEY_SCALE` places (midpoint away from zero).
pub fn line_total(quantity: i64, unit_cost: Decimal) -> DomainResult<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_cost)
        .map(|v| v.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| {
            DomainError::validation(format!("line total of {quantity} × {unit_cost} is out of range"))
        })
}

/// Sum of already-rounded line totals.
pub fn sum_totals<I>(totals: I) -> DomainResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    totals
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .ok_or_else(|| DomainError::validation("total value is out of range"))
}

/// Reject negative costs.
pub fn ensure_non_negative(field: &str, value: Decimal) -> DomainResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

/// Render an amount with exactly `MONEY_SCALE` decimals (e.g. `200.00`).
pub fn format_amount(value: Decimal) -> String {
    let mut v = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(MONEY_SCALE);
    v.to_string()
}
