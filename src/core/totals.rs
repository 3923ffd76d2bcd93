use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::types::InvoiceItem;

/// Derived invoice totals at 2-decimal monetary scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_ht: Decimal,
    pub total_vat: Decimal,
    pub total_ttc: Decimal,
}

impl Totals {
    pub const ZERO: Totals = Totals {
        total_ht: Decimal::ZERO,
        total_vat: Decimal::ZERO,
        total_ttc: Decimal::ZERO,
    };
}

/// Net line total for a quantity at a unit price.
///
/// With an integer quantity and a 2-decimal unit price the product has
/// at most 2 decimal places, so no rounding happens here.
pub fn line_total(quantity: u32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

/// Compute invoice totals over the currently attached items.
///
/// `total_ht` sums the materialized line totals exactly; VAT is summed
/// at full precision and rounded half-up to 2 decimals once, so
/// `total_ttc = total_ht + total_vat` holds without tolerance.
pub fn compute_totals(items: &[InvoiceItem]) -> Totals {
    let total_ht: Decimal = items.iter().map(|item| item.unit_total_ht).sum();
    let raw_vat: Decimal = items
        .iter()
        .map(|item| item.unit_total_ht * item.vat_rate / dec!(100))
        .sum();
    let total_vat = round_half_up(raw_vat, 2);

    Totals {
        total_ht,
        total_vat,
        total_ttc: total_ht + total_vat,
    }
}

/// Round a Decimal to `dp` decimal places using half-up (commercial
/// rounding).
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
