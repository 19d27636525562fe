//! Fixed-point money arithmetic shared across the pipeline.
//!
//! All monetary values are `rust_decimal::Decimal`; currency is never
//! represented as a float anywhere in the workspace.

use rust_decimal::Decimal;

/// Derive a discount percentage from a price pair, rounded to two decimals.
///
/// Returns `round(((original - price) / original) * 100, 2)` when
/// `original > 0` and `price < original`, and zero otherwise. The result is
/// always recomputed server-side; a percentage supplied by an external
/// source is never trusted.
#[must_use]
pub fn discount_percent(price: Decimal, original_price: Decimal) -> Decimal {
    if original_price <= Decimal::ZERO || price >= original_price {
        return Decimal::ZERO;
    }
    ((original_price - price) / original_price * Decimal::ONE_HUNDRED).round_dp(2)
}
