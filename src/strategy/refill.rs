//! Corrective quantity calculation.

use crate::exchange::BalanceMap;
use rust_decimal::Decimal;

/// Signed quantity that brings `currency` to its target.
///
/// Positive means buy, negative means sell, zero means aligned. A currency
/// missing from `total` counts as a zero balance. No rounding happens here;
/// tick and precision rules depend on the venue chosen later.
pub fn calculate_refill_quantity(total: &BalanceMap, currency: &str, expected: Decimal) -> Decimal {
    expected - total.net(currency)
}
