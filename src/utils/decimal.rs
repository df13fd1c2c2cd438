//! Decimal arithmetic utilities for financial calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round up to a number of decimal places.
///
/// Used for cost estimates and exchange minimums, where rounding down
/// would under-reserve funds or fall short of the limit.
pub fn round_up_to_precision(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::ToPositiveInfinity)
}
