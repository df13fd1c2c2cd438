//! Shared utilities.

pub mod decimal;

pub use decimal::round_up_to_precision;
