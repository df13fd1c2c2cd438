//! Balance alignment strategy.
//!
//! Contains the core logic for:
//! - Aggregating balances across venues
//! - Computing the signed corrective quantity per currency
//! - Selecting venue, quote currency and price for the corrective order
//! - Tracking and cancelling the aligner's own orders
//! - Running cycles on a fixed interval

mod aggregator;
mod cycle;
mod refill;
mod scheduler;
mod selector;
mod tracker;

pub use aggregator::{aggregate_balances, AggregatedBalances, AggregationError};
pub use cycle::{AlignmentCycle, CycleOutcome, CycleReport, SubmitFailure, STRATEGY_ID};
pub use refill::calculate_refill_quantity;
pub use scheduler::Scheduler;
pub use selector::{buy_price, sell_price, VenuePriceSelector};
pub use tracker::OrderTracker;
