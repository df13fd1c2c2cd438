//! # Balance Aligner
//!
//! Keeps the total holding of each configured currency, summed across
//! several trading venues, at a target level. Every cycle it cancels its own
//! stale orders, measures balances, and places at most one corrective limit
//! order per currency on the first venue that can take it.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: Venue session trait, shared types and the paper venue
//! - `strategy`: Aggregation, quantity and venue selection, cycles, scheduling
//! - `utils`: Shared utilities and decimal arithmetic

pub mod config;
pub mod exchange;
pub mod strategy;
pub mod utils;

pub use config::Config;
