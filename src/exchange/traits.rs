//! Venue-agnostic session trait.
//!
//! The aligner never talks to an exchange directly. Each configured venue is
//! reached through a [`VenueSession`], which hides connectivity, signing and
//! stream handling behind the handful of calls one alignment cycle needs:
//! - Account refresh and balance snapshot
//! - Market rules and best bid/ask
//! - Order submission and cancellation

use super::error::VenueError;
use super::types::{BalanceMap, Market, Order, SubmitOrder, Ticker};
use async_trait::async_trait;

/// A connected trading account on one exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VenueSession: Send + Sync {
    /// Re-fetch account state from the venue.
    async fn refresh_account(&self) -> Result<(), VenueError>;

    /// Balances as of the last successful refresh.
    async fn balances(&self) -> BalanceMap;

    /// Trading rules for a symbol, `None` when the venue does not list it.
    fn market(&self, symbol: &str) -> Option<Market>;

    /// Current best bid/ask.
    async fn query_ticker(&self, symbol: &str) -> Result<Ticker, VenueError>;

    /// Place an order.
    async fn submit_order(&self, order: &SubmitOrder) -> Result<Order, VenueError>;

    /// Cancel orders.
    ///
    /// Returns the orders whose final state the venue confirmed (cancelled,
    /// or already filled). Orders missing from the result are still open.
    async fn cancel_orders(&self, orders: &[Order]) -> Result<Vec<Order>, VenueError>;
}
