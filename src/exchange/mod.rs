//! Venue integrations for balance alignment.
//!
//! ## Session seam
//! [`VenueSession`] is the only way the strategy touches an exchange:
//! - Account refresh and balances
//! - Market rules and tickers
//! - Order submission and cancellation
//!
//! ## Paper venue
//! [`PaperVenue`] keeps balances, tickers and resting orders in memory, for
//! paper runs of the binary and for tests.

mod error;
pub mod paper;
mod traits;
mod types;

pub use error::VenueError;
pub use paper::PaperVenue;
#[cfg(test)]
pub use traits::MockVenueSession;
pub use traits::VenueSession;
pub use types::*;
