//! Errors surfaced by venue sessions.

use thiserror::Error;

/// Failure talking to a venue.
///
/// Every variant is non-fatal to the aligner: the venue or candidate is
/// treated as unavailable for the current cycle.
#[derive(Debug, Error)]
pub enum VenueError {
    /// Transport or remote failure (timeouts, 5xx, auth).
    #[error("{venue}: request failed: {message}")]
    Request { venue: String, message: String },

    /// The venue refused the order.
    #[error("{venue}: order rejected: {reason}")]
    Rejected { venue: String, reason: String },

    #[error("{venue}: no market for {symbol}")]
    UnknownMarket { venue: String, symbol: String },

    #[error("{venue}: unknown order {id}")]
    UnknownOrder { venue: String, id: u64 },
}

impl VenueError {
    pub fn request(venue: impl Into<String>, message: impl Into<String>) -> Self {
        VenueError::Request {
            venue: venue.into(),
            message: message.into(),
        }
    }

    pub fn rejected(venue: impl Into<String>, reason: impl Into<String>) -> Self {
        VenueError::Rejected {
            venue: venue.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_venue() {
        let err = VenueError::request("binance", "timeout");
        assert_eq!(err.to_string(), "binance: request failed: timeout");

        let err = VenueError::UnknownMarket {
            venue: "okx".to_string(),
            symbol: "BTCUSDT".to_string(),
        };
        assert_eq!(err.to_string(), "okx: no market for BTCUSDT");
    }
}
