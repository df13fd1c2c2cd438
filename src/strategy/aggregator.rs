//! Cross-venue balance aggregation.

use crate::exchange::{BalanceMap, VenueError, VenueSession};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// A venue could not be refreshed, so no total was produced.
#[derive(Debug, Error)]
#[error("balance aggregation failed at venue {venue}")]
pub struct AggregationError {
    pub venue: String,
    #[source]
    pub source: VenueError,
}

/// Balances summed across venues, plus the per-venue breakdown.
#[derive(Debug, Clone, Default)]
pub struct AggregatedBalances {
    pub total: BalanceMap,
    pub per_venue: BTreeMap<String, BalanceMap>,
}

/// Refresh every venue and sum their balances per currency.
///
/// Fails as a whole on the first venue whose refresh fails; a total built
/// from a subset of venues would misstate every currency held there.
pub async fn aggregate_balances(
    venues: &[(String, Arc<dyn VenueSession>)],
) -> Result<AggregatedBalances, AggregationError> {
    let mut aggregated = AggregatedBalances::default();

    for (name, session) in venues {
        if let Err(source) = session.refresh_account().await {
            error!(venue = %name, error = %source, "Cannot update account");
            return Err(AggregationError {
                venue: name.clone(),
                source,
            });
        }

        let balances = session.balances().await;
        debug!(venue = %name, currencies = balances.len(), "Venue balances refreshed");

        aggregated.total.add(&balances);
        aggregated.per_venue.insert(name.clone(), balances);
    }

    Ok(aggregated)
}
