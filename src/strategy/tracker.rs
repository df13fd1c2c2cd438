//! Per-venue record of the aligner's own open orders.

use crate::exchange::{Order, VenueError, VenueSession};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Open orders placed by this aligner on one venue.
#[derive(Debug, Clone)]
pub struct OrderTracker {
    venue: String,
    orders: BTreeMap<u64, Order>,
}

impl OrderTracker {
    pub fn new(venue: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            orders: BTreeMap::new(),
        }
    }

    /// Start tracking a newly placed order.
    pub fn record_open(&mut self, order: Order) {
        if order.status.is_closed() {
            debug!(venue = %self.venue, order_id = order.id, status = ?order.status, "Not tracking closed order");
            return;
        }
        self.orders.insert(order.id, order);
    }

    /// Apply an order update; closed orders stop being tracked.
    pub fn update(&mut self, order: &Order) {
        if order.status.is_closed() {
            self.orders.remove(&order.id);
        } else if let Some(tracked) = self.orders.get_mut(&order.id) {
            tracked.status = order.status;
        }
    }

    pub fn open_orders(&self) -> Vec<Order> {
        self.orders.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Cancel every tracked order on `session`.
    ///
    /// Returns the number of orders the venue confirmed closed. Orders the
    /// venue did not confirm stay tracked and are reported as an error so
    /// the next cycle retries them.
    pub async fn cancel_all_open(&mut self, session: &dyn VenueSession) -> Result<usize, VenueError> {
        if self.orders.is_empty() {
            return Ok(0);
        }

        let orders = self.open_orders();
        let confirmed = session.cancel_orders(&orders).await?;

        let mut closed = 0;
        for order in &confirmed {
            if order.status.is_closed() && self.orders.contains_key(&order.id) {
                closed += 1;
            }
            self.update(order);
        }

        if !self.orders.is_empty() {
            warn!(venue = %self.venue, remaining = self.orders.len(), "Orders still open after cancel");
            return Err(VenueError::request(
                &self.venue,
                format!("{} orders not confirmed cancelled", self.orders.len()),
            ));
        }

        info!(venue = %self.venue, closed, "Cancelled tracked orders");
        Ok(closed)
    }
}
