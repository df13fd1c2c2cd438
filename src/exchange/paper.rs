//! In-memory venue for paper trading and tests.
//!
//! Resting orders reserve funds the way a real exchange does: a buy moves
//! `quantity * price` of the quote currency from available to locked, a sell
//! moves `quantity` of the base currency. Cancelling releases the reservation,
//! filling settles it.

use super::error::VenueError;
use super::traits::VenueSession;
use super::types::*;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Mutable paper account state.
#[derive(Debug, Default)]
struct PaperState {
    /// Live balances, changed by orders
    balances: BalanceMap,
    /// Snapshot returned by `balances()`, taken on refresh
    account: BalanceMap,
    tickers: HashMap<String, Ticker>,
    open_orders: BTreeMap<u64, Order>,
    /// Filled orders not yet reported through `cancel_orders`
    filled_orders: BTreeMap<u64, Order>,
}

/// Simulated venue session.
pub struct PaperVenue {
    name: String,
    markets: HashMap<String, Market>,
    state: Arc<RwLock<PaperState>>,
    order_id_counter: AtomicU64,
    fail_refresh: AtomicBool,
}

impl PaperVenue {
    /// Create an empty venue.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markets: HashMap::new(),
            state: Arc::new(RwLock::new(PaperState::default())),
            order_id_counter: AtomicU64::new(1),
            fail_refresh: AtomicBool::new(false),
        }
    }

    /// List a market on this venue.
    pub fn with_market(mut self, market: Market) -> Self {
        self.markets.insert(market.symbol.clone(), market);
        self
    }

    /// Seed a balance. Visible through `balances()` after the next refresh.
    pub fn with_balance(self, currency: &str, balance: Balance) -> Self {
        self.state_mut_blocking(|state| state.balances.insert(currency, balance));
        self
    }

    /// Seed a ticker.
    pub fn with_ticker(self, symbol: &str, ticker: Ticker) -> Self {
        self.state_mut_blocking(|state| {
            state.tickers.insert(symbol.to_string(), ticker);
        });
        self
    }

    // Builders run before the venue is shared, so the lock is always free.
    fn state_mut_blocking<F: FnOnce(&mut PaperState)>(&self, f: F) {
        if let Ok(mut state) = self.state.try_write() {
            f(&mut state);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Make subsequent account refreshes fail (or succeed again).
    pub fn set_refresh_failure(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    pub async fn set_ticker(&self, symbol: &str, ticker: Ticker) {
        self.state
            .write()
            .await
            .tickers
            .insert(symbol.to_string(), ticker);
    }

    pub async fn set_balance(&self, currency: &str, balance: Balance) {
        self.state.write().await.balances.insert(currency, balance);
    }

    /// Live balances, including changes since the last refresh.
    pub async fn live_balances(&self) -> BalanceMap {
        self.state.read().await.balances.clone()
    }

    pub async fn open_orders(&self) -> Vec<Order> {
        self.state.read().await.open_orders.values().cloned().collect()
    }

    /// Settle a resting order at its limit price.
    pub async fn fill_order(&self, id: u64) -> Result<Order, VenueError> {
        let mut state = self.state.write().await;
        let symbol = state
            .open_orders
            .get(&id)
            .map(|o| o.symbol.clone())
            .ok_or_else(|| VenueError::UnknownOrder {
                venue: self.name.clone(),
                id,
            })?;
        let market = self.require_market(&symbol)?;
        let Some(mut order) = state.open_orders.remove(&id) else {
            return Err(VenueError::UnknownOrder {
                venue: self.name.clone(),
                id,
            });
        };
        let notional = order.quantity * order.price;

        match order.side {
            OrderSide::Buy => {
                adjust(&mut state.balances, &market.quote_currency, |b| {
                    b.locked -= notional
                });
                adjust(&mut state.balances, &market.base_currency, |b| {
                    b.available += order.quantity
                });
            }
            OrderSide::Sell => {
                adjust(&mut state.balances, &market.base_currency, |b| {
                    b.locked -= order.quantity
                });
                adjust(&mut state.balances, &market.quote_currency, |b| {
                    b.available += notional
                });
            }
        }

        order.status = OrderStatus::Filled;
        state.filled_orders.insert(id, order.clone());

        info!(
            venue = %self.name,
            order_id = id,
            symbol = %order.symbol,
            side = %order.side,
            quantity = %order.quantity,
            price = %order.price,
            "Paper order filled"
        );

        Ok(order)
    }

    fn require_market(&self, symbol: &str) -> Result<&Market, VenueError> {
        self.markets
            .get(symbol)
            .ok_or_else(|| VenueError::UnknownMarket {
                venue: self.name.clone(),
                symbol: symbol.to_string(),
            })
    }

    fn next_order_id(&self) -> u64 {
        self.order_id_counter.fetch_add(1, Ordering::SeqCst)
    }
}

fn adjust<F: FnOnce(&mut Balance)>(balances: &mut BalanceMap, currency: &str, f: F) {
    let mut balance = balances.get(currency).copied().unwrap_or_default();
    f(&mut balance);
    balances.insert(currency, balance);
}

#[async_trait]
impl VenueSession for PaperVenue {
    async fn refresh_account(&self) -> Result<(), VenueError> {
        if self.fail_refresh.load(Ordering::SeqCst) {
            warn!(venue = %self.name, "Paper account refresh failure injected");
            return Err(VenueError::request(&self.name, "account refresh unavailable"));
        }

        let mut state = self.state.write().await;
        state.account = state.balances.clone();
        debug!(venue = %self.name, currencies = state.account.len(), "Paper account refreshed");
        Ok(())
    }

    async fn balances(&self) -> BalanceMap {
        self.state.read().await.account.clone()
    }

    fn market(&self, symbol: &str) -> Option<Market> {
        self.markets.get(symbol).cloned()
    }

    async fn query_ticker(&self, symbol: &str) -> Result<Ticker, VenueError> {
        self.state
            .read()
            .await
            .tickers
            .get(symbol)
            .copied()
            .ok_or_else(|| VenueError::request(&self.name, format!("no ticker for {symbol}")))
    }

    async fn submit_order(&self, order: &SubmitOrder) -> Result<Order, VenueError> {
        let market = self.require_market(&order.symbol)?;

        if order.quantity <= Decimal::ZERO || order.price <= Decimal::ZERO {
            return Err(VenueError::rejected(
                &self.name,
                format!("invalid quantity {} or price {}", order.quantity, order.price),
            ));
        }

        let mut state = self.state.write().await;

        let (currency, amount) = match order.side {
            OrderSide::Buy => (&market.quote_currency, order.notional()),
            OrderSide::Sell => (&market.base_currency, order.quantity),
        };

        let available = state
            .balances
            .get(currency)
            .map(|b| b.available)
            .unwrap_or(Decimal::ZERO);
        if amount > available {
            return Err(VenueError::rejected(
                &self.name,
                format!("insufficient {currency}: need {amount}, have {available}"),
            ));
        }

        adjust(&mut state.balances, currency, |b| {
            b.available -= amount;
            b.locked += amount;
        });

        let created = Order {
            id: self.next_order_id(),
            venue: self.name.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.order_type,
            quantity: order.quantity,
            price: order.price,
            status: OrderStatus::New,
            created_at: Utc::now(),
        };
        state.open_orders.insert(created.id, created.clone());

        info!(
            venue = %self.name,
            order_id = created.id,
            symbol = %created.symbol,
            side = %created.side,
            quantity = %created.quantity,
            price = %created.price,
            "Paper order accepted"
        );

        Ok(created)
    }

    async fn cancel_orders(&self, orders: &[Order]) -> Result<Vec<Order>, VenueError> {
        let mut state = self.state.write().await;
        let mut confirmed = Vec::with_capacity(orders.len());

        for order in orders {
            if let Some(mut open) = state.open_orders.remove(&order.id) {
                // Orders are only accepted on listed markets
                let market = self.require_market(&open.symbol)?;
                match open.side {
                    OrderSide::Buy => {
                        let notional = open.quantity * open.price;
                        adjust(&mut state.balances, &market.quote_currency, |b| {
                            b.locked -= notional;
                            b.available += notional;
                        });
                    }
                    OrderSide::Sell => {
                        adjust(&mut state.balances, &market.base_currency, |b| {
                            b.locked -= open.quantity;
                            b.available += open.quantity;
                        });
                    }
                }
                open.status = OrderStatus::Canceled;
                debug!(venue = %self.name, order_id = open.id, "Paper order cancelled");
                confirmed.push(open);
            } else if let Some(filled) = state.filled_orders.remove(&order.id) {
                confirmed.push(filled);
            }
        }

        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc_usdt() -> Market {
        Market {
            symbol: "BTCUSDT".to_string(),
            base_currency: "BTC".to_string(),
            quote_currency: "USDT".to_string(),
            tick_size: dec!(1),
            price_precision: 2,
            volume_precision: 6,
            min_notional: dec!(10),
            min_quantity: dec!(0.0001),
        }
    }

    fn create_test_venue() -> PaperVenue {
        PaperVenue::new("paper")
            .with_market(btc_usdt())
            .with_balance("USDT", Balance::new(dec!(20000), dec!(0)))
            .with_balance("BTC", Balance::new(dec!(1), dec!(0)))
            .with_ticker("BTCUSDT", Ticker::new(dec!(29999), dec!(30001)))
    }

    fn buy(quantity: Decimal, price: Decimal) -> SubmitOrder {
        SubmitOrder::limit("paper", &btc_usdt(), OrderSide::Buy, quantity, price)
    }

    #[tokio::test]
    async fn test_balances_visible_after_refresh() {
        let venue = create_test_venue();
        assert!(venue.balances().await.is_empty());

        venue.refresh_account().await.unwrap();
        let balances = venue.balances().await;
        assert_eq!(balances.net("USDT"), dec!(20000));
        assert_eq!(balances.net("BTC"), dec!(1));
    }

    #[tokio::test]
    async fn test_refresh_failure_injection() {
        let venue = create_test_venue();
        venue.set_refresh_failure(true);
        assert!(venue.refresh_account().await.is_err());

        venue.set_refresh_failure(false);
        assert!(venue.refresh_account().await.is_ok());
    }

    #[tokio::test]
    async fn test_submit_locks_quote_funds() {
        let venue = create_test_venue();
        let order = venue.submit_order(&buy(dec!(0.5), dec!(30000))).await.unwrap();

        assert_eq!(order.status, OrderStatus::New);
        let usdt = *venue.live_balances().await.get("USDT").unwrap();
        assert_eq!(usdt.available, dec!(5000));
        assert_eq!(usdt.locked, dec!(15000));
        // Net is unchanged by a resting order
        assert_eq!(usdt.net(), dec!(20000));
    }

    #[tokio::test]
    async fn test_submit_rejects_insufficient_funds() {
        let venue = create_test_venue();
        let result = venue.submit_order(&buy(dec!(1), dec!(30000))).await;
        assert!(matches!(result, Err(VenueError::Rejected { .. })));
        assert!(venue.open_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_market() {
        let venue = create_test_venue();
        let mut order = buy(dec!(1), dec!(2000));
        order.symbol = "ETHUSDT".to_string();
        let result = venue.submit_order(&order).await;
        assert!(matches!(result, Err(VenueError::UnknownMarket { .. })));
    }

    #[tokio::test]
    async fn test_cancel_releases_locked_funds() {
        let venue = create_test_venue();
        let order = venue.submit_order(&buy(dec!(0.5), dec!(30000))).await.unwrap();

        let confirmed = venue.cancel_orders(&[order.clone()]).await.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].status, OrderStatus::Canceled);

        let usdt = *venue.live_balances().await.get("USDT").unwrap();
        assert_eq!(usdt.available, dec!(20000));
        assert_eq!(usdt.locked, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_fill_settles_and_cancel_reports_filled() {
        let venue = create_test_venue();
        let sell = SubmitOrder::limit("paper", &btc_usdt(), OrderSide::Sell, dec!(0.4), dec!(30000));
        let order = venue.submit_order(&sell).await.unwrap();

        venue.fill_order(order.id).await.unwrap();

        let balances = venue.live_balances().await;
        assert_eq!(balances.net("BTC"), dec!(0.6));
        assert_eq!(balances.net("USDT"), dec!(32000));

        let confirmed = venue.cancel_orders(&[order.clone()]).await.unwrap();
        assert_eq!(confirmed[0].status, OrderStatus::Filled);

        // Reported once, then forgotten
        assert!(venue.state.read().await.filled_orders.is_empty());
        assert!(venue.cancel_orders(&[order]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_and_replace_keeps_no_history() {
        let venue = create_test_venue();
        for _ in 0..5 {
            let order = venue.submit_order(&buy(dec!(0.1), dec!(30000))).await.unwrap();
            venue.cancel_orders(&[order]).await.unwrap();
        }

        let state = venue.state.read().await;
        assert!(state.open_orders.is_empty());
        assert!(state.filled_orders.is_empty());
    }

    #[tokio::test]
    async fn test_set_ticker_and_balance_update_live_state() {
        let venue = create_test_venue();
        venue
            .set_ticker("BTCUSDT", Ticker::new(dec!(31000), dec!(31002)))
            .await;
        venue
            .set_balance("USDT", Balance::new(dec!(500), dec!(0)))
            .await;

        assert_eq!(
            venue.query_ticker("BTCUSDT").await.unwrap(),
            Ticker::new(dec!(31000), dec!(31002))
        );
        assert_eq!(venue.live_balances().await.net("USDT"), dec!(500));
        // Account view changes only on refresh
        assert!(venue.balances().await.is_empty());
        venue.refresh_account().await.unwrap();
        assert_eq!(venue.balances().await.net("USDT"), dec!(500));
    }

    #[tokio::test]
    async fn test_cancel_ignores_unknown_orders() {
        let venue = create_test_venue();
        let mut ghost = venue.submit_order(&buy(dec!(0.1), dec!(30000))).await.unwrap();
        ghost.id = 999;
        let confirmed = venue.cancel_orders(&[ghost]).await.unwrap();
        assert!(confirmed.is_empty());
    }
}
