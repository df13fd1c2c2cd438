//! One alignment pass over every target currency.
//!
//! A cycle moves through `Cancelling -> Aggregating -> (Planning ->
//! Submitting)*` and keeps nothing between runs except the per-venue order
//! trackers.

use super::aggregator::aggregate_balances;
use super::refill::calculate_refill_quantity;
use super::selector::VenuePriceSelector;
use super::tracker::OrderTracker;
use crate::config::AlignmentConfig;
use crate::exchange::{Order, SubmitOrder, VenueSession};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

pub const STRATEGY_ID: &str = "xalign";

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CycleOutcome {
    /// Every currency was evaluated
    Completed,
    /// A venue refresh failed; no currency was evaluated
    AggregationFailed,
    /// Dry run stopped after logging the first plan
    HaltedOnDryRun,
    /// A submission failed and the cycle stopped
    HaltedOnSubmitError,
    /// Shutdown was observed between steps
    Interrupted,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitFailure {
    pub currency: String,
    pub venue: String,
    pub error: String,
}

/// What one cycle did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// Orders confirmed closed during the cancel step
    pub cancelled: usize,
    /// Venues whose cancel step failed
    pub cancel_failures: Vec<String>,
    /// Net balance per target currency, when aggregation succeeded
    pub balances: BTreeMap<String, Decimal>,
    pub planned: Vec<SubmitOrder>,
    pub submitted: Vec<Order>,
    pub submit_failures: Vec<SubmitFailure>,
    /// Currencies with nothing to do or no feasible order
    pub skipped: Vec<String>,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            cancelled: 0,
            cancel_failures: Vec::new(),
            balances: BTreeMap::new(),
            planned: Vec::new(),
            submitted: Vec::new(),
            submit_failures: Vec::new(),
            skipped: Vec::new(),
            outcome: CycleOutcome::Completed,
        }
    }

    fn interrupt(mut self, before: &str) -> Self {
        info!(before, "Shutdown requested, stopping cycle");
        self.outcome = CycleOutcome::Interrupted;
        self
    }
}

/// Owns the venue sessions and order trackers for a strategy run.
pub struct AlignmentCycle {
    config: AlignmentConfig,
    venues: Vec<(String, Arc<dyn VenueSession>)>,
    trackers: BTreeMap<String, OrderTracker>,
    selector: VenuePriceSelector,
}

impl AlignmentCycle {
    /// Bind the configured sessions, in priority order, to their venues.
    ///
    /// Fails when quote currencies are missing or a preferred session has
    /// no venue.
    pub fn new(
        config: AlignmentConfig,
        sessions: &HashMap<String, Arc<dyn VenueSession>>,
    ) -> Result<Self> {
        let quote_currencies = config
            .quote_currencies
            .clone()
            .context("quote_currencies is not defined")?;

        let mut venues = Vec::with_capacity(config.sessions.len());
        let mut trackers = BTreeMap::new();
        for name in &config.sessions {
            let session = sessions.get(name).with_context(|| {
                format!("incorrect preferred session name: {name} is not defined")
            })?;
            venues.push((name.clone(), session.clone()));
            trackers.insert(name.clone(), OrderTracker::new(name.clone()));
        }

        let selector = VenuePriceSelector::new(quote_currencies, config.use_taker_order);

        Ok(Self {
            config,
            venues,
            trackers,
            selector,
        })
    }

    /// Identifier built from the sessions and target currencies.
    pub fn instance_id(&self) -> String {
        let currencies: Vec<&str> = self
            .config
            .expected_balances
            .keys()
            .map(String::as_str)
            .collect();
        format!(
            "{}{}{}",
            STRATEGY_ID,
            self.config.sessions.join("-"),
            currencies.join("-")
        )
    }

    /// Orders currently tracked on `venue`.
    pub fn open_orders(&self, venue: &str) -> Vec<Order> {
        self.trackers
            .get(venue)
            .map(OrderTracker::open_orders)
            .unwrap_or_default()
    }

    /// Run one full cycle.
    pub async fn run_once(&mut self) -> CycleReport {
        let (_shutdown_tx, shutdown) = watch::channel(false);
        self.run_until(&shutdown).await
    }

    /// Run one cycle, starting no further step once `shutdown` is true.
    ///
    /// Shutdown is checked before aggregation, before each currency and
    /// before each submission.
    pub async fn run_until(&mut self, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let span = info_span!("align", instance = %self.instance_id());
        self.run_cycle(shutdown).instrument(span).await
    }

    async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::new();

        self.cancel_open_orders(&mut report).await;

        if *shutdown.borrow() {
            return report.interrupt("aggregation");
        }

        let aggregated = match aggregate_balances(&self.venues).await {
            Ok(aggregated) => aggregated,
            Err(e) => {
                error!(error = %e, "Skipping cycle, balances unavailable");
                report.outcome = CycleOutcome::AggregationFailed;
                return report;
            }
        };

        for (currency, expected) in &self.config.expected_balances {
            if *shutdown.borrow() {
                return report.interrupt("selection");
            }

            let quantity = calculate_refill_quantity(&aggregated.total, currency, *expected);
            report
                .balances
                .insert(currency.clone(), aggregated.total.net(currency));

            if quantity.is_zero() {
                debug!(%currency, %expected, "Balance aligned");
                report.skipped.push(currency.clone());
                continue;
            }

            let Some(order) = self
                .selector
                .select(currency, quantity, &self.venues, &aggregated.per_venue)
                .await
            else {
                info!(%currency, %quantity, "No feasible order");
                report.skipped.push(currency.clone());
                continue;
            };

            info!(
                venue = %order.venue,
                symbol = %order.symbol,
                side = %order.side,
                quantity = %order.quantity,
                price = %order.price,
                dry_run = self.config.dry_run,
                "Placing order"
            );
            report.planned.push(order.clone());

            if self.config.dry_run {
                if self.config.dry_run_plan_all {
                    continue;
                }
                report.outcome = CycleOutcome::HaltedOnDryRun;
                return report;
            }

            let Some(session) = self.session(&order.venue) else {
                continue;
            };

            if *shutdown.borrow() {
                return report.interrupt("submission");
            }

            match session.submit_order(&order).await {
                Ok(created) => {
                    if let Some(tracker) = self.trackers.get_mut(&order.venue) {
                        tracker.record_open(created.clone());
                    }
                    report.submitted.push(created);
                }
                Err(e) => {
                    error!(venue = %order.venue, symbol = %order.symbol, error = %e, "Cannot place order");
                    report.submit_failures.push(SubmitFailure {
                        currency: currency.clone(),
                        venue: order.venue.clone(),
                        error: e.to_string(),
                    });
                    if self.config.stop_on_submit_error {
                        report.outcome = CycleOutcome::HaltedOnSubmitError;
                        return report;
                    }
                }
            }
        }

        report
    }

    /// Best-effort cancel on every venue; a failure never blocks the rest.
    async fn cancel_open_orders(&mut self, report: &mut CycleReport) {
        for (name, session) in &self.venues {
            let Some(tracker) = self.trackers.get_mut(name) else {
                continue;
            };
            match tracker.cancel_all_open(session.as_ref()).await {
                Ok(closed) => report.cancelled += closed,
                Err(e) => {
                    warn!(venue = %name, error = %e, "Cannot cancel orders");
                    report.cancel_failures.push(name.clone());
                }
            }
        }
    }

    fn session(&self, venue: &str) -> Option<Arc<dyn VenueSession>> {
        self.venues
            .iter()
            .find(|(name, _)| name == venue)
            .map(|(_, session)| session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuoteCurrencyPreference;
    use crate::exchange::{
        Balance, Market, MockVenueSession, OrderSide, OrderStatus, PaperVenue, Ticker, VenueError,
    };
    use rust_decimal_macros::dec;

    fn market(base: &str, quote: &str, tick: Decimal, min_notional: Decimal) -> Market {
        Market {
            symbol: format!("{base}{quote}"),
            base_currency: base.to_string(),
            quote_currency: quote.to_string(),
            tick_size: tick,
            price_precision: 2,
            volume_precision: 6,
            min_notional,
            min_quantity: Decimal::ZERO,
        }
    }

    fn alignment(sessions: &[&str], targets: &[(&str, Decimal)]) -> AlignmentConfig {
        AlignmentConfig {
            sessions: sessions.iter().map(|s| s.to_string()).collect(),
            quote_currencies: Some(QuoteCurrencyPreference {
                buy: vec!["USDT".to_string()],
                sell: vec!["USDT".to_string()],
            }),
            expected_balances: targets
                .iter()
                .map(|(currency, target)| (currency.to_string(), *target))
                .collect(),
            ..Default::default()
        }
    }

    /// Venue with BTC, ETH and XRP markets against USDT.
    fn paper(name: &str) -> PaperVenue {
        PaperVenue::new(name)
            .with_market(market("BTC", "USDT", dec!(1), dec!(10)))
            .with_market(market("ETH", "USDT", dec!(0.01), dec!(10)))
            .with_market(market("XRP", "USDT", dec!(0.01), dec!(30)))
            .with_ticker("BTCUSDT", Ticker::new(dec!(29999), dec!(30001)))
            .with_ticker("ETHUSDT", Ticker::new(dec!(1999), dec!(2001)))
            .with_ticker("XRPUSDT", Ticker::new(dec!(0.48), dec!(0.51)))
    }

    fn sessions(venues: &[Arc<PaperVenue>]) -> HashMap<String, Arc<dyn VenueSession>> {
        venues
            .iter()
            .map(|v| (v.name().to_string(), v.clone() as Arc<dyn VenueSession>))
            .collect()
    }

    #[test]
    fn test_unknown_session_fails_construction() {
        let venues = [Arc::new(paper("a"))];
        let result = AlignmentCycle::new(alignment(&["a", "b"], &[]), &sessions(&venues));
        let err = result.err().unwrap();
        assert!(err.to_string().contains("b is not defined"));
    }

    #[test]
    fn test_missing_quote_currencies_fails_construction() {
        let venues = [Arc::new(paper("a"))];
        let mut config = alignment(&["a"], &[]);
        config.quote_currencies = None;
        assert!(AlignmentCycle::new(config, &sessions(&venues)).is_err());
    }

    #[test]
    fn test_instance_id() {
        let venues = [Arc::new(paper("a")), Arc::new(paper("b"))];
        let cycle = AlignmentCycle::new(
            alignment(&["a", "b"], &[("ETH", dec!(1)), ("BTC", dec!(1))]),
            &sessions(&venues),
        )
        .unwrap();
        assert_eq!(cycle.instance_id(), "xaligna-bBTC-ETH");
    }

    #[tokio::test]
    async fn test_places_buy_and_tracks_order() {
        let a = Arc::new(
            paper("a")
                .with_balance("BTC", Balance::new(dec!(0.4), dec!(0)))
                .with_balance("USDT", Balance::new(dec!(20000), dec!(0))),
        );
        let mut cycle = AlignmentCycle::new(
            alignment(&["a"], &[("BTC", dec!(1.0)), ("ETH", dec!(0))]),
            &sessions(&[a.clone()]),
        )
        .unwrap();

        let report = cycle.run_once().await;

        assert_eq!(report.outcome, CycleOutcome::Completed);
        assert_eq!(report.submitted.len(), 1);
        let order = &report.submitted[0];
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.quantity, dec!(0.6));
        assert_eq!(order.price, dec!(30000));
        assert_eq!(report.skipped, vec!["ETH".to_string()]);
        assert_eq!(report.balances["BTC"], dec!(0.4));
        assert_eq!(cycle.open_orders("a").len(), 1);
        assert_eq!(a.open_orders().await.len(), 1);
    }

    #[tokio::test]
    async fn test_aligned_currency_places_nothing() {
        let a = Arc::new(paper("a").with_balance("ETH", Balance::new(dec!(1.5), dec!(0.5))));
        let mut cycle =
            AlignmentCycle::new(alignment(&["a"], &[("ETH", dec!(2.0))]), &sessions(&[a.clone()]))
                .unwrap();

        let report = cycle.run_once().await;

        assert!(report.planned.is_empty());
        assert_eq!(report.skipped, vec!["ETH".to_string()]);
        assert!(a.open_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_dust_sell_places_nothing() {
        let a = Arc::new(paper("a").with_balance("XRP", Balance::new(dec!(50), dec!(0))));
        let mut cycle =
            AlignmentCycle::new(alignment(&["a"], &[("XRP", dec!(0))]), &sessions(&[a.clone()]))
                .unwrap();

        let report = cycle.run_once().await;

        assert_eq!(report.outcome, CycleOutcome::Completed);
        assert!(report.planned.is_empty());
        assert_eq!(report.skipped, vec!["XRP".to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_failure_skips_all_currencies() {
        let venues = [
            Arc::new(paper("a").with_balance("USDT", Balance::new(dec!(100000), dec!(0)))),
            Arc::new(paper("b")),
            Arc::new(paper("c")),
        ];
        venues[2].set_refresh_failure(true);
        let mut cycle = AlignmentCycle::new(
            alignment(&["a", "b", "c"], &[("BTC", dec!(1))]),
            &sessions(&venues),
        )
        .unwrap();

        let report = cycle.run_once().await;

        assert_eq!(report.outcome, CycleOutcome::AggregationFailed);
        assert!(report.planned.is_empty());
        assert!(report.balances.is_empty());
        assert!(venues[0].open_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_stops_after_first_plan() {
        let a = Arc::new(paper("a").with_balance("USDT", Balance::new(dec!(100000), dec!(0))));
        let mut config = alignment(&["a"], &[("BTC", dec!(1)), ("ETH", dec!(1))]);
        config.dry_run = true;
        let mut cycle = AlignmentCycle::new(config, &sessions(&[a.clone()])).unwrap();

        let report = cycle.run_once().await;

        assert_eq!(report.outcome, CycleOutcome::HaltedOnDryRun);
        assert_eq!(report.planned.len(), 1);
        assert_eq!(report.planned[0].symbol, "BTCUSDT");
        assert!(report.submitted.is_empty());
        assert!(a.open_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_plan_all_logs_every_plan() {
        let a = Arc::new(paper("a").with_balance("USDT", Balance::new(dec!(100000), dec!(0))));
        let mut config = alignment(&["a"], &[("BTC", dec!(1)), ("ETH", dec!(1))]);
        config.dry_run = true;
        config.dry_run_plan_all = true;
        let mut cycle = AlignmentCycle::new(config, &sessions(&[a.clone()])).unwrap();

        let report = cycle.run_once().await;

        assert_eq!(report.outcome, CycleOutcome::Completed);
        let symbols: Vec<&str> = report.planned.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);
        assert!(report.submitted.is_empty());
        assert!(a.open_orders().await.is_empty());
    }

    /// Mock quoting BTC and ETH against USDT; refresh and submit left to the test.
    fn quoting_session() -> MockVenueSession {
        let mut session = MockVenueSession::new();
        session.expect_balances().returning(|| {
            let mut balances = crate::exchange::BalanceMap::new();
            balances.insert("USDT", Balance::new(dec!(100000), dec!(0)));
            balances
        });
        session
            .expect_market()
            .returning(|symbol| match symbol {
                "BTCUSDT" => Some(market("BTC", "USDT", dec!(1), dec!(10))),
                "ETHUSDT" => Some(market("ETH", "USDT", dec!(0.01), dec!(10))),
                _ => None,
            });
        session
            .expect_query_ticker()
            .returning(|_| Ok(Ticker::new(dec!(100), dec!(102))));
        session
    }

    fn rejecting_session() -> MockVenueSession {
        let mut session = quoting_session();
        session.expect_refresh_account().returning(|| Ok(()));
        session
    }

    fn accepted(order: &SubmitOrder, id: u64) -> Order {
        Order {
            id,
            venue: order.venue.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.order_type,
            quantity: order.quantity,
            price: order.price,
            status: OrderStatus::New,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_shutdown_during_refresh_plans_nothing() {
        let (tx, rx) = watch::channel(false);
        let mut session = quoting_session();
        session.expect_refresh_account().times(1).returning(move || {
            tx.send(true).unwrap();
            Ok(())
        });
        session.expect_submit_order().never();
        let mut map: HashMap<String, Arc<dyn VenueSession>> = HashMap::new();
        map.insert("a".to_string(), Arc::new(session));

        let mut cycle =
            AlignmentCycle::new(alignment(&["a"], &[("BTC", dec!(1)), ("ETH", dec!(1))]), &map)
                .unwrap();
        let report = cycle.run_until(&rx).await;

        assert_eq!(report.outcome, CycleOutcome::Interrupted);
        assert!(report.planned.is_empty());
        assert!(report.submitted.is_empty());
        assert!(report.balances.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_during_submit_skips_remaining_currencies() {
        let (tx, rx) = watch::channel(false);
        let mut session = rejecting_session();
        session.expect_submit_order().times(1).returning(move |order| {
            tx.send(true).unwrap();
            Ok(accepted(order, 1))
        });
        let mut map: HashMap<String, Arc<dyn VenueSession>> = HashMap::new();
        map.insert("a".to_string(), Arc::new(session));

        let mut cycle =
            AlignmentCycle::new(alignment(&["a"], &[("BTC", dec!(1)), ("ETH", dec!(1))]), &map)
                .unwrap();
        let report = cycle.run_until(&rx).await;

        assert_eq!(report.outcome, CycleOutcome::Interrupted);
        assert_eq!(report.submitted.len(), 1);
        assert_eq!(report.submitted[0].symbol, "BTCUSDT");
        assert_eq!(cycle.open_orders("a").len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_already_set_stops_before_aggregation() {
        let a = Arc::new(paper("a").with_balance("USDT", Balance::new(dec!(100000), dec!(0))));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let mut cycle =
            AlignmentCycle::new(alignment(&["a"], &[("BTC", dec!(1))]), &sessions(&[a.clone()]))
                .unwrap();

        let report = cycle.run_until(&rx).await;

        assert_eq!(report.outcome, CycleOutcome::Interrupted);
        assert!(report.planned.is_empty());
        assert!(a.open_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_error_halts_cycle_by_default() {
        let mut session = rejecting_session();
        session
            .expect_submit_order()
            .times(1)
            .returning(|_| Err(VenueError::rejected("a", "maintenance")));
        let mut map: HashMap<String, Arc<dyn VenueSession>> = HashMap::new();
        map.insert("a".to_string(), Arc::new(session));

        let mut cycle =
            AlignmentCycle::new(alignment(&["a"], &[("BTC", dec!(1)), ("ETH", dec!(1))]), &map)
                .unwrap();
        let report = cycle.run_once().await;

        assert_eq!(report.outcome, CycleOutcome::HaltedOnSubmitError);
        assert_eq!(report.planned.len(), 1);
        assert_eq!(report.submit_failures.len(), 1);
        assert_eq!(report.submit_failures[0].currency, "BTC");
    }

    #[tokio::test]
    async fn test_submit_error_continues_when_configured() {
        let mut session = rejecting_session();
        session
            .expect_submit_order()
            .times(2)
            .returning(|_| Err(VenueError::rejected("a", "maintenance")));
        let mut map: HashMap<String, Arc<dyn VenueSession>> = HashMap::new();
        map.insert("a".to_string(), Arc::new(session));

        let mut config = alignment(&["a"], &[("BTC", dec!(1)), ("ETH", dec!(1))]);
        config.stop_on_submit_error = false;
        let mut cycle = AlignmentCycle::new(config, &map).unwrap();
        let report = cycle.run_once().await;

        assert_eq!(report.outcome, CycleOutcome::Completed);
        assert_eq!(report.planned.len(), 2);
        assert_eq!(report.submit_failures.len(), 2);
        assert!(cycle.open_orders("a").is_empty());
    }

    #[tokio::test]
    async fn test_cancel_failure_does_not_block_cycle() {
        let mut session = rejecting_session();
        session
            .expect_submit_order()
            .times(2)
            .returning(|order| Ok(accepted(order, 1)));
        session
            .expect_cancel_orders()
            .times(1)
            .returning(|_| Err(VenueError::request("a", "timeout")));
        let mut map: HashMap<String, Arc<dyn VenueSession>> = HashMap::new();
        map.insert("a".to_string(), Arc::new(session));

        let mut cycle = AlignmentCycle::new(alignment(&["a"], &[("BTC", dec!(1))]), &map).unwrap();
        let first = cycle.run_once().await;
        assert_eq!(first.submitted.len(), 1);
        assert_eq!(cycle.open_orders("a").len(), 1);

        let second = cycle.run_once().await;

        assert_eq!(second.cancel_failures, vec!["a".to_string()]);
        assert_eq!(second.outcome, CycleOutcome::Completed);
        assert_eq!(second.submitted.len(), 1);
    }

    #[tokio::test]
    async fn test_second_cycle_repeats_unresolved_order() {
        let a = Arc::new(
            paper("a")
                .with_balance("BTC", Balance::new(dec!(0.4), dec!(0)))
                .with_balance("USDT", Balance::new(dec!(20000), dec!(0))),
        );
        let mut cycle =
            AlignmentCycle::new(alignment(&["a"], &[("BTC", dec!(1))]), &sessions(&[a.clone()]))
                .unwrap();

        let first = cycle.run_once().await;
        let second = cycle.run_once().await;

        // The resting buy is cancelled and re-placed identically
        assert_eq!(second.cancelled, 1);
        assert_eq!(first.planned, second.planned);
        assert_eq!(a.open_orders().await.len(), 1);
        assert_eq!(cycle.open_orders("a").len(), 1);
    }

    #[tokio::test]
    async fn test_second_cycle_reprices_after_ticker_moves() {
        let a = Arc::new(
            paper("a")
                .with_balance("BTC", Balance::new(dec!(0.4), dec!(0)))
                .with_balance("USDT", Balance::new(dec!(20000), dec!(0))),
        );
        let mut cycle =
            AlignmentCycle::new(alignment(&["a"], &[("BTC", dec!(1))]), &sessions(&[a.clone()]))
                .unwrap();

        let first = cycle.run_once().await;
        assert_eq!(first.submitted[0].price, dec!(30000));

        a.set_ticker("BTCUSDT", Ticker::new(dec!(28999), dec!(29001)))
            .await;
        let second = cycle.run_once().await;

        assert_eq!(second.cancelled, 1);
        assert_eq!(second.submitted.len(), 1);
        assert_eq!(second.submitted[0].price, dec!(29000));
        let open = a.open_orders().await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].price, dec!(29000));
    }

    #[tokio::test]
    async fn test_second_cycle_after_fill_places_nothing() {
        let a = Arc::new(
            paper("a")
                .with_balance("BTC", Balance::new(dec!(0.4), dec!(0)))
                .with_balance("USDT", Balance::new(dec!(20000), dec!(0))),
        );
        let mut cycle =
            AlignmentCycle::new(alignment(&["a"], &[("BTC", dec!(1))]), &sessions(&[a.clone()]))
                .unwrap();

        let first = cycle.run_once().await;
        a.fill_order(first.submitted[0].id).await.unwrap();

        let second = cycle.run_once().await;

        assert!(second.planned.is_empty());
        assert_eq!(second.balances["BTC"], dec!(1.0));
        assert!(cycle.open_orders("a").is_empty());
    }
}
