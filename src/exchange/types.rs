//! Venue-agnostic account, market and order types.

use crate::utils::round_up_to_precision;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Balance of a single currency on a single venue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub available: Decimal,
    #[serde(default)]
    pub locked: Decimal,
    /// Margin loan outstanding (zero for spot accounts)
    #[serde(default)]
    pub borrowed: Decimal,
    /// Accrued margin interest (zero for spot accounts)
    #[serde(default)]
    pub interest: Decimal,
}

impl Balance {
    /// Spot balance with nothing borrowed.
    pub fn new(available: Decimal, locked: Decimal) -> Self {
        Self {
            available,
            locked,
            ..Default::default()
        }
    }

    /// Funds held on the venue, free or reserved by open orders.
    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }

    /// Net holding after margin liabilities.
    pub fn net(&self) -> Decimal {
        self.total() - self.borrowed - self.interest
    }

    fn add(&self, other: &Balance) -> Balance {
        Balance {
            available: self.available + other.available,
            locked: self.locked + other.locked,
            borrowed: self.borrowed + other.borrowed,
            interest: self.interest + other.interest,
        }
    }
}

/// Balances keyed by currency, iterated in currency order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceMap(BTreeMap<String, Balance>);

impl BalanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, currency: &str) -> Option<&Balance> {
        self.0.get(currency)
    }

    pub fn insert(&mut self, currency: impl Into<String>, balance: Balance) {
        self.0.insert(currency.into(), balance);
    }

    /// Net balance of a currency, zero when the currency is absent.
    pub fn net(&self, currency: &str) -> Decimal {
        self.0.get(currency).map(Balance::net).unwrap_or(Decimal::ZERO)
    }

    /// Sum another map into this one, field by field per currency.
    pub fn add(&mut self, other: &BalanceMap) {
        for (currency, balance) in &other.0 {
            let entry = self.0.entry(currency.clone()).or_default();
            *entry = entry.add(balance);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Balance)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Balance)> for BalanceMap {
    fn from_iter<I: IntoIterator<Item = (String, Balance)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Trading rules of one market on one venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub symbol: String,
    pub base_currency: String,
    pub quote_currency: String,
    /// Minimum price increment
    pub tick_size: Decimal,
    /// Decimal places for quote amounts
    pub price_precision: u32,
    /// Decimal places for base quantities
    pub volume_precision: u32,
    /// Minimum order value (quantity * price)
    #[serde(default)]
    pub min_notional: Decimal,
    /// Minimum order quantity
    #[serde(default)]
    pub min_quantity: Decimal,
}

impl Market {
    /// Raise `quantity` so the order value reaches the minimum notional.
    ///
    /// Scaled quantities are rounded up to the volume precision so the
    /// result never drops back below the minimum.
    pub fn adjust_quantity_by_min_notional(&self, quantity: Decimal, price: Decimal) -> Decimal {
        let amount = quantity * price;
        if amount.is_zero() || amount >= self.min_notional {
            return quantity;
        }

        let ratio = self.min_notional / amount;
        round_up_to_precision(quantity * ratio, self.volume_precision)
    }

    /// Whether an order is too small to be worth placing.
    pub fn is_dust_quantity(&self, quantity: Decimal, price: Decimal) -> bool {
        quantity <= self.min_quantity || quantity * price < self.min_notional
    }
}

/// Best bid/ask snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub bid: Decimal,
    pub ask: Decimal,
}

impl Ticker {
    pub fn new(bid: Decimal, ask: Decimal) -> Self {
        Self { bid, ask }
    }

    /// Both sides quoted with positive prices.
    pub fn is_valid(&self) -> bool {
        self.bid > Decimal::ZERO && self.ask > Decimal::ZERO
    }
}

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
}

/// Time in force for limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    Gtc, // Good Till Cancel
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

impl OrderStatus {
    /// No further fills or cancels can happen.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }
}

/// A corrective order chosen for one currency, not yet sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOrder {
    pub venue: String,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Decimal,
    pub time_in_force: TimeInForce,
    #[serde(skip)]
    pub market: Market,
}

impl SubmitOrder {
    /// Limit GTC order, the only kind the aligner places.
    pub fn limit(
        venue: impl Into<String>,
        market: &Market,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            venue: venue.into(),
            symbol: market.symbol.clone(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price,
            time_in_force: TimeInForce::Gtc,
            market: market.clone(),
        }
    }

    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// An order acknowledged by a venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: u64,
    pub venue: String,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
