//! Venue, quote currency and price selection for a corrective order.
//!
//! Candidates are visited in operator priority order (venues first, then
//! quote currencies within a venue) and the first feasible one wins. There is
//! no cross-venue price comparison: priority lists already encode preferred
//! liquidity and fees.

use crate::config::QuoteCurrencyPreference;
use crate::exchange::{
    Balance, BalanceMap, Market, OrderSide, SubmitOrder, Ticker, VenueSession,
};
use crate::utils::round_up_to_precision;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of evaluating one (venue, quote currency) pair.
#[derive(Debug, Clone, PartialEq)]
enum Candidate {
    Feasible(SubmitOrder),
    /// Constraint not met; try the next pair
    Rejected(String),
    /// Correction too small to place anywhere this cycle
    Dust,
}

/// Limit price for a buy.
///
/// Taker crosses the spread at the ask. Maker improves the bid by one tick
/// unless that would reach the ask, in which case it joins the bid.
pub fn buy_price(ticker: &Ticker, tick_size: Decimal, taker: bool) -> Decimal {
    if taker {
        return ticker.ask;
    }
    let improved = ticker.bid + tick_size;
    if improved < ticker.ask {
        improved
    } else {
        ticker.bid
    }
}

/// Limit price for a sell; mirror image of [`buy_price`].
pub fn sell_price(ticker: &Ticker, tick_size: Decimal, taker: bool) -> Decimal {
    if taker {
        return ticker.bid;
    }
    let improved = ticker.ask - tick_size;
    if improved > ticker.bid {
        improved
    } else {
        ticker.ask
    }
}

fn evaluate_buy(
    venue: &str,
    market: &Market,
    ticker: &Ticker,
    quantity: Decimal,
    quote_balance: Option<&Balance>,
    taker: bool,
) -> Candidate {
    let Some(quote_balance) = quote_balance else {
        return Candidate::Rejected(format!("no {} balance", market.quote_currency));
    };

    let price = buy_price(ticker, market.tick_size, taker);
    let required = round_up_to_precision(quantity * price, market.price_precision);
    if required > quote_balance.available {
        return Candidate::Rejected(format!(
            "required quote amount {} exceeds available {}",
            required, quote_balance.available
        ));
    }

    let adjusted = market.adjust_quantity_by_min_notional(quantity, price);
    if adjusted != quantity {
        let required = round_up_to_precision(adjusted * price, market.price_precision);
        if required > quote_balance.available {
            return Candidate::Rejected(format!(
                "min notional quantity {} needs {} but only {} available",
                adjusted, required, quote_balance.available
            ));
        }
    }

    Candidate::Feasible(SubmitOrder::limit(
        venue,
        market,
        OrderSide::Buy,
        adjusted,
        price,
    ))
}

fn evaluate_sell(
    venue: &str,
    market: &Market,
    ticker: &Ticker,
    quantity: Decimal,
    base_balance: Option<&Balance>,
    taker: bool,
) -> Candidate {
    let Some(base_balance) = base_balance else {
        return Candidate::Rejected(format!("no {} balance", market.base_currency));
    };

    if quantity > base_balance.available {
        return Candidate::Rejected(format!(
            "required base amount {} exceeds available {}",
            quantity, base_balance.available
        ));
    }

    let price = sell_price(ticker, market.tick_size, taker);
    if market.is_dust_quantity(quantity, price) {
        return Candidate::Dust;
    }

    Candidate::Feasible(SubmitOrder::limit(
        venue,
        market,
        OrderSide::Sell,
        quantity,
        price,
    ))
}

/// Picks where and at what price to place a currency's corrective order.
#[derive(Debug, Clone)]
pub struct VenuePriceSelector {
    quote_currencies: QuoteCurrencyPreference,
    use_taker_order: bool,
}

impl VenuePriceSelector {
    pub fn new(quote_currencies: QuoteCurrencyPreference, use_taker_order: bool) -> Self {
        Self {
            quote_currencies,
            use_taker_order,
        }
    }

    /// Find the first feasible order for `quantity` of `currency`.
    ///
    /// `venues` must be in priority order and `balances` keyed by venue
    /// name. Returns `None` when no candidate is feasible, or as soon as a
    /// sell candidate turns out to be dust.
    pub async fn select(
        &self,
        currency: &str,
        quantity: Decimal,
        venues: &[(String, Arc<dyn VenueSession>)],
        balances: &BTreeMap<String, BalanceMap>,
    ) -> Option<SubmitOrder> {
        if quantity.is_zero() {
            return None;
        }

        let (side, quote_currencies) = if quantity > Decimal::ZERO {
            (OrderSide::Buy, &self.quote_currencies.buy)
        } else {
            (OrderSide::Sell, &self.quote_currencies.sell)
        };
        let quantity = quantity.abs();

        for (venue, session) in venues {
            let venue_balances = balances.get(venue);

            for quote_currency in quote_currencies {
                let symbol = format!("{currency}{quote_currency}");
                let Some(market) = session.market(&symbol) else {
                    continue;
                };

                let ticker = match session.query_ticker(&symbol).await {
                    Ok(ticker) if ticker.is_valid() => ticker,
                    Ok(ticker) => {
                        warn!(%venue, %symbol, bid = %ticker.bid, ask = %ticker.ask, "Ignoring ticker without two-sided prices");
                        continue;
                    }
                    Err(e) => {
                        error!(%venue, %symbol, error = %e, "Unable to query ticker");
                        continue;
                    }
                };

                let candidate = match side {
                    OrderSide::Buy => evaluate_buy(
                        venue,
                        &market,
                        &ticker,
                        quantity,
                        venue_balances.and_then(|b| b.get(quote_currency)),
                        self.use_taker_order,
                    ),
                    OrderSide::Sell => evaluate_sell(
                        venue,
                        &market,
                        &ticker,
                        quantity,
                        venue_balances.and_then(|b| b.get(currency)),
                        self.use_taker_order,
                    ),
                };

                match candidate {
                    Candidate::Feasible(order) => {
                        debug!(%venue, %symbol, side = %order.side, quantity = %order.quantity, price = %order.price, "Candidate selected");
                        return Some(order);
                    }
                    Candidate::Rejected(reason) => {
                        debug!(%venue, %symbol, %reason, "Candidate rejected");
                    }
                    Candidate::Dust => {
                        info!(%venue, %symbol, %currency, %quantity, "Dust quantity, no correction this cycle");
                        return None;
                    }
                }
            }
        }

        None
    }
}
