use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::StrategyConfig;
use crate::engine::position::{AccountState, PositionState};
use crate::indicators::calculate_slope;
use crate::market::MarketState;
use crate::models::{MarketEvent, Side};
use crate::risk::RateLimiter;

/// A rate-limit-admitted order attempt, to be carried out by the execution
/// worker. At most one is produced per qualifying market event.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub side: Side,
    pub instrument: String,
    pub quantity: f64,
}

/// Owns all mutable strategy state for one instrument
///
/// The controller is synchronous and never performs I/O: the event loop owns
/// it and feeds it one event at a time, which serializes every mutation of
/// the market, position, and rate-limiter state. Decisions come back as
/// `OrderIntent`s for the caller to dispatch off the market-data path.
pub struct StrategyController {
    config: StrategyConfig,
    market: MarketState,
    account: AccountState,
    limiter: Arc<Mutex<RateLimiter>>,
}

impl StrategyController {
    pub fn new(config: StrategyConfig, limiter: Arc<Mutex<RateLimiter>>) -> Self {
        let market = MarketState::new(config.window_size);
        let account = AccountState::new(config.capital);
        Self {
            config,
            market,
            account,
            limiter,
        }
    }

    /// Process one inbound event; events for other instruments are ignored
    /// without touching any state
    pub fn on_event(&mut self, event: &MarketEvent) -> Option<OrderIntent> {
        if event.instrument() != self.config.instrument {
            return None;
        }

        match event {
            MarketEvent::Trade {
                price, quantity, ..
            } => self.on_trade_update(*price, *quantity),
            MarketEvent::Book {
                side,
                price,
                quantity,
                ..
            } => self.on_orderbook_update(*side, *price, *quantity),
            MarketEvent::Account {
                side,
                quantity,
                capital_remaining,
                ..
            } => {
                self.on_account_update(*side, *quantity, *capital_remaining);
                None
            }
        }
    }

    fn on_trade_update(&mut self, price: f64, quantity: f64) -> Option<OrderIntent> {
        tracing::debug!(price, quantity, "Trade update");
        self.market.update_from_trade(price);
        self.evaluate()
    }

    fn on_orderbook_update(&mut self, side: Side, price: f64, quantity: f64) -> Option<OrderIntent> {
        // Only a delta that leaves the book two-sided yields a midpoint
        // sample; anything else is a non-qualifying update
        let mid = self.market.update_from_book(side, price, quantity)?;
        tracing::debug!(?side, price, quantity, mid, "Book update");
        self.evaluate()
    }

    fn on_account_update(&mut self, side: Side, quantity: f64, capital_remaining: f64) {
        self.account.apply_fill(side, quantity, capital_remaining);
        tracing::info!(
            ?side,
            quantity,
            capital = self.account.capital(),
            position_size = self.account.position_size(),
            "Account update applied"
        );
    }

    /// Recompute the signal and apply the entry/exit policy
    fn evaluate(&mut self) -> Option<OrderIntent> {
        if self.market.history().len() < self.config.window_size {
            return None;
        }

        let prices = self.market.history().snapshot();
        let slope = calculate_slope(&prices);
        let current_price = self.market.history().latest()?;
        tracing::debug!(slope, current_price, "Regression slope");

        let intent = match self.account.position() {
            PositionState::Flat if slope > self.config.entry_threshold => {
                let investment = self.account.capital() * self.config.max_position_fraction;
                OrderIntent {
                    side: Side::Buy,
                    instrument: self.config.instrument.clone(),
                    quantity: investment / current_price,
                }
            }
            PositionState::Long if slope < self.config.exit_threshold => OrderIntent {
                side: Side::Sell,
                instrument: self.config.instrument.clone(),
                quantity: self.account.position_size(),
            },
            _ => return None,
        };

        if !self.limiter.lock().unwrap().try_admit(Instant::now()) {
            tracing::warn!(
                side = ?intent.side,
                quantity = intent.quantity,
                "Rate limit exceeded, dropping order attempt"
            );
            return None;
        }

        tracing::info!(
            side = ?intent.side,
            quantity = intent.quantity,
            price = current_price,
            slope,
            "Order attempt admitted"
        );
        Some(intent)
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }
}
