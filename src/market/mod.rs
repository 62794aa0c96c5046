use std::collections::VecDeque;

use crate::models::Side;

/// Bounded FIFO of recent price samples
///
/// Holds up to 2x the signal window so the regression always has headroom
/// over the minimum sample count. Oldest sample is evicted once full.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl PriceHistory {
    /// Create a history sized for the given signal window
    pub fn for_window(window_size: usize) -> Self {
        let capacity = window_size * 2;
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest if over capacity
    pub fn push(&mut self, price: f64) {
        self.samples.push_back(price);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Samples in arrival order
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

/// Top-of-book tracker
///
/// `None` means the level is unset (no resting order known on that side).
/// `best_bid < best_ask` is expected when both are set but not enforced;
/// crossed feeds are the venue's problem, not ours.
#[derive(Debug, Clone, Default)]
pub struct BookState {
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
}

impl BookState {
    /// Apply a book delta
    ///
    /// A zero-quantity update at a price equal to the tracked level on that
    /// side clears the level. Otherwise the bid only improves upward and the
    /// ask only improves downward.
    pub fn apply(&mut self, side: Side, price: f64, quantity: f64) {
        match side {
            Side::Buy => {
                if quantity == 0.0 && self.best_bid == Some(price) {
                    self.best_bid = None;
                } else if self.best_bid.map_or(true, |bid| price > bid) {
                    self.best_bid = Some(price);
                }
            }
            Side::Sell => {
                if quantity == 0.0 && self.best_ask == Some(price) {
                    self.best_ask = None;
                } else if self.best_ask.map_or(true, |ask| price < ask) {
                    self.best_ask = Some(price);
                }
            }
        }
    }

    /// Midpoint of the book, when both sides are set
    pub fn midpoint(&self) -> Option<f64> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            _ => None,
        }
    }
}

/// Price history plus top-of-book for one instrument
#[derive(Debug, Clone)]
pub struct MarketState {
    history: PriceHistory,
    book: BookState,
}

impl MarketState {
    pub fn new(window_size: usize) -> Self {
        Self {
            history: PriceHistory::for_window(window_size),
            book: BookState::default(),
        }
    }

    /// Record a trade print
    pub fn update_from_trade(&mut self, price: f64) {
        self.history.push(price);
    }

    /// Apply a book delta; when the book has both sides afterwards, the
    /// midpoint is appended to the price history and returned as the
    /// qualifying-update signal
    pub fn update_from_book(&mut self, side: Side, price: f64, quantity: f64) -> Option<f64> {
        self.book.apply(side, price, quantity);

        let mid = self.book.midpoint()?;
        self.history.push(mid);
        Some(mid)
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn book(&self) -> &BookState {
        &self.book
    }
}
