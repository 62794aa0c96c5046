use std::sync::{Arc, RwLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use crate::models::{MarketEvent, Side};

/// Market scenario types for synthetic event generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with noise
    Uptrend,
    /// Steady downtrend with noise
    Downtrend,
    /// Mean-reverting chop around the base price
    Sideways,
}

impl std::str::FromStr for MarketScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uptrend" => Ok(Self::Uptrend),
            "downtrend" => Ok(Self::Downtrend),
            "sideways" => Ok(Self::Sideways),
            other => Err(format!("unknown scenario '{other}'")),
        }
    }
}

/// Generates a seeded stream of trade prints and book deltas
///
/// Book deltas clear the previous top level with a zero-quantity update
/// before posting the new one, the way a delta feed reports a replaced
/// level, so the tracker's clear path gets exercised too.
pub struct SyntheticFeed {
    rng: StdRng,
    instrument: String,
    base_price: f64,
    price: f64,
    last_bid: Option<f64>,
    last_ask: Option<f64>,
}

impl SyntheticFeed {
    /// Create a new feed with a seed for reproducibility
    pub fn new(instrument: impl Into<String>, seed: u64, base_price: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            instrument: instrument.into(),
            base_price,
            price: base_price,
            last_bid: None,
            last_ask: None,
        }
    }

    /// Generate the next batch of events for one price step
    fn step(&mut self, scenario: MarketScenario) -> Vec<MarketEvent> {
        let drift = match scenario {
            MarketScenario::Uptrend => self.price * 0.001,
            MarketScenario::Downtrend => self.price * -0.001,
            MarketScenario::Sideways => (self.base_price - self.price) * 0.1,
        };
        let noise = self.price * self.rng.gen_range(-0.0002..0.0002);
        self.price += drift + noise;

        let mut events = Vec::with_capacity(6);

        let trade_side = if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };
        let trade_quantity = self.rng.gen_range(0.01..1.0);
        events.push(MarketEvent::trade(
            &self.instrument,
            trade_side,
            self.price,
            trade_quantity,
        ));

        // Replace the top of book around the new price
        let half_spread = self.price * 0.0001;
        let bid = self.price - half_spread;
        let ask = self.price + half_spread;

        if let Some(old_bid) = self.last_bid {
            events.push(MarketEvent::book(&self.instrument, Side::Buy, old_bid, 0.0));
        }
        events.push(MarketEvent::book(
            &self.instrument,
            Side::Buy,
            bid,
            self.rng.gen_range(0.5..5.0),
        ));
        if let Some(old_ask) = self.last_ask {
            events.push(MarketEvent::book(&self.instrument, Side::Sell, old_ask, 0.0));
        }
        events.push(MarketEvent::book(
            &self.instrument,
            Side::Sell,
            ask,
            self.rng.gen_range(0.5..5.0),
        ));

        self.last_bid = Some(bid);
        self.last_ask = Some(ask);
        events
    }

    /// Generate a fixed number of price steps' worth of events
    pub fn generate(&mut self, scenario: MarketScenario, num_steps: usize) -> Vec<MarketEvent> {
        let mut events = Vec::new();
        for _ in 0..num_steps {
            events.extend(self.step(scenario));
        }
        events
    }

    /// Stream events into the engine's channel, keeping the shared mark
    /// price in step with the trade tape
    pub async fn stream(
        mut self,
        scenario: MarketScenario,
        num_steps: usize,
        tx: mpsc::Sender<MarketEvent>,
        mark: Arc<RwLock<f64>>,
        step_interval: Duration,
    ) {
        for _ in 0..num_steps {
            for event in self.step(scenario) {
                if let MarketEvent::Trade { price, .. } = event {
                    *mark.write().unwrap() = price;
                }
                if tx.send(event).await.is_err() {
                    tracing::info!("Engine channel closed, feed stopping");
                    return;
                }
            }
            sleep(step_interval).await;
        }
        tracing::info!("Synthetic feed complete: {} steps", num_steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_trade_price(events: &[MarketEvent]) -> f64 {
        events
            .iter()
            .rev()
            .find_map(|e| match e {
                MarketEvent::Trade { price, .. } => Some(*price),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_uptrend_ends_higher() {
        let mut feed = SyntheticFeed::new("BTC-USD", 42, 50_000.0);
        let events = feed.generate(MarketScenario::Uptrend, 200);

        assert!(last_trade_price(&events) > 50_000.0);
    }

    #[test]
    fn test_downtrend_ends_lower() {
        let mut feed = SyntheticFeed::new("BTC-USD", 42, 50_000.0);
        let events = feed.generate(MarketScenario::Downtrend, 200);

        assert!(last_trade_price(&events) < 50_000.0);
    }

    #[test]
    fn test_sideways_stays_near_base() {
        let mut feed = SyntheticFeed::new("BTC-USD", 42, 50_000.0);
        let events = feed.generate(MarketScenario::Sideways, 200);

        let last = last_trade_price(&events);
        assert!(last > 45_000.0 && last < 55_000.0, "drifted to {last}");
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let mut a = SyntheticFeed::new("BTC-USD", 7, 50_000.0);
        let mut b = SyntheticFeed::new("BTC-USD", 7, 50_000.0);

        let pa = last_trade_price(&a.generate(MarketScenario::Uptrend, 50));
        let pb = last_trade_price(&b.generate(MarketScenario::Uptrend, 50));
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_book_levels_are_cleared_before_replacement() {
        let mut feed = SyntheticFeed::new("BTC-USD", 42, 50_000.0);
        let events = feed.generate(MarketScenario::Uptrend, 2);

        // Second step must clear the first step's bid with a zero-quantity delta
        let clears = events
            .iter()
            .filter(|e| matches!(e, MarketEvent::Book { quantity, .. } if *quantity == 0.0))
            .count();
        assert_eq!(clears, 2); // one bid clear, one ask clear
    }

    #[test]
    fn test_stream_delivers_events_and_tracks_mark() {
        let feed = SyntheticFeed::new("BTC-USD", 42, 50_000.0);
        let (tx, mut rx) = mpsc::channel(1024);
        let mark = Arc::new(RwLock::new(50_000.0));

        tokio_test::block_on(feed.stream(
            MarketScenario::Uptrend,
            10,
            tx,
            mark.clone(),
            Duration::from_millis(0),
        ));

        let mut trades = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, MarketEvent::Trade { .. }) {
                trades += 1;
            }
        }
        assert_eq!(trades, 10);

        // Mark tracks the last trade of an uptrend tape
        assert!(*mark.read().unwrap() > 50_000.0);
    }

    #[test]
    fn test_scenario_parsing() {
        assert_eq!(
            "uptrend".parse::<MarketScenario>().unwrap(),
            MarketScenario::Uptrend
        );
        assert!("garbage".parse::<MarketScenario>().is_err());
    }
}
