// Synthetic market-data feed for the demo binary and tests
pub mod synthetic;

pub use synthetic::{MarketScenario, SyntheticFeed};
