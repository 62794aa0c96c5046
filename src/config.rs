use serde::{Deserialize, Serialize};

use crate::Result;

/// Fixed construction-time configuration for one strategy instance
///
/// One controller is built per instrument; nothing here changes after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Venue instrument the strategy trades; events for anything else are ignored
    pub instrument: String,
    /// Seed capital, overwritten by account updates once trading starts
    pub capital: f64,
    /// Minimum samples before the slope signal is computed; the price history
    /// retains up to twice this many samples
    pub window_size: usize,
    /// Fraction of capital deployed on entry
    pub max_position_fraction: f64,
    /// Slope above which a flat book goes long
    pub entry_threshold: f64,
    /// Slope below which a long position is closed
    pub exit_threshold: f64,
    /// Cap on order submissions in any trailing 60-second window
    pub max_orders_per_minute: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            instrument: "BTC-USD".to_string(),
            capital: 100_000.0,
            window_size: 10,
            max_position_fraction: 0.5,  // 50% of capital per entry
            entry_threshold: 0.003,
            exit_threshold: -0.003,
            max_orders_per_minute: 30,
        }
    }
}

impl StrategyConfig {
    /// Build a config from `TRENDBOT_*` environment variables, falling back
    /// to defaults for anything unset or unparseable
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            instrument: env_var("TRENDBOT_INSTRUMENT").unwrap_or(defaults.instrument),
            capital: env_parse("TRENDBOT_CAPITAL").unwrap_or(defaults.capital),
            window_size: env_parse("TRENDBOT_WINDOW_SIZE").unwrap_or(defaults.window_size),
            max_position_fraction: env_parse("TRENDBOT_MAX_POSITION_FRACTION")
                .unwrap_or(defaults.max_position_fraction),
            entry_threshold: env_parse("TRENDBOT_ENTRY_THRESHOLD")
                .unwrap_or(defaults.entry_threshold),
            exit_threshold: env_parse("TRENDBOT_EXIT_THRESHOLD")
                .unwrap_or(defaults.exit_threshold),
            max_orders_per_minute: env_parse("TRENDBOT_MAX_ORDERS_PER_MINUTE")
                .unwrap_or(defaults.max_orders_per_minute),
        }
    }

    /// Reject configurations the strategy cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.instrument.is_empty() {
            return Err("instrument must not be empty".into());
        }
        if self.capital <= 0.0 {
            return Err(format!("capital must be positive, got {}", self.capital).into());
        }
        if self.window_size < 1 {
            return Err("window_size must be at least 1".into());
        }
        if self.max_position_fraction <= 0.0 || self.max_position_fraction > 1.0 {
            return Err(format!(
                "max_position_fraction must be in (0, 1], got {}",
                self.max_position_fraction
            )
            .into());
        }
        if self.max_orders_per_minute < 1 {
            return Err("max_orders_per_minute must be at least 1".into());
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
