// Core modules
pub mod config;
pub mod engine;
pub mod feed;
pub mod gateway;
pub mod indicators;
pub mod market;
pub mod models;
pub mod risk;

// Re-export commonly used types
pub use config::StrategyConfig;
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
