// Strategy engine: decision policy, position state, serialized event loop
pub mod controller;
pub mod position;
pub mod runner;

pub use controller::{OrderIntent, StrategyController};
pub use position::{AccountState, PositionState};
pub use runner::run_event_loop;
