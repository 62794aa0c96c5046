// Technical indicators module

pub mod regression;

pub use regression::calculate_slope;
