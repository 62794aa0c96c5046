use crate::models::Side;

/// Directional state of the book. This strategy only ever holds long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
}

/// Position and capital as driven by account-update feedback
///
/// Capital is overwritten by each fill's reported remainder, never
/// delta-accumulated; the venue's number is authoritative. Flat always
/// implies a zero position size.
#[derive(Debug, Clone)]
pub struct AccountState {
    position: PositionState,
    position_size: f64,
    capital: f64,
}

impl AccountState {
    pub fn new(capital: f64) -> Self {
        Self {
            position: PositionState::Flat,
            position_size: 0.0,
            capital,
        }
    }

    /// Apply an executed fill reported through the account-update channel
    ///
    /// No validation against the order that was placed; event ordering is
    /// the feed's responsibility.
    pub fn apply_fill(&mut self, side: Side, quantity: f64, capital_remaining: f64) {
        self.capital = capital_remaining;

        match side {
            Side::Buy => {
                self.position_size += quantity;
                self.position = PositionState::Long;
            }
            Side::Sell => {
                self.position_size -= quantity;
                if self.position_size <= 0.0 {
                    // Clamp so Flat always means exactly zero
                    self.position_size = 0.0;
                    self.position = PositionState::Flat;
                }
            }
        }
    }

    pub fn position(&self) -> PositionState {
        self.position
    }

    pub fn position_size(&self) -> f64 {
        self.position_size
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }
}
