use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// Order type: immediate market execution, or a resting limit
/// (optionally immediate-or-cancel)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum OrderType {
    Market,
    Limit {
        price: f64,
        immediate_or_cancel: bool,
    },
}

/// An order as handed to the gateway
///
/// Market orders have no broker identity; limit orders are identified by the
/// gateway-assigned `Uuid` returned from `submit_limit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: Side,
    pub instrument: String,
    pub quantity: f64,
    pub order_type: OrderType,
    pub created_at: DateTime<Utc>,
}

impl OrderRequest {
    pub fn market(side: Side, instrument: impl Into<String>, quantity: f64) -> Self {
        Self {
            side,
            instrument: instrument.into(),
            quantity,
            order_type: OrderType::Market,
            created_at: Utc::now(),
        }
    }

    pub fn limit(
        side: Side,
        instrument: impl Into<String>,
        quantity: f64,
        price: f64,
        immediate_or_cancel: bool,
    ) -> Self {
        Self {
            side,
            instrument: instrument.into(),
            quantity,
            order_type: OrderType::Limit {
                price,
                immediate_or_cancel,
            },
            created_at: Utc::now(),
        }
    }
}

/// Inbound event from the venue's feeds
///
/// The three variants are the entire mutation surface of the strategy state:
/// trade prints and book deltas drive the signal, account updates report
/// fills back asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    Trade {
        instrument: String,
        side: Side,
        price: f64,
        quantity: f64,
        timestamp: DateTime<Utc>,
    },
    Book {
        instrument: String,
        side: Side,
        price: f64,
        quantity: f64,
        timestamp: DateTime<Utc>,
    },
    Account {
        instrument: String,
        side: Side,
        price: f64,
        quantity: f64,
        capital_remaining: f64,
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    pub fn trade(instrument: impl Into<String>, side: Side, price: f64, quantity: f64) -> Self {
        Self::Trade {
            instrument: instrument.into(),
            side,
            price,
            quantity,
            timestamp: Utc::now(),
        }
    }

    pub fn book(instrument: impl Into<String>, side: Side, price: f64, quantity: f64) -> Self {
        Self::Book {
            instrument: instrument.into(),
            side,
            price,
            quantity,
            timestamp: Utc::now(),
        }
    }

    pub fn account(
        instrument: impl Into<String>,
        side: Side,
        price: f64,
        quantity: f64,
        capital_remaining: f64,
    ) -> Self {
        Self::Account {
            instrument: instrument.into(),
            side,
            price,
            quantity,
            capital_remaining,
            timestamp: Utc::now(),
        }
    }

    /// Instrument this event refers to
    pub fn instrument(&self) -> &str {
        match self {
            Self::Trade { instrument, .. }
            | Self::Book { instrument, .. }
            | Self::Account { instrument, .. } => instrument,
        }
    }
}
