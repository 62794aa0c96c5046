// Order execution gateway seam
//
// The strategy core only depends on this trait; real exchange connectivity
// lives behind it. `PaperGateway` is the in-process implementation used by
// the demo binary and the integration tests.
pub mod paper;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Side;

pub use paper::PaperGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The venue refused the order outright (bad instrument, bad size)
    #[error("order rejected: {0}")]
    Rejected(String),
    /// A transient transport failure; the gateway retries these internally
    #[error("transport failure: {0}")]
    Transport(String),
    /// The gateway gave up after its internal retry budget
    #[error("submission failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
    /// Cancel referenced an order id the venue does not know
    #[error("unknown order id {0}")]
    UnknownOrder(Uuid),
}

/// Contract the strategy controller needs from an order-execution venue
///
/// Implementations own their retry policy: a `submit_market` call is one
/// logical attempt from the caller's point of view, with bounded retry and
/// backoff happening inside the gateway. Fills are never reported through
/// these return values; they arrive later as account-update events.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit a market order. `Ok` means the venue accepted the submission,
    /// not that it filled.
    async fn submit_market(
        &self,
        side: Side,
        instrument: &str,
        quantity: f64,
    ) -> Result<(), GatewayError>;

    /// Submit a limit order, optionally immediate-or-cancel, returning the
    /// venue-assigned order id
    async fn submit_limit(
        &self,
        side: Side,
        instrument: &str,
        quantity: f64,
        price: f64,
        immediate_or_cancel: bool,
    ) -> Result<Uuid, GatewayError>;

    /// Cancel a resting limit order
    async fn cancel(&self, instrument: &str, order_id: Uuid) -> Result<(), GatewayError>;
}
