use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use crate::gateway::{GatewayError, OrderGateway};
use crate::models::{MarketEvent, OrderRequest, Side};

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 50;

/// In-process simulated venue
///
/// Fills market orders at the shared mark price, keeps its own cash balance
/// (the venue's authoritative view of the account), and reports fills back
/// through the event channel as account updates - the same asynchronous path
/// a real venue would use. Transient transport failures can be injected to
/// exercise the retry loop.
pub struct PaperGateway {
    instrument: String,
    mark: Arc<RwLock<f64>>,
    cash: Mutex<f64>,
    open_orders: Mutex<HashMap<Uuid, OrderRequest>>,
    fills: mpsc::Sender<MarketEvent>,
    failures_remaining: AtomicU32,
}

impl PaperGateway {
    pub fn new(
        instrument: impl Into<String>,
        initial_cash: f64,
        mark: Arc<RwLock<f64>>,
        fills: mpsc::Sender<MarketEvent>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            mark,
            cash: Mutex::new(initial_cash),
            open_orders: Mutex::new(HashMap::new()),
            fills,
            failures_remaining: AtomicU32::new(0),
        }
    }

    /// Make the next `n` transport attempts fail
    pub fn inject_failures(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Resting (non-IOC) limit orders currently on the venue
    pub fn open_order_count(&self) -> usize {
        self.open_orders.lock().unwrap().len()
    }

    fn check_instrument(&self, instrument: &str) -> Result<(), GatewayError> {
        if instrument != self.instrument {
            return Err(GatewayError::Rejected(format!(
                "unknown instrument {instrument}"
            )));
        }
        Ok(())
    }

    fn transport_attempt(&self) -> Result<(), GatewayError> {
        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(GatewayError::Transport("injected failure".to_string()));
        }
        Ok(())
    }

    fn mark_price(&self) -> f64 {
        *self.mark.read().unwrap()
    }

    /// Execute a fill against the venue account and emit the account update
    async fn fill(&self, side: Side, price: f64, quantity: f64) {
        let capital_remaining = {
            let mut cash = self.cash.lock().unwrap();
            match side {
                Side::Buy => *cash -= quantity * price,
                Side::Sell => *cash += quantity * price,
            }
            *cash
        };

        tracing::info!(
            side = ?side,
            price,
            quantity,
            capital_remaining,
            "Paper fill"
        );

        let event =
            MarketEvent::account(&self.instrument, side, price, quantity, capital_remaining);
        if self.fills.send(event).await.is_err() {
            tracing::warn!("Fill dropped: account event channel closed");
        }
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    /// Submit a market order with bounded retry on transient failure
    async fn submit_market(
        &self,
        side: Side,
        instrument: &str,
        quantity: f64,
    ) -> Result<(), GatewayError> {
        self.check_instrument(instrument)?;
        if quantity <= 0.0 {
            return Err(GatewayError::Rejected(format!(
                "non-positive quantity {quantity}"
            )));
        }

        let mut last_error = None;
        for attempt in 1..=MAX_RETRIES {
            match self.transport_attempt() {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!("Market order accepted after {} attempts", attempt);
                    }
                    let price = self.mark_price();
                    self.fill(side, price, quantity).await;
                    return Ok(());
                }
                Err(e) => {
                    if attempt < MAX_RETRIES {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                        tracing::warn!(
                            "Attempt {}/{} failed: {}. Retrying in {}ms...",
                            attempt,
                            MAX_RETRIES,
                            e,
                            backoff_ms
                        );
                        sleep(Duration::from_millis(backoff_ms)).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(GatewayError::RetriesExhausted {
            attempts: MAX_RETRIES,
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn submit_limit(
        &self,
        side: Side,
        instrument: &str,
        quantity: f64,
        price: f64,
        immediate_or_cancel: bool,
    ) -> Result<Uuid, GatewayError> {
        self.check_instrument(instrument)?;
        if quantity <= 0.0 || price <= 0.0 {
            return Err(GatewayError::Rejected(format!(
                "bad limit parameters: quantity {quantity}, price {price}"
            )));
        }
        self.transport_attempt()?;

        let order_id = Uuid::new_v4();
        let mark = self.mark_price();
        let marketable = match side {
            Side::Buy => price >= mark,
            Side::Sell => price <= mark,
        };

        if immediate_or_cancel {
            if marketable {
                // IOC crossing the mark fills at the limit price
                self.fill(side, price, quantity).await;
            } else {
                tracing::info!(order_id = %order_id, "IOC limit not marketable, cancelled");
            }
            return Ok(order_id);
        }

        let request = OrderRequest::limit(side, instrument, quantity, price, false);
        self.open_orders.lock().unwrap().insert(order_id, request);
        tracing::info!(order_id = %order_id, price, quantity, "Limit order resting");
        Ok(order_id)
    }

    async fn cancel(&self, instrument: &str, order_id: Uuid) -> Result<(), GatewayError> {
        self.check_instrument(instrument)?;

        match self.open_orders.lock().unwrap().remove(&order_id) {
            Some(_) => {
                tracing::info!(order_id = %order_id, "Limit order cancelled");
                Ok(())
            }
            None => Err(GatewayError::UnknownOrder(order_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_gateway(cash: f64, mark_price: f64) -> (PaperGateway, mpsc::Receiver<MarketEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let mark = Arc::new(RwLock::new(mark_price));
        (PaperGateway::new("BTC-USD", cash, mark, tx), rx)
    }

    #[tokio::test]
    async fn test_market_buy_fills_and_reports() {
        let (gateway, mut rx) = test_gateway(100_000.0, 50_000.0);

        gateway
            .submit_market(Side::Buy, "BTC-USD", 1.0)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            MarketEvent::Account {
                side,
                price,
                quantity,
                capital_remaining,
                ..
            } => {
                assert_eq!(side, Side::Buy);
                assert_eq!(price, 50_000.0);
                assert_eq!(quantity, 1.0);
                assert_eq!(capital_remaining, 50_000.0);
            }
            other => panic!("expected account event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sell_credits_cash() {
        let (gateway, mut rx) = test_gateway(10_000.0, 100.0);

        gateway
            .submit_market(Side::Sell, "BTC-USD", 5.0)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            MarketEvent::Account {
                capital_remaining, ..
            } => assert_eq!(capital_remaining, 10_500.0),
            other => panic!("expected account event, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_failures() {
        let (gateway, mut rx) = test_gateway(100_000.0, 50_000.0);
        gateway.inject_failures(2);

        // Two failures then success: still one fill, inside the retry budget
        gateway
            .submit_market(Side::Buy, "BTC-USD", 1.0)
            .await
            .unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            MarketEvent::Account { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_reports_failure() {
        let (gateway, mut rx) = test_gateway(100_000.0, 50_000.0);
        gateway.inject_failures(MAX_RETRIES);

        let result = gateway.submit_market(Side::Buy, "BTC-USD", 1.0).await;
        assert!(matches!(
            result,
            Err(GatewayError::RetriesExhausted { attempts, .. }) if attempts == MAX_RETRIES
        ));

        // No fill event was emitted
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejects_foreign_instrument() {
        let (gateway, _rx) = test_gateway(100_000.0, 50_000.0);

        let result = gateway.submit_market(Side::Buy, "ETH-USD", 1.0).await;
        assert!(matches!(result, Err(GatewayError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_resting_limit_and_cancel() {
        let (gateway, _rx) = test_gateway(100_000.0, 50_000.0);

        let order_id = gateway
            .submit_limit(Side::Buy, "BTC-USD", 1.0, 45_000.0, false)
            .await
            .unwrap();
        assert_eq!(gateway.open_order_count(), 1);

        gateway.cancel("BTC-USD", order_id).await.unwrap();
        assert_eq!(gateway.open_order_count(), 0);

        // Second cancel of the same id fails
        let result = gateway.cancel("BTC-USD", order_id).await;
        assert!(matches!(result, Err(GatewayError::UnknownOrder(_))));
    }

    #[tokio::test]
    async fn test_ioc_limit_fills_when_marketable() {
        let (gateway, mut rx) = test_gateway(100_000.0, 50_000.0);

        // Buy IOC above the mark crosses and fills at the limit price
        gateway
            .submit_limit(Side::Buy, "BTC-USD", 1.0, 51_000.0, true)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            MarketEvent::Account { price, .. } => assert_eq!(price, 51_000.0),
            other => panic!("expected account event, got {:?}", other),
        }
        assert_eq!(gateway.open_order_count(), 0);
    }

    #[tokio::test]
    async fn test_ioc_limit_cancels_when_not_marketable() {
        let (gateway, mut rx) = test_gateway(100_000.0, 50_000.0);

        gateway
            .submit_limit(Side::Buy, "BTC-USD", 1.0, 45_000.0, true)
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(gateway.open_order_count(), 0);
    }
}
