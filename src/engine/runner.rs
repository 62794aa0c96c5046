use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::{mpsc, watch};

use crate::engine::controller::{OrderIntent, StrategyController};
use crate::gateway::OrderGateway;
use crate::models::MarketEvent;
use crate::risk::RateLimiter;

/// Serialized event loop for one strategy instance
///
/// Owns the controller, so every event handler runs to completion before the
/// next event is taken. Admitted order intents are dispatched to worker tasks
/// so gateway retries and their backoff sleeps never stall market-data
/// processing. Returns the controller when the event channel closes or
/// shutdown is signalled, so the caller can inspect final state.
pub async fn run_event_loop(
    mut controller: StrategyController,
    mut events: mpsc::Receiver<MarketEvent>,
    gateway: Arc<dyn OrderGateway>,
    limiter: Arc<Mutex<RateLimiter>>,
    mut shutdown: watch::Receiver<bool>,
) -> StrategyController {
    loop {
        tokio::select! {
            // Drain queued events before honoring shutdown, so nothing sent
            // ahead of the signal is dropped
            biased;
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => {
                        if let Some(intent) = controller.on_event(&event) {
                            dispatch(intent, gateway.clone(), limiter.clone());
                        }
                    }
                    None => {
                        tracing::info!("Event channel closed, stopping");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => {
                tracing::info!("Shutdown signalled, stopping");
                break;
            }
        }
    }

    controller
}

/// Hand an admitted intent to a worker task
///
/// The worker records the limiter timestamp only after the gateway accepts
/// the submission; a failed submission consumes no rate-limit capacity.
fn dispatch(intent: OrderIntent, gateway: Arc<dyn OrderGateway>, limiter: Arc<Mutex<RateLimiter>>) {
    tokio::spawn(async move {
        match gateway
            .submit_market(intent.side, &intent.instrument, intent.quantity)
            .await
        {
            Ok(()) => {
                limiter.lock().unwrap().record(Instant::now());
                tracing::info!(
                    side = ?intent.side,
                    quantity = intent.quantity,
                    "Market order submitted"
                );
            }
            Err(e) => {
                tracing::warn!(
                    side = ?intent.side,
                    quantity = intent.quantity,
                    "Market order failed: {}",
                    e
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyConfig;
    use crate::engine::PositionState;
    use crate::gateway::PaperGateway;
    use crate::models::{MarketEvent, Side};
    use std::sync::RwLock;

    #[tokio::test]
    async fn test_loop_drains_channel_and_returns_controller() {
        let config = StrategyConfig::default();
        let limiter = Arc::new(Mutex::new(RateLimiter::new(config.max_orders_per_minute)));
        let controller = StrategyController::new(config, limiter.clone());

        let (tx, rx) = mpsc::channel(64);
        let mark = Arc::new(RwLock::new(100.0));
        // Fills feed back into the same channel the loop consumes
        let gateway = Arc::new(PaperGateway::new("BTC-USD", 100_000.0, mark, tx.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_event_loop(
            controller,
            rx,
            gateway,
            limiter,
            shutdown_rx,
        ));

        // Flat prices: qualifying updates, no intents
        for _ in 0..12 {
            tx.send(MarketEvent::trade("BTC-USD", Side::Buy, 100.0, 1.0))
                .await
                .unwrap();
        }

        // Give the loop a tick to drain, then stop it
        tokio::task::yield_now().await;
        shutdown_tx.send(true).unwrap();

        let controller = handle.await.unwrap();
        assert_eq!(controller.market().history().len(), 12);
        assert_eq!(controller.account().position(), PositionState::Flat);
    }

    #[tokio::test]
    async fn test_uptrend_round_trips_a_fill() {
        let config = StrategyConfig::default();
        let limiter = Arc::new(Mutex::new(RateLimiter::new(config.max_orders_per_minute)));
        let controller = StrategyController::new(config, limiter.clone());

        let (tx, rx) = mpsc::channel(64);
        let mark = Arc::new(RwLock::new(109.0));
        let gateway = Arc::new(PaperGateway::new("BTC-USD", 100_000.0, mark, tx.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_event_loop(
            controller,
            rx,
            gateway,
            limiter,
            shutdown_rx,
        ));

        for p in 100..110 {
            tx.send(MarketEvent::trade("BTC-USD", Side::Buy, p as f64, 1.0))
                .await
                .unwrap();
        }

        // Let the submission worker run and the fill event flow back
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let controller = handle.await.unwrap();
        assert_eq!(controller.account().position(), PositionState::Long);
        let expected_quantity = 100_000.0 * 0.5 / 109.0;
        assert!((controller.account().position_size() - expected_quantity).abs() < 1e-9);
    }
}
