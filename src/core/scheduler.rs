//! Evaluation scheduler
//!
//! Drives `ArbitrageEngine::tick` on a fixed interval, independent of how
//! often the feeds deliver. Stale or repeated prices are evaluated like any
//! other; an invalid tick is logged and the next one proceeds.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::engine::{ArbitrageEngine, TickError, TickOutcome};
use super::market::SharedMarket;

/// Engine shared between the scheduler (sole writer) and presenters
pub type SharedEngine = Arc<RwLock<ArbitrageEngine>>;

/// Counters reported when the scheduler stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub awaiting: u64,
    pub errors: u64,
    pub transitions: u64,
}

pub struct EvaluationScheduler {
    engine: SharedEngine,
    view: SharedMarket,
    interval: Duration,
}

impl EvaluationScheduler {
    pub fn new(engine: SharedEngine, view: SharedMarket, interval: Duration) -> Self {
        Self {
            engine,
            view,
            interval,
        }
    }

    /// Tick until shutdown
    ///
    /// Missed ticks are skipped rather than bursted. The tick runs outside
    /// `select!`, so shutdown is only observed between ticks.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> SchedulerStats {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut stats = SchedulerStats::default();
        let mut last_error: Option<TickError> = None;

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "[SCHEDULER] Starting");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("[SHUTDOWN] Scheduler stopping");
                    break;
                }
                _ = interval.tick() => {}
            }

            let result = {
                let mut engine = self.engine.write().await;
                engine.tick(&self.view).await
            };
            stats.ticks += 1;

            match result {
                Ok(TickOutcome::AwaitingPrices) => stats.awaiting += 1,
                Ok(TickOutcome::Hold { .. }) => {}
                Ok(TickOutcome::Entered(_)) | Ok(TickOutcome::Exited(_)) => stats.transitions += 1,
                Err(e) => {
                    stats.errors += 1;
                    // At millisecond cadence the same bad price repeats; warn once per change
                    if last_error.as_ref() != Some(&e) {
                        tracing::warn!(error = %e, "[SCHEDULER] Tick skipped");
                    } else {
                        tracing::debug!(error = %e, "[SCHEDULER] Tick skipped");
                    }
                    last_error = Some(e);
                    continue;
                }
            }
            last_error = None;
        }

        tracing::info!(
            ticks = stats.ticks,
            transitions = stats.transitions,
            errors = stats.errors,
            "[SCHEDULER] Stopped"
        );
        stats
    }
}

/// Spawn the scheduler on its own task
pub fn spawn_scheduler(
    scheduler: EvaluationScheduler,
    shutdown: broadcast::Receiver<()>,
) -> JoinHandle<SchedulerStats> {
    tokio::spawn(scheduler.run(shutdown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::EngineConfig;
    use crate::core::market::SharedMarketView;
    use crate::core::types::{PositionState, PriceSample};

    fn shared_engine() -> SharedEngine {
        let config = EngineConfig {
            entry_threshold: 0.6,
            exit_threshold: 0.2,
            initial_balance: 1000.0,
        };
        Arc::new(RwLock::new(ArbitrageEngine::new(config, "a", "b").unwrap()))
    }

    #[tokio::test]
    async fn test_ticks_until_shutdown() {
        let view = SharedMarketView::shared(["a", "b"]);
        let engine = shared_engine();
        let (tx, rx) = broadcast::channel(1);

        let handle = spawn_scheduler(
            EvaluationScheduler::new(Arc::clone(&engine), Arc::clone(&view), Duration::from_millis(1)),
            rx,
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();

        let stats = handle.await.unwrap();
        assert!(stats.ticks > 0);
        assert_eq!(stats.awaiting, stats.ticks);
        assert_eq!(engine.read().await.state(), PositionState::Flat);
    }

    #[tokio::test]
    async fn test_enters_when_prices_arrive() {
        let view = SharedMarketView::shared(["a", "b"]);
        let engine = shared_engine();
        let (tx, rx) = broadcast::channel(1);

        let handle = spawn_scheduler(
            EvaluationScheduler::new(Arc::clone(&engine), Arc::clone(&view), Duration::from_millis(1)),
            rx,
        );

        view.append("a", PriceSample::new(1, 100.7)).await.unwrap();
        view.append("b", PriceSample::new(1, 100.0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();

        let stats = handle.await.unwrap();
        assert_eq!(stats.transitions, 1);
        let engine = engine.read().await;
        assert_eq!(engine.state(), PositionState::InPosition);
        assert_eq!(engine.trades().len(), 1);
    }

    #[tokio::test]
    async fn test_survives_invalid_ticks() {
        let view = SharedMarketView::shared(["a", "b"]);
        let engine = shared_engine();
        let (tx, rx) = broadcast::channel(1);

        // A negative price never comes out of a feed, but the engine must cope
        view.append("a", PriceSample::new(1, -5.0)).await.unwrap();
        view.append("b", PriceSample::new(1, 100.0)).await.unwrap();

        let handle = spawn_scheduler(
            EvaluationScheduler::new(Arc::clone(&engine), Arc::clone(&view), Duration::from_millis(1)),
            rx,
        );
        tokio::time::sleep(Duration::from_millis(20)).await;

        view.append("a", PriceSample::new(2, 100.7)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(()).unwrap();

        let stats = handle.await.unwrap();
        assert!(stats.errors > 0);
        assert_eq!(stats.transitions, 1);
        assert_eq!(engine.read().await.state(), PositionState::InPosition);
    }
}
