//! Periodic log presenter
//!
//! Headless counterpart of the TUI: every `interval` it snapshots the engine
//! and logs one summary line. It never writes to the engine.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use super::engine::EngineSnapshot;
use super::scheduler::SharedEngine;

/// Log one summary line for `snapshot`
pub fn log_snapshot(snapshot: &EngineSnapshot) {
    info!(
        event_type = "REPORT",
        state = %snapshot.state,
        price_a = ?snapshot.price_a,
        price_b = ?snapshot.price_b,
        spread = %snapshot.spread.map(|s| format!("{:.4}", s)).unwrap_or_else(|| "-".into()),
        equity = %format!("{:.2}", snapshot.equity()),
        realized_pnl = %format!("{:.2}", snapshot.realized_pnl()),
        max_drawdown = %format!("{:.4}%", snapshot.max_drawdown * 100.0),
        trades = snapshot.trades.len(),
        ticks = snapshot.ticks,
        tick_errors = snapshot.tick_errors,
        "[REPORT] {} vs {}",
        snapshot.venue_a,
        snapshot.venue_b
    );
}

/// Log a summary every `every` until shutdown, then one final line
pub async fn report_task(
    engine: SharedEngine,
    every: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick fires immediately; nothing to report yet
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                let snapshot = engine.read().await.snapshot();
                log_snapshot(&snapshot);
            }
        }
    }

    let snapshot = engine.read().await.snapshot();
    info!("[SHUTDOWN] Final report");
    log_snapshot(&snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{ArbitrageEngine, EngineConfig};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[tokio::test]
    async fn test_report_task_stops_on_shutdown() {
        let config = EngineConfig {
            entry_threshold: 0.6,
            exit_threshold: 0.2,
            initial_balance: 1000.0,
        };
        let engine = Arc::new(RwLock::new(ArbitrageEngine::new(config, "a", "b").unwrap()));
        engine
            .write()
            .await
            .evaluate(Some(100.7), Some(100.0))
            .unwrap();

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(report_task(Arc::clone(&engine), Duration::from_millis(5), rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("report task did not stop")
            .unwrap();
    }

    #[test]
    fn test_log_snapshot_without_prices() {
        let config = EngineConfig {
            entry_threshold: 0.6,
            exit_threshold: 0.2,
            initial_balance: 1000.0,
        };
        let engine = ArbitrageEngine::new(config, "a", "b").unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.spread, None);
        log_snapshot(&snapshot);
    }
}
