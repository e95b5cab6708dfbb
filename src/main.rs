//! Spread paper trader entry point
//!
//! 1. Loads `.env` and the YAML configuration
//! 2. Starts one price feed per venue
//! 3. Runs the evaluation scheduler against the shared market view
//! 4. Presents results (periodic log report, or dashboard with LOG_FORMAT=tui)
//! 5. Shuts everything down on Ctrl+C or dashboard quit

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};

use spread_paper::adapters::{create_quote_stream, resolve_symbol};
use spread_paper::config::{self, AppConfig};
use spread_paper::core::{
    log_snapshot, report_task, spawn_feed, spawn_scheduler, ArbitrageEngine, EngineConfig,
    EvaluationScheduler, FeedExit, PriceFeed, SharedMarketView,
};
use spread_paper::tui::{self, AppState};

/// Grace period for tasks to observe shutdown
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let path = config::config_path();
    let app_config = config::load_config(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let (venue_a, venue_b) = (&app_config.venues.a, &app_config.venues.b);
    let tui_mode = config::is_tui_mode();
    let app_state = if tui_mode {
        let state = Arc::new(Mutex::new(AppState::new(
            venue_a.symbol.clone(),
            venue_a.label.clone(),
            venue_b.label.clone(),
        )));
        tui::init_tui_logging(Arc::clone(&state));
        Some(state)
    } else {
        config::init_logging();
        None
    };

    log_startup(&app_config);

    for venue in [venue_a, venue_b] {
        resolve_symbol(venue.exchange, &venue.symbol)
            .with_context(|| format!("Venue '{}' cannot trade {}", venue.label, venue.symbol))?;
    }

    let view = SharedMarketView::shared([venue_a.label.as_str(), venue_b.label.as_str()]);
    let engine = Arc::new(RwLock::new(ArbitrageEngine::new(
        EngineConfig::from(&app_config.strategy),
        venue_a.label.as_str(),
        venue_b.label.as_str(),
    )?));

    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let shutdown_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("[SHUTDOWN] Graceful shutdown initiated");
                let _ = shutdown_signal.send(());
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for Ctrl+C signal");
            }
        }
    });

    let mut feeds = Vec::new();
    for venue in [venue_a, venue_b] {
        let feed = PriceFeed::new(
            venue.label.as_str(),
            venue.symbol.as_str(),
            Arc::clone(&view),
            app_config.feed.error_policy.clone(),
        )?;
        let stream = create_quote_stream(venue.exchange);
        feeds.push((venue.label.clone(), spawn_feed(feed, stream, shutdown_tx.subscribe())));
    }

    let scheduler = spawn_scheduler(
        EvaluationScheduler::new(
            Arc::clone(&engine),
            Arc::clone(&view),
            Duration::from_millis(app_config.strategy.evaluation_interval_ms),
        ),
        shutdown_tx.subscribe(),
    );

    match app_state {
        Some(state) => {
            let result =
                tui::run_dashboard(state, Arc::clone(&engine), Arc::clone(&view), shutdown_tx.clone())
                    .await;
            let _ = shutdown_tx.send(());
            result.context("Dashboard failed")?;
        }
        None => {
            report_task(
                Arc::clone(&engine),
                Duration::from_secs(app_config.report.interval_secs),
                shutdown_tx.subscribe(),
            )
            .await;
        }
    }

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, scheduler).await {
        Ok(Ok(stats)) => info!(ticks = stats.ticks, errors = stats.errors, "[SHUTDOWN] Scheduler joined"),
        Ok(Err(e)) => error!(error = %e, "[SHUTDOWN] Scheduler task panicked"),
        Err(_) => warn!("[SHUTDOWN] Scheduler did not stop in time"),
    }

    for (label, handle) in feeds {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok((FeedExit::Shutdown, stats))) => {
                info!(venue = %label, appended = stats.appended, "[SHUTDOWN] Feed joined")
            }
            Ok(Ok((FeedExit::Failed(e), stats))) => {
                warn!(venue = %label, appended = stats.appended, error = %e, "[SHUTDOWN] Feed had already failed")
            }
            Ok(Err(e)) => error!(venue = %label, error = %e, "[SHUTDOWN] Feed task panicked"),
            Err(_) => warn!(venue = %label, "[SHUTDOWN] Feed did not stop in time"),
        }
    }

    let snapshot = engine.read().await.snapshot();
    if tui_mode {
        // The dashboard's log layer is no longer visible
        println!(
            "{} trades, equity {:.2}, realized PnL {:+.2}, MDD {:.4}%",
            snapshot.trades.len(),
            snapshot.equity(),
            snapshot.realized_pnl(),
            snapshot.max_drawdown * 100.0
        );
    } else {
        log_snapshot(&snapshot);
    }

    info!("[SHUTDOWN] Clean exit");
    Ok(())
}

fn log_startup(config: &AppConfig) {
    let (a, b) = (&config.venues.a, &config.venues.b);
    info!(
        venue_a = %a.label,
        exchange_a = %a.exchange,
        venue_b = %b.label,
        exchange_b = %b.exchange,
        symbol_a = %a.symbol,
        symbol_b = %b.symbol,
        "[CONFIG] Venues loaded"
    );
    info!(
        entry_threshold = config.strategy.entry_threshold,
        exit_threshold = config.strategy.exit_threshold,
        initial_balance = config.strategy.initial_balance,
        interval_ms = config.strategy.evaluation_interval_ms,
        error_policy = ?config.feed.error_policy,
        "[CONFIG] Strategy loaded"
    );
}
