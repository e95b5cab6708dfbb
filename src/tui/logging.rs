//! Custom tracing Layer for TUI log capture
//!
//! Captures log events and pushes them to AppState for display.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use super::app::{AppState, LogEntry};

/// Whether DEBUG logs are shown; mirrors `AppState::show_debug_logs` so the
/// layer can filter without taking the lock
static SHOW_DEBUG: AtomicBool = AtomicBool::new(false);

/// Logs dropped under lock contention, synced into AppState on the next push
static DROPPED_LOGS: AtomicU64 = AtomicU64::new(0);

/// Structured fields appended to the displayed message
const DISPLAYED_FIELDS: &[&str] = &["event_type", "venue", "spread", "error"];

pub fn set_show_debug(enabled: bool) {
    SHOW_DEBUG.store(enabled, Ordering::Relaxed);
}

/// Layer that captures logs for TUI display.
///
/// `on_event()` must use `try_lock()`: events can fire while the dashboard
/// loop holds the AppState lock, and `lock()` would deadlock. Entries dropped
/// under contention are counted.
pub struct TuiLayer {
    app_state: Arc<Mutex<AppState>>,
}

impl TuiLayer {
    pub fn new(app_state: Arc<Mutex<AppState>>) -> Self {
        Self { app_state }
    }
}

impl<S: Subscriber> Layer<S> for TuiLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = event.metadata().level();

        if *level == tracing::Level::DEBUG && !SHOW_DEBUG.load(Ordering::Relaxed) {
            return;
        }

        let entry = format_entry(event);

        match self.app_state.try_lock() {
            Ok(mut state) => {
                let dropped = DROPPED_LOGS.swap(0, Ordering::Relaxed);
                if dropped > 0 {
                    state.dropped_logs_count += dropped;
                }
                state.push_log(entry);
            }
            Err(_) => {
                DROPPED_LOGS.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Install the global subscriber for `LOG_FORMAT=tui`
///
/// Crate DEBUG events pass the filter so `l` can reveal them; the layer
/// hides them until toggled.
pub fn init_tui_logging(app_state: Arc<Mutex<AppState>>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,spread_paper=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(TuiLayer::new(app_state))
        .init();
}

fn format_entry(event: &Event<'_>) -> LogEntry {
    let mut message = String::new();
    let mut extra_fields = Vec::new();
    let mut visitor = MessageVisitor {
        message: &mut message,
        extra_fields: &mut extra_fields,
    };
    event.record(&mut visitor);

    if !extra_fields.is_empty() {
        message.push_str(" [");
        message.push_str(&extra_fields.join(", "));
        message.push(']');
    }

    LogEntry {
        timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
        level: event.metadata().level().to_string(),
        message,
    }
}

struct MessageVisitor<'a> {
    message: &'a mut String,
    extra_fields: &'a mut Vec<String>,
}

impl<'a> tracing::field::Visit for MessageVisitor<'a> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = format!("{:?}", value).trim_matches('"').to_string();
        } else if DISPLAYED_FIELDS.contains(&field.name()) {
            self.extra_fields.push(format!("{}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_string();
        } else if DISPLAYED_FIELDS.contains(&field.name()) {
            self.extra_fields.push(format!("{}={}", field.name(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn shared_state() -> Arc<Mutex<AppState>> {
        Arc::new(Mutex::new(AppState::new(
            "ETH/USDT:USDT".into(),
            "binance-u".into(),
            "okex".into(),
        )))
    }

    #[test]
    #[serial(tui_log)]
    fn test_captures_message_and_fields() {
        let state = shared_state();
        let subscriber = tracing_subscriber::registry().with(TuiLayer::new(Arc::clone(&state)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(event_type = "TRADE_ENTRY", quantity = 10.0, "[TRADE] Position opened");
        });

        let state = state.lock().unwrap();
        let entry = state.recent_logs.back().unwrap();
        assert_eq!(entry.level, "INFO");
        assert!(entry.message.starts_with("[TRADE] Position opened"));
        assert!(entry.message.contains("event_type=TRADE_ENTRY"));
        assert!(!entry.message.contains("quantity"));
    }

    #[test]
    #[serial(tui_log)]
    fn test_debug_filtered_by_default() {
        let state = shared_state();
        let subscriber = tracing_subscriber::registry().with(TuiLayer::new(Arc::clone(&state)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("hidden");
        });

        assert!(state.lock().unwrap().recent_logs.is_empty());
    }

    #[test]
    #[serial(tui_log)]
    fn test_contended_lock_counts_drop() {
        let state = shared_state();
        let subscriber = tracing_subscriber::registry().with(TuiLayer::new(Arc::clone(&state)));

        tracing::subscriber::with_default(subscriber, || {
            let _guard = state.lock().unwrap();
            tracing::warn!("while locked");
        });
        tracing::subscriber::with_default(
            tracing_subscriber::registry().with(TuiLayer::new(Arc::clone(&state))),
            || tracing::warn!("after"),
        );

        let state = state.lock().unwrap();
        assert_eq!(state.recent_logs.len(), 1);
        assert!(state.dropped_logs_count >= 1);
    }
}
