//! Async keyboard event handling for TUI
//!
//! Uses crossterm's EventStream so input never blocks a tokio worker thread.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tracing::warn;

use super::app::AppState;

/// Result of processing a single event poll cycle
#[derive(Debug, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    /// User requested quit; shutdown has been broadcast
    Quit,
}

/// Wait up to `timeout` for one terminal event and apply it
pub async fn handle_events_async(
    app_state: &Arc<Mutex<AppState>>,
    shutdown_tx: &broadcast::Sender<()>,
    event_stream: &mut EventStream,
    timeout: Duration,
) -> EventResult {
    match tokio::time::timeout(timeout, event_stream.next()).await {
        Err(_) => EventResult::Continue,
        // Terminal closed
        Ok(None) => EventResult::Quit,
        Ok(Some(Err(e))) => {
            warn!(event_type = "TERMINAL_IO_ERROR", error = %e, "Terminal I/O error during event polling");
            EventResult::Continue
        }
        Ok(Some(Ok(Event::Key(key)))) if key.kind == KeyEventKind::Press => {
            process_key_event(key.code, key.modifiers, app_state, shutdown_tx)
        }
        Ok(Some(Ok(_))) => EventResult::Continue,
    }
}

fn request_quit(app_state: &Arc<Mutex<AppState>>, shutdown_tx: &broadcast::Sender<()>) -> EventResult {
    if let Ok(mut state) = app_state.lock() {
        state.should_quit = true;
    }
    let _ = shutdown_tx.send(());
    EventResult::Quit
}

fn process_key_event(
    code: KeyCode,
    modifiers: KeyModifiers,
    app_state: &Arc<Mutex<AppState>>,
    shutdown_tx: &broadcast::Sender<()>,
) -> EventResult {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => request_quit(app_state, shutdown_tx),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            request_quit(app_state, shutdown_tx)
        }

        // Offset counts back from the newest entry
        KeyCode::Char('j') | KeyCode::Down => {
            if let Ok(mut state) = app_state.lock() {
                state.log_scroll_offset = state.log_scroll_offset.saturating_sub(1);
            }
            EventResult::Continue
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Ok(mut state) = app_state.lock() {
                let max_offset = state.recent_logs.len().saturating_sub(1);
                if state.log_scroll_offset < max_offset {
                    state.log_scroll_offset += 1;
                }
            }
            EventResult::Continue
        }

        KeyCode::Char('l') | KeyCode::Char('L') => {
            if let Ok(mut state) = app_state.lock() {
                state.show_debug_logs = !state.show_debug_logs;
                super::logging::set_show_debug(state.show_debug_logs);
            }
            EventResult::Continue
        }

        _ => EventResult::Continue,
    }
}
