//! Terminal dashboard
//!
//! Optional presenter activated via LOG_FORMAT=tui
//!
//! # Usage
//! ```bash
//! LOG_FORMAT=tui cargo run --release
//! ```
//!
//! # Keyboard Controls
//! - `q` or `Ctrl+C`: Quit (broadcasts shutdown)
//! - `k/↑` `j/↓`: Scroll logs
//! - `l`: Toggle DEBUG logs

pub mod app;
pub mod event;
pub mod logging;
pub mod ui;

use std::io::{self, Stdout};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossterm::event::EventStream;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::broadcast;

use crate::core::{SharedEngine, SharedMarket};

pub use app::{AppState, LogEntry, MAX_LOG_ENTRIES};
pub use event::EventResult;
pub use logging::{init_tui_logging, TuiLayer};

pub type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Dashboard refresh period, also the key poll timeout
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

pub fn init_terminal() -> io::Result<TuiTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

pub fn restore_terminal(terminal: &mut TuiTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Run the dashboard until the user quits or shutdown is broadcast
///
/// Reads engine and series snapshots only. The terminal is restored even
/// when drawing fails.
pub async fn run_dashboard(
    app_state: Arc<Mutex<AppState>>,
    engine: SharedEngine,
    view: SharedMarket,
    shutdown_tx: broadcast::Sender<()>,
) -> io::Result<()> {
    let mut terminal = init_terminal()?;
    let result = dashboard_loop(&mut terminal, &app_state, &engine, &view, &shutdown_tx).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn dashboard_loop(
    terminal: &mut TuiTerminal,
    app_state: &Arc<Mutex<AppState>>,
    engine: &SharedEngine,
    view: &SharedMarket,
    shutdown_tx: &broadcast::Sender<()>,
) -> io::Result<()> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut events = EventStream::new();

    loop {
        let snapshot = engine.read().await.snapshot();
        let series_a = view.snapshot_series(&snapshot.venue_a).await.unwrap_or_default();
        let series_b = view.snapshot_series(&snapshot.venue_b).await.unwrap_or_default();

        {
            let mut state = app_state.lock().unwrap_or_else(PoisonError::into_inner);
            state.refresh(snapshot, &series_a, &series_b);
            terminal.draw(|frame| ui::draw(frame, &state))?;
            if state.should_quit {
                break;
            }
        }

        match shutdown_rx.try_recv() {
            Err(broadcast::error::TryRecvError::Empty) => {}
            _ => break,
        }

        let result =
            event::handle_events_async(app_state, shutdown_tx, &mut events, REFRESH_INTERVAL).await;
        if result == EventResult::Quit {
            break;
        }
    }

    Ok(())
}
