//! TUI Application State
//!
//! Display copy of the engine and market view, refreshed by the dashboard
//! loop. Wrapped in `Arc<Mutex<>>` so the log layer can push entries.

use std::collections::VecDeque;
use std::time::Instant;

use crate::core::{EngineSnapshot, PriceSample, VenueSeries};

/// Maximum number of log entries to keep in memory
pub const MAX_LOG_ENTRIES: usize = 100;

/// Maximum number of trade records shown
pub const MAX_TRADE_HISTORY: usize = 10;

/// Points kept per chart line; older samples are dropped
pub const MAX_CHART_POINTS: usize = 600;

/// Single log entry for display
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

/// Central state shared between the dashboard loop and the log layer
#[derive(Debug)]
pub struct AppState {
    pub pair: String,
    pub venue_a: String,
    pub venue_b: String,

    /// Latest engine copy, `None` until the first refresh
    pub snapshot: Option<EngineSnapshot>,

    // Chart data as (seconds since start, value)
    pub prices_a: Vec<(f64, f64)>,
    pub prices_b: Vec<(f64, f64)>,
    pub spreads: Vec<(f64, f64)>,
    pub equity: Vec<(f64, f64)>,
    /// Epoch of the chart x axis
    pub origin_ms: Option<u64>,

    pub uptime_start: Instant,

    // Logs (ring buffer)
    pub recent_logs: VecDeque<LogEntry>,
    pub dropped_logs_count: u64,

    // Control
    pub should_quit: bool,
    pub log_scroll_offset: usize,
    pub show_debug_logs: bool,
}

impl AppState {
    pub fn new(pair: String, venue_a: String, venue_b: String) -> Self {
        Self {
            pair,
            venue_a,
            venue_b,
            snapshot: None,
            prices_a: Vec::new(),
            prices_b: Vec::new(),
            spreads: Vec::new(),
            equity: Vec::new(),
            origin_ms: None,
            uptime_start: Instant::now(),
            recent_logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            dropped_logs_count: 0,
            should_quit: false,
            log_scroll_offset: 0,
            show_debug_logs: false,
        }
    }

    /// Add a log entry with automatic rotation
    pub fn push_log(&mut self, entry: LogEntry) {
        if self.recent_logs.len() >= MAX_LOG_ENTRIES {
            self.recent_logs.pop_front();
        }
        self.recent_logs.push_back(entry);
    }

    /// Get formatted uptime string
    pub fn uptime_str(&self) -> String {
        let elapsed = self.uptime_start.elapsed();
        let hours = elapsed.as_secs() / 3600;
        let minutes = (elapsed.as_secs() % 3600) / 60;
        format!("{}h{:02}m", hours, minutes)
    }

    /// Replace the display data with fresh copies
    pub fn refresh(&mut self, snapshot: EngineSnapshot, series_a: &VenueSeries, series_b: &VenueSeries) {
        let first = [series_a.samples().first(), series_b.samples().first()]
            .into_iter()
            .flatten()
            .map(|s| s.timestamp_ms)
            .min();
        if self.origin_ms.is_none() {
            self.origin_ms = first;
        }
        let origin = self.origin_ms.unwrap_or(0);

        self.prices_a = chart_points(series_a.samples(), origin);
        self.prices_b = chart_points(series_b.samples(), origin);
        self.spreads = chart_points(&spread_series(series_a.samples(), series_b.samples()), origin);
        self.equity = tail(&snapshot.equity_curve)
            .iter()
            .enumerate()
            .map(|(i, e)| (i as f64, *e))
            .collect();
        self.snapshot = Some(snapshot);
    }

    /// Newest trades first, capped for the history panel
    pub fn recent_trades(&self) -> impl Iterator<Item = &crate::core::TradeRecord> {
        self.snapshot
            .iter()
            .flat_map(|s| s.trades.iter().rev())
            .take(MAX_TRADE_HISTORY)
    }
}

fn tail<T>(items: &[T]) -> &[T] {
    &items[items.len().saturating_sub(MAX_CHART_POINTS)..]
}

fn chart_points(samples: &[PriceSample], origin_ms: u64) -> Vec<(f64, f64)> {
    tail(samples)
        .iter()
        .map(|s| (s.timestamp_ms.saturating_sub(origin_ms) as f64 / 1000.0, s.price))
        .collect()
}

/// `pA - pB` at every sample time of either venue, pairing each sample with
/// the other venue's latest sample at or before it
pub fn spread_series(a: &[PriceSample], b: &[PriceSample]) -> Vec<PriceSample> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    let (mut last_a, mut last_b): (Option<f64>, Option<f64>) = (None, None);

    while i < a.len() || j < b.len() {
        let take_a = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) => x.timestamp_ms <= y.timestamp_ms,
            (Some(_), None) => true,
            _ => false,
        };
        let ts = if take_a {
            last_a = Some(a[i].price);
            i += 1;
            a[i - 1].timestamp_ms
        } else {
            last_b = Some(b[j].price);
            j += 1;
            b[j - 1].timestamp_ms
        };
        if let (Some(pa), Some(pb)) = (last_a, last_b) {
            out.push(PriceSample::new(ts, pa - pb));
        }
    }
    out
}

/// `[min, max]` of the y values, padded so a flat line stays visible
pub fn y_bounds<'a>(series: impl IntoIterator<Item = &'a [(f64, f64)]>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for points in series {
        for (_, y) in points {
            lo = lo.min(*y);
            hi = hi.max(*y);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.05).max(hi.abs() * 1e-4).max(1e-6);
    [lo - pad, hi + pad]
}

/// `[first, last]` of the x values
pub fn x_bounds<'a>(series: impl IntoIterator<Item = &'a [(f64, f64)]>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for points in series {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            lo = lo.min(first.0);
            hi = hi.max(last.0);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi - lo < 1e-9 {
        hi = lo + 1.0;
    }
    [lo, hi]
}
