//! TUI UI Rendering
//!
//! Zones, top to bottom:
//! - Header: pair, spread, position state
//! - Charts: both venue prices | spread with thresholds
//! - Equity chart (titled with MDD) | stats
//! - Trade history
//! - Logs

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph},
    Frame,
};

use super::app::{x_bounds, y_bounds, AppState};
use crate::core::{PositionState, TradeKind};

/// Main draw function - renders the entire UI
pub fn draw(frame: &mut Frame, state: &AppState) {
    // Minimum usable height is about 3+12+10+6+6 rows; smaller terminals clip the logs
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(8),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], state);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    draw_price_chart(frame, charts[0], state);
    draw_spread_chart(frame, charts[1], state);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);
    draw_equity_chart(frame, middle[0], state);
    draw_stats(frame, middle[1], state);

    draw_trade_history(frame, chunks[3], state);
    draw_logs(frame, chunks[4], state);
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

fn draw_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let snapshot = state.snapshot.as_ref();
    let spread = snapshot.and_then(|s| s.spread);
    let entry = snapshot.map(|s| s.entry_threshold).unwrap_or(f64::INFINITY);

    let spread_color = match spread {
        Some(s) if s > entry => Color::Green,
        _ => Color::White,
    };

    let (pos_text, pos_color) = match snapshot.map(|s| s.state) {
        Some(PositionState::InPosition) => ("● IN_POSITION", Color::Green),
        _ => ("○ FLAT", Color::DarkGray),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            &state.pair,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  │  {} - {}: ", state.venue_a, state.venue_b)),
        Span::styled(fmt_opt(spread, 4), Style::default().fg(spread_color)),
        Span::raw("  │  Position: "),
        Span::styled(
            pos_text,
            Style::default().fg(pos_color).add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Spread Paper Trader"));

    frame.render_widget(header, area);
}

fn axis_labels(bounds: [f64; 2], decimals: usize) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .into_iter()
        .map(|v| Span::raw(format!("{:.*}", decimals, v)))
        .collect()
}

fn line<'a>(name: String, data: &'a [(f64, f64)], color: Color) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(data)
}

fn draw_price_chart(frame: &mut Frame, area: Rect, state: &AppState) {
    let series = [state.prices_a.as_slice(), state.prices_b.as_slice()];
    let x = x_bounds(series);
    let y = y_bounds(series);

    let chart = Chart::new(vec![
        line(state.venue_a.clone(), &state.prices_a, Color::Yellow),
        line(state.venue_b.clone(), &state.prices_b, Color::Cyan),
    ])
    .block(Block::default().borders(Borders::ALL).title("Last price"))
    .x_axis(Axis::default().title("s").bounds(x).labels(axis_labels(x, 0)))
    .y_axis(Axis::default().bounds(y).labels(axis_labels(y, 2)));

    frame.render_widget(chart, area);
}

fn draw_spread_chart(frame: &mut Frame, area: Rect, state: &AppState) {
    let x = x_bounds([state.spreads.as_slice()]);

    let thresholds: Vec<(String, Vec<(f64, f64)>, Color)> = state
        .snapshot
        .as_ref()
        .map(|s| {
            vec![
                ("entry".to_string(), vec![(x[0], s.entry_threshold), (x[1], s.entry_threshold)], Color::Green),
                ("exit".to_string(), vec![(x[0], s.exit_threshold), (x[1], s.exit_threshold)], Color::Red),
            ]
        })
        .unwrap_or_default();

    let mut all: Vec<&[(f64, f64)]> = vec![state.spreads.as_slice()];
    all.extend(thresholds.iter().map(|(_, points, _)| points.as_slice()));
    let y = y_bounds(all);

    let mut datasets = vec![line("spread".to_string(), &state.spreads, Color::Magenta)];
    for (name, points, color) in &thresholds {
        datasets.push(line(name.clone(), points, *color));
    }

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Spread (A - B)"))
        .x_axis(Axis::default().title("s").bounds(x).labels(axis_labels(x, 0)))
        .y_axis(Axis::default().bounds(y).labels(axis_labels(y, 3)));

    frame.render_widget(chart, area);
}

fn draw_equity_chart(frame: &mut Frame, area: Rect, state: &AppState) {
    let mdd = state.snapshot.as_ref().map(|s| s.max_drawdown).unwrap_or(0.0);
    let x = x_bounds([state.equity.as_slice()]);
    let y = y_bounds([state.equity.as_slice()]);

    let chart = Chart::new(vec![line("equity".to_string(), &state.equity, Color::Green)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Equity  MDD: {:.2}%", mdd * 100.0)),
        )
        .x_axis(Axis::default().bounds(x))
        .y_axis(Axis::default().bounds(y).labels(axis_labels(y, 2)));

    frame.render_widget(chart, area);
}

fn draw_stats(frame: &mut Frame, area: Rect, state: &AppState) {
    let lines = match state.snapshot.as_ref() {
        None => vec![Line::from("Waiting for prices...")],
        Some(s) => {
            let pnl = s.realized_pnl();
            let pnl_color = if pnl >= 0.0 { Color::Green } else { Color::Red };
            vec![
                Line::from(vec![
                    Span::raw("Entry > "),
                    Span::styled(format!("{:.3}", s.entry_threshold), Style::default().fg(Color::Green)),
                    Span::raw("  Exit < "),
                    Span::styled(format!("{:.3}", s.exit_threshold), Style::default().fg(Color::Red)),
                ]),
                Line::from(format!(
                    "{}: cash {:.2} qty {:+.4}",
                    s.venue_a,
                    s.account_a.cash_balance(),
                    s.account_a.holdings()
                )),
                Line::from(format!(
                    "{}: cash {:.2} qty {:+.4}",
                    s.venue_b,
                    s.account_b.cash_balance(),
                    s.account_b.holdings()
                )),
                Line::from(vec![
                    Span::raw("Equity: "),
                    Span::styled(format!("{:.2}", s.equity()), Style::default().fg(Color::White)),
                    Span::raw("  PnL: "),
                    Span::styled(format!("{:+.2}", pnl), Style::default().fg(pnl_color)),
                ]),
                Line::from(format!(
                    "Trades: {}  Ticks: {}  Errors: {}",
                    s.trades.len(),
                    s.ticks,
                    s.tick_errors
                )),
                Line::from(vec![
                    Span::raw("Uptime: "),
                    Span::styled(state.uptime_str(), Style::default().fg(Color::Cyan)),
                ]),
            ]
        }
    };

    let stats = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Stats"));
    frame.render_widget(stats, area);
}

fn draw_trade_history(frame: &mut Frame, area: Rect, state: &AppState) {
    let items: Vec<ListItem> = state
        .recent_trades()
        .take(area.height.saturating_sub(2) as usize)
        .map(|record| {
            let (kind, kind_color) = match record.kind {
                TradeKind::Entry => ("ENTRY", Color::Cyan),
                TradeKind::Exit => ("EXIT ", Color::Yellow),
            };
            let pnl = match record.realized_pnl {
                Some(p) => Span::styled(
                    format!("{:+.4}", p),
                    Style::default().fg(if p >= 0.0 { Color::Green } else { Color::Red }),
                ),
                None => Span::raw("-"),
            };
            let time = chrono::DateTime::from_timestamp_millis(record.timestamp_ms as i64)
                .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
                .unwrap_or_default();

            ListItem::new(Line::from(vec![
                Span::styled(time, Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::styled(kind, Style::default().fg(kind_color)),
                Span::raw(format!(
                    " │ spread {:+.4} │ A {:.2} B {:.2} │ qty {:.4} │ ",
                    record.spread, record.price_a, record.price_b, record.quantity
                )),
                pnl,
            ]))
        })
        .collect();

    let history = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Trade History (latest first)"),
    );
    frame.render_widget(history, area);
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &AppState) {
    let log_items: Vec<ListItem> = state
        .recent_logs
        .iter()
        .rev()
        .skip(state.log_scroll_offset)
        .take(area.height.saturating_sub(2) as usize)
        .map(|entry| {
            let level_color = match entry.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                "INFO" => Color::Cyan,
                "DEBUG" => Color::DarkGray,
                _ => Color::White,
            };

            ListItem::new(Line::from(vec![
                Span::styled(&entry.timestamp, Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::styled(format!("{:5}", entry.level), Style::default().fg(level_color)),
                Span::raw(" "),
                Span::raw(&entry.message),
            ]))
        })
        .collect();

    let mut title = String::from("Logs (j/k scroll, l=debug)");
    if state.show_debug_logs {
        title.push_str(" [DEBUG ON]");
    }
    if state.dropped_logs_count > 0 {
        title.push_str(&format!(" [{} dropped]", state.dropped_logs_count));
    }

    let logs = List::new(log_items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(logs, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArbitrageEngine, EngineConfig, PriceSample, VenueSeries};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draw_before_first_refresh() {
        let state = AppState::new("ETH/USDT:USDT".into(), "binance-u".into(), "okex".into());
        let mut terminal = Terminal::new(TestBackend::new(120, 45)).unwrap();

        terminal.draw(|f| draw(f, &state)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("ETH/USDT:USDT"));
        assert!(text.contains("FLAT"));
        assert!(text.contains("Waiting for prices"));
    }

    #[test]
    fn test_draw_in_position() {
        let mut state = AppState::new("ETH/USDT:USDT".into(), "binance-u".into(), "okex".into());
        let config = EngineConfig {
            entry_threshold: 0.6,
            exit_threshold: 0.2,
            initial_balance: 1000.0,
        };
        let mut engine = ArbitrageEngine::new(config, "binance-u", "okex").unwrap();
        engine.evaluate(Some(100.7), Some(100.0)).unwrap();

        let mut a = VenueSeries::new();
        a.push(PriceSample::new(1_000, 100.7));
        let mut b = VenueSeries::new();
        b.push(PriceSample::new(1_000, 100.0));
        state.refresh(engine.snapshot(), &a, &b);

        let mut terminal = Terminal::new(TestBackend::new(120, 45)).unwrap();
        terminal.draw(|f| draw(f, &state)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("IN_POSITION"));
        assert!(text.contains("MDD"));
        assert!(text.contains("ENTRY"));
    }
}
