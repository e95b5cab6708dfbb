//! Price feed
//!
//! One task per venue: pulls quotes from a `QuoteStream`, stamps each usable
//! last price with the local receipt time and appends it to the venue's
//! series in the shared market view.
//!
//! # Error policy
//! - `Stop` (default): the first stream error is logged and ends this feed
//!   only; the other venue keeps streaming.
//! - `Retry`: reconnect with exponential backoff; the feed ends when every
//!   attempt fails.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::adapters::errors::ExchangeError;
use crate::adapters::shared::reconnect_stream;
use crate::adapters::traits::QuoteStream;
use crate::adapters::types::Quote;
use crate::config::FeedErrorPolicy;

use super::market::{MarketViewError, SharedMarket};
use super::types::{current_time_ms, PriceSample, VenueLabel};

/// Why a feed stopped
#[derive(Debug)]
pub enum FeedExit {
    /// Shutdown broadcast received
    Shutdown,
    /// Stream failed and the error policy gave up
    Failed(ExchangeError),
}

/// Ingestion counters reported when a feed ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub appended: u64,
    /// Quotes without a usable last price
    pub skipped: u64,
}

pub struct PriceFeed {
    label: VenueLabel,
    symbol: String,
    view: SharedMarket,
    policy: FeedErrorPolicy,
    stats: FeedStats,
}

impl PriceFeed {
    /// Create a feed for `label`, which must be registered in `view`
    pub fn new(
        label: impl Into<VenueLabel>,
        symbol: impl Into<String>,
        view: SharedMarket,
        policy: FeedErrorPolicy,
    ) -> Result<Self, MarketViewError> {
        let label = label.into();
        if !view.venues().contains(&label) {
            return Err(MarketViewError::UnknownVenue(label.to_string()));
        }
        Ok(Self {
            label,
            symbol: symbol.into(),
            view,
            policy,
            stats: FeedStats::default(),
        })
    }

    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    /// Stream quotes into the market view until shutdown or a terminal error
    pub async fn run<S>(mut self, mut stream: S, mut shutdown: broadcast::Receiver<()>) -> (FeedExit, FeedStats)
    where
        S: QuoteStream,
    {
        tracing::info!(
            venue = %self.label,
            exchange = stream.exchange_name(),
            symbol = %self.symbol,
            "[FEED] Starting"
        );

        let exit = loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!(venue = %self.label, "[SHUTDOWN] Feed stopping");
                    let _ = stream.disconnect().await;
                    break FeedExit::Shutdown;
                }
                result = stream.next_quote(&self.symbol) => match result {
                    Ok(quote) => self.ingest(quote).await,
                    Err(e) => {
                        tracing::error!(
                            venue = %self.label,
                            exchange = stream.exchange_name(),
                            error = %e,
                            "[FEED] Stream error"
                        );
                        if let Err(e) = self.recover(&mut stream, e).await {
                            break FeedExit::Failed(e);
                        }
                    }
                },
            }
        };

        tracing::info!(
            venue = %self.label,
            appended = self.stats.appended,
            skipped = self.stats.skipped,
            reason = ?exit,
            "[FEED] Stopped"
        );
        (exit, self.stats)
    }

    async fn ingest(&mut self, quote: Quote) {
        let Some(price) = quote.tradable_last() else {
            self.stats.skipped += 1;
            tracing::warn!(
                venue = %self.label,
                last = ?quote.last,
                "[FEED] Quote without usable last price skipped"
            );
            return;
        };

        let sample = PriceSample::new(current_time_ms(), price);
        match self.view.append(&self.label, sample).await {
            Ok(()) => {
                self.stats.appended += 1;
                tracing::debug!(
                    venue = %self.label,
                    price = price,
                    bid = ?quote.bid,
                    ask = ?quote.ask,
                    exchange_ts = quote.timestamp_ms,
                    "[FEED] Sample"
                );
            }
            Err(e) => tracing::error!(venue = %self.label, error = %e, "[FEED] Append failed"),
        }
    }

    /// Apply the error policy; `Err` means the feed must stop
    async fn recover<S>(&self, stream: &mut S, error: ExchangeError) -> Result<(), ExchangeError>
    where
        S: QuoteStream,
    {
        match self.policy.reconnect_config() {
            None => Err(error),
            Some(config) => reconnect_stream(&config, &self.label, stream).await,
        }
    }
}

/// Spawn `feed` on its own task
pub fn spawn_feed<S>(
    feed: PriceFeed,
    stream: S,
    shutdown: broadcast::Receiver<()>,
) -> JoinHandle<(FeedExit, FeedStats)>
where
    S: QuoteStream + 'static,
{
    tokio::spawn(feed.run(stream, shutdown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_utils::{quote_at, ScriptedQuoteStream};
    use crate::core::market::SharedMarketView;
    use std::sync::Arc;
    use std::time::Duration;

    const SYMBOL: &str = "ETH/USDT:USDT";

    fn fast_retry(max_attempts: u32) -> FeedErrorPolicy {
        FeedErrorPolicy::Retry {
            max_attempts,
            initial_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[tokio::test]
    async fn test_new_rejects_unregistered_venue() {
        let view = SharedMarketView::shared(["a"]);
        let result = PriceFeed::new("b", SYMBOL, view, FeedErrorPolicy::Stop);
        assert!(matches!(result, Err(MarketViewError::UnknownVenue(_))));
    }

    #[tokio::test]
    async fn test_appends_and_stops_on_error() {
        let view = SharedMarketView::shared(["a"]);
        let feed = PriceFeed::new("a", SYMBOL, Arc::clone(&view), FeedErrorPolicy::Stop).unwrap();
        let stream = ScriptedQuoteStream::new(
            "mock",
            vec![
                Ok(quote_at(100.0, 1)),
                Ok(quote_at(101.0, 2)),
                Err(ExchangeError::ConnectionFailed("reset".into())),
                Ok(quote_at(999.0, 3)),
            ],
        );
        let (_tx, rx) = broadcast::channel(1);

        let (exit, stats) = feed.run(stream, rx).await;

        assert!(matches!(exit, FeedExit::Failed(ExchangeError::ConnectionFailed(_))));
        assert_eq!(stats.appended, 2);
        let series = view.snapshot_series("a").await.unwrap();
        assert_eq!(series.prices().collect::<Vec<_>>(), vec![100.0, 101.0]);
    }

    #[tokio::test]
    async fn test_skips_unusable_quotes() {
        let view = SharedMarketView::shared(["a"]);
        let feed = PriceFeed::new("a", SYMBOL, Arc::clone(&view), FeedErrorPolicy::Stop).unwrap();
        let mut no_last = quote_at(100.0, 1);
        no_last.last = None;
        let stream = ScriptedQuoteStream::new(
            "mock",
            vec![
                Ok(no_last),
                Ok(quote_at(0.0, 2)),
                Ok(quote_at(f64::NAN, 3)),
                Ok(quote_at(50.0, 4)),
            ],
        );
        let (_tx, rx) = broadcast::channel(1);

        let (_, stats) = feed.run(stream, rx).await;

        assert_eq!(stats, FeedStats { appended: 1, skipped: 3 });
        assert_eq!(view.latest("a").await.unwrap().price, 50.0);
    }

    #[tokio::test]
    async fn test_retry_policy_reconnects_and_continues() {
        let view = SharedMarketView::shared(["a"]);
        let feed = PriceFeed::new("a", SYMBOL, Arc::clone(&view), fast_retry(3)).unwrap();
        let stream = ScriptedQuoteStream::new(
            "mock",
            vec![
                Ok(quote_at(100.0, 1)),
                Err(ExchangeError::StreamClosed("mock".into())),
                Ok(quote_at(102.0, 2)),
            ],
        );
        let (tx, rx) = broadcast::channel(1);

        // Script ends with StreamClosed and reconnect keeps succeeding, so
        // bound the run by the shutdown signal instead.
        let handle = tokio::spawn(feed.run(stream.hanging(), rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        let (exit, stats) = handle.await.unwrap();

        assert!(matches!(exit, FeedExit::Shutdown));
        assert_eq!(stats.appended, 2);
        assert_eq!(view.latest("a").await.unwrap().price, 102.0);
    }

    #[tokio::test]
    async fn test_retry_policy_gives_up_after_max_attempts() {
        let view = SharedMarketView::shared(["a"]);
        let feed = PriceFeed::new("a", SYMBOL, Arc::clone(&view), fast_retry(2)).unwrap();
        let stream = ScriptedQuoteStream::new(
            "mock",
            vec![Err(ExchangeError::StreamClosed("mock".into()))],
        )
        .with_reconnect_results(vec![
            Err(ExchangeError::ConnectionFailed("down 1".into())),
            Err(ExchangeError::ConnectionFailed("down 2".into())),
        ]);
        let (_tx, rx) = broadcast::channel(1);

        let (exit, _) = feed.run(stream, rx).await;
        match exit {
            FeedExit::Failed(e) => assert!(e.to_string().contains("down 2"), "Got: {}", e),
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_pending_read() {
        let view = SharedMarketView::shared(["a"]);
        let feed = PriceFeed::new("a", SYMBOL, Arc::clone(&view), FeedErrorPolicy::Stop).unwrap();
        let stream = ScriptedQuoteStream::new("mock", vec![Ok(quote_at(100.0, 1))]).hanging();
        let (tx, rx) = broadcast::channel(1);

        let handle = spawn_feed(feed, stream, rx);
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(()).unwrap();

        let (exit, stats) = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("feed did not stop")
            .unwrap();
        assert!(matches!(exit, FeedExit::Shutdown));
        assert_eq!(stats.appended, 1);
    }

    #[tokio::test]
    async fn test_one_feed_failing_leaves_other_running() {
        let view = SharedMarketView::shared(["a", "b"]);
        let (tx, _) = broadcast::channel::<()>(1);

        let failing = PriceFeed::new("a", SYMBOL, Arc::clone(&view), FeedErrorPolicy::Stop).unwrap();
        let healthy = PriceFeed::new("b", SYMBOL, Arc::clone(&view), FeedErrorPolicy::Stop).unwrap();

        let a = spawn_feed(
            failing,
            ScriptedQuoteStream::new("mock-a", vec![Err(ExchangeError::NetworkTimeout(500))]),
            tx.subscribe(),
        );
        let b = spawn_feed(
            healthy,
            ScriptedQuoteStream::new("mock-b", vec![Ok(quote_at(10.0, 1)), Ok(quote_at(11.0, 2))])
                .hanging(),
            tx.subscribe(),
        );

        let (exit_a, _) = a.await.unwrap();
        assert!(matches!(exit_a, FeedExit::Failed(_)));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!b.is_finished());
        assert_eq!(view.len("b").await, 2);

        tx.send(()).unwrap();
        let (exit_b, _) = b.await.unwrap();
        assert!(matches!(exit_b, FeedExit::Shutdown));
    }
}
