//! Bounded reconnection with exponential backoff
//!
//! Only used when a feed runs with the `retry` error policy. Delays double
//! per attempt (500ms, 1000ms, 2000ms...) up to `max_delay_ms`, plus random
//! jitter so two feeds dropped by the same outage do not reconnect in lockstep.

use std::time::Duration;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::QuoteStream;

/// Configuration for reconnection attempts
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Maximum number of reconnection attempts
    pub max_attempts: u32,
    /// Initial delay in milliseconds (doubles each attempt)
    pub initial_delay_ms: u64,
    /// Maximum delay cap in milliseconds
    pub max_delay_ms: u64,
    /// Upper bound (exclusive) of the random jitter added to each delay
    pub max_jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            max_jitter_ms: 200,
        }
    }
}

/// Delay before attempt number `attempt` (0-based), without jitter
pub fn backoff_delay(config: &ReconnectConfig, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let base = config.initial_delay_ms.saturating_mul(factor);
    Duration::from_millis(base.min(config.max_delay_ms))
}

/// Reconnect `stream` with exponential backoff and jitter
///
/// # Returns
/// * `Ok(())` - Reconnection successful
/// * `Err(ExchangeError)` - All attempts failed (last error returned)
pub async fn reconnect_stream<S>(
    config: &ReconnectConfig,
    label: &str,
    stream: &mut S,
) -> ExchangeResult<()>
where
    S: QuoteStream + ?Sized,
{
    let mut last_error: Option<ExchangeError> = None;

    for attempt in 0..config.max_attempts {
        let jitter = if config.max_jitter_ms > 0 {
            rand::random::<u64>() % config.max_jitter_ms
        } else {
            0
        };
        let delay = backoff_delay(config, attempt) + Duration::from_millis(jitter);

        tracing::info!(
            venue = %label,
            attempt = attempt + 1,
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "[FEED] Reconnect attempt"
        );

        tokio::time::sleep(delay).await;

        match stream.reconnect().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(
                    venue = %label,
                    attempt = attempt + 1,
                    error = %e,
                    "[FEED] Reconnect attempt failed"
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        ExchangeError::ConnectionFailed("Reconnection failed after max attempts".into())
    }))
}
