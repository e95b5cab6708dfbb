//! Shared market view
//!
//! Latest price series per tracked venue, shared by every task through an
//! `Arc`. The venue set is fixed at construction and each venue has its own
//! `RwLock`, so the two feeds never contend with each other; only a feed and
//! a reader of the same venue do.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use super::types::{PriceSample, VenueLabel, VenueSeries};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketViewError {
    #[error("Unknown venue: {0}")]
    UnknownVenue(String),
}

/// Concurrent venue-label -> series map
#[derive(Debug)]
pub struct SharedMarketView {
    series: HashMap<VenueLabel, RwLock<VenueSeries>>,
    /// Registration order, for stable iteration
    labels: Vec<VenueLabel>,
}

/// Shared handle injected into feeds, engine and presenters
pub type SharedMarket = Arc<SharedMarketView>;

impl SharedMarketView {
    /// Register the tracked venues (duplicates are ignored)
    pub fn new<I, S>(venues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut series = HashMap::new();
        let mut labels = Vec::new();
        for venue in venues {
            let label: VenueLabel = Arc::from(venue.as_ref());
            if !series.contains_key(&label) {
                series.insert(label.clone(), RwLock::new(VenueSeries::new()));
                labels.push(label);
            }
        }
        Self { series, labels }
    }

    /// Convenience constructor returning the shared handle
    pub fn shared<I, S>(venues: I) -> SharedMarket
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Arc::new(Self::new(venues))
    }

    fn entry(&self, venue: &str) -> Result<&RwLock<VenueSeries>, MarketViewError> {
        self.series
            .get(venue)
            .ok_or_else(|| MarketViewError::UnknownVenue(venue.to_string()))
    }

    /// Append a sample to `venue`'s series
    pub async fn append(&self, venue: &str, sample: PriceSample) -> Result<(), MarketViewError> {
        let mut series = self.entry(venue)?.write().await;
        series.push(sample);
        Ok(())
    }

    /// Newest sample of `venue`, `None` when unknown or empty
    pub async fn latest(&self, venue: &str) -> Option<PriceSample> {
        let series = self.entry(venue).ok()?.read().await;
        series.latest()
    }

    /// Immutable copy of `venue`'s series for presentation
    pub async fn snapshot_series(&self, venue: &str) -> Option<VenueSeries> {
        let series = self.entry(venue).ok()?.read().await;
        Some(series.clone())
    }

    /// Number of samples of `venue` (0 when unknown)
    pub async fn len(&self, venue: &str) -> usize {
        match self.entry(venue) {
            Ok(lock) => lock.read().await.len(),
            Err(_) => 0,
        }
    }

    /// Tracked venues in registration order
    pub fn venues(&self) -> &[VenueLabel] {
        &self.labels
    }
}
