//! Core module - market view, feeds, engine, virtual accounts, scheduling
//!
//! Uses explicit re-exports rather than glob exports so the public API stays
//! visible in one place. Prefer importing from `crate::core`:
//! ```ignore
//! use crate::core::{ArbitrageEngine, SharedMarketView, PriceFeed};
//! ```

pub mod account;
pub mod engine;
pub mod feed;
pub mod market;
pub mod metrics;
pub mod report;
pub mod scheduler;
pub mod types;

// Explicit re-exports for types module
pub use types::{
    current_time_ms, PositionState, PriceSample, Side, TradeKind, TradeRecord, VenueLabel,
    VenueSeries,
};

// Explicit re-exports for market module
pub use market::{MarketViewError, SharedMarket, SharedMarketView};

// Explicit re-exports for account module
pub use account::{AccountError, VirtualAccount};

// Explicit re-exports for engine module
pub use engine::{ArbitrageEngine, EngineConfig, EngineSnapshot, TickError, TickOutcome};

// Explicit re-exports for feed module
pub use feed::{spawn_feed, FeedExit, FeedStats, PriceFeed};

// Explicit re-exports for scheduler module
pub use scheduler::{spawn_scheduler, EvaluationScheduler, SchedulerStats, SharedEngine};

// Explicit re-exports for report module
pub use report::{log_snapshot, report_task};

pub use metrics::max_drawdown;
