//! Whiskydash Runner: memoized loading, configuration and dashboard aggregates.
//!
//! This crate builds on `whiskydash-core` to provide:
//! - A TOML-backed loader configuration
//! - `DatasetLoader`, an explicit cache over directory loads and dataset builds
//! - Overview metrics, descriptive statistics, comparisons and rankings

pub mod analytics;
pub mod config;
pub mod loader;

pub use analytics::{
    available_distilleries, compare, describe, distillery_series, market_overview, overview,
    rankings, top_by_mean_price, top_by_rating, top_by_total_volume, ColumnStats,
    ComparisonEntry, DirectoryColumn, MarketOverview, Overview, RankingEntry, Rankings,
    DEFAULT_RANKING_LIMIT,
};
pub use config::{ConfigError, LoaderConfig};
pub use loader::{DatasetLoader, LoadError};
