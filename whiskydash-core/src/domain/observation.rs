//! Market observations: one row per distillery per auction date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single market data point for one distillery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketObservation {
    /// Owning distillery. Not checked against the directory.
    pub slug: String,
    /// Distillery name when the series endpoint echoes it.
    pub name: Option<String>,
    pub dt: Option<NaiveDate>,
    pub winning_bid_mean: Option<f64>,
    pub winning_bid_min: Option<f64>,
    pub winning_bid_max: Option<f64>,
    pub trading_volume: Option<f64>,
    pub lots_count: Option<u64>,
}

/// Historical series for a single distillery, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesTable {
    slug: String,
    rows: Vec<MarketObservation>,
}

impl SeriesTable {
    pub fn new(slug: impl Into<String>, rows: Vec<MarketObservation>) -> Self {
        Self {
            slug: slug.into(),
            rows,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn rows(&self) -> &[MarketObservation] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<MarketObservation> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Concatenated series across the top-N selection.
///
/// Rows are grouped by distillery in selection order; each group keeps the
/// row order of its series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedDataset {
    rows: Vec<MarketObservation>,
}

impl CombinedDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Concatenate per-distillery series, skipping empty ones.
    pub fn concat(series: impl IntoIterator<Item = SeriesTable>) -> Self {
        let rows = series
            .into_iter()
            .filter(|s| !s.is_empty())
            .flat_map(SeriesTable::into_rows)
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[MarketObservation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct slugs in first-appearance order.
    pub fn slugs(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !out.contains(&row.slug.as_str()) {
                out.push(&row.slug);
            }
        }
        out
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.rows.iter().any(|r| r.slug == slug)
    }

    /// Observations belonging to one distillery.
    pub fn series_for<'a>(&'a self, slug: &'a str) -> impl Iterator<Item = &'a MarketObservation> {
        self.rows.iter().filter(move |r| r.slug == slug)
    }
}
