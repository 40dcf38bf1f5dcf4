//! Dashboard aggregates over the directory and the combined dataset.
//!
//! Overview metrics, descriptive statistics, per-distillery views,
//! cross-distillery comparison and the three rankings. Missing values are
//! skipped everywhere; an aggregate over nothing is `None`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use whiskydash_core::domain::{CombinedDataset, DirectoryTable, DistilleryInfo, MarketObservation};

pub const DEFAULT_RANKING_LIMIT: usize = 10;

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ── Descriptive statistics ───────────────────────────────────────────

/// Summary statistics of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Describe the present values; `None` when every value is missing.
pub fn describe(values: impl IntoIterator<Item = Option<f64>>) -> Option<ColumnStats> {
    let mut v: Vec<f64> = values.into_iter().flatten().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));

    let count = v.len();
    let mean = v.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let ss: f64 = v.iter().map(|x| (x - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    Some(ColumnStats {
        count,
        mean,
        std,
        min: v[0],
        p25: quantile(&v, 0.25),
        median: quantile(&v, 0.5),
        p75: quantile(&v, 0.75),
        max: v[count - 1],
    })
}

/// Numeric directory columns available for descriptive statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryColumn {
    WhiskybaseRating,
    WhiskybaseVotes,
    WhiskybaseWhiskies,
}

impl DirectoryColumn {
    pub const ALL: [DirectoryColumn; 3] = [
        DirectoryColumn::WhiskybaseRating,
        DirectoryColumn::WhiskybaseVotes,
        DirectoryColumn::WhiskybaseWhiskies,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DirectoryColumn::WhiskybaseRating => "whiskybase_rating",
            DirectoryColumn::WhiskybaseVotes => "whiskybase_votes",
            DirectoryColumn::WhiskybaseWhiskies => "whiskybase_whiskies",
        }
    }

    pub fn value(&self, d: &DistilleryInfo) -> Option<f64> {
        match self {
            DirectoryColumn::WhiskybaseRating => d.whiskybase_rating,
            DirectoryColumn::WhiskybaseVotes => d.whiskybase_votes.map(|v| v as f64),
            DirectoryColumn::WhiskybaseWhiskies => d.whiskybase_whiskies.map(|v| v as f64),
        }
    }

    pub fn describe(&self, directory: &DirectoryTable) -> Option<ColumnStats> {
        describe(directory.iter().map(|d| self.value(d)))
    }
}

// ── Overviews ────────────────────────────────────────────────────────

/// Headline numbers for the distillery directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub distillery_count: usize,
    pub mean_rating: Option<f64>,
    pub mean_votes: Option<f64>,
    /// Distilleries per country, most first; ties by country name.
    pub countries: Vec<(String, usize)>,
}

pub fn overview(directory: &DirectoryTable) -> Overview {
    let mut by_country: BTreeMap<String, usize> = BTreeMap::new();
    for d in directory {
        let country = d.country.clone().unwrap_or_else(|| "Unknown".to_string());
        *by_country.entry(country).or_default() += 1;
    }
    let mut countries: Vec<(String, usize)> = by_country.into_iter().collect();
    // BTreeMap order is by name, so a stable sort on count keeps name ties sorted
    countries.sort_by(|a, b| b.1.cmp(&a.1));

    Overview {
        distillery_count: directory.len(),
        mean_rating: mean(directory.iter().filter_map(|d| d.whiskybase_rating)),
        mean_votes: mean(directory.iter().filter_map(|d| d.whiskybase_votes.map(|v| v as f64))),
        countries,
    }
}

/// Headline numbers for the combined market dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub observation_count: usize,
    pub distilleries_with_data: usize,
    pub mean_price: Option<f64>,
    pub mean_trading_volume: Option<f64>,
}

pub fn market_overview(dataset: &CombinedDataset) -> MarketOverview {
    MarketOverview {
        observation_count: dataset.len(),
        distilleries_with_data: dataset.slugs().len(),
        mean_price: mean(dataset.rows().iter().filter_map(|o| o.winning_bid_mean)),
        mean_trading_volume: mean(dataset.rows().iter().filter_map(|o| o.trading_volume)),
    }
}

// ── Per-distillery views ─────────────────────────────────────────────

/// Directory entries that have rows in the dataset, sorted by name.
pub fn available_distilleries<'a>(
    directory: &'a DirectoryTable,
    dataset: &CombinedDataset,
) -> Vec<&'a DistilleryInfo> {
    let mut out: Vec<&DistilleryInfo> = directory
        .iter()
        .filter(|d| dataset.contains_slug(&d.slug))
        .collect();
    out.sort_by(|a, b| a.display_name().cmp(b.display_name()));
    out
}

/// One distillery's observations in dataset order.
pub fn distillery_series<'a>(dataset: &'a CombinedDataset, slug: &'a str) -> Vec<&'a MarketObservation> {
    dataset.series_for(slug).collect()
}

/// Summary statistics for one distillery in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub slug: String,
    pub name: String,
    pub observations: usize,
    pub price: Option<ColumnStats>,
    pub trading_volume: Option<ColumnStats>,
    pub lots_count: Option<ColumnStats>,
}

/// Compare the requested distilleries; slugs without data are left out.
pub fn compare(
    directory: &DirectoryTable,
    dataset: &CombinedDataset,
    slugs: &[&str],
) -> Vec<ComparisonEntry> {
    slugs
        .iter()
        .filter_map(|&slug| {
            let rows = distillery_series(dataset, slug);
            if rows.is_empty() {
                return None;
            }
            Some(ComparisonEntry {
                slug: slug.to_string(),
                name: display_name(directory, &rows, slug),
                observations: rows.len(),
                price: describe(rows.iter().map(|o| o.winning_bid_mean)),
                trading_volume: describe(rows.iter().map(|o| o.trading_volume)),
                lots_count: describe(rows.iter().map(|o| o.lots_count.map(|n| n as f64))),
            })
        })
        .collect()
}

fn display_name(directory: &DirectoryTable, rows: &[&MarketObservation], slug: &str) -> String {
    directory
        .get(slug)
        .map(|d| d.display_name().to_string())
        .or_else(|| rows.iter().find_map(|o| o.name.clone()))
        .unwrap_or_else(|| slug.to_string())
}

// ── Rankings ─────────────────────────────────────────────────────────

/// One row of a ranking, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based position.
    pub rank: usize,
    pub slug: String,
    pub name: String,
    pub value: f64,
}

fn ranked(mut scored: Vec<(String, String, f64)>, limit: usize) -> Vec<RankingEntry> {
    scored.sort_by(|a, b| b.2.total_cmp(&a.2));
    scored
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (slug, name, value))| RankingEntry {
            rank: i + 1,
            slug,
            name,
            value,
        })
        .collect()
}

/// Per-slug values from the dataset, in first-appearance order.
fn grouped_values(
    dataset: &CombinedDataset,
    pick: impl Fn(&MarketObservation) -> Option<f64>,
) -> Vec<(String, Vec<f64>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for o in dataset.rows() {
        if !groups.contains_key(o.slug.as_str()) {
            order.push(o.slug.clone());
        }
        let values = groups.entry(o.slug.as_str()).or_default();
        if let Some(v) = pick(o) {
            values.push(v);
        }
    }
    order
        .into_iter()
        .map(|slug| {
            let values = groups.remove(slug.as_str()).unwrap_or_default();
            (slug, values)
        })
        .collect()
}

/// Highest Whiskybase rating; unrated distilleries are left out.
pub fn top_by_rating(directory: &DirectoryTable, limit: usize) -> Vec<RankingEntry> {
    let scored = directory
        .iter()
        .filter_map(|d| {
            d.whiskybase_rating
                .map(|r| (d.slug.clone(), d.display_name().to_string(), r))
        })
        .collect();
    ranked(scored, limit)
}

/// Highest mean winning bid across each distillery's observations.
pub fn top_by_mean_price(
    directory: &DirectoryTable,
    dataset: &CombinedDataset,
    limit: usize,
) -> Vec<RankingEntry> {
    let scored = grouped_values(dataset, |o| o.winning_bid_mean)
        .into_iter()
        .filter_map(|(slug, values)| {
            let m = mean(values)?;
            let name = name_for(directory, dataset, &slug);
            Some((slug, name, m))
        })
        .collect();
    ranked(scored, limit)
}

/// Highest total trading volume across each distillery's observations.
pub fn top_by_total_volume(
    directory: &DirectoryTable,
    dataset: &CombinedDataset,
    limit: usize,
) -> Vec<RankingEntry> {
    let scored = grouped_values(dataset, |o| o.trading_volume)
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(slug, values)| {
            let total: f64 = values.iter().sum();
            let name = name_for(directory, dataset, &slug);
            (slug, name, total)
        })
        .collect();
    ranked(scored, limit)
}

fn name_for(directory: &DirectoryTable, dataset: &CombinedDataset, slug: &str) -> String {
    let rows = distillery_series(dataset, slug);
    display_name(directory, &rows, slug)
}

/// All three rankings together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    pub by_rating: Vec<RankingEntry>,
    pub by_mean_price: Vec<RankingEntry>,
    pub by_total_volume: Vec<RankingEntry>,
}

pub fn rankings(directory: &DirectoryTable, dataset: &CombinedDataset, limit: usize) -> Rankings {
    Rankings {
        by_rating: top_by_rating(directory, limit),
        by_mean_price: top_by_mean_price(directory, dataset, limit),
        by_total_volume: top_by_total_volume(directory, dataset, limit),
    }
}
