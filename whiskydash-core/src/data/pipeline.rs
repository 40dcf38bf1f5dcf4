//! Top-N aggregation pipeline.
//!
//! directory → rank by rating → paced per-distillery series fetch → concat.
//!
//! The loop is strictly sequential: each series fetch completes and the fixed
//! delay elapses before the next request starts. Per-distillery failures are
//! recorded in the [`BuildReport`] and never abort the batch.

use super::client::WhiskyHunterClient;
use super::pacing::PacedExt;
use super::provider::{FetchError, FetchOutcome, FetchProgress, Transport};
use crate::domain::{CombinedDataset, DirectoryTable, DistilleryInfo, SeriesTable, Slug};
use std::cmp::Ordering;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_TOP_N: usize = 50;
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Options for a dataset build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Number of highest-rated distilleries to fetch series for.
    pub top_n: usize,
    /// Fixed pause between consecutive series requests.
    pub request_delay: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }
}

/// What happened to each selected distillery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Slugs selected for fetching, in ranking order.
    pub selected: Vec<Slug>,
    /// Slugs whose series contributed rows.
    pub with_data: Vec<Slug>,
    /// Slugs whose series came back empty.
    pub empty: Vec<Slug>,
    /// Slugs whose fetch failed, with the cause.
    pub failed: Vec<(Slug, FetchError)>,
}

impl BuildReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A combined dataset together with the report of how it was built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetBuild {
    pub dataset: CombinedDataset,
    pub report: BuildReport,
}

/// Compare two optional ratings: higher first, missing last.
fn rating_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The `top_n` highest-rated distilleries, best first.
///
/// Missing ratings sort after every rated entry; ties keep directory order.
/// Returns fewer than `top_n` entries when the directory is smaller.
pub fn select_top(directory: &DirectoryTable, top_n: usize) -> Vec<&DistilleryInfo> {
    let mut ranked: Vec<&DistilleryInfo> = directory.iter().collect();
    ranked.sort_by(|a, b| rating_order(a.whiskybase_rating, b.whiskybase_rating));
    ranked.truncate(top_n);
    ranked
}

/// Fetch the directory, then build the combined dataset for its top `top_n`.
///
/// `Failed` and `Empty` describe the directory fetch. A `Data` build can still
/// hold an empty dataset when no selected distillery returned rows; its report
/// says whether that was due to failures.
pub fn build_dataset<T: Transport>(
    client: &WhiskyHunterClient<T>,
    options: &BuildOptions,
    progress: &dyn FetchProgress,
) -> FetchOutcome<DatasetBuild> {
    match client.fetch_directory() {
        FetchOutcome::Data(directory) => {
            FetchOutcome::Data(build_from_directory(client, &directory, options, progress))
        }
        FetchOutcome::Empty => {
            warn!("directory is empty; nothing to build");
            FetchOutcome::Empty
        }
        FetchOutcome::Failed(e) => FetchOutcome::Failed(e),
    }
}

/// Build the combined dataset for an already-loaded directory.
pub fn build_from_directory<T: Transport>(
    client: &WhiskyHunterClient<T>,
    directory: &DirectoryTable,
    options: &BuildOptions,
    progress: &dyn FetchProgress,
) -> DatasetBuild {
    let selected = select_top(directory, options.top_n);
    let total = selected.len();
    info!(
        requested = options.top_n,
        selected = total,
        delay_ms = options.request_delay.as_millis() as u64,
        "loading series for top-rated distilleries"
    );

    let mut report = BuildReport {
        selected: selected.iter().map(|d| d.slug.clone()).collect(),
        ..BuildReport::default()
    };
    let mut collected: Vec<SeriesTable> = Vec::with_capacity(total);

    for (i, distillery) in selected.into_iter().enumerate().paced(options.request_delay) {
        let slug = distillery.slug.as_str();
        progress.on_start(slug, i, total);

        let outcome = client.fetch_series(slug);
        let summary = match &outcome {
            FetchOutcome::Data(series) => FetchOutcome::Data(series.len()),
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(e) => FetchOutcome::Failed(e.clone()),
        };
        progress.on_complete(slug, i, total, &summary);

        match outcome {
            FetchOutcome::Data(series) => {
                report.with_data.push(slug.to_string());
                collected.push(series);
            }
            FetchOutcome::Empty => report.empty.push(slug.to_string()),
            FetchOutcome::Failed(e) => report.failed.push((slug.to_string(), e)),
        }
    }

    progress.on_batch_complete(
        report.with_data.len(),
        report.empty.len(),
        report.failed.len(),
        total,
    );

    let dataset = CombinedDataset::concat(collected);
    if dataset.is_empty() {
        warn!(
            selected = total,
            failed = report.failed.len(),
            "no distillery returned series data"
        );
    } else {
        info!(
            rows = dataset.len(),
            distilleries = report.with_data.len(),
            "combined dataset built"
        );
    }

    DatasetBuild { dataset, report }
}
