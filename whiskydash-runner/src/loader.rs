//! Memoized load facade.
//!
//! `DatasetLoader` owns the client and two caches:
//! - the directory, loaded once and shared by every dataset build
//! - combined datasets, keyed by `top_n`
//!
//! A repeated `load_dataset(n)` is served from memory with no network I/O.
//! Nothing expires on its own: callers invalidate or refresh explicitly.
//!
//! Caching policy:
//! - a failed directory fetch is never cached (the next call retries)
//! - a genuinely empty directory is cached like any other answer
//! - a dataset build that came out empty *because* of per-distillery failures
//!   is returned but not cached

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use whiskydash_core::data::{
    build_from_directory, BuildOptions, BuildReport, FetchOutcome, FetchProgress, HttpTransport,
    NoProgress, Transport, WhiskyHunterClient,
};
use whiskydash_core::domain::{CombinedDataset, DirectoryTable};

use crate::config::LoaderConfig;

/// Argument errors from the facade. Fetch problems never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("top_n must be at least 1")]
    InvalidTopN,
}

struct CachedDataset {
    dataset: Arc<CombinedDataset>,
    report: BuildReport,
}

/// Explicit, injectable cache over directory loads and dataset builds.
pub struct DatasetLoader<T> {
    client: WhiskyHunterClient<T>,
    request_delay: Duration,
    progress: Box<dyn FetchProgress>,
    directory: Mutex<Option<Arc<DirectoryTable>>>,
    datasets: Mutex<HashMap<usize, CachedDataset>>,
}

fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DatasetLoader<HttpTransport> {
    /// Loader over the live API as described by `config`.
    pub fn from_config(config: &LoaderConfig) -> Result<Self, whiskydash_core::data::FetchError> {
        let transport = config.http_transport()?;
        let client = WhiskyHunterClient::new(transport, config.base_url.clone());
        Ok(Self::new(client, config.request_delay()))
    }
}

impl<T: Transport> DatasetLoader<T> {
    pub fn new(client: WhiskyHunterClient<T>, request_delay: Duration) -> Self {
        Self {
            client,
            request_delay,
            progress: Box::new(NoProgress),
            directory: Mutex::new(None),
            datasets: Mutex::new(HashMap::new()),
        }
    }

    /// Report per-distillery progress through `progress`.
    pub fn with_progress(mut self, progress: impl FetchProgress + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn client(&self) -> &WhiskyHunterClient<T> {
        &self.client
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// The distillery directory; empty when the fetch failed or had no rows.
    pub fn load_directory(&self) -> Arc<DirectoryTable> {
        let mut slot = lock(&self.directory);
        if let Some(cached) = slot.as_ref() {
            debug!(rows = cached.len(), "directory served from cache");
            return Arc::clone(cached);
        }

        match self.client.fetch_directory() {
            FetchOutcome::Data(table) => {
                let table = Arc::new(table);
                *slot = Some(Arc::clone(&table));
                table
            }
            FetchOutcome::Empty => {
                let table = Arc::new(DirectoryTable::empty());
                *slot = Some(Arc::clone(&table));
                table
            }
            FetchOutcome::Failed(e) => {
                warn!(error = %e, "directory unavailable; returning empty table");
                Arc::new(DirectoryTable::empty())
            }
        }
    }

    /// The combined dataset for the `top_n` highest-rated distilleries.
    ///
    /// An empty dataset means the directory was unavailable or empty, or no
    /// selected distillery had data; [`Self::last_report`] tells them apart.
    pub fn load_dataset(&self, top_n: usize) -> Result<Arc<CombinedDataset>, LoadError> {
        if top_n == 0 {
            return Err(LoadError::InvalidTopN);
        }

        if let Some(cached) = lock(&self.datasets).get(&top_n) {
            debug!(top_n, rows = cached.dataset.len(), "dataset served from cache");
            return Ok(Arc::clone(&cached.dataset));
        }

        let directory = self.load_directory();
        if directory.is_empty() {
            // not cached: the directory cache already records a genuine empty answer
            return Ok(Arc::new(CombinedDataset::empty()));
        }

        let options = BuildOptions {
            top_n,
            request_delay: self.request_delay,
        };
        let build = build_from_directory(&self.client, &directory, &options, self.progress.as_ref());
        let dataset = Arc::new(build.dataset);

        if dataset.is_empty() && build.report.has_failures() {
            warn!(
                top_n,
                failed = build.report.failed.len(),
                "dataset empty because of fetch failures; not caching"
            );
            return Ok(dataset);
        }

        info!(top_n, rows = dataset.len(), "caching dataset");
        lock(&self.datasets).insert(
            top_n,
            CachedDataset {
                dataset: Arc::clone(&dataset),
                report: build.report,
            },
        );
        Ok(dataset)
    }

    /// Drop the cached dataset for `top_n`. Returns whether one was cached.
    pub fn invalidate(&self, top_n: usize) -> bool {
        let removed = lock(&self.datasets).remove(&top_n).is_some();
        if removed {
            info!(top_n, "dataset cache entry invalidated");
        }
        removed
    }

    /// Drop the cached directory. Cached datasets are kept.
    pub fn invalidate_directory(&self) -> bool {
        lock(&self.directory).take().is_some()
    }

    /// Drop everything.
    pub fn clear(&self) {
        lock(&self.directory).take();
        lock(&self.datasets).clear();
        info!("loader cache cleared");
    }

    /// Rebuild the dataset for `top_n`, reloading the directory as well.
    pub fn refresh_dataset(&self, top_n: usize) -> Result<Arc<CombinedDataset>, LoadError> {
        if top_n == 0 {
            return Err(LoadError::InvalidTopN);
        }
        self.invalidate_directory();
        self.invalidate(top_n);
        self.load_dataset(top_n)
    }

    pub fn is_cached(&self, top_n: usize) -> bool {
        lock(&self.datasets).contains_key(&top_n)
    }

    /// Cached `top_n` keys, ascending.
    pub fn cached_top_ns(&self) -> Vec<usize> {
        let mut keys: Vec<usize> = lock(&self.datasets).keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Build report behind the cached dataset for `top_n`.
    pub fn last_report(&self, top_n: usize) -> Option<BuildReport> {
        lock(&self.datasets).get(&top_n).map(|c| c.report.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use whiskydash_core::data::StaticTransport;

    const BASE: &str = "http://test.local/api";

    fn dir_url() -> String {
        format!("{BASE}/distilleries_info/")
    }

    fn series_url(slug: &str) -> String {
        format!("{BASE}/distillery_data/{slug}/")
    }

    fn loader(t: StaticTransport) -> DatasetLoader<StaticTransport> {
        DatasetLoader::new(WhiskyHunterClient::new(t, BASE), Duration::ZERO)
    }

    fn three_distilleries() -> StaticTransport {
        StaticTransport::new()
            .with_json(
                dir_url(),
                json!([
                    { "slug": "a", "name": "A", "whiskybase_rating": "90" },
                    { "slug": "b", "name": "B" },
                    { "slug": "c", "name": "C", "whiskybase_rating": "70" }
                ]),
            )
            .with_json(series_url("a"), json!([{ "dt": "2024-01-31", "winning_bid_mean": "100" }]))
            .with_json(series_url("b"), json!([{ "dt": "2024-01-31", "winning_bid_mean": "50" }]))
            .with_json(series_url("c"), json!([{ "dt": "2024-01-31", "winning_bid_mean": "75" }]))
    }

    #[test]
    fn second_load_hits_the_cache() {
        let l = loader(three_distilleries());

        let first = l.load_dataset(2).unwrap();
        let after_first = l.client().transport().request_count();
        let second = l.load_dataset(2).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(l.client().transport().request_count(), after_first);
        // directory + one request per selected distillery
        assert_eq!(after_first, 3);
        assert_eq!(first.slugs(), vec!["a", "c"]);
    }

    #[test]
    fn directory_is_shared_across_top_n() {
        let l = loader(three_distilleries());

        l.load_dataset(1).unwrap();
        l.load_dataset(3).unwrap();
        l.load_directory();

        let t = l.client().transport();
        assert_eq!(t.count_for(&dir_url()), 1);
        assert_eq!(t.count_for(&series_url("a")), 2);
        assert_eq!(l.cached_top_ns(), vec![1, 3]);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let l = loader(three_distilleries());

        l.load_dataset(2).unwrap();
        assert!(l.is_cached(2));
        assert!(l.invalidate(2));
        assert!(!l.invalidate(2));
        assert!(!l.is_cached(2));

        l.load_dataset(2).unwrap();
        assert_eq!(l.client().transport().count_for(&series_url("a")), 2);
        // directory stayed cached
        assert_eq!(l.client().transport().count_for(&dir_url()), 1);
    }

    #[test]
    fn refresh_reloads_directory_too() {
        let l = loader(three_distilleries());

        l.load_dataset(1).unwrap();
        l.refresh_dataset(1).unwrap();

        assert_eq!(l.client().transport().count_for(&dir_url()), 2);
        assert_eq!(l.client().transport().count_for(&series_url("a")), 2);
    }

    #[test]
    fn clear_drops_everything() {
        let l = loader(three_distilleries());
        l.load_dataset(2).unwrap();
        l.clear();

        assert!(l.cached_top_ns().is_empty());
        l.load_directory();
        assert_eq!(l.client().transport().count_for(&dir_url()), 2);
    }

    #[test]
    fn failed_directory_is_not_cached() {
        let l = loader(StaticTransport::new().with_status(dir_url(), 500));

        assert!(l.load_directory().is_empty());
        assert!(l.load_directory().is_empty());
        assert_eq!(l.client().transport().count_for(&dir_url()), 2);

        assert!(l.load_dataset(5).unwrap().is_empty());
        assert!(!l.is_cached(5));
    }

    #[test]
    fn all_failed_build_is_not_cached() {
        let t = StaticTransport::new()
            .with_json(dir_url(), json!([{ "slug": "a", "whiskybase_rating": 90 }]))
            .with_status(series_url("a"), 503);
        let l = loader(t);

        assert!(l.load_dataset(1).unwrap().is_empty());
        assert!(!l.is_cached(1));
        l.load_dataset(1).unwrap();
        assert_eq!(l.client().transport().count_for(&series_url("a")), 2);
    }

    #[test]
    fn genuinely_empty_build_is_cached() {
        let t = StaticTransport::new()
            .with_json(dir_url(), json!([{ "slug": "x", "whiskybase_rating": 90 }]))
            .with_json(series_url("x"), json!([]));
        let l = loader(t);

        assert!(l.load_dataset(1).unwrap().is_empty());
        assert!(l.is_cached(1));
        let report = l.last_report(1).unwrap();
        assert_eq!(report.empty, vec!["x"]);
    }

    #[test]
    fn zero_top_n_is_an_error() {
        let l = loader(three_distilleries());
        assert_eq!(l.load_dataset(0).unwrap_err(), LoadError::InvalidTopN);
        assert_eq!(l.client().transport().request_count(), 0);
    }
}
