//! Transport trait, fetch outcomes and structured error types.
//!
//! The Transport trait abstracts over how JSON reaches the client (live HTTP,
//! canned fixtures) so the pipeline can be exercised without a network.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// Structured error types for fetch operations.
///
/// Every variant is recoverable: callers degrade to an empty table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("response format changed: {0}")]
    UnexpectedShape(String),

    #[error("invalid distillery slug: {0:?}")]
    InvalidSlug(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Result of a single fetch, keeping "no data" apart from "fetch failed".
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The endpoint answered with at least one row.
    Data(T),
    /// The endpoint answered, but with `null`, an empty body, or `[]`.
    Empty,
    /// The request did not produce a usable response.
    Failed(FetchError),
}

impl<T> FetchOutcome<T> {
    pub fn is_data(&self) -> bool {
        matches!(self, FetchOutcome::Data(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FetchOutcome::Empty)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Data(t) => FetchOutcome::Data(f(t)),
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(e) => FetchOutcome::Failed(e),
        }
    }

    /// Short label for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchOutcome::Data(_) => "data",
            FetchOutcome::Empty => "empty",
            FetchOutcome::Failed(_) => "failed",
        }
    }
}

impl<T: Default> FetchOutcome<T> {
    /// Collapse into a table; `Empty` and `Failed` both become the empty table.
    pub fn into_table(self) -> T {
        match self {
            FetchOutcome::Data(t) => t,
            FetchOutcome::Empty | FetchOutcome::Failed(_) => T::default(),
        }
    }
}

/// Source of decoded JSON bodies.
///
/// Implementations return `Value::Null` for an empty body and map every
/// transport-level problem (connect, timeout, non-2xx, undecodable body) to a
/// [`FetchError`].
pub trait Transport: Send + Sync {
    fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        (**self).get_json(url)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        (**self).get_json(url)
    }
}

/// Progress callback for the per-distillery fetch loop.
pub trait FetchProgress: Send + Sync {
    /// Called when starting to fetch a distillery's series.
    fn on_start(&self, slug: &str, index: usize, total: usize);

    /// Called when a fetch completes; `Data` carries the row count.
    fn on_complete(&self, slug: &str, index: usize, total: usize, outcome: &FetchOutcome<usize>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, with_data: usize, empty: usize, failed: usize, total: usize);
}

/// Progress reporter that writes through `tracing`.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_start(&self, slug: &str, index: usize, total: usize) {
        info!(slug, "[{}/{}] fetching series", index + 1, total);
    }

    fn on_complete(&self, slug: &str, _index: usize, _total: usize, outcome: &FetchOutcome<usize>) {
        match outcome {
            FetchOutcome::Data(rows) => info!(slug, rows, "series fetched"),
            FetchOutcome::Empty => info!(slug, "no series data"),
            FetchOutcome::Failed(e) => warn!(slug, error = %e, "series fetch failed"),
        }
    }

    fn on_batch_complete(&self, with_data: usize, empty: usize, failed: usize, total: usize) {
        info!(with_data, empty, failed, total, "series batch complete");
    }
}

/// Progress reporter that does nothing.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _slug: &str, _index: usize, _total: usize) {}

    fn on_complete(&self, _slug: &str, _index: usize, _total: usize, _outcome: &FetchOutcome<usize>) {}

    fn on_batch_complete(&self, _with_data: usize, _empty: usize, _failed: usize, _total: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_table_collapses_empty_and_failed() {
        let data: FetchOutcome<Vec<u8>> = FetchOutcome::Data(vec![1, 2]);
        let empty: FetchOutcome<Vec<u8>> = FetchOutcome::Empty;
        let failed: FetchOutcome<Vec<u8>> =
            FetchOutcome::Failed(FetchError::NetworkUnreachable("dns".into()));

        assert_eq!(data.into_table(), vec![1, 2]);
        assert!(empty.into_table().is_empty());
        assert!(failed.into_table().is_empty());
    }

    #[test]
    fn kind_and_error_accessors() {
        let failed: FetchOutcome<()> = FetchOutcome::Failed(FetchError::HttpStatus {
            status: 500,
            url: "http://x/".into(),
        });
        assert_eq!(failed.kind(), "failed");
        assert!(failed.is_failed());
        assert_eq!(failed.error().unwrap().to_string(), "HTTP 500 from http://x/");

        let mapped = FetchOutcome::Data(2).map(|n| n * 10);
        assert_eq!(mapped, FetchOutcome::Data(20));
        assert!(FetchOutcome::<u8>::Empty.is_empty());
    }
}
