//! WhiskyHunter API client.
//!
//! Two endpoints:
//! - `{base}/distilleries_info/`: the distillery directory
//! - `{base}/distillery_data/{slug}/`: one distillery's auction history
//!
//! Every fetch returns a [`FetchOutcome`]. Transport problems are logged and
//! reported as `Failed`; they never escape as errors or panics.

use super::coerce::{coerce_count, coerce_date, coerce_f64, coerce_string};
use super::provider::{FetchError, FetchOutcome, Transport};
use crate::domain::{DirectoryTable, DistilleryInfo, MarketObservation, SeriesTable};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://whiskyhunter.net/api";

/// Client for the two WhiskyHunter endpoints.
pub struct WhiskyHunterClient<T> {
    transport: T,
    base_url: String,
}

impl<T: Transport> WhiskyHunterClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn directory_url(&self) -> String {
        format!("{}/distilleries_info/", self.base_url)
    }

    pub fn series_url(&self, slug: &str) -> String {
        format!("{}/distillery_data/{slug}/", self.base_url)
    }

    /// Fetch and coerce the distillery directory.
    pub fn fetch_directory(&self) -> FetchOutcome<DirectoryTable> {
        let url = self.directory_url();
        let items = match self.get_array(&url) {
            FetchOutcome::Data(items) => items,
            FetchOutcome::Empty => {
                info!(url = %url, "directory endpoint returned no rows");
                return FetchOutcome::Empty;
            }
            FetchOutcome::Failed(e) => {
                error!(url = %url, error = %e, "failed to load distillery directory");
                return FetchOutcome::Failed(e);
            }
        };

        let total = items.len();
        let rows: Vec<DistilleryInfo> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let parsed = parse_distillery(item);
                if parsed.is_none() {
                    warn!(index = i, "skipping directory entry without a usable slug");
                }
                parsed
            })
            .collect();

        let (table, duplicates) = DirectoryTable::from_rows(rows);
        for slug in &duplicates {
            warn!(slug = %slug, "duplicate slug in directory; keeping first entry");
        }

        if table.is_empty() {
            warn!(url = %url, total, "directory had entries but none were usable");
            return FetchOutcome::Empty;
        }

        info!(rows = table.len(), "loaded distillery directory");
        FetchOutcome::Data(table)
    }

    /// Fetch and coerce one distillery's historical series.
    pub fn fetch_series(&self, slug: &str) -> FetchOutcome<SeriesTable> {
        if slug.trim().is_empty() || slug.contains('/') {
            let e = FetchError::InvalidSlug(slug.to_string());
            warn!(error = %e, "refusing to fetch series");
            return FetchOutcome::Failed(e);
        }

        let url = self.series_url(slug);
        match self.get_array(&url) {
            FetchOutcome::Data(items) => {
                let rows: Vec<MarketObservation> = items
                    .iter()
                    .filter_map(|item| {
                        let parsed = parse_observation(item, slug);
                        if parsed.is_none() {
                            warn!(slug, "skipping non-object series entry");
                        }
                        parsed
                    })
                    .collect();
                if rows.is_empty() {
                    return FetchOutcome::Empty;
                }
                debug!(slug, rows = rows.len(), "loaded series");
                FetchOutcome::Data(SeriesTable::new(slug, rows))
            }
            FetchOutcome::Empty => {
                debug!(slug, "series endpoint returned no rows");
                FetchOutcome::Empty
            }
            FetchOutcome::Failed(e) => {
                error!(slug, error = %e, "failed to load distillery series");
                FetchOutcome::Failed(e)
            }
        }
    }

    /// GET a URL and expect a JSON array; `null` and `[]` are `Empty`.
    fn get_array(&self, url: &str) -> FetchOutcome<Vec<Value>> {
        match self.transport.get_json(url) {
            Ok(Value::Null) => FetchOutcome::Empty,
            Ok(Value::Array(items)) if items.is_empty() => FetchOutcome::Empty,
            Ok(Value::Array(items)) => FetchOutcome::Data(items),
            Ok(other) => FetchOutcome::Failed(FetchError::UnexpectedShape(format!(
                "expected a JSON array from {url}, got {}",
                json_kind(&other)
            ))),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a Value {
    obj.get(key).unwrap_or(&Value::Null)
}

/// Coerce one directory element. `None` when it is not an object or has no slug.
fn parse_distillery(item: &Value) -> Option<DistilleryInfo> {
    let obj = item.as_object()?;
    let slug = coerce_string(field(obj, "slug"))?;

    Some(DistilleryInfo {
        name: coerce_string(field(obj, "name")).unwrap_or_default(),
        slug,
        country: coerce_string(field(obj, "country")),
        whiskybase_rating: coerce_f64(field(obj, "whiskybase_rating")),
        whiskybase_votes: coerce_count(field(obj, "whiskybase_votes")),
        whiskybase_whiskies: coerce_count(field(obj, "whiskybase_whiskies")),
    })
}

/// Coerce one series element. The requested slug fills in when the record has none.
fn parse_observation(item: &Value, requested_slug: &str) -> Option<MarketObservation> {
    let obj = item.as_object()?;

    Some(MarketObservation {
        slug: coerce_string(field(obj, "slug")).unwrap_or_else(|| requested_slug.to_string()),
        name: coerce_string(field(obj, "name")),
        dt: coerce_date(field(obj, "dt")),
        winning_bid_mean: coerce_f64(field(obj, "winning_bid_mean")),
        winning_bid_min: coerce_f64(field(obj, "winning_bid_min")),
        winning_bid_max: coerce_f64(field(obj, "winning_bid_max")),
        trading_volume: coerce_f64(field(obj, "trading_volume")),
        lots_count: coerce_count(field(obj, "lots_count")),
    })
}
