//! Integration tests for the loader facade feeding the dashboard aggregates.
//!
//! A 60-distillery directory is served from a `StaticTransport`; every other
//! distillery has a two-row series, the rest return `[]`.

use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use whiskydash_core::data::{StaticTransport, WhiskyHunterClient};
use whiskydash_runner::{
    available_distilleries, compare, market_overview, overview, rankings, DatasetLoader,
    DEFAULT_RANKING_LIMIT,
};

const BASE: &str = "http://dash.local/api";
const DISTILLERIES: usize = 60;

fn slug(i: usize) -> String {
    format!("d-{i:02}")
}

fn fixture() -> StaticTransport {
    let directory: Vec<Value> = (0..DISTILLERIES)
        .map(|i| {
            json!({
                "name": format!("Distillery {i:02}"),
                "slug": slug(i),
                "country": if i % 3 == 0 { "Japan" } else { "Scotland" },
                // d-00 rated highest, falling by 0.5 per entry
                "whiskybase_rating": format!("{:.1}", 95.0 - i as f64 * 0.5),
                "whiskybase_votes": (100 + i).to_string(),
                "whiskybase_whiskies": null
            })
        })
        .collect();

    let mut t = StaticTransport::new().with_json(format!("{BASE}/distilleries_info/"), Value::Array(directory));
    for i in 0..DISTILLERIES {
        let url = format!("{BASE}/distillery_data/{}/", slug(i));
        let body = if i % 2 == 0 {
            json!([
                {
                    "dt": "2024-01-31",
                    "name": format!("Distillery {i:02}"),
                    "slug": slug(i),
                    "winning_bid_mean": (100 + i).to_string(),
                    "trading_volume": "1000",
                    "lots_count": 4
                },
                {
                    "dt": "2024-02-29",
                    "name": format!("Distillery {i:02}"),
                    "slug": slug(i),
                    "winning_bid_mean": (120 + i).to_string(),
                    "trading_volume": "2000",
                    "lots_count": "6"
                }
            ])
        } else {
            json!([])
        };
        t = t.with_json(url, body);
    }
    t
}

fn loader() -> DatasetLoader<StaticTransport> {
    DatasetLoader::new(WhiskyHunterClient::new(fixture(), BASE), Duration::ZERO)
}

#[test]
fn repeated_load_makes_one_request_per_distillery() {
    let l = loader();

    let first = l.load_dataset(50).unwrap();
    let second = l.load_dataset(50).unwrap();
    assert_eq!(first, second);

    let t = l.client().transport();
    // one directory request + 50 series requests, nothing on the second call
    assert_eq!(t.request_count(), 51);
    let distinct: HashSet<String> = t.requests().into_iter().collect();
    assert_eq!(distinct.len(), 51);

    // only even-numbered distilleries in the top 50 have data
    assert_eq!(first.slugs().len(), 25);
    assert_eq!(first.len(), 50);
    assert!(!first.contains_slug(&slug(1)));
    assert!(!first.contains_slug(&slug(50)));

    let report = l.last_report(50).unwrap();
    assert_eq!(report.selected.len(), 50);
    assert_eq!(report.with_data.len(), 25);
    assert_eq!(report.empty.len(), 25);
    assert!(report.all_succeeded());
}

#[test]
fn aggregates_over_a_loaded_dataset() {
    let l = loader();
    let directory = l.load_directory();
    let dataset = l.load_dataset(10).unwrap();

    let o = overview(&directory);
    assert_eq!(o.distillery_count, DISTILLERIES);
    assert_eq!(o.countries[0], ("Scotland".to_string(), 40));
    assert_eq!(o.countries[1], ("Japan".to_string(), 20));

    let m = market_overview(&dataset);
    assert_eq!(m.distilleries_with_data, 5);
    assert_eq!(m.mean_trading_volume, Some(1500.0));

    let available = available_distilleries(&directory, &dataset);
    let names: Vec<&str> = available.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Distillery 00", "Distillery 02", "Distillery 04", "Distillery 06", "Distillery 08"]
    );

    let r = rankings(&directory, &dataset, DEFAULT_RANKING_LIMIT);
    assert_eq!(r.by_rating.len(), DEFAULT_RANKING_LIMIT);
    assert_eq!(r.by_rating[0].slug, "d-00");
    assert_eq!(r.by_rating[0].value, 95.0);
    assert_eq!(r.by_mean_price.len(), 5);
    assert_eq!(r.by_mean_price[0].slug, "d-08");
    assert_eq!(r.by_mean_price[0].value, 118.0);
    assert_eq!(r.by_total_volume[0].value, 3000.0);

    let c = compare(&directory, &dataset, &["d-00", "d-01"]);
    assert_eq!(c.len(), 1);
    assert_eq!(c[0].name, "Distillery 00");
    let lots = c[0].lots_count.unwrap();
    assert_eq!(lots.min, 4.0);
    assert_eq!(lots.max, 6.0);
}

#[test]
fn directory_failure_leaves_every_aggregate_empty() {
    let t = StaticTransport::new().with_status(format!("{BASE}/distilleries_info/"), 500);
    let l = DatasetLoader::new(WhiskyHunterClient::new(t, BASE), Duration::ZERO);

    let directory = l.load_directory();
    let dataset = l.load_dataset(50).unwrap();
    assert!(directory.is_empty());
    assert!(dataset.is_empty());

    assert_eq!(overview(&directory).distillery_count, 0);
    assert_eq!(market_overview(&dataset).mean_price, None);
    let r = rankings(&directory, &dataset, 5);
    assert!(r.by_rating.is_empty() && r.by_mean_price.is_empty() && r.by_total_volume.is_empty());
}
