//! Columnar views of the domain tables as Polars DataFrames.
//!
//! Missing values become nulls; `dt` is a `Date` column.

use crate::domain::{CombinedDataset, DirectoryTable, MarketObservation, SeriesTable};
use chrono::NaiveDate;
use polars::prelude::*;

fn days_since_epoch(d: NaiveDate) -> i32 {
    (d - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()).num_days() as i32
}

fn observations_to_dataframe(rows: &[MarketObservation]) -> PolarsResult<DataFrame> {
    let slugs: Vec<&str> = rows.iter().map(|r| r.slug.as_str()).collect();
    let names: Vec<Option<&str>> = rows.iter().map(|r| r.name.as_deref()).collect();
    let dates: Vec<Option<i32>> = rows.iter().map(|r| r.dt.map(days_since_epoch)).collect();
    let means: Vec<Option<f64>> = rows.iter().map(|r| r.winning_bid_mean).collect();
    let mins: Vec<Option<f64>> = rows.iter().map(|r| r.winning_bid_min).collect();
    let maxs: Vec<Option<f64>> = rows.iter().map(|r| r.winning_bid_max).collect();
    let volumes: Vec<Option<f64>> = rows.iter().map(|r| r.trading_volume).collect();
    let lots: Vec<Option<u64>> = rows.iter().map(|r| r.lots_count).collect();

    DataFrame::new(vec![
        Column::new("slug".into(), slugs),
        Column::new("name".into(), names),
        Column::new("dt".into(), dates).cast(&DataType::Date)?,
        Column::new("winning_bid_mean".into(), means),
        Column::new("winning_bid_min".into(), mins),
        Column::new("winning_bid_max".into(), maxs),
        Column::new("trading_volume".into(), volumes),
        Column::new("lots_count".into(), lots),
    ])
}

impl DirectoryTable {
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let rows = self.rows();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        let slugs: Vec<&str> = rows.iter().map(|r| r.slug.as_str()).collect();
        let countries: Vec<Option<&str>> = rows.iter().map(|r| r.country.as_deref()).collect();
        let ratings: Vec<Option<f64>> = rows.iter().map(|r| r.whiskybase_rating).collect();
        let votes: Vec<Option<u64>> = rows.iter().map(|r| r.whiskybase_votes).collect();
        let whiskies: Vec<Option<u64>> = rows.iter().map(|r| r.whiskybase_whiskies).collect();

        DataFrame::new(vec![
            Column::new("name".into(), names),
            Column::new("slug".into(), slugs),
            Column::new("country".into(), countries),
            Column::new("whiskybase_rating".into(), ratings),
            Column::new("whiskybase_votes".into(), votes),
            Column::new("whiskybase_whiskies".into(), whiskies),
        ])
    }
}

impl SeriesTable {
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        observations_to_dataframe(self.rows())
    }
}

impl CombinedDataset {
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        observations_to_dataframe(self.rows())
    }
}
