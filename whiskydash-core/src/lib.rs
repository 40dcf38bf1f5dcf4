//! whiskydash core: WhiskyHunter client, type coercion and the top-N pipeline.
//!
//! This crate turns the two WhiskyHunter endpoints into typed tables:
//! - Domain tables (distillery directory, per-distillery series, combined dataset)
//! - `Transport` seam with a blocking HTTP implementation and a canned fixture
//! - Lenient coercion of numeric-as-string fields and dates
//! - Top-N selection by rating with a paced, strictly sequential series fetch
//! - Tri-state fetch outcomes that keep "no data" apart from "fetch failed"

pub mod data;
pub mod domain;
