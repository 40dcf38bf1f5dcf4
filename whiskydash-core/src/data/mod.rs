//! Data acquisition: transport, client, coercion, pacing and the top-N pipeline

pub mod client;
pub mod coerce;
pub mod fixture;
pub mod frame;
pub mod http;
pub mod pacing;
pub mod pipeline;
pub mod provider;

pub use client::{WhiskyHunterClient, DEFAULT_BASE_URL};
pub use fixture::StaticTransport;
pub use http::HttpTransport;
pub use pacing::{Paced, PacedExt};
pub use pipeline::{
    build_dataset, build_from_directory, select_top, BuildOptions, BuildReport, DatasetBuild,
    DEFAULT_REQUEST_DELAY, DEFAULT_TOP_N,
};
pub use provider::{FetchError, FetchOutcome, FetchProgress, NoProgress, TracingProgress, Transport};
