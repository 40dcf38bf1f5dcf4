//! Domain tables for whiskydash

pub mod distillery;
pub mod observation;

pub use distillery::{DirectoryTable, DistilleryInfo};
pub use observation::{CombinedDataset, MarketObservation, SeriesTable};

/// Distillery key type alias
pub type Slug = String;
