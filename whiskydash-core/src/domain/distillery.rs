//! Distillery directory: one row per entity, keyed by `slug`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Descriptive and rating metadata for a single distillery.
///
/// Numeric fields are `None` when the upstream value was absent or could not
/// be coerced; downstream aggregation skips them instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistilleryInfo {
    pub name: String,
    pub slug: String,
    pub country: Option<String>,
    /// Whiskybase rating on a 0-100 scale.
    pub whiskybase_rating: Option<f64>,
    pub whiskybase_votes: Option<u64>,
    pub whiskybase_whiskies: Option<u64>,
}

impl DistilleryInfo {
    /// Name to show to a reader; falls back to the slug when the API sent none.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.slug
        } else {
            &self.name
        }
    }
}

/// The full distillery directory.
///
/// Construction through [`DirectoryTable::from_rows`] keeps `slug` unique:
/// later duplicates are dropped and reported back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryTable {
    rows: Vec<DistilleryInfo>,
}

impl DirectoryTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from rows, keeping the first occurrence of each slug.
    ///
    /// Returns the table and the slugs that were dropped as duplicates.
    pub fn from_rows(rows: Vec<DistilleryInfo>) -> (Self, Vec<String>) {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut kept = Vec::with_capacity(rows.len());
        let mut duplicates = Vec::new();

        for row in rows {
            if seen.insert(row.slug.clone()) {
                kept.push(row);
            } else {
                duplicates.push(row.slug);
            }
        }

        (Self { rows: kept }, duplicates)
    }

    pub fn rows(&self) -> &[DistilleryInfo] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a distillery by slug.
    pub fn get(&self, slug: &str) -> Option<&DistilleryInfo> {
        self.rows.iter().find(|d| d.slug == slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|d| d.slug.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DistilleryInfo> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a DirectoryTable {
    type Item = &'a DistilleryInfo;
    type IntoIter = std::slice::Iter<'a, DistilleryInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
