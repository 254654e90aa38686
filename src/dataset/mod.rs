//! Tabular training data.
//!
//! This module defines the fixed feature schema shared by extraction,
//! preprocessing and inference, and the [`Table`] that collects extracted
//! rows for fitting.
//!
//! # Core Concepts
//!
//! - **FeatureRow** — one sample: victim age, victim ethnicity, location.
//! - **FeatureColumn** — a named column of the schema, either numeric or
//!   categorical. Column order is fixed by [`FEATURE_COLUMNS`].
//! - **Table** — column-major storage of many rows plus their labels.
//!
//! # Example
//!
//! ```rust
//! use case_classifier::dataset::{FeatureRow, Table};
//!
//! let rows = vec![
//!     (FeatureRow::new(34.0, "A", "X"), "homicide".to_string()),
//!     (FeatureRow::new(5.0, "B", "Y"), "accident".to_string()),
//! ];
//! let table = Table::assemble(rows);
//! assert_eq!(table.len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod table;
pub use self::table::Table;

/// Category used for an ethnicity or location that is present but blank.
pub const UNKNOWN_CATEGORY: &str = "<unknown>";

/// Canonical form of a category value: surrounding whitespace trimmed and a
/// blank value mapped to [`UNKNOWN_CATEGORY`].
///
/// Extraction, table assembly and encoding all go through this, so a raw
/// value lands in the same one-hot column at training and prediction time.
pub fn normalize_category(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        UNKNOWN_CATEGORY
    } else {
        value
    }
}

/// A classification target: the case type string.
pub type Label = String;

/// How a feature column is represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Real-valued column, passed through unchanged.
    Numeric,
    /// String-valued column, one-hot encoded.
    Categorical,
}

/// A column of the feature schema.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FeatureColumn {
    Age,
    Ethnicity,
    Location,
}

/// Feature columns in table order.
pub const FEATURE_COLUMNS: [FeatureColumn; 3] = [
    FeatureColumn::Age,
    FeatureColumn::Ethnicity,
    FeatureColumn::Location,
];

impl FeatureColumn {
    /// Column name as it appears in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::Age => "age",
            FeatureColumn::Ethnicity => "ethnicity",
            FeatureColumn::Location => "location",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            FeatureColumn::Age => ColumnKind::Numeric,
            FeatureColumn::Ethnicity | FeatureColumn::Location => ColumnKind::Categorical,
        }
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed view of a single cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellRef<'a> {
    Numeric(f32),
    Categorical(&'a str),
}

/// One extracted sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub age: f32,
    pub ethnicity: String,
    pub location: String,
}

impl FeatureRow {
    pub fn new(age: f32, ethnicity: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            age,
            ethnicity: ethnicity.into(),
            location: location.into(),
        }
    }

    /// Returns the value stored under `column`.
    pub fn get(&self, column: FeatureColumn) -> CellRef<'_> {
        match column {
            FeatureColumn::Age => CellRef::Numeric(self.age),
            FeatureColumn::Ethnicity => CellRef::Categorical(&self.ethnicity),
            FeatureColumn::Location => CellRef::Categorical(&self.location),
        }
    }
}
