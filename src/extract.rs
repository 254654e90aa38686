//! Feature extraction from raw documents.
//!
//! Maps each nested record to a flat [`FeatureRow`] plus its [`Label`], or
//! to a tagged [`Extraction::Dropped`] when a required value is absent or has
//! the wrong type. A dropped record never becomes a row, so it cannot leak
//! null values into the encoder vocabularies or the classifier.

use crate::dataset::{normalize_category, FeatureRow, Label};
use crate::source::RawRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A required value of a raw record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Age,
    Ethnicity,
    Location,
    CaseType,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Age => "age",
            Field::Ethnicity => "ethnicity",
            Field::Location => "location",
            Field::CaseType => "case_type",
        };
        f.write_str(name)
    }
}

/// Why a record was left out of the dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropReason {
    /// The key is absent or holds `null`.
    Missing(Field),
    /// The value exists but cannot be used as this field.
    WrongType(Field),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Missing(field) => write!(f, "missing {}", field),
            DropReason::WrongType(field) => write!(f, "invalid {}", field),
        }
    }
}

/// Outcome of extracting one record.
#[derive(Clone, Debug, PartialEq)]
pub enum Extraction {
    Row { features: FeatureRow, label: Label },
    Dropped(DropReason),
}

/// Where the required values live inside a record, as JSON pointers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSchema {
    pub age: String,
    pub ethnicity: String,
    pub location: String,
    pub case_type: String,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            age: "/victim/age".to_string(),
            ethnicity: "/victim/ethnicity".to_string(),
            location: "/location".to_string(),
            case_type: "/case_type".to_string(),
        }
    }
}

impl RecordSchema {
    /// Field layout of the production collection, which uses Portuguese keys.
    pub fn portuguese() -> Self {
        Self {
            age: "/vitima/idade".to_string(),
            ethnicity: "/vitima/etnia".to_string(),
            location: "/localizacao".to_string(),
            case_type: "/tipo_do_caso".to_string(),
        }
    }

    fn pointer(&self, field: Field) -> &str {
        match field {
            Field::Age => &self.age,
            Field::Ethnicity => &self.ethnicity,
            Field::Location => &self.location,
            Field::CaseType => &self.case_type,
        }
    }
}

/// Per-reason counts of dropped records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DropStats {
    /// Records inspected, kept or not.
    pub seen: usize,
    /// Dropped records by reason.
    pub by_reason: BTreeMap<DropReason, usize>,
}

impl DropStats {
    pub fn dropped(&self) -> usize {
        self.by_reason.values().sum()
    }

    pub fn kept(&self) -> usize {
        self.seen - self.dropped()
    }

    fn record(&mut self, reason: DropReason) {
        *self.by_reason.entry(reason).or_insert(0) += 1;
    }
}

/// Reads the required values out of raw records.
#[derive(Clone, Debug, Default)]
pub struct FeatureExtractor {
    schema: RecordSchema,
}

impl FeatureExtractor {
    pub fn new(schema: RecordSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Extracts one record.
    ///
    /// Fields are checked in the order age, ethnicity, location, case type;
    /// the first failing field decides the drop reason.
    pub fn extract(&self, record: &RawRecord) -> Extraction {
        match self.try_extract(record) {
            Ok((features, label)) => Extraction::Row { features, label },
            Err(reason) => Extraction::Dropped(reason),
        }
    }

    /// Extracts every record, keeping admissible rows in input order.
    pub fn extract_all<'a, I>(&self, records: I) -> (Vec<(FeatureRow, Label)>, DropStats)
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        let mut rows = Vec::new();
        let mut stats = DropStats::default();

        for (index, record) in records.into_iter().enumerate() {
            stats.seen += 1;
            match self.extract(record) {
                Extraction::Row { features, label } => rows.push((features, label)),
                Extraction::Dropped(reason) => {
                    debug!(record = index, %reason, "dropping record");
                    stats.record(reason);
                }
            }
        }

        (rows, stats)
    }

    fn try_extract(&self, record: &RawRecord) -> Result<(FeatureRow, Label), DropReason> {
        let age = self.age(record)?;
        let ethnicity = self.category(record, Field::Ethnicity)?;
        let location = self.category(record, Field::Location)?;
        let label = self.label(record)?;

        Ok((
            FeatureRow {
                age,
                ethnicity,
                location,
            },
            label,
        ))
    }

    fn lookup<'r>(&self, record: &'r RawRecord, field: Field) -> Result<&'r Value, DropReason> {
        match record.pointer(self.schema.pointer(field)) {
            None | Some(Value::Null) => Err(DropReason::Missing(field)),
            Some(value) => Ok(value),
        }
    }

    fn age(&self, record: &RawRecord) -> Result<f32, DropReason> {
        let value = self.lookup(record, Field::Age)?;
        let age = value
            .as_f64()
            .ok_or(DropReason::WrongType(Field::Age))? as f32;
        if !age.is_finite() {
            return Err(DropReason::WrongType(Field::Age));
        }
        Ok(age)
    }

    fn category(&self, record: &RawRecord, field: Field) -> Result<String, DropReason> {
        let value = self.lookup(record, field)?;
        let text = value.as_str().ok_or(DropReason::WrongType(field))?;
        Ok(normalize_category(text).to_string())
    }

    fn label(&self, record: &RawRecord) -> Result<Label, DropReason> {
        let value = self.lookup(record, Field::CaseType)?;
        let text = value
            .as_str()
            .ok_or(DropReason::WrongType(Field::CaseType))?
            .trim();
        if text.is_empty() {
            return Err(DropReason::WrongType(Field::CaseType));
        }
        Ok(text.to_string())
    }
}
