//! Record sources.
//!
//! A [`RecordSource`] yields every raw document of a collection with the
//! store's identifier field removed. The whole corpus is returned at once;
//! there is no pagination.
//!
//! # Available Sources
//!
//! - [`MemorySource`]: documents already in memory.
//! - [`JsonLinesSource`]: a collection export file (JSON lines or a JSON array).
//! - `MongoSource`: a live MongoDB collection (cargo feature `mongodb`).

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

mod json_lines;
#[cfg(feature = "mongodb")]
mod mongo;

pub use json_lines::JsonLinesSource;
#[cfg(feature = "mongodb")]
pub use mongo::MongoSource;

/// A raw, nested document as read from the store.
pub type RawRecord = Value;

/// Name of the identifier field stripped from every record.
pub const ID_FIELD: &str = "_id";

/// Where in an export a bad document sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    /// 1-based line of the file.
    Line(usize),
    /// 1-based element of a top-level JSON array.
    Element(usize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Line(line) => write!(f, "line {}", line),
            Position::Element(index) => write!(f, "array element {}", index),
        }
    }
}

/// Error raised when the record store cannot be read.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{at}: invalid JSON: {source}")]
    Parse {
        at: Position,
        #[source]
        source: serde_json::Error,
    },

    #[error("{at}: expected a JSON object document")]
    NotADocument { at: Position },

    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// A collection of raw documents.
pub trait RecordSource {
    /// Fetch every record, identifier field excluded.
    fn fetch_all(&mut self) -> Result<Vec<RawRecord>, SourceError>;

    /// Human-readable location of the source, for logs.
    fn describe(&self) -> String;
}

/// Removes the identifier field from a top-level document.
pub(crate) fn strip_id(mut record: RawRecord) -> RawRecord {
    if let Value::Object(map) = &mut record {
        map.remove(ID_FIELD);
    }
    record
}

/// Documents held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    records: Vec<RawRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for MemorySource {
    fn fetch_all(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self.records.iter().cloned().map(strip_id).collect())
    }

    fn describe(&self) -> String {
        format!("memory ({} documents)", self.records.len())
    }
}
