use crate::source::{strip_id, Position, RawRecord, RecordSource, SourceError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// A collection export on disk.
///
/// Accepts either one JSON document per line (blank lines are skipped) or a
/// single JSON array of documents. Any line that is not a JSON object makes
/// the whole export unreadable.
#[derive(Clone, Debug)]
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonLinesSource {
    fn fetch_all(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;

        if content.trim_start().starts_with('[') {
            parse_array(&content)
        } else {
            parse_lines(&content)
        }
    }

    fn describe(&self) -> String {
        format!("json export {}", self.path.display())
    }
}

fn parse_lines(content: &str) -> Result<Vec<RawRecord>, SourceError> {
    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let at = Position::Line(line_no);
        let value: Value =
            serde_json::from_str(line).map_err(|source| SourceError::Parse { at, source })?;
        records.push(document(value, at)?);
    }
    Ok(records)
}

fn parse_array(content: &str) -> Result<Vec<RawRecord>, SourceError> {
    let values: Vec<Value> = serde_json::from_str(content).map_err(|source| SourceError::Parse {
        at: Position::Line(source.line()),
        source,
    })?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| document(value, Position::Element(index + 1)))
        .collect()
}

fn document(value: Value, at: Position) -> Result<RawRecord, SourceError> {
    if !value.is_object() {
        return Err(SourceError::NotADocument { at });
    }
    Ok(strip_id(value))
}
