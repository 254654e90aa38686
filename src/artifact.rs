//! Persisted form of a trained pipeline and its label encoding.
//!
//! # Format
//!
//! Two bincode values written back to back:
//!
//! 1. a header `{ magic: b"CCLF", format_version: u32 }`,
//! 2. a body `{ pipeline: TrainedPipelineParams, label_encoding: LabelEncodingParams }`.
//!
//! The header is checked before the body is decoded, so files from another
//! tool or a newer format are rejected without guessing at their layout.

use crate::dataset::FeatureRow;
use crate::pipeline::{PipelineError, TrainedPipeline, TrainedPipelineParams};
use crate::preprocessing::{EncodingError, LabelEncoding, LabelEncodingParams};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File signature of every artifact.
pub const MAGIC: [u8; 4] = *b"CCLF";

/// Format version written by this build, and the only one it reads.
pub const FORMAT_VERSION: u32 = 1;

/// Errors raised while writing, reading or using an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed artifact: {0}")]
    Malformed(#[from] bincode::Error),

    #[error("not a classifier artifact (magic {found:?})")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported artifact format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("label encoding has {labels} classes but the model predicts {model}")]
    ClassCountMismatch { labels: usize, model: usize },

    #[error("transformer produces {transformer} features but the model expects {model}")]
    FeatureWidthMismatch { transformer: usize, model: usize },

    #[error("invalid pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("invalid label encoding: {0}")]
    Labels(#[from] EncodingError),
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    magic: [u8; 4],
    format_version: u32,
}

/// Body of an artifact: the two persisted sections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBody {
    pub pipeline: TrainedPipelineParams,
    pub label_encoding: LabelEncodingParams,
}

/// A trained pipeline together with the label encoding that decodes its
/// predictions.
#[derive(Clone, Debug)]
pub struct Artifact {
    pipeline: TrainedPipeline,
    label_encoding: LabelEncoding,
}

impl Artifact {
    /// Bundles a pipeline with its label encoding.
    ///
    /// Both must agree on the number of classes.
    pub fn new(pipeline: TrainedPipeline, label_encoding: LabelEncoding) -> Result<Self, ArtifactError> {
        if label_encoding.n_classes() != pipeline.n_classes() {
            return Err(ArtifactError::ClassCountMismatch {
                labels: label_encoding.n_classes(),
                model: pipeline.n_classes(),
            });
        }
        Ok(Self {
            pipeline,
            label_encoding,
        })
    }

    pub fn pipeline(&self) -> &TrainedPipeline {
        &self.pipeline
    }

    pub fn label_encoding(&self) -> &LabelEncoding {
        &self.label_encoding
    }

    /// Predicted case type for one row.
    pub fn predict_label(&self, row: &FeatureRow) -> Result<&str, ArtifactError> {
        let code = self.pipeline.predict(row)?;
        Ok(self.label_encoding.inverse(code)?)
    }

    /// Both sections as serializable parameters.
    pub fn to_body(&self) -> ArtifactBody {
        ArtifactBody {
            pipeline: self.pipeline.extract_params(),
            label_encoding: self.label_encoding.extract_params(),
        }
    }

    /// Rebuilds an artifact, checking the sections are consistent.
    pub fn from_body(body: ArtifactBody) -> Result<Self, ArtifactError> {
        let transformer = body.pipeline.preprocessor.n_features_out;
        let model = body.pipeline.model.n_features;
        if transformer != model {
            return Err(ArtifactError::FeatureWidthMismatch { transformer, model });
        }

        let labels = body.label_encoding.classes.len();
        let classes = body.pipeline.model.n_classes;
        if labels != classes {
            return Err(ArtifactError::ClassCountMismatch {
                labels,
                model: classes,
            });
        }

        let label_encoding = LabelEncoding::from_params(body.label_encoding)?;
        let pipeline = TrainedPipeline::from_params(body.pipeline)?;
        Self::new(pipeline, label_encoding)
    }

    /// Writes header and body to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), ArtifactError> {
        let header = Header {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
        };
        bincode::serialize_into(&mut writer, &header)?;
        bincode::serialize_into(&mut writer, &self.to_body())?;
        writer.flush()?;
        Ok(())
    }

    /// Reads an artifact written by [`Artifact::write_to`].
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, ArtifactError> {
        let header: Header = bincode::deserialize_from(&mut reader)?;
        if header.magic != MAGIC {
            return Err(ArtifactError::BadMagic {
                found: header.magic,
            });
        }
        if header.format_version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: header.format_version,
                supported: FORMAT_VERSION,
            });
        }
        let body: ArtifactBody = bincode::deserialize_from(&mut reader)?;
        Self::from_body(body)
    }

    /// Writes the artifact to `path`, replacing any existing file.
    ///
    /// The bytes go to a sibling `*.partial` file first, which is then
    /// renamed over `path`; a failed save never leaves a truncated artifact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let partial = partial_path(path);

        let written = File::create(&partial)
            .map_err(ArtifactError::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                self.write_to(&mut writer)?;
                let file = writer.into_inner().map_err(|e| e.into_error())?;
                file.sync_all()?;
                Ok(())
            })
            .and_then(|()| fs::rename(&partial, path).map_err(ArtifactError::from));

        if written.is_err() {
            let _ = fs::remove_file(&partial);
        } else {
            info!(path = %path.display(), "artifact saved");
        }
        written
    }

    /// Loads an artifact saved with [`Artifact::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }
}

/// `model.bin` becomes `model.bin.partial`.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Table;
    use crate::pipeline::TrainablePipeline;
    use crate::preprocessing::LabelEncoder;
    use crate::trainer::TrainerConfig;

    fn trained() -> (Artifact, Table) {
        let mut rows = Vec::new();
        for i in 0..5 {
            let age = i as f32;
            rows.push((FeatureRow::new(10.0 + age, "A", "X"), "acidente".to_string()));
            rows.push((FeatureRow::new(40.0 + age, "B", "Y"), "homicidio".to_string()));
            rows.push((FeatureRow::new(70.0 + age, "A", "Z"), "suicidio".to_string()));
        }
        let table = Table::assemble(rows);
        let (encoding, y) = LabelEncoder::new().fit_transform(table.labels()).unwrap();
        let pipeline = TrainablePipeline::for_case_features(TrainerConfig {
            n_rounds: 8,
            ..TrainerConfig::default()
        })
        .fit(&table, &y, encoding.n_classes())
        .unwrap();
        (Artifact::new(pipeline, encoding).unwrap(), table)
    }

    #[test]
    fn test_save_load_predicts_identically() {
        let (artifact, table) = trained();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        artifact.save(&path).unwrap();
        assert!(!partial_path(&path).exists());

        let loaded = Artifact::load(&path).unwrap();
        assert_eq!(loaded.label_encoding(), artifact.label_encoding());
        assert_eq!(loaded.to_body(), artifact.to_body());
        for i in 0..table.len() {
            let row = table.row(i).unwrap();
            assert_eq!(
                loaded.predict_label(&row).unwrap(),
                artifact.predict_label(&row).unwrap()
            );
            assert_eq!(
                loaded.pipeline().predict_proba(&row).unwrap(),
                artifact.pipeline().predict_proba(&row).unwrap()
            );
        }
        let unseen = FeatureRow::new(33.0, "C", "W");
        assert_eq!(
            loaded.predict_label(&unseen).unwrap(),
            artifact.predict_label(&unseen).unwrap()
        );
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let (artifact, _) = trained();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"stale").unwrap();

        artifact.save(&path).unwrap();
        assert!(Artifact::load(&path).is_ok());
    }

    #[test]
    fn test_predict_label_decodes() {
        let (artifact, _) = trained();
        let label = artifact
            .predict_label(&FeatureRow::new(42.0, "B", "Y"))
            .unwrap();
        assert_eq!(label, "homicidio");
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = Vec::new();
        bincode::serialize_into(
            &mut bytes,
            &Header {
                magic: *b"PK\x03\x04",
                format_version: FORMAT_VERSION,
            },
        )
        .unwrap();
        assert!(matches!(
            Artifact::read_from(bytes.as_slice()),
            Err(ArtifactError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_rejects_unsupported_version() {
        let (artifact, _) = trained();
        let mut bytes = Vec::new();
        artifact.write_to(&mut bytes).unwrap();
        // The version follows the 4 magic bytes, little endian.
        bytes[4..8].copy_from_slice(&2u32.to_le_bytes());

        assert!(matches!(
            Artifact::read_from(bytes.as_slice()),
            Err(ArtifactError::UnsupportedVersion {
                found: 2,
                supported: 1
            })
        ));
    }

    #[test]
    fn test_rejects_truncated_body() {
        let (artifact, _) = trained();
        let mut bytes = Vec::new();
        artifact.write_to(&mut bytes).unwrap();
        bytes.truncate(bytes.len() / 2);

        assert!(matches!(
            Artifact::read_from(bytes.as_slice()),
            Err(ArtifactError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_class_count_mismatch() {
        let (artifact, _) = trained();
        let mut body = artifact.to_body();
        body.label_encoding.classes.pop();
        assert!(matches!(
            Artifact::from_body(body),
            Err(ArtifactError::ClassCountMismatch { labels: 2, model: 3 })
        ));
    }

    #[test]
    fn test_rejects_width_mismatch() {
        let (artifact, _) = trained();
        let mut body = artifact.to_body();
        body.pipeline.model.n_features += 1;
        assert!(matches!(
            Artifact::from_body(body),
            Err(ArtifactError::FeatureWidthMismatch { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Artifact::load(dir.path().join("absent.bin")),
            Err(ArtifactError::Io(_))
        ));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("out/model.bin")),
            PathBuf::from("out/model.bin.partial")
        );
    }
}
