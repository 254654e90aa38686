//! Job-level errors.

use crate::artifact::ArtifactError;
use crate::model::ModelError;
use crate::pipeline::PipelineError;
use crate::preprocessing::{EncodingError, PreprocessingError};
use crate::source::SourceError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal outcome of a training job.
///
/// Incomplete records are not errors; they are counted in
/// [`DropStats`](crate::extract::DropStats) and skipped.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("record source unavailable")]
    SourceUnavailable(#[source] SourceError),

    #[error("need at least two distinct case types to train, found {found}")]
    DegenerateLabelSet { found: usize },

    #[error("label encoding failed")]
    Encoding(#[from] EncodingError),

    #[error("preprocessing failed")]
    Preprocessing(#[from] PreprocessingError),

    #[error("model training failed")]
    Model(#[from] ModelError),

    #[error("failed to write artifact to {}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },
}

impl From<PipelineError> for TrainingError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Preprocessing(err) => TrainingError::Preprocessing(err),
            PipelineError::Model(err) => TrainingError::Model(err),
        }
    }
}

impl From<SourceError> for TrainingError {
    fn from(err: SourceError) -> Self {
        TrainingError::SourceUnavailable(err)
    }
}
