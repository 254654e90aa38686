//! Inference-side models.
//!
//! Fitted models carry no training hyper-parameters; the boosting loop lives
//! in [`crate::trainer`] and hands back a [`GradientBoostedClassifier`].

pub mod gbdt;
pub mod tree;

pub use gbdt::{argmax, GradientBoostedClassifier, GradientBoostedParams};
pub use tree::{RegressionTree, TreeNode};

use crate::serialization::SerializableParams;
use thiserror::Error;

/// Errors raised while training, validating or running a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot train on an empty dataset")]
    EmptyData,

    #[error("feature matrix has {rows} rows but {labels} labels were given")]
    ShapeMismatch { rows: usize, labels: usize },

    #[error("label code {code} out of range for {n_classes} classes")]
    LabelOutOfRange { code: usize, n_classes: usize },

    #[error("need at least two classes, got {0}")]
    TooFewClasses(usize),

    #[error("invalid hyper-parameter: {0}")]
    InvalidParameter(String),

    #[error("feature count mismatch: expected {expected}, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("invalid model parameters: {0}")]
    InvalidParams(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fitted model usable for prediction and persistence.
pub trait InferenceModel {
    type InputSingle;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;
    type ParamsRepr: SerializableParams;

    fn predict(&self, input: &Self::InputSingle) -> Result<Self::OutputSingle, ModelError>;
    fn predict_batch(&self, input: &Self::InputBatch) -> Result<Self::OutputBatch, ModelError>;

    fn extract_params(&self) -> Self::ParamsRepr;
    fn from_params(params: Self::ParamsRepr) -> Result<Self, ModelError>
    where
        Self: Sized;

    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ModelError> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| ModelError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ModelError>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::ParamsRepr::from_bytes(&bytes)
            .map_err(|e| ModelError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }
}
