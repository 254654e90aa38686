//! Preprocessing and classifier fitted together.
//!
//! A [`TrainablePipeline`] pairs an unfitted [`ColumnTransformer`] with a
//! [`Trainer`]; fitting it yields a [`TrainedPipeline`] that applies the same
//! fitted transformer at prediction time, so training and inference always
//! see identical encodings.

use crate::dataset::{FeatureRow, Table};
use crate::error::TrainingError;
use crate::model::{GradientBoostedClassifier, GradientBoostedParams, InferenceModel, ModelError};
use crate::preprocessing::{
    ColumnTransformer, ColumnTransformerParams, FittedColumnTransformer, FittedTransformer,
    PreprocessingError, Transformer,
};
use crate::trainer::{Trainer, TrainerConfig};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Failure while encoding a row or running the fitted classifier.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Unfitted preprocessing plus boosting configuration.
#[derive(Clone, Debug)]
pub struct TrainablePipeline {
    preprocessor: ColumnTransformer,
    trainer: Trainer,
}

impl TrainablePipeline {
    pub fn new(preprocessor: ColumnTransformer, trainer: Trainer) -> Self {
        Self {
            preprocessor,
            trainer,
        }
    }

    /// One-hot ethnicity and location, pass age through, boost with `config`.
    pub fn for_case_features(config: TrainerConfig) -> Self {
        Self::new(
            ColumnTransformer::for_case_features(),
            Trainer::from_config(config),
        )
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    /// Fits the transformer on `table`, then the classifier on the encoded
    /// matrix and the class codes `y`.
    ///
    /// Fewer than two classes is reported as
    /// [`TrainingError::DegenerateLabelSet`] before anything is fit.
    pub fn fit(
        &self,
        table: &Table,
        y: &[usize],
        n_classes: usize,
    ) -> Result<TrainedPipeline, TrainingError> {
        if n_classes < 2 {
            return Err(TrainingError::DegenerateLabelSet { found: n_classes });
        }

        let preprocessor = self.preprocessor.fit(table)?;
        let x = preprocessor.transform(table)?;
        info!(
            rows = x.nrows(),
            features = x.ncols(),
            "feature matrix encoded"
        );

        let model = self.trainer.fit(x.view(), y, n_classes)?;
        Ok(TrainedPipeline {
            preprocessor,
            model,
        })
    }
}

/// Serializable parameters for a trained pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipelineParams {
    pub preprocessor: ColumnTransformerParams,
    pub model: GradientBoostedParams,
}

/// Fitted transformer and classifier, ready for inference.
#[derive(Clone, Debug)]
pub struct TrainedPipeline {
    preprocessor: FittedColumnTransformer,
    model: GradientBoostedClassifier,
}

impl TrainedPipeline {
    /// Pairs a fitted transformer with a classifier of matching input width.
    pub fn new(
        preprocessor: FittedColumnTransformer,
        model: GradientBoostedClassifier,
    ) -> Result<Self, PipelineError> {
        if preprocessor.n_features_out() != model.n_features() {
            return Err(ModelError::FeatureMismatch {
                expected: model.n_features(),
                got: preprocessor.n_features_out(),
            }
            .into());
        }
        Ok(Self {
            preprocessor,
            model,
        })
    }

    pub fn preprocessor(&self) -> &FittedColumnTransformer {
        &self.preprocessor
    }

    pub fn model(&self) -> &GradientBoostedClassifier {
        &self.model
    }

    pub fn n_classes(&self) -> usize {
        self.model.n_classes()
    }

    /// Encodes one row with the fitted transformer.
    pub fn preprocess_row(&self, row: &FeatureRow) -> Result<Array1<f32>, PreprocessingError> {
        self.preprocessor.transform_row(row)
    }

    /// Encodes a table with the fitted transformer.
    pub fn preprocess(&self, table: &Table) -> Result<Array2<f32>, PreprocessingError> {
        self.preprocessor.transform(table)
    }

    /// Predicted class code for one row.
    pub fn predict(&self, row: &FeatureRow) -> Result<usize, PipelineError> {
        let x = self.preprocess_row(row)?;
        Ok(self.model.predict(&x)?)
    }

    /// Class probabilities for one row.
    pub fn predict_proba(&self, row: &FeatureRow) -> Result<Array1<f32>, PipelineError> {
        let x = self.preprocess_row(row)?;
        Ok(self.model.predict_proba(x.view())?)
    }

    /// Predicted class codes for every row of `table`.
    pub fn predict_batch(&self, table: &Table) -> Result<Vec<usize>, PipelineError> {
        let x = self.preprocess(table)?;
        Ok(self.model.predict_batch(&x)?)
    }

    /// Fraction of rows of `table` whose prediction equals `y`.
    pub fn accuracy(&self, table: &Table, y: &[usize]) -> Result<f64, PipelineError> {
        if table.is_empty() {
            return Ok(0.0);
        }
        let predicted = self.predict_batch(table)?;
        let correct = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / table.len() as f64)
    }

    /// Extract parameters for serialization.
    pub fn extract_params(&self) -> TrainedPipelineParams {
        TrainedPipelineParams {
            preprocessor: self.preprocessor.extract_params(),
            model: self.model.extract_params(),
        }
    }

    /// Reconstruct from parameters.
    pub fn from_params(params: TrainedPipelineParams) -> Result<Self, PipelineError> {
        let preprocessor = FittedColumnTransformer::from_params(params.preprocessor)?;
        let model = GradientBoostedClassifier::from_params(params.model)?;
        Self::new(preprocessor, model)
    }
}
