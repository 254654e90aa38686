//! End-to-end training job.
//!
//! fetch → extract → assemble → encode labels → fit pipeline → save artifact.
//! Any fatal error stops the job before the artifact is written.

use crate::artifact::Artifact;
use crate::config::JobConfig;
use crate::dataset::Table;
use crate::error::TrainingError;
use crate::extract::{DropStats, FeatureExtractor};
use crate::pipeline::TrainablePipeline;
use crate::preprocessing::{FittedTransformer, LabelEncoder};
use crate::source::RecordSource;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Summary of a successful run.
#[derive(Clone, Debug, PartialEq)]
pub struct JobReport {
    /// Extraction counts, kept and dropped.
    pub drops: DropStats,
    /// Rows the model was trained on.
    pub rows: usize,
    /// Case types, in class-code order.
    pub classes: Vec<String>,
    /// Width of the encoded feature matrix.
    pub n_features: usize,
    /// Accuracy of the fitted pipeline on its own training rows.
    pub training_accuracy: f64,
    pub artifact_path: PathBuf,
}

/// Runs the job against an already opened source.
pub fn run(source: &mut dyn RecordSource, config: &JobConfig) -> Result<JobReport, TrainingError> {
    info!(source = %source.describe(), "fetching records");
    let records = source.fetch_all()?;
    info!(records = records.len(), "records fetched");

    let extractor = FeatureExtractor::new(config.schema.clone());
    let (rows, drops) = extractor.extract_all(&records);
    if drops.dropped() > 0 {
        warn!(
            dropped = drops.dropped(),
            seen = drops.seen,
            reasons = ?drops.by_reason,
            "skipped incomplete records"
        );
    }

    let table = Table::assemble(rows);
    let distinct: BTreeSet<&str> = table.labels().iter().map(String::as_str).collect();
    if distinct.len() < 2 {
        return Err(TrainingError::DegenerateLabelSet {
            found: distinct.len(),
        });
    }

    let (encoding, y) = LabelEncoder::new().fit_transform(table.labels())?;
    info!(
        rows = table.len(),
        classes = encoding.n_classes(),
        "dataset assembled"
    );

    let pipeline = TrainablePipeline::for_case_features(config.trainer.clone()).fit(
        &table,
        &y,
        encoding.n_classes(),
    )?;
    let training_accuracy = pipeline.accuracy(&table, &y)?;
    let n_features = pipeline.preprocessor().n_features_out();
    info!(training_accuracy, "pipeline trained");

    let path = config.artifact_path.clone();
    let persistence = |source| TrainingError::Persistence {
        path: path.clone(),
        source,
    };
    let artifact = Artifact::new(pipeline, encoding).map_err(persistence)?;
    artifact.save(&path).map_err(persistence)?;

    Ok(JobReport {
        drops,
        rows: table.len(),
        classes: artifact.label_encoding().classes().to_vec(),
        n_features,
        training_accuracy,
        artifact_path: path,
    })
}

/// Opens the configured source and runs the job.
///
/// The source, and any connection it holds, is dropped when this returns.
pub fn run_with_config(config: &JobConfig) -> Result<JobReport, TrainingError> {
    let mut source = config.source.open()?;
    run(source.as_mut(), config)
}
