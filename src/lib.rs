//! # case-classifier
//!
//! Trains a multi-class classifier that predicts the case type of an incident
//! record from the victim's age and ethnicity and the incident location, and
//! persists the fitted pipeline with its label encoding as one artifact.
//!
//! ## Core Design Principles
//!
//! - **Fail-soft extraction**: incomplete records are dropped and counted,
//!   never fatal.
//! - **Training/Inference Separation**: fitted models carry prediction
//!   parameters only; boosting lives in [`trainer`].
//! - **One encoding path**: the fitted [`preprocessing::ColumnTransformer`]
//!   is stored with the model, so inference encodes exactly like training.
//! - **Explicit persistence contract**: the artifact has a magic number, a
//!   format version and two sections, all checked on load.
//!
//! ## Quick Start
//!
//! ```no_run
//! use case_classifier::config::JobConfig;
//! use case_classifier::dataset::FeatureRow;
//! use case_classifier::{artifact::Artifact, job};
//!
//! let config = JobConfig::from_toml_file("train.toml")?;
//! let report = job::run_with_config(&config)?;
//! println!("trained on {} rows", report.rows);
//!
//! let artifact = Artifact::load(&report.artifact_path)?;
//! let case_type = artifact.predict_label(&FeatureRow::new(34.0, "parda", "Recife"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Structure
//!
//! - `source` — Record sources (MongoDB, JSON lines export, memory)
//! - `extract` — Per-record field extraction with tagged drop reasons
//! - `dataset` — Column table of extracted samples
//! - `preprocessing` — One-hot / passthrough column transformer and label encoder
//! - `loss` — Softmax cross-entropy gradients for boosting
//! - `model` — Regression trees and the boosted classifier
//! - `trainer` — Boosting loop and hyper-parameters
//! - `pipeline` — Transformer and classifier fitted together
//! - `artifact` — Versioned on-disk format
//! - `job` — End-to-end training run
//! - `config`, `logging`, `error` — Ambient plumbing

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod job;
pub mod logging;
pub mod loss;
pub mod model;
pub mod pipeline;
pub mod preprocessing;
pub mod serialization;
pub mod source;
pub mod trainer;

pub use artifact::{Artifact, ArtifactError};
pub use config::JobConfig;
pub use error::TrainingError;
pub use job::{run, run_with_config, JobReport};
