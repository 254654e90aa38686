//! Data preprocessing transformers.
//!
//! Turns the assembled [`Table`](crate::dataset::Table) into the numeric
//! matrix the classifier trains on, and turns label strings into class codes.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! # Available Transformers
//!
//! ## Encoding
//! - [`OneHotEncoder`]: Indicator block per categorical column
//! - [`LabelEncoder`]: Target labels to dense class codes
//!
//! ## Composition
//! - [`ColumnTransformer`]: One step per column, blocks concatenated in order
//!
//! # Example
//!
//! ```ignore
//! use case_classifier::preprocessing::{ColumnTransformer, FittedTransformer, Transformer};
//!
//! let fitted = ColumnTransformer::for_case_features().fit(&table)?;
//! let x = fitted.transform(&table)?;
//!
//! fitted.save_to_file("columns.bin")?;
//! let loaded = FittedColumnTransformer::load_from_file("columns.bin")?;
//! ```

pub mod column_transformer;
pub mod encoding;
pub mod error;
pub mod traits;

// Re-export main types
pub use column_transformer::{
    ColumnStep, ColumnTransformer, ColumnTransformerParams, FittedColumnStep,
    FittedColumnTransformer, StepKindParams, StepParams,
};
pub use encoding::{
    EncodingError, FittedOneHotEncoder, HandleUnknown, LabelEncoder, LabelEncoding,
    LabelEncodingParams, OneHotEncoder, OneHotEncoderParams,
};
pub use error::PreprocessingError;
pub use traits::{FittedTransformer, Transformer};
