//! Categorical encoding.
//!
//! # Available Encoders
//!
//! ## OneHotEncoder
//! Expands one string column into a block of 0/1 indicator columns, one per
//! category seen during fit.
//!
//! ```ignore
//! // Input:  ["B", "A", "B"]
//! // Output: [[0, 1], [1, 0], [0, 1]]   (vocabulary sorted: A, B)
//! ```
//!
//! ## LabelEncoder
//! Maps target label strings to dense class codes `0..K` and back.
//!
//! # Design Notes
//!
//! Vocabularies are always kept in sorted order, so fitting twice on the same
//! values yields the same positions regardless of row order.

mod label;
mod one_hot;

pub use label::{EncodingError, LabelEncoder, LabelEncoding, LabelEncodingParams};
pub use one_hot::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams};

/// Strategy for handling unknown categories during transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HandleUnknown {
    /// Raise an error when unknown categories are encountered.
    #[default]
    Error,
    /// Ignore unknown categories (the one-hot block stays all zeros).
    Ignore,
}
