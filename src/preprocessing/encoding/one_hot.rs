//! One-hot encoding for a categorical column.
//!
//! Transforms string categories to one-hot (dummy) encoded blocks.

use crate::preprocessing::encoding::HandleUnknown;
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array2, ArrayViewMut1};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One-hot encoder for a single categorical column.
///
/// Learns the distinct values of the column during fitting and gives each a
/// dedicated output position, in sorted order.
///
/// # Example
/// ```
/// use case_classifier::preprocessing::{FittedTransformer, OneHotEncoder, Transformer};
///
/// let values = vec!["red".to_string(), "blue".to_string(), "red".to_string()];
/// let fitted = OneHotEncoder::new().fit(&values).unwrap();
///
/// // Vocabulary: ["blue", "red"]
/// let encoded = fitted.transform(&values).unwrap();
/// assert_eq!(encoded.row(0).to_vec(), vec![0.0, 1.0]);
/// assert_eq!(encoded.row(1).to_vec(), vec![1.0, 0.0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    /// How to handle unknown categories during transform.
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    /// Create a new OneHotEncoder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy for handling unknown categories.
    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }
}

/// Serializable parameters for a fitted OneHotEncoder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoderParams {
    /// Categories in output order.
    pub categories: Vec<String>,
    /// Handle unknown strategy.
    pub handle_unknown: HandleUnknown,
}

/// Fitted OneHotEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    /// Categories (unique sorted values).
    categories: Vec<String>,
    /// Mapping from category to output position.
    positions: HashMap<String, usize>,
    /// Handle unknown strategy.
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    fn from_categories(categories: Vec<String>, handle_unknown: HandleUnknown) -> Self {
        let positions = categories
            .iter()
            .enumerate()
            .map(|(idx, cat)| (cat.clone(), idx))
            .collect();
        Self {
            categories,
            positions,
            handle_unknown,
        }
    }

    /// Get the categories learned during fit, in output order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }

    /// Output position of a category, if it was seen during fit.
    pub fn position(&self, value: &str) -> Option<usize> {
        self.positions.get(value).copied()
    }

    /// Writes the one-hot block for `value` into `out`.
    ///
    /// `out` must be zeroed and exactly `n_features_out()` wide.
    pub(crate) fn encode_into(
        &self,
        value: &str,
        mut out: ArrayViewMut1<'_, f32>,
    ) -> Result<(), PreprocessingError> {
        match self.position(value) {
            Some(idx) => {
                out[idx] = 1.0;
                Ok(())
            }
            None => match self.handle_unknown {
                HandleUnknown::Ignore => Ok(()),
                HandleUnknown::Error => Err(PreprocessingError::UnknownCategory {
                    column: "one-hot input".to_string(),
                    value: value.to_string(),
                }),
            },
        }
    }
}

impl Transformer for OneHotEncoder {
    type Input = [String];
    type Output = Array2<f32>;
    type Params = OneHotEncoderParams;
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit OneHotEncoder on empty data".to_string(),
            ));
        }

        let categories: BTreeSet<&str> = data.iter().map(String::as_str).collect();
        let categories = categories.into_iter().map(str::to_string).collect();

        Ok(FittedOneHotEncoder::from_categories(
            categories,
            self.handle_unknown,
        ))
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    type Input = [String];
    type Output = Array2<f32>;
    type Params = OneHotEncoderParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let mut result = Array2::<f32>::zeros((data.len(), self.n_features_out()));
        for (value, out) in data.iter().zip(result.rows_mut()) {
            self.encode_into(value, out)?;
        }
        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        OneHotEncoderParams {
            categories: self.categories.clone(),
            handle_unknown: self.handle_unknown,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.categories.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PreprocessingError::SerializationError(
                "one-hot categories must be sorted and unique".to_string(),
            ));
        }
        Ok(FittedOneHotEncoder::from_categories(
            params.categories,
            params.handle_unknown,
        ))
    }

    fn n_features_out(&self) -> usize {
        self.categories.len()
    }
}
