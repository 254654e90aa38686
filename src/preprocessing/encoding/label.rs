//! Label encoding for classification targets.
//!
//! Maps label strings to integer codes (0, 1, 2, ...) in sorted label order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Errors raised while encoding or decoding labels.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("cannot fit a label encoding on an empty label set")]
    EmptyData,

    #[error("label {0:?} was not seen when the encoding was fit")]
    UnknownLabel(String),

    #[error("class code {code} out of range for {n_classes} classes")]
    UnknownCode { code: usize, n_classes: usize },

    #[error("invalid label encoding: {0}")]
    Invalid(String),
}

/// Label encoder for classification targets.
///
/// Codes are assigned by sorting the distinct labels, so the same multiset
/// of labels always produces the same mapping whatever order the records
/// arrive in.
///
/// # Example
/// ```
/// use case_classifier::preprocessing::LabelEncoder;
///
/// let encoding = LabelEncoder::new().fit(["theft", "assault", "theft"]).unwrap();
/// assert_eq!(encoding.encode("assault").unwrap(), 0);
/// assert_eq!(encoding.inverse(1).unwrap(), "theft");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct LabelEncoder;

impl LabelEncoder {
    /// Create a new LabelEncoder.
    pub fn new() -> Self {
        Self
    }

    /// Fit the encoder to the labels and return the fitted encoding.
    pub fn fit<I, S>(&self, labels: I) -> Result<LabelEncoding, EncodingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();

        if classes.is_empty() {
            return Err(EncodingError::EmptyData);
        }

        Ok(LabelEncoding::from_sorted(classes.into_iter().collect()))
    }

    /// Fit and encode in one step.
    pub fn fit_transform<S: AsRef<str>>(
        &self,
        labels: &[S],
    ) -> Result<(LabelEncoding, Vec<usize>), EncodingError> {
        let encoding = self.fit(labels.iter().map(<S as AsRef<str>>::as_ref))?;
        let codes = encoding.encode_all(labels)?;
        Ok((encoding, codes))
    }
}

/// Serializable parameters for a fitted label encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncodingParams {
    /// Unique classes in sorted order; the position is the code.
    pub classes: Vec<String>,
}

/// Fitted, bijective mapping between labels and class codes.
#[derive(Clone, Debug)]
pub struct LabelEncoding {
    /// Unique classes in sorted order.
    classes: Vec<String>,
    /// Mapping from class to code.
    class_to_idx: HashMap<String, usize>,
}

impl PartialEq for LabelEncoding {
    fn eq(&self, other: &Self) -> bool {
        self.classes == other.classes
    }
}

impl LabelEncoding {
    fn from_sorted(classes: Vec<String>) -> Self {
        let class_to_idx = classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (class.clone(), idx))
            .collect();
        Self {
            classes,
            class_to_idx,
        }
    }

    /// Unique classes; the index of a class is its code.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Code of a label seen during fit.
    pub fn encode(&self, label: &str) -> Result<usize, EncodingError> {
        self.class_to_idx
            .get(label)
            .copied()
            .ok_or_else(|| EncodingError::UnknownLabel(label.to_string()))
    }

    /// Codes for a sequence of labels; fails on the first unseen label.
    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, EncodingError> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    /// Label for a class code.
    pub fn inverse(&self, code: usize) -> Result<&str, EncodingError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(EncodingError::UnknownCode {
                code,
                n_classes: self.classes.len(),
            })
    }

    /// Extract parameters for serialization.
    pub fn extract_params(&self) -> LabelEncodingParams {
        LabelEncodingParams {
            classes: self.classes.clone(),
        }
    }

    /// Reconstruct from parameters.
    ///
    /// Classes must be non-empty, strictly increasing and therefore unique.
    pub fn from_params(params: LabelEncodingParams) -> Result<Self, EncodingError> {
        if params.classes.is_empty() {
            return Err(EncodingError::EmptyData);
        }
        if params.classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(EncodingError::Invalid(
                "classes must be sorted and unique".to_string(),
            ));
        }
        Ok(Self::from_sorted(params.classes))
    }
}
