//! Gradient-boosted multi-class classifier.
//!
//! Each boosting round contributes one [`RegressionTree`] per class. The raw
//! margin of class `k` is `base_score + Σ_rounds tree_k(x)`, and class
//! probabilities are the softmax of the margins.
//!
//! Training lives in [`crate::trainer::Trainer`]; this type only predicts.

use crate::loss::softmax;
use crate::model::{InferenceModel, ModelError, RegressionTree, TreeNode};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Index of the largest value; ties go to the lowest index.
pub fn argmax(values: ArrayView1<'_, f32>) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = idx;
        }
    }
    best
}

/// Serializable representation of a fitted classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedParams {
    pub n_features: usize,
    pub n_classes: usize,
    pub base_score: f32,
    /// `rounds[r][k]` holds the nodes of the tree for class `k` in round `r`.
    pub rounds: Vec<Vec<Vec<TreeNode>>>,
}

/// Fitted gradient-boosted tree ensemble over `n_classes` classes.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientBoostedClassifier {
    n_features: usize,
    n_classes: usize,
    base_score: f32,
    rounds: Vec<Vec<RegressionTree>>,
}

impl GradientBoostedClassifier {
    /// An ensemble with no rounds yet; every class gets `base_score`.
    pub(crate) fn empty(n_features: usize, n_classes: usize, base_score: f32) -> Self {
        Self {
            n_features,
            n_classes,
            base_score,
            rounds: Vec::new(),
        }
    }

    /// Appends one round (one tree per class).
    pub(crate) fn push_round(&mut self, trees: Vec<RegressionTree>) {
        debug_assert_eq!(trees.len(), self.n_classes);
        self.rounds.push(trees);
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn base_score(&self) -> f32 {
        self.base_score
    }

    /// Trees of boosting round `round`, one per class.
    pub fn round(&self, round: usize) -> Option<&[RegressionTree]> {
        self.rounds.get(round).map(Vec::as_slice)
    }

    fn check_width(&self, got: usize) -> Result<(), ModelError> {
        if got != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                got,
            });
        }
        Ok(())
    }

    /// Raw per-class margins for one sample.
    pub fn margins(&self, x: ArrayView1<'_, f32>) -> Result<Array1<f32>, ModelError> {
        self.check_width(x.len())?;
        let mut margins = Array1::from_elem(self.n_classes, self.base_score);
        for trees in &self.rounds {
            for (margin, tree) in margins.iter_mut().zip(trees) {
                *margin += tree.predict(x);
            }
        }
        Ok(margins)
    }

    /// Raw margins for a batch, shaped `(n_samples, n_classes)`.
    pub fn margins_batch(&self, x: ArrayView2<'_, f32>) -> Result<Array2<f32>, ModelError> {
        self.check_width(x.ncols())?;
        let mut margins = Array2::from_elem((x.nrows(), self.n_classes), self.base_score);
        for (row, mut out) in x.axis_iter(Axis(0)).zip(margins.axis_iter_mut(Axis(0))) {
            for trees in &self.rounds {
                for (margin, tree) in out.iter_mut().zip(trees) {
                    *margin += tree.predict(row);
                }
            }
        }
        Ok(margins)
    }

    /// Class probabilities for one sample; sums to 1.
    pub fn predict_proba(&self, x: ArrayView1<'_, f32>) -> Result<Array1<f32>, ModelError> {
        Ok(softmax(self.margins(x)?.view()))
    }

    /// Class probabilities for a batch, shaped `(n_samples, n_classes)`.
    pub fn predict_proba_batch(&self, x: ArrayView2<'_, f32>) -> Result<Array2<f32>, ModelError> {
        Ok(crate::loss::softmax_rows(self.margins_batch(x)?.view()))
    }
}

impl InferenceModel for GradientBoostedClassifier {
    type InputSingle = Array1<f32>;
    type OutputSingle = usize;
    type InputBatch = Array2<f32>;
    type OutputBatch = Vec<usize>;
    type ParamsRepr = GradientBoostedParams;

    /// Predicted class code (argmax of the margins).
    fn predict(&self, input: &Self::InputSingle) -> Result<usize, ModelError> {
        Ok(argmax(self.margins(input.view())?.view()))
    }

    fn predict_batch(&self, input: &Self::InputBatch) -> Result<Vec<usize>, ModelError> {
        let margins = self.margins_batch(input.view())?;
        Ok(margins.axis_iter(Axis(0)).map(argmax).collect())
    }

    fn extract_params(&self) -> GradientBoostedParams {
        GradientBoostedParams {
            n_features: self.n_features,
            n_classes: self.n_classes,
            base_score: self.base_score,
            rounds: self
                .rounds
                .iter()
                .map(|trees| trees.iter().map(|t| t.nodes().to_vec()).collect())
                .collect(),
        }
    }

    fn from_params(params: GradientBoostedParams) -> Result<Self, ModelError> {
        if params.n_classes < 2 {
            return Err(ModelError::TooFewClasses(params.n_classes));
        }
        if !params.base_score.is_finite() {
            return Err(ModelError::InvalidParams(
                "base score must be finite".to_string(),
            ));
        }

        let mut rounds = Vec::with_capacity(params.rounds.len());
        for (r, trees) in params.rounds.into_iter().enumerate() {
            if trees.len() != params.n_classes {
                return Err(ModelError::InvalidParams(format!(
                    "round {} has {} trees for {} classes",
                    r,
                    trees.len(),
                    params.n_classes
                )));
            }
            let trees = trees
                .into_iter()
                .map(RegressionTree::from_nodes)
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(feature) = trees.iter().filter_map(RegressionTree::max_feature).max() {
                if feature >= params.n_features {
                    return Err(ModelError::InvalidParams(format!(
                        "round {} splits on feature {} but the model has {} features",
                        r, feature, params.n_features
                    )));
                }
            }
            rounds.push(trees);
        }

        Ok(Self {
            n_features: params.n_features,
            n_classes: params.n_classes,
            base_score: params.base_score,
            rounds,
        })
    }
}
