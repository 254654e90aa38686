//! Boosting loop for [`GradientBoostedClassifier`].
//!
//! The trainer owns every training hyper-parameter; the model it returns
//! carries only what inference needs.

mod grow;

use crate::loss::{Loss, SoftmaxLoss};
use crate::model::{GradientBoostedClassifier, ModelError};
use grow::{grow_tree, presort, GrowParams};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Initial margin of every class.
pub const BASE_SCORE: f32 = 0.5;

/// Boosting hyper-parameters.
///
/// Defaults:
/// - `n_rounds`: 100
/// - `learning_rate`: 0.3
/// - `max_depth`: 6
/// - `lambda`: 1.0
/// - `gamma`: 0.0
/// - `min_child_weight`: 1.0
/// - `log_every`: 10 (0 disables per-round logging)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub n_rounds: usize,
    pub learning_rate: f32,
    pub max_depth: usize,
    /// L2 penalty on leaf weights.
    pub lambda: f32,
    /// Minimum loss reduction required to split.
    pub gamma: f32,
    /// Minimum hessian sum in each child.
    pub min_child_weight: f32,
    pub log_every: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.3,
            max_depth: 6,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            log_every: 10,
        }
    }
}

impl TrainerConfig {
    /// Checks every hyper-parameter is usable.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_rounds == 0 {
            return Err(ModelError::InvalidParameter(
                "n_rounds must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (name, value) in [
            ("lambda", self.lambda),
            ("gamma", self.gamma),
            ("min_child_weight", self.min_child_weight),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ModelError::InvalidParameter(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    fn grow_params(&self) -> GrowParams {
        GrowParams {
            max_depth: self.max_depth,
            learning_rate: self.learning_rate as f64,
            lambda: self.lambda as f64,
            gamma: self.gamma as f64,
            min_child_weight: self.min_child_weight as f64,
        }
    }
}

/// Fits gradient-boosted trees with a fixed loss.
///
/// Once built via [`TrainerBuilder`], it is immutable and can be reused
/// across datasets.
#[derive(Clone, Debug)]
pub struct Trainer<L: Loss = SoftmaxLoss> {
    pub(crate) config: TrainerConfig,
    pub(crate) loss_fn: L,
}

/// Fluent builder for constructing a [`Trainer`] with custom hyperparameters.
#[derive(Clone, Debug)]
pub struct TrainerBuilder<L: Loss = SoftmaxLoss> {
    config: TrainerConfig,
    loss_fn: L,
}

impl<L: Loss> TrainerBuilder<L> {
    /// Creates a builder with default hyper-parameters.
    pub fn new(loss_fn: L) -> Self {
        Self {
            config: TrainerConfig::default(),
            loss_fn,
        }
    }

    /// Starts from an existing configuration.
    pub fn with_config(mut self, config: TrainerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn n_rounds(mut self, rounds: usize) -> Self {
        self.config.n_rounds = rounds;
        self
    }

    pub fn learning_rate(mut self, eta: f32) -> Self {
        self.config.learning_rate = eta;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn lambda(mut self, lambda: f32) -> Self {
        self.config.lambda = lambda;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn min_child_weight(mut self, weight: f32) -> Self {
        self.config.min_child_weight = weight;
        self
    }

    /// Log the training loss every `rounds` rounds; 0 turns it off.
    pub fn log_every(mut self, rounds: usize) -> Self {
        self.config.log_every = rounds;
        self
    }

    pub fn build(self) -> Trainer<L> {
        Trainer {
            config: self.config,
            loss_fn: self.loss_fn,
        }
    }
}

impl Trainer<SoftmaxLoss> {
    /// Convenience constructor that starts the builder pattern with the
    /// multi-class softmax loss.
    pub fn builder() -> TrainerBuilder<SoftmaxLoss> {
        TrainerBuilder::new(SoftmaxLoss)
    }

    /// Trainer with the given hyper-parameters and the softmax loss.
    pub fn from_config(config: TrainerConfig) -> Self {
        Self::builder().with_config(config).build()
    }
}

impl Default for Trainer<SoftmaxLoss> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<L: Loss> Trainer<L> {
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Trains one tree per class per round on `x` against class codes `y`.
    ///
    /// # Errors
    /// - [`ModelError::InvalidParameter`] for unusable hyper-parameters
    /// - [`ModelError::EmptyData`] when `x` has no rows
    /// - [`ModelError::ShapeMismatch`] when `x` and `y` disagree on length
    /// - [`ModelError::TooFewClasses`] when `n_classes < 2`
    /// - [`ModelError::LabelOutOfRange`] when a code is `>= n_classes`
    pub fn fit(
        &self,
        x: ArrayView2<'_, f32>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<GradientBoostedClassifier, ModelError> {
        self.config.validate()?;

        if x.nrows() == 0 {
            return Err(ModelError::EmptyData);
        }
        if x.nrows() != y.len() {
            return Err(ModelError::ShapeMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        if n_classes < 2 {
            return Err(ModelError::TooFewClasses(n_classes));
        }
        if let Some(&code) = y.iter().find(|&&code| code >= n_classes) {
            return Err(ModelError::LabelOutOfRange { code, n_classes });
        }

        info!(
            samples = x.nrows(),
            features = x.ncols(),
            classes = n_classes,
            rounds = self.config.n_rounds,
            "boosting started"
        );

        let sorted = presort(x);
        let grow_params = self.config.grow_params();
        let mut model = GradientBoostedClassifier::empty(x.ncols(), n_classes, BASE_SCORE);
        let mut margins = Array2::<f32>::from_elem((x.nrows(), n_classes), BASE_SCORE);

        for round in 0..self.config.n_rounds {
            let (grad, hess) = self.loss_fn.grad_hess(margins.view(), y);

            let mut trees = Vec::with_capacity(n_classes);
            for class in 0..n_classes {
                let tree = grow_tree(
                    x,
                    &sorted,
                    grad.column(class),
                    hess.column(class),
                    grow_params,
                )?;
                for (row, margin) in x.axis_iter(Axis(0)).zip(margins.column_mut(class)) {
                    *margin += tree.predict(row);
                }
                trees.push(tree);
            }
            model.push_round(trees);

            let log_every = self.config.log_every;
            if log_every > 0 && (round + 1) % log_every == 0 {
                debug!(
                    round = round + 1,
                    metric = self.loss_fn.name(),
                    train = self.loss_fn.loss(margins.view(), y),
                    "boosting round"
                );
            }
        }

        info!(
            rounds = model.n_rounds(),
            loss = self.loss_fn.name(),
            final_loss = self.loss_fn.loss(margins.view(), y),
            "boosting finished"
        );

        Ok(model)
    }
}
