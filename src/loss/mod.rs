use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

/// Smallest hessian a sample may contribute; keeps leaf weights finite.
pub const HESSIAN_FLOOR: f32 = 1e-6;

/// Probability floor used by the log-loss.
const PROB_EPS: f64 = 1e-16;

/// A twice-differentiable loss over per-class raw margins.
///
/// Implementors must define:
/// - How to compute the scalar loss value (for logging/metrics).
/// - The per-sample, per-class gradient and hessian w.r.t. the margins.
///
/// The gradient and hessian feed the tree builder, which fits one regression
/// tree per class on them every boosting round.
pub trait Loss {
    /// Name used in training logs.
    fn name(&self) -> &'static str;

    /// Mean loss over all samples.
    fn loss(&self, margins: ArrayView2<'_, f32>, targets: &[usize]) -> f64;

    /// Gradient and hessian matrices, both shaped like `margins`.
    fn grad_hess(
        &self,
        margins: ArrayView2<'_, f32>,
        targets: &[usize],
    ) -> (Array2<f32>, Array2<f32>);
}

/// Softmax of a single margin vector (numerically stable).
pub fn softmax(margins: ArrayView1<'_, f32>) -> Array1<f32> {
    let max = margins.fold(f32::NEG_INFINITY, |acc, &m| acc.max(m));
    let mut exp = margins.mapv(|m| (m - max).exp());
    let sum = exp.sum();
    exp.mapv_inplace(|e| e / sum);
    exp
}

/// Row-wise softmax of a `(n_samples, n_classes)` margin matrix.
pub fn softmax_rows(margins: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut probs = Array2::<f32>::zeros(margins.raw_dim());
    for (row, mut out) in margins.axis_iter(Axis(0)).zip(probs.axis_iter_mut(Axis(0))) {
        out.assign(&softmax(row));
    }
    probs
}

/// Multi-class softmax cross-entropy (`mlogloss`).
///
/// `L = -(1/n) * Σ log(softmax(z_i)[y_i])`
///
/// Per class `k`: gradient `p_k - [y == k]`, hessian `max(2 p_k (1 - p_k), 1e-6)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftmaxLoss;

impl Loss for SoftmaxLoss {
    fn name(&self) -> &'static str {
        "mlogloss"
    }

    fn loss(&self, margins: ArrayView2<'_, f32>, targets: &[usize]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let total: f64 = margins
            .axis_iter(Axis(0))
            .zip(targets)
            .map(|(row, &y)| {
                let p = softmax(row)[y] as f64;
                -p.max(PROB_EPS).ln()
            })
            .sum();
        total / targets.len() as f64
    }

    fn grad_hess(
        &self,
        margins: ArrayView2<'_, f32>,
        targets: &[usize],
    ) -> (Array2<f32>, Array2<f32>) {
        let probs = softmax_rows(margins);

        let mut grad = probs.clone();
        for (mut row, &y) in grad.axis_iter_mut(Axis(0)).zip(targets) {
            row[y] -= 1.0;
        }

        let mut hess = Array2::<f32>::zeros(probs.raw_dim());
        Zip::from(&mut hess)
            .and(&probs)
            .for_each(|h, &p| *h = (2.0 * p * (1.0 - p)).max(HESSIAN_FLOOR));

        (grad, hess)
    }
}
