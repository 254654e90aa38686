//! Exact greedy growth of one regression tree on gradient statistics.

use crate::model::{ModelError, RegressionTree, TreeNode};
use ndarray::{ArrayView1, ArrayView2};

/// Smallest loss reduction that justifies a split.
const MIN_SPLIT_GAIN: f64 = 1e-6;

/// Tree-shape hyper-parameters used while growing.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GrowParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub lambda: f64,
    pub gamma: f64,
    pub min_child_weight: f64,
}

#[derive(Clone, Copy, Debug)]
struct Split {
    feature: usize,
    threshold: f32,
    gain: f64,
}

/// Row indices of `x` sorted by value, one list per feature.
pub(crate) fn presort(x: ArrayView2<'_, f32>) -> Vec<Vec<usize>> {
    (0..x.ncols())
        .map(|feature| {
            let column = x.column(feature);
            let mut order: Vec<usize> = (0..x.nrows()).collect();
            order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));
            order
        })
        .collect()
}

/// Threshold between two consecutive distinct values `low < high`.
///
/// Every value `<= low` compares below it and `high` does not.
fn split_threshold(low: f32, high: f32) -> f32 {
    let mid = low + (high - low) / 2.0;
    if mid <= low || mid > high {
        high
    } else {
        mid
    }
}

struct Grower<'a> {
    x: ArrayView2<'a, f32>,
    grad: ArrayView1<'a, f32>,
    hess: ArrayView1<'a, f32>,
    params: GrowParams,
    goes_left: Vec<bool>,
    nodes: Vec<TreeNode>,
}

impl Grower<'_> {
    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(g, h), &r| {
            (g + self.grad[r] as f64, h + self.hess[r] as f64)
        })
    }

    fn leaf_weight(&self, g: f64, h: f64) -> f32 {
        (-self.params.learning_rate * g / (h + self.params.lambda)) as f32
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    /// Best split of a node over all features, if any clears the gain floor.
    ///
    /// `sorted[f]` holds the node's rows ordered by feature `f`.
    fn best_split(&self, sorted: &[Vec<usize>], g: f64, h: f64) -> Option<Split> {
        let parent = self.score(g, h);
        let mut best: Option<Split> = None;

        for (feature, order) in sorted.iter().enumerate() {
            let (mut gl, mut hl) = (0.0f64, 0.0f64);
            let mut prev: Option<f32> = None;

            for &r in order {
                let value = self.x[[r, feature]];
                if let Some(low) = prev {
                    if value > low {
                        let (gr, hr) = (g - gl, h - hl);
                        if hl >= self.params.min_child_weight && hr >= self.params.min_child_weight
                        {
                            let gain = 0.5 * (self.score(gl, hl) + self.score(gr, hr) - parent)
                                - self.params.gamma;
                            if gain > MIN_SPLIT_GAIN && best.map_or(true, |b| gain > b.gain) {
                                best = Some(Split {
                                    feature,
                                    threshold: split_threshold(low, value),
                                    gain,
                                });
                            }
                        }
                    }
                }
                gl += self.grad[r] as f64;
                hl += self.hess[r] as f64;
                prev = Some(value);
            }
        }
        best
    }

    /// Grows the subtree for `rows` and returns its node index.
    ///
    /// Each child receives its share of the parent's sorted lists, order
    /// preserved, so no node rescans rows outside it.
    fn grow(&mut self, rows: Vec<usize>, sorted: Vec<Vec<usize>>, depth: usize) -> usize {
        let (g, h) = self.sums(&rows);
        let weight = self.leaf_weight(g, h);
        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf { weight });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return idx;
        }

        let Some(split) = self.best_split(&sorted, g, h) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.x[[r, split.feature]] < split.threshold);

        for &r in &left_rows {
            self.goes_left[r] = true;
        }
        let (left_sorted, right_sorted): (Vec<Vec<usize>>, Vec<Vec<usize>>) = sorted
            .into_iter()
            .map(|order| order.into_iter().partition(|&r| self.goes_left[r]))
            .unzip();
        for &r in &left_rows {
            self.goes_left[r] = false;
        }

        let left = self.grow(left_rows, left_sorted, depth + 1);
        let right = self.grow(right_rows, right_sorted, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }
}

/// Fits one regression tree to `(grad, hess)` over all rows of `x`.
///
/// `sorted` must come from [`presort`] on the same `x`.
pub(crate) fn grow_tree(
    x: ArrayView2<'_, f32>,
    sorted: &[Vec<usize>],
    grad: ArrayView1<'_, f32>,
    hess: ArrayView1<'_, f32>,
    params: GrowParams,
) -> Result<RegressionTree, ModelError> {
    let n_rows = x.nrows();
    let mut grower = Grower {
        x: x.view(),
        grad: grad.view(),
        hess: hess.view(),
        params,
        goes_left: vec![false; n_rows],
        nodes: Vec::new(),
    };
    grower.grow((0..n_rows).collect(), sorted.to_vec(), 0);
    RegressionTree::from_nodes(grower.nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params() -> GrowParams {
        GrowParams {
            max_depth: 6,
            learning_rate: 1.0,
            lambda: 0.0,
            gamma: 0.0,
            min_child_weight: 0.0,
        }
    }

    #[test]
    fn test_split_threshold() {
        assert_eq!(split_threshold(1.0, 3.0), 2.0);
        let tiny = f32::from_bits(1);
        assert_eq!(split_threshold(0.0, tiny), tiny);
    }

    #[test]
    fn test_presort_orders_rows() {
        let x = array![[3.0f32, 0.0], [1.0, 5.0], [2.0, -1.0]];
        assert_eq!(presort(x.view()), vec![vec![1, 2, 0], vec![2, 0, 1]]);
    }

    #[test]
    fn test_separable_gradients_split_once() {
        let x = array![[1.0f32], [2.0], [10.0], [11.0]];
        let grad = array![1.0f32, 1.0, -1.0, -1.0];
        let hess = array![1.0f32, 1.0, 1.0, 1.0];
        let sorted = presort(x.view());

        let tree = grow_tree(x.view(), &sorted, grad.view(), hess.view(), params()).unwrap();

        match &tree.nodes()[0] {
            TreeNode::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 0);
                assert_eq!(*threshold, 6.0);
            }
            other => panic!("expected a split, got {:?}", other),
        }
        // Leaf weight -G/H: left -2/2 = -1, right 2/2 = 1.
        assert_eq!(tree.predict(array![1.5f32].view()), -1.0);
        assert_eq!(tree.predict(array![10.5f32].view()), 1.0);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_constant_feature_yields_leaf() {
        let x = array![[4.0f32], [4.0], [4.0]];
        let grad = array![1.0f32, -1.0, 0.5];
        let hess = array![1.0f32, 1.0, 1.0];
        let sorted = presort(x.view());

        let tree = grow_tree(x.view(), &sorted, grad.view(), hess.view(), params()).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_max_depth_zero_is_a_single_leaf() {
        let x = array![[1.0f32], [10.0]];
        let grad = array![1.0f32, -1.0];
        let hess = array![1.0f32, 1.0];
        let sorted = presort(x.view());

        let tree = grow_tree(
            x.view(),
            &sorted,
            grad.view(),
            hess.view(),
            GrowParams {
                max_depth: 0,
                ..params()
            },
        )
        .unwrap();
        assert_eq!(tree.nodes().len(), 1);
    }

    #[test]
    fn test_min_child_weight_blocks_split() {
        let x = array![[1.0f32], [10.0]];
        let grad = array![1.0f32, -1.0];
        let hess = array![0.5f32, 0.5];
        let sorted = presort(x.view());

        let tree = grow_tree(
            x.view(),
            &sorted,
            grad.view(),
            hess.view(),
            GrowParams {
                min_child_weight: 1.0,
                ..params()
            },
        )
        .unwrap();
        assert_eq!(tree.n_leaves(), 1);
    }

    #[test]
    fn test_gamma_blocks_weak_split() {
        let x = array![[1.0f32], [10.0]];
        let grad = array![0.1f32, -0.1];
        let hess = array![1.0f32, 1.0];
        let sorted = presort(x.view());

        let tree = grow_tree(
            x.view(),
            &sorted,
            grad.view(),
            hess.view(),
            GrowParams {
                gamma: 1.0,
                ..params()
            },
        )
        .unwrap();
        assert_eq!(tree.n_leaves(), 1);
    }

    #[test]
    fn test_split_on_second_feature() {
        let x = array![[0.0f32, 1.0], [0.0, 2.0], [0.0, 8.0], [0.0, 9.0]];
        let grad = array![-1.0f32, -1.0, 1.0, 1.0];
        let hess = array![1.0f32, 1.0, 1.0, 1.0];
        let sorted = presort(x.view());

        let tree = grow_tree(x.view(), &sorted, grad.view(), hess.view(), params()).unwrap();
        assert_eq!(tree.max_feature(), Some(1));
    }

    #[test]
    fn test_children_split_on_their_own_rows() {
        // Rows interleaved so every presorted list mixes all four groups.
        let x = array![
            [1.0f32, 1.0],
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [1.0, 0.0]
        ];
        let grad = array![4.0f32, -4.0, 2.0, -2.0, -4.0, 4.0, -2.0, 2.0];
        let hess = array![1.0f32, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let sorted = presort(x.view());

        let tree = grow_tree(
            x.view(),
            &sorted,
            grad.view(),
            hess.view(),
            GrowParams {
                max_depth: 2,
                ..params()
            },
        )
        .unwrap();

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_leaves(), 4);
        assert_eq!(tree.predict(array![0.0f32, 0.0].view()), 4.0);
        assert_eq!(tree.predict(array![0.0f32, 1.0].view()), 2.0);
        assert_eq!(tree.predict(array![1.0f32, 0.0].view()), -2.0);
        assert_eq!(tree.predict(array![1.0f32, 1.0].view()), -4.0);
    }

    #[test]
    fn test_grow_tree_with_owned_inputs() {
        let x = array![[1.0f32], [2.0], [10.0], [11.0]];
        let sorted = presort(x.view());
        let grad = array![1.0f32, 1.0, -1.0, -1.0];
        let hess = grad.mapv(|_| 1.0f32);

        let tree = grow_tree(x.view(), &sorted, grad.view(), hess.view(), params()).unwrap();
        assert_eq!(tree.predict(x.row(3)), 1.0);
    }
}
