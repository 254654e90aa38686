//! Regression trees stored as a flat node arena.

use crate::model::ModelError;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// One node of a [`RegressionTree`].
///
/// Children are indices into the tree's node vector and are always greater
/// than the index of their parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Samples with `x[feature] < threshold` go left, all others go right.
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    /// Additive margin contribution.
    Leaf { weight: f32 },
}

/// A binary regression tree; the root is node 0.
#[derive(Clone, Debug, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// A tree consisting of a single leaf.
    pub fn leaf(weight: f32) -> Self {
        Self {
            nodes: vec![TreeNode::Leaf { weight }],
        }
    }

    /// Builds a tree from its nodes, checking the arena is well formed.
    pub fn from_nodes(nodes: Vec<TreeNode>) -> Result<Self, ModelError> {
        if nodes.is_empty() {
            return Err(ModelError::InvalidParams("tree has no nodes".to_string()));
        }

        let mut referenced = vec![false; nodes.len()];
        for (idx, node) in nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    for &child in [left, right] {
                        if child <= idx || child >= nodes.len() {
                            return Err(ModelError::InvalidParams(format!(
                                "node {} has invalid child {}",
                                idx, child
                            )));
                        }
                        if referenced[child] {
                            return Err(ModelError::InvalidParams(format!(
                                "node {} has more than one parent",
                                child
                            )));
                        }
                        referenced[child] = true;
                    }
                    if threshold.is_nan() {
                        return Err(ModelError::InvalidParams(format!(
                            "node {} has a NaN threshold",
                            idx
                        )));
                    }
                }
                TreeNode::Leaf { weight } => {
                    if !weight.is_finite() {
                        return Err(ModelError::InvalidParams(format!(
                            "leaf {} has non-finite weight",
                            idx
                        )));
                    }
                }
            }
        }

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<TreeNode> {
        self.nodes
    }

    /// Largest feature index used by any split.
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut deepest = 0;
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                depths[*left] = depths[idx] + 1;
                depths[*right] = depths[idx] + 1;
                deepest = deepest.max(depths[idx] + 1);
            }
        }
        deepest
    }

    /// Leaf weight reached by `x`.
    ///
    /// `x` must be at least `max_feature() + 1` wide.
    pub fn predict(&self, x: ArrayView1<'_, f32>) -> f32 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { weight } => return *weight,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}
