//! CART decision tree classifier

use crate::error::{GreyWolfError, Result};
use crate::optimizer::TreeParams;
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the predicted class label
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node, samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity
    Gini,
    /// Shannon entropy (log2)
    Entropy,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Gini => write!(f, "gini"),
            Criterion::Entropy => write!(f, "entropy"),
        }
    }
}

/// Best split found for one feature
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth (root is depth 0)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed fixing the feature scan order
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Sorted distinct class labels seen during fit
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create an unconstrained gini tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
            random_state: None,
            n_features: 0,
            feature_importances: None,
            classes: Vec::new(),
        }
    }

    /// Build a tree from decoded hyperparameters and a fixed seed
    pub fn from_params(params: &TreeParams, seed: u64) -> Self {
        Self::new()
            .with_criterion(params.criterion)
            .with_max_depth(params.max_depth)
            .with_min_samples_split(params.min_samples_split)
            .with_min_samples_leaf(params.min_samples_leaf)
            .with_random_state(seed)
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn check_params(&self) -> Result<()> {
        if self.min_samples_split < 2 {
            return Err(GreyWolfError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: self.min_samples_split.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(GreyWolfError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: self.min_samples_leaf.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_depth == Some(0) {
            return Err(GreyWolfError::InvalidParameter {
                name: "max_depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.check_params()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(GreyWolfError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(GreyWolfError::TrainingError(format!(
                "cannot fit on an empty matrix ({} x {})",
                n_samples, n_features
            )));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(GreyWolfError::TrainingError(
                "class labels must be finite".to_string(),
            ));
        }

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(f64::total_cmp);
        classes.dedup();

        // Position of each sample's label in `classes`
        let y_idx: Vec<usize> = y
            .iter()
            .map(|v| classes.partition_point(|c| c < v))
            .collect();

        self.n_features = n_features;
        self.classes = classes;

        let feature_order = self.feature_order(n_features);
        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        let root = self.build_tree(x, &y_idx, &feature_order, &indices, 0, &mut importances);
        self.root = Some(root);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    /// Feature scan order; permuted by the seed when one is set
    fn feature_order(&self, n_features: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n_features).collect();
        if let Some(seed) = self.random_state {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            order.shuffle(&mut rng);
        }
        order
    }

    fn class_counts(&self, y_idx: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &i in indices {
            counts[y_idx[i]] += 1;
        }
        counts
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        feature_order: &[usize],
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(y_idx, indices);
        let impurity = self.impurity(&counts, n_samples);
        let leaf = || TreeNode::Leaf {
            value: self.majority_class(&counts),
            n_samples,
        };

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= 0.0;

        if should_stop {
            return leaf();
        }

        let best = match self.find_best_split(x, y_idx, feature_order, indices, &counts, impurity) {
            Some(best) => best,
            None => return leaf(),
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += n_samples as f64 * best.gain;

        let left = Box::new(self.build_tree(x, y_idx, feature_order, &left_indices, depth + 1, importances));
        let right = Box::new(self.build_tree(x, y_idx, feature_order, &right_indices, depth + 1, importances));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        feature_order: &[usize],
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        // Features are scanned in parallel; the reduction keeps scan order so ties stay deterministic
        let per_feature: Vec<Option<SplitCandidate>> = feature_order
            .par_iter()
            .map(|&feature_idx| {
                self.best_split_for_feature(x, y_idx, feature_idx, indices, parent_counts, parent_impurity)
            })
            .collect();

        let mut best: Option<SplitCandidate> = None;
        for candidate in per_feature.into_iter().flatten() {
            if best.map_or(true, |b| candidate.gain > b.gain) {
                best = Some(candidate);
            }
        }
        best
    }

    /// Sorted sweep over one feature, moving samples from right to left
    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        feature_idx: usize,
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let mut order = indices.to_vec();
        order.sort_by(|&a, &b| x[[a, feature_idx]].total_cmp(&x[[b, feature_idx]]));

        let mut left_counts = vec![0usize; parent_counts.len()];
        let mut right_counts = parent_counts.to_vec();
        let mut best_gain = 0.0f64;
        let mut best_threshold = None;

        for pos in 0..n - 1 {
            let sample = order[pos];
            let class = y_idx[sample];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let value = x[[sample, feature_idx]];
            let next = x[[order[pos + 1], feature_idx]];
            if next <= value {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let weighted = (n_left as f64 * self.impurity(&left_counts, n_left)
                + n_right as f64 * self.impurity(&right_counts, n_right))
                / n as f64;
            let gain = parent_impurity - weighted;

            if gain > best_gain {
                best_gain = gain;
                let mut threshold = (value + next) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best_threshold = Some(threshold);
            }
        }

        best_threshold.map(|threshold| SplitCandidate {
            feature_idx,
            threshold,
            gain: best_gain,
        })
    }

    fn impurity(&self, counts: &[usize], n: usize) -> f64 {
        if n == 0 {
            return 0.0;
        }
        let n = n as f64;
        match self.criterion {
            Criterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| (c as f64 / n).powi(2))
                    .sum::<f64>()
            }
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.log2()
                })
                .sum::<f64>(),
        }
    }

    /// Most common class; ties go to the smallest label
    fn majority_class(&self, counts: &[usize]) -> f64 {
        let mut best = 0;
        for (i, &c) in counts.iter().enumerate() {
            if c > counts[best] {
                best = i;
            }
        }
        self.classes.get(best).copied().unwrap_or(0.0)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(GreyWolfError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(GreyWolfError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| self.predict_sample(root, |f| row[f]))
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Predict a single feature row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        let root = self.root.as_ref().ok_or(GreyWolfError::ModelNotFitted)?;

        if row.len() != self.n_features {
            return Err(GreyWolfError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", row.len()),
            });
        }

        Ok(self.predict_sample(root, |f| row[f]))
    }

    fn predict_sample<F: Fn(usize) -> f64>(&self, node: &TreeNode, feature: F) -> f64 {
        let mut node = node;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if feature(*feature_idx) <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Whether `fit` has completed
    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Sorted class labels seen during fit
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of split levels from root to deepest leaf
    pub fn get_depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => Self::node_depth(node),
        }
    }

    fn node_depth(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => {
                1 + Self::node_depth(left).max(Self::node_depth(right))
            }
        }
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => Self::count_leaves(node),
        }
    }

    fn count_leaves(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => {
                Self::count_leaves(left) + Self::count_leaves(right)
            }
        }
    }
}
