//! Random forest (tree ensemble) classifier
//!
//! Trees are stored in flattened form: parallel arrays indexed by node id,
//! with `children_left[i] == -1` marking a leaf. `value[i]` holds the
//! per-class weights at node `i` (sample counts or fractions).
//!
//! **Prediction:** each tree's leaf weights are normalized to probabilities,
//! the probabilities are averaged over all trees and the argmax is returned.

use std::path::Path;

use serde::Deserialize;

use super::{argmax, read_json, ModelError};

const LEAF: i64 = -1;

/// One flattened decision tree
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

/// Tree ensemble loaded from `random_forest_model.json`
#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    pub n_classes: usize,
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let forest: Self = read_json(path)?;
        forest.validate()?;
        Ok(forest)
    }

    /// Check structural consistency so prediction can index without panicking
    ///
    /// Child ids must point forward (`child > parent`), which also rules out
    /// cycles.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_classes == 0 {
            return Err(ModelError::Invalid("forest has no classes".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("forest has no trees".to_string()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            let n = tree.children_left.len();
            if n == 0 {
                return Err(ModelError::Invalid(format!("tree {} is empty", t)));
            }
            if tree.children_right.len() != n
                || tree.feature.len() != n
                || tree.threshold.len() != n
                || tree.value.len() != n
            {
                return Err(ModelError::Invalid(format!(
                    "tree {} has mismatched node array lengths",
                    t
                )));
            }

            for node in 0..n {
                if tree.value[node].len() != self.n_classes {
                    return Err(ModelError::Invalid(format!(
                        "tree {} node {} has {} class weights, expected {}",
                        t,
                        node,
                        tree.value[node].len(),
                        self.n_classes
                    )));
                }

                let (left, right) = (tree.children_left[node], tree.children_right[node]);
                if left == LEAF {
                    continue;
                }
                let in_range = |child: i64| child > node as i64 && (child as usize) < n;
                if !in_range(left) || !in_range(right) {
                    return Err(ModelError::Invalid(format!(
                        "tree {} node {} has invalid children ({}, {})",
                        t, node, left, right
                    )));
                }
                let feature = tree.feature[node];
                if feature < 0 || feature as usize >= self.n_features {
                    return Err(ModelError::Invalid(format!(
                        "tree {} node {} splits on feature {} (n_features = {})",
                        t, node, feature, self.n_features
                    )));
                }
            }
        }

        Ok(())
    }

    /// Averaged class probabilities
    pub fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::Shape {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let mut proba = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            let weights = &tree.value[tree.leaf_for(features)];
            let total: f64 = weights.iter().sum();
            if total > 0.0 {
                for (p, w) in proba.iter_mut().zip(weights) {
                    *p += w / total;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }

    /// Predicted class index
    pub fn predict(&self, features: &[f32]) -> Result<usize, ModelError> {
        let proba = self.predict_proba(features)?;
        argmax(&proba).ok_or_else(|| ModelError::Invalid("no class probabilities".to_string()))
    }
}

impl DecisionTree {
    /// Walk from the root to a leaf (`x[feature] <= threshold` goes left)
    fn leaf_for(&self, features: &[f32]) -> usize {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let x = features[self.feature[node] as usize] as f64;
            node = if x <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        node
    }
}
