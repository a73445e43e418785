//! Random forest evaluation over exported decision trees.
//!
//! Trees arrive in the flat parallel-array layout common to CART exports:
//! node `i` is a leaf when `children_left[i] == -1`, otherwise it routes
//! `x[feature[i]] <= threshold[i]` to the left child. Leaf `value` rows
//! hold per-class weights `[cover, stego]`.

use serde::{Deserialize, Serialize};

use crate::steganalysis::common::error::{AnalysisError, Result};
use crate::steganalysis::scoring::classifier::Classifier;

const LEAF: i64 = -1;

/// Serialized tree as stored in the artifact file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

/// Serialized forest as stored in the artifact file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestArtifact {
    pub feature_importances: Vec<f64>,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        stego_probability: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Validates the flat arrays. Children must point strictly forward so
    /// traversal always terminates.
    pub fn from_artifact(tree: &TreeArtifact, n_features: usize) -> Result<Self> {
        let n = tree.children_left.len();
        if n == 0
            || tree.children_right.len() != n
            || tree.feature.len() != n
            || tree.threshold.len() != n
            || tree.value.len() != n
        {
            return Err(AnalysisError::ArtifactLoad(
                "decision tree arrays are empty or of unequal length".to_string(),
            ));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (tree.children_left[i], tree.children_right[i]);
            if left == LEAF {
                nodes.push(Node::Leaf {
                    stego_probability: leaf_probability(&tree.value[i])?,
                });
                continue;
            }

            let forward = |child: i64| child > i as i64 && (child as usize) < n;
            if !forward(left) || !forward(right) {
                return Err(AnalysisError::ArtifactLoad(format!(
                    "node {} has invalid children ({}, {})",
                    i, left, right
                )));
            }
            let feature = tree.feature[i];
            if feature < 0 || feature as usize >= n_features {
                return Err(AnalysisError::ArtifactLoad(format!(
                    "node {} splits on feature {} outside 0..{}",
                    i, feature, n_features
                )));
            }
            nodes.push(Node::Split {
                feature: feature as usize,
                threshold: tree.threshold[i],
                left: left as usize,
                right: right as usize,
            });
        }

        Ok(Self { nodes })
    }

    /// Features are compared in single precision, the precision the forest
    /// was fit in.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { stego_probability } => return *stego_probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = f64::from(features[*feature] as f32);
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn leaf_probability(value: &[f64]) -> Result<f64> {
    match value {
        [cover, stego] => {
            let total = cover + stego;
            if !total.is_finite() || *cover < 0.0 || *stego < 0.0 {
                return Err(AnalysisError::ArtifactLoad(
                    "leaf class weights must be finite and non-negative".to_string(),
                ));
            }
            Ok(if total > 0.0 { stego / total } else { 0.0 })
        }
        other => Err(AnalysisError::ArtifactLoad(format!(
            "leaf holds {} class weights, expected 2",
            other.len()
        ))),
    }
}

/// Averaged ensemble of decision trees with impurity-based importances.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

impl TryFrom<ForestArtifact> for RandomForest {
    type Error = AnalysisError;

    fn try_from(artifact: ForestArtifact) -> Result<Self> {
        let n_features = artifact.feature_importances.len();
        if n_features == 0 || artifact.trees.is_empty() {
            return Err(AnalysisError::ArtifactLoad(
                "random forest needs feature importances and at least one tree".to_string(),
            ));
        }
        let trees = artifact
            .trees
            .iter()
            .map(|tree| DecisionTree::from_artifact(tree, n_features))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            trees,
            feature_importances: artifact.feature_importances,
        })
    }
}

impl RandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.feature_importances.len()
    }

    fn predict_proba(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        sum / self.trees.len() as f64
    }

    /// `x_i * importance_i`
    fn contributions(&self, features: &[f64]) -> Vec<f64> {
        self.feature_importances
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .collect()
    }
}
