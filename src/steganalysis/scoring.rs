//! Ensemble scoring module
//!
//! Trained model artifacts, the classifiers they describe, and the fixed
//! weight fusion that turns a feature vector into a verdict.

mod artifacts;
mod classifier;
mod ensemble;
mod forest;
mod logistic;
mod scaler;
pub mod types;

pub use artifacts::{
    ModelArtifacts,
    FEATURE_NAMES_FILE,
    FOREST_FILE,
    LOGISTIC_FILE,
    SCALER_FILE,
};
pub use classifier::{Classifier, InputTransform};
pub use ensemble::Ensemble;
pub use forest::{DecisionTree, ForestArtifact, RandomForest, TreeArtifact};
pub use logistic::LogisticModel;
pub use scaler::StandardScaler;
pub use types::{FeatureContribution, Label, ScoringConfig, Verdict};
