use serde::{Deserialize, Serialize};

use crate::steganalysis::common::error::{AnalysisError, Result};
use crate::steganalysis::scoring::classifier::Classifier;

/// Binary logistic regression, `sigmoid(w . x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn validate(&self) -> Result<()> {
        if self.coefficients.is_empty() {
            return Err(AnalysisError::ArtifactLoad(
                "logistic model has no coefficients".to_string(),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AnalysisError::ArtifactLoad(
                "logistic model parameters must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn decision_function(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticModel {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.decision_function(features))
    }

    /// `x_i * w_i`
    fn contributions(&self, features: &[f64]) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .collect()
    }
}
