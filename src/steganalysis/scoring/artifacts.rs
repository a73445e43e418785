//! Trained model artifacts.
//!
//! Loaded once at startup from a model directory and never mutated:
//!
//! - `scaler.json`: `{ "mean": [..], "scale": [..] }`
//! - `log_model.json`: `{ "coefficients": [..], "intercept": x }`
//! - `rf_model.json`: `{ "feature_importances": [..], "trees": [..] }`
//! - `feature_names.json` (optional): the training column order

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, instrument};

use crate::steganalysis::common::error::{AnalysisError, Result};
use crate::steganalysis::scoring::classifier::Classifier;
use crate::steganalysis::scoring::forest::{ForestArtifact, RandomForest};
use crate::steganalysis::scoring::logistic::LogisticModel;
use crate::steganalysis::scoring::scaler::StandardScaler;

pub const SCALER_FILE: &str = "scaler.json";
pub const LOGISTIC_FILE: &str = "log_model.json";
pub const FOREST_FILE: &str = "rf_model.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";

#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub scaler: StandardScaler,
    pub logistic: LogisticModel,
    pub forest: RandomForest,
    /// Column order recorded at training time, when exported.
    pub feature_names: Option<Vec<String>>,
}

impl ModelArtifacts {
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let scaler: StandardScaler = read_json(&dir.join(SCALER_FILE))?;
        let logistic: LogisticModel = read_json(&dir.join(LOGISTIC_FILE))?;
        let forest: ForestArtifact = read_json(&dir.join(FOREST_FILE))?;
        let names_path = dir.join(FEATURE_NAMES_FILE);
        let feature_names = if names_path.exists() {
            Some(read_json::<Vec<String>>(&names_path)?)
        } else {
            None
        };

        let artifacts = Self::from_parts(scaler, logistic, RandomForest::try_from(forest)?, feature_names)?;
        info!(
            features = artifacts.n_features(),
            trees = artifacts.forest.n_trees(),
            "Model artifacts loaded"
        );
        Ok(artifacts)
    }

    /// Checks that the three models agree on the feature count.
    pub fn from_parts(
        scaler: StandardScaler,
        logistic: LogisticModel,
        forest: RandomForest,
        feature_names: Option<Vec<String>>,
    ) -> Result<Self> {
        scaler.validate()?;
        logistic.validate()?;

        let n = scaler.n_features();
        if logistic.n_features() != n || forest.n_features() != n {
            return Err(AnalysisError::FeatureMismatch(format!(
                "scaler expects {} features, logistic model {}, random forest {}",
                n,
                logistic.n_features(),
                forest.n_features()
            )));
        }
        if let Some(names) = &feature_names {
            if names.len() != n {
                return Err(AnalysisError::FeatureMismatch(format!(
                    "{} feature names recorded for {} model features",
                    names.len(),
                    n
                )));
            }
        }

        Ok(Self {
            scaler,
            logistic,
            forest,
            feature_names,
        })
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    /// Fails loudly if the models were trained on a different schema than
    /// the extractor produces.
    pub fn validate_schema(&self, schema: &[&str]) -> Result<()> {
        if self.n_features() != schema.len() {
            return Err(AnalysisError::FeatureMismatch(format!(
                "models were trained on {} features, extractor produces {}",
                self.n_features(),
                schema.len()
            )));
        }
        if let Some(names) = &self.feature_names {
            if let Some((index, (trained, current))) = names
                .iter()
                .zip(schema)
                .enumerate()
                .find(|(_, (trained, current))| trained.as_str() != **current)
            {
                return Err(AnalysisError::FeatureMismatch(format!(
                    "feature {} is `{}` in the models but `{}` in the extractor",
                    index, trained, current
                )));
            }
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AnalysisError::ArtifactLoad(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| AnalysisError::ArtifactLoad(format!("{}: {}", path.display(), e)))
}
