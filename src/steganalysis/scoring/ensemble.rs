use tracing::{debug, instrument, warn};

use crate::steganalysis::common::error::{AnalysisError, Result};
use crate::steganalysis::features::{FeatureVector, FEATURE_NAMES, VARIANCE_INDEX};
use crate::steganalysis::scoring::artifacts::ModelArtifacts;
use crate::steganalysis::scoring::classifier::{Classifier, InputTransform};
use crate::steganalysis::scoring::types::{
    round_to, FeatureContribution, Label, ScoringConfig, Verdict,
};

const CONFIDENCE_DECIMALS: usize = 4;
const INFLUENCE_DECIMALS: usize = 6;

/// A classifier together with the preprocessing it was trained on.
struct Member {
    transform: InputTransform,
    classifier: Box<dyn Classifier>,
    weight: f64,
}

/// Fixed-weight fusion of heterogeneous classifiers.
///
/// Each member sees its own view of the features (standardized or raw)
/// through the transform it was registered with. Probabilities and
/// per-feature contributions are fused with the same weights.
pub struct Ensemble {
    members: Vec<Member>,
    feature_names: Vec<String>,
    threshold: f64,
    top_k: usize,
}

impl std::fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ensemble")
            .field(
                "members",
                &self
                    .members
                    .iter()
                    .map(|m| (m.classifier.name(), m.weight))
                    .collect::<Vec<_>>(),
            )
            .field("features", &self.feature_names.len())
            .field("threshold", &self.threshold)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl Ensemble {
    /// Empty ensemble over the given schema.
    pub fn new(feature_names: Vec<String>, threshold: f64, top_k: usize) -> Self {
        Self {
            members: Vec::new(),
            feature_names,
            threshold,
            top_k,
        }
    }

    /// Standard two-model ensemble: logistic regression on standardized
    /// features and the random forest on raw features.
    pub fn from_artifacts(artifacts: ModelArtifacts, config: &ScoringConfig) -> Result<Self> {
        artifacts.validate_schema(&FEATURE_NAMES)?;

        let weight_sum = config.logistic_weight + config.forest_weight;
        if (weight_sum - 1.0).abs() > 1e-9 {
            warn!(weight_sum, "Ensemble weights do not sum to one");
        }

        let names = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        Self::new(names, config.threshold, config.top_k)
            .with_member(
                InputTransform::Standardize(artifacts.scaler),
                artifacts.logistic,
                config.logistic_weight,
            )?
            .with_member(InputTransform::Identity, artifacts.forest, config.forest_weight)
    }

    pub fn with_member<C: Classifier + 'static>(
        mut self,
        transform: InputTransform,
        classifier: C,
        weight: f64,
    ) -> Result<Self> {
        let expected = self.feature_names.len();
        let transform_len = transform.n_features().unwrap_or(expected);
        if classifier.n_features() != expected || transform_len != expected {
            return Err(AnalysisError::FeatureMismatch(format!(
                "{} expects {} features (transform {}), schema has {}",
                classifier.name(),
                classifier.n_features(),
                transform_len,
                expected
            )));
        }
        self.members.push(Member {
            transform,
            classifier: Box::new(classifier),
            weight,
        });
        Ok(self)
    }

    pub fn expected_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fused positive-class probability and fused per-feature contributions.
    fn fuse(&self, features: &[f64]) -> (f64, Vec<f64>) {
        let mut probability = 0.0;
        let mut contributions = vec![0.0; features.len()];
        for member in &self.members {
            let input = member.transform.apply(features);
            let p = member.classifier.predict_proba(&input);
            debug!(model = member.classifier.name(), probability = p, "Member score");
            probability += member.weight * p;
            for (total, c) in contributions
                .iter_mut()
                .zip(member.classifier.contributions(&input))
            {
                *total += member.weight * c;
            }
        }
        (probability, contributions)
    }

    #[instrument(skip_all)]
    pub fn score(&self, features: &FeatureVector) -> Result<Verdict> {
        if features.len() != self.expected_features() {
            return Err(AnalysisError::FeatureMismatch(format!(
                "expected {} features, got {}",
                self.expected_features(),
                features.len()
            )));
        }
        let features = features.sanitized();
        if features.get(VARIANCE_INDEX) == Some(0.0) {
            return Err(AnalysisError::DegenerateImage);
        }

        let (probability, contributions) = self.fuse(features.values());
        let label = if probability > self.threshold {
            Label::Stego
        } else {
            Label::Cover
        };

        let mut ranked: Vec<(usize, f64)> = contributions.into_iter().enumerate().collect();
        // stable: equal magnitudes keep schema order
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        let top_features = ranked
            .into_iter()
            .take(self.top_k)
            .map(|(index, score)| FeatureContribution {
                feature: self.feature_names[index].clone(),
                influence_score: round_to(score, INFLUENCE_DECIMALS),
            })
            .collect();

        debug!(probability, %label, "Ensemble verdict");
        Ok(Verdict {
            label,
            confidence: round_to(probability, CONFIDENCE_DECIMALS),
            top_features,
        })
    }
}
