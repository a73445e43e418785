use crate::steganalysis::scoring::scaler::StandardScaler;

/// A trained binary classifier over a fixed-length feature vector.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Feature count the model was trained on.
    fn n_features(&self) -> usize;

    /// Probability of the positive (stego) class.
    fn predict_proba(&self, features: &[f64]) -> f64;

    /// Per-feature signed contribution on the same input.
    fn contributions(&self, features: &[f64]) -> Vec<f64>;
}

/// Preprocessing paired with a classifier when it joins the ensemble.
#[derive(Debug, Clone)]
pub enum InputTransform {
    /// Raw features.
    Identity,
    /// Features standardized with the training-time scaler.
    Standardize(StandardScaler),
}

impl InputTransform {
    pub fn apply(&self, features: &[f64]) -> Vec<f64> {
        match self {
            InputTransform::Identity => features.to_vec(),
            InputTransform::Standardize(scaler) => scaler.transform(features),
        }
    }

    /// Expected input length, if the transform is length-bound.
    pub fn n_features(&self) -> Option<usize> {
        match self {
            InputTransform::Identity => None,
            InputTransform::Standardize(scaler) => Some(scaler.n_features()),
        }
    }
}
