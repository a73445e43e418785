//! Feature vector schema
//!
//! The order here is the order the classifiers were trained on. Changing
//! it silently invalidates every stored model.

pub const FEATURE_COUNT: usize = 31;

/// Additive epsilon used by every ratio, entropy and logarithm.
pub const EPSILON: f64 = 1e-10;

/// Index of the intensity variance feature.
pub const VARIANCE_INDEX: usize = 1;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "mean",
    "variance",
    "skewness",
    "kurtosis",
    "lsb_entropy",
    "lsb_ratio",
    "lsb_transitions",
    "diff_mean",
    "diff_variance",
    "diff_skew",
    "glcm_contrast_0",
    "glcm_contrast_45",
    "glcm_contrast_90",
    "glcm_contrast_135",
    "glcm_correlation_0",
    "glcm_correlation_45",
    "glcm_correlation_90",
    "glcm_correlation_135",
    "glcm_energy_0",
    "glcm_energy_45",
    "glcm_energy_90",
    "glcm_energy_135",
    "glcm_homogeneity_0",
    "glcm_homogeneity_45",
    "glcm_homogeneity_90",
    "glcm_homogeneity_135",
    "residual_variance",
    "residual_energy",
    "residual_skew",
    "high_freq_energy",
    "spectral_entropy",
];

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|&n| n == name)
}

/// Ordered feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.get(i))
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Copy with NaN and infinities replaced by 0.0, the same cleaning the
    /// training set went through.
    pub fn sanitized(&self) -> Self {
        Self {
            values: self
                .values
                .iter()
                .map(|&v| if v.is_finite() { v } else { 0.0 })
                .collect(),
        }
    }

    /// Pairs each value with its schema name; extra trailing values are unnamed.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_names_are_unique() {
        let mut names = FEATURE_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FEATURE_COUNT);
    }

    #[test]
    fn sanitize_replaces_non_finite_values() {
        let vector = FeatureVector::new(vec![1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -2.5]);
        assert!(!vector.is_finite());
        let clean = vector.sanitized();
        assert_eq!(clean.values(), &[1.0, 0.0, 0.0, 0.0, -2.5]);
        assert!(clean.is_finite());
    }

    #[test]
    fn lookup_by_name() {
        let vector = FeatureVector::new((0..FEATURE_COUNT).map(|i| i as f64).collect());
        assert_eq!(vector.by_name("variance"), Some(VARIANCE_INDEX as f64));
        assert_eq!(vector.by_name("spectral_entropy"), Some(30.0));
        assert_eq!(vector.by_name("nope"), None);
    }
}
