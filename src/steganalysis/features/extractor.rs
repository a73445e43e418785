use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::steganalysis::features::schema::{FeatureVector, FEATURE_COUNT};
use crate::steganalysis::features::{difference, frequency, glcm, histogram, lsb, residual};
use crate::steganalysis::normalize::GrayImage;

/// Independent feature families, listed in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureGroup {
    Histogram,
    Lsb,
    Difference,
    Glcm,
    Residual,
    Frequency,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 6] = [
        FeatureGroup::Histogram,
        FeatureGroup::Lsb,
        FeatureGroup::Difference,
        FeatureGroup::Glcm,
        FeatureGroup::Residual,
        FeatureGroup::Frequency,
    ];

    pub fn len(self) -> usize {
        match self {
            FeatureGroup::Histogram => histogram::LEN,
            FeatureGroup::Lsb => lsb::LEN,
            FeatureGroup::Difference => difference::LEN,
            FeatureGroup::Glcm => glcm::LEN,
            FeatureGroup::Residual => residual::LEN,
            FeatureGroup::Frequency => frequency::LEN,
        }
    }

    pub fn compute(self, image: &GrayImage) -> Vec<f64> {
        match self {
            FeatureGroup::Histogram => histogram::histogram_features(image).to_vec(),
            FeatureGroup::Lsb => lsb::lsb_features(image).to_vec(),
            FeatureGroup::Difference => difference::difference_features(image).to_vec(),
            FeatureGroup::Glcm => glcm::glcm_features(image).to_vec(),
            FeatureGroup::Residual => residual::residual_features(image).to_vec(),
            FeatureGroup::Frequency => frequency::frequency_features(image).to_vec(),
        }
    }
}

/// Turns a canonical image into the ordered feature vector.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    parallel: bool,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl FeatureExtractor {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Groups may run on the rayon pool; concatenation always follows
    /// [`FeatureGroup::ALL`].
    #[instrument(skip_all, fields(parallel = self.parallel))]
    pub fn extract(&self, image: &GrayImage) -> FeatureVector {
        let groups: Vec<Vec<f64>> = if self.parallel {
            FeatureGroup::ALL
                .par_iter()
                .map(|group| group.compute(image))
                .collect()
        } else {
            FeatureGroup::ALL
                .iter()
                .map(|group| group.compute(image))
                .collect()
        };

        let mut values = Vec::with_capacity(FEATURE_COUNT);
        for (group, group_values) in FeatureGroup::ALL.iter().zip(groups) {
            debug_assert_eq!(group.len(), group_values.len(), "{:?}", group);
            values.extend(group_values);
        }
        debug!(count = values.len(), "Extracted features");

        FeatureVector::new(values)
    }
}
