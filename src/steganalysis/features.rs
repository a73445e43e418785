//! Feature extraction module
//!
//! Statistical, textural and frequency-domain descriptors computed from the
//! canonical grayscale buffer, concatenated in a fixed schema order.

mod schema;
pub mod stats;
pub mod histogram;
pub mod lsb;
pub mod difference;
pub mod glcm;
pub mod residual;
pub mod frequency;
mod extractor;

pub use schema::{
    feature_index,
    FeatureVector,
    EPSILON,
    FEATURE_COUNT,
    FEATURE_NAMES,
    VARIANCE_INDEX,
};
pub use extractor::{FeatureExtractor, FeatureGroup};
