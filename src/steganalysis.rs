//! Steganalysis pipeline module
//!
//! This module classifies grayscale images as cover or stego, with separate
//! modules for image normalization, feature extraction, ensemble scoring,
//! explanation and request orchestration.

pub mod common;
pub mod normalize;
pub mod features;
pub mod scoring;
pub mod explain;
pub mod analysis;

#[cfg(test)]
pub(crate) mod test_support;

pub use common::{
    AnalysisError,
    CancellationToken,
    ErrorKind,
    Result,
};

pub use normalize::{
    BitDepth,
    DecodedImage,
    GrayImage,
    ImageNormalizer,
    ImageReader,
    Samples,
    StandardImageReader,
};

pub use features::{
    FeatureExtractor,
    FeatureGroup,
    FeatureVector,
    FEATURE_COUNT,
    FEATURE_NAMES,
};

pub use scoring::{
    Classifier,
    Ensemble,
    FeatureContribution,
    InputTransform,
    Label,
    LogisticModel,
    ModelArtifacts,
    RandomForest,
    ScoringConfig,
    StandardScaler,
    Verdict,
};

pub use explain::{
    Explainer,
    Explanation,
    ExplanationError,
    MockTextGenerator,
    OllamaClient,
    TextGenerator,
    FALLBACK_EXPLANATION,
};

pub use analysis::{
    AnalysisConfig,
    AnalysisConfigBuilder,
    AnalysisReport,
    AnalysisResponse,
    ErrorReport,
    ImageAnalyzer,
    PipelineTimings,
    StegoAnalysisPipeline,
};
