use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid or corrupted image: {0}")]
    InvalidImage(String),

    #[error("Image has insufficient texture (standard deviation {std_dev:.4} below {minimum})")]
    InsufficientTexture { std_dev: f64, minimum: f64 },

    #[error("Image has no texture information")]
    DegenerateImage,

    #[error("Feature mismatch with trained model: {0}")]
    FeatureMismatch(String),

    #[error("Failed to load model artifacts: {0}")]
    ArtifactLoad(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Coarse classification used by the wire envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller can fix it by sending another image.
    InvalidInput,
    /// Deployment problem: models and extractor disagree, or artifacts are broken.
    Configuration,
}

impl AnalysisError {
    /// True for failures caused by the deployment rather than the submitted image.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::FeatureMismatch(_)
                | AnalysisError::ArtifactLoad(_)
                | AnalysisError::Configuration(_)
        )
    }

    pub fn kind(&self) -> ErrorKind {
        if self.is_configuration_error() {
            ErrorKind::Configuration
        } else {
            ErrorKind::InvalidInput
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
