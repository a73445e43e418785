use serde::Serialize;

use crate::steganalysis::common::error::{AnalysisError, ErrorKind};
use crate::steganalysis::scoring::Verdict;

/// Successful analysis: the verdict fields plus the explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub error_kind: ErrorKind,
    pub message: String,
}

impl From<&AnalysisError> for ErrorReport {
    fn from(error: &AnalysisError) -> Self {
        Self {
            error_kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Status envelope returned for every request.
///
/// ```json
/// { "status": "success", "prediction": "STEGO", "confidence": 0.81, ... }
/// { "status": "error", "error_kind": "invalid_input", "message": "..." }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisResponse {
    Success(AnalysisReport),
    Error(ErrorReport),
}

impl AnalysisResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResponse::Success(_))
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            AnalysisResponse::Success(report) => Some(&report.verdict),
            AnalysisResponse::Error(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            AnalysisResponse::Success(_) => None,
            AnalysisResponse::Error(report) => Some(report.error_kind),
        }
    }
}

impl From<AnalysisError> for AnalysisResponse {
    fn from(error: AnalysisError) -> Self {
        AnalysisResponse::Error(ErrorReport::from(&error))
    }
}
