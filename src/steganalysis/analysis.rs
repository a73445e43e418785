//! Request orchestration module
//!
//! Wires normalization, feature extraction, scoring and explanation into a
//! single call and maps every outcome onto the status envelope returned to
//! clients.

pub mod types;
pub mod timing;
mod response;
mod pipeline;

#[cfg(test)]
mod tests;

pub use types::{AnalysisConfig, AnalysisConfigBuilder};
pub use timing::{PipelineTimings, StepTiming, Timer};
pub use response::{AnalysisReport, AnalysisResponse, ErrorReport};
pub use pipeline::{ImageAnalyzer, StegoAnalysisPipeline};
