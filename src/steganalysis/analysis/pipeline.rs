use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, info_span, instrument, warn};

use crate::steganalysis::analysis::response::{AnalysisReport, AnalysisResponse};
use crate::steganalysis::analysis::timing::{PipelineTimings, Timer};
use crate::steganalysis::analysis::types::AnalysisConfig;
use crate::steganalysis::common::cancel::CancellationToken;
use crate::steganalysis::common::error::{AnalysisError, Result};
use crate::steganalysis::explain::{Explainer, OllamaClient, TextGenerator};
use crate::steganalysis::features::FeatureExtractor;
use crate::steganalysis::normalize::{GrayImage, ImageNormalizer, ImageReader, StandardImageReader};
use crate::steganalysis::scoring::{Ensemble, ModelArtifacts, Verdict};

/// Something that can analyze an image stored on disk. The HTTP boundary
/// depends on this rather than on a concrete pipeline.
pub trait ImageAnalyzer: Send + Sync {
    fn analyze_file_with_cancel(&self, path: &Path, cancel: &CancellationToken) -> AnalysisResponse;
}

pub struct StegoAnalysisPipeline<R: ImageReader, G: TextGenerator> {
    reader: R,
    normalizer: ImageNormalizer,
    extractor: FeatureExtractor,
    ensemble: Arc<Ensemble>,
    explainer: Explainer<G>,
    config: AnalysisConfig,
}

impl StegoAnalysisPipeline<StandardImageReader, OllamaClient> {
    /// Loads the model artifacts from `config.model_dir` and connects the
    /// explainer to the configured Ollama instance. Any artifact problem is
    /// fatal here rather than per request.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let artifacts = ModelArtifacts::load(&config.model_dir)?;
        let ensemble = Ensemble::from_artifacts(artifacts, &config.scoring)?;
        let client = OllamaClient::new(&config.ollama_url, config.explanation_timeout)
            .map_err(|e| AnalysisError::Configuration(e.to_string()))?;
        Ok(Self::with_custom(
            StandardImageReader,
            client,
            Arc::new(ensemble),
            config,
        ))
    }
}

impl<R: ImageReader, G: TextGenerator + 'static> StegoAnalysisPipeline<R, G> {
    pub fn with_custom(reader: R, generator: G, ensemble: Arc<Ensemble>, config: AnalysisConfig) -> Self {
        let explainer = Explainer::new(
            generator,
            config.llm_model.clone(),
            config.explanation_timeout,
        );
        Self {
            reader,
            normalizer: ImageNormalizer::new(config.min_texture_std_dev),
            extractor: FeatureExtractor::new(config.parallel_features),
            ensemble,
            explainer,
            config,
        }
    }

    /// Decode and normalize into the canonical buffer.
    pub fn load_image(&self, data: &[u8]) -> Result<GrayImage> {
        let decoded = self.reader.read_image(data)?;
        self.normalizer.normalize(&decoded)
    }

    /// Verdict without an explanation.
    pub fn predict_bytes(&self, data: &[u8]) -> Result<Verdict> {
        self.predict_timed(data, &mut PipelineTimings::new())
    }

    pub fn predict_bytes_with_timings(&self, data: &[u8]) -> Result<(Verdict, PipelineTimings)> {
        let mut timings = PipelineTimings::new();
        let verdict = self.predict_timed(data, &mut timings)?;
        Ok((verdict, timings))
    }

    fn predict_timed(&self, data: &[u8], timings: &mut PipelineTimings) -> Result<Verdict> {
        let image = info_span!("normalize", bytes = data.len()).in_scope(|| -> Result<GrayImage> {
            let timer = Timer::start("decode");
            let decoded = self.reader.read_image(data)?;
            timings.record(timer);

            let timer = Timer::start("normalize");
            let image = self.normalizer.normalize(&decoded)?;
            timings.record(timer);
            Ok(image)
        })?;

        let features = info_span!("extract_features").in_scope(|| {
            let timer = Timer::start("extract_features");
            let features = self.extractor.extract(&image);
            timings.record(timer);
            features
        });

        info_span!("score").in_scope(|| -> Result<Verdict> {
            let timer = Timer::start("score");
            let verdict = self.ensemble.score(&features)?;
            timings.record(timer);
            Ok(verdict)
        })
    }

    pub fn analyze_bytes(&self, data: &[u8]) -> AnalysisResponse {
        self.analyze_bytes_with_cancel(data, &CancellationToken::new())
    }

    pub fn analyze_bytes_with_cancel(&self, data: &[u8], cancel: &CancellationToken) -> AnalysisResponse {
        self.analyze_bytes_with_timings(data, cancel).0
    }

    /// Full analysis. Errors never escape: they become the error envelope.
    /// Timings cover the steps that ran, up to the failing one.
    #[instrument(skip_all, fields(bytes = data.len()))]
    pub fn analyze_bytes_with_timings(
        &self,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> (AnalysisResponse, PipelineTimings) {
        let mut timings = PipelineTimings::new();
        let response = match self.run(data, cancel, &mut timings) {
            Ok(report) => {
                info!(
                    prediction = %report.verdict.label,
                    confidence = report.verdict.confidence,
                    total_ms = timings.total_duration().as_secs_f64() * 1000.0,
                    "Analysis complete"
                );
                AnalysisResponse::Success(report)
            }
            Err(e) => {
                if e.is_configuration_error() {
                    error!(error = %e, "Analysis failed: models and extractor disagree");
                } else {
                    warn!(error = %e, "Analysis rejected input");
                }
                AnalysisResponse::from(e)
            }
        };
        (response, timings)
    }

    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> AnalysisResponse {
        ImageAnalyzer::analyze_file_with_cancel(self, path.as_ref(), &CancellationToken::new())
    }

    fn run(
        &self,
        data: &[u8],
        cancel: &CancellationToken,
        timings: &mut PipelineTimings,
    ) -> Result<AnalysisReport> {
        let verdict = self.predict_timed(data, timings)?;

        let llm_explanation = if self.config.explain {
            let explanation = info_span!("explain").in_scope(|| {
                let timer = Timer::start("explain");
                let explanation = self.explainer.explain(&verdict, cancel);
                timings.record(timer);
                explanation
            });
            Some(explanation.text)
        } else {
            None
        };

        Ok(AnalysisReport {
            verdict,
            llm_explanation,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn ensemble(&self) -> &Arc<Ensemble> {
        &self.ensemble
    }
}

impl<R: ImageReader, G: TextGenerator + 'static> ImageAnalyzer for StegoAnalysisPipeline<R, G> {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn analyze_file_with_cancel(&self, path: &Path, cancel: &CancellationToken) -> AnalysisResponse {
        match ImageNormalizer::read_file(path) {
            Ok(data) => self.analyze_bytes_with_cancel(&data, cancel),
            Err(e) => {
                warn!(error = %e, "Could not read image file");
                AnalysisResponse::from(e)
            }
        }
    }
}
