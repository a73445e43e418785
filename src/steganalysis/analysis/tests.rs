use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::steganalysis::analysis::pipeline::{ImageAnalyzer, StegoAnalysisPipeline};
use crate::steganalysis::analysis::response::AnalysisResponse;
use crate::steganalysis::analysis::types::{AnalysisConfig, ENV_LLM_TIMEOUT_SECS, ENV_MODEL_DIR, ENV_OLLAMA_HOST};
use crate::steganalysis::common::cancel::CancellationToken;
use crate::steganalysis::common::error::{AnalysisError, ErrorKind, Result};
use crate::steganalysis::explain::{MockTextGenerator, FALLBACK_EXPLANATION};
use crate::steganalysis::features::FEATURE_COUNT;
use crate::steganalysis::normalize::{DecodedImage, GrayImage, ImageReader, StandardImageReader};
use crate::steganalysis::scoring::{Ensemble, InputTransform, LogisticModel, ModelArtifacts, ScoringConfig};
use crate::steganalysis::test_support::{encode_canonical, gray_image, textured, write_artifacts};

struct MockReader {
    should_fail: bool,
    mock_data: Option<DecodedImage>,
}

impl ImageReader for MockReader {
    fn read_image(&self, _data: &[u8]) -> Result<DecodedImage> {
        if self.should_fail {
            return Err(AnalysisError::InvalidImage("Mock decode error".to_string()));
        }
        Ok(self.mock_data.clone().unwrap_or_else(|| {
            let image = textured(7);
            DecodedImage::from_gray8(GrayImage::SIZE, GrayImage::SIZE, image.pixels())
        }))
    }
}

fn test_ensemble() -> Arc<Ensemble> {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let artifacts = ModelArtifacts::load(dir.path()).unwrap();
    Arc::new(Ensemble::from_artifacts(artifacts, &ScoringConfig::default()).unwrap())
}

fn pipeline_with(
    generator: MockTextGenerator,
    config: AnalysisConfig,
) -> StegoAnalysisPipeline<StandardImageReader, MockTextGenerator> {
    StegoAnalysisPipeline::with_custom(StandardImageReader, generator, test_ensemble(), config)
}

fn pipeline() -> StegoAnalysisPipeline<StandardImageReader, MockTextGenerator> {
    pipeline_with(MockTextGenerator::new("Generated explanation."), AnalysisConfig::default())
}

#[test]
fn test_config_builder() {
    let config = AnalysisConfig::builder()
        .model_dir("/opt/models")
        .llm_model("llama3:8b")
        .explanation_timeout(Duration::from_secs(5))
        .explain(false)
        .parallel_features(false)
        .build();

    assert_eq!(config.model_dir, Path::new("/opt/models"));
    assert_eq!(config.llm_model, "llama3:8b");
    assert_eq!(config.explanation_timeout, Duration::from_secs(5));
    assert!(!config.explain);
    assert!(!config.parallel_features);
    assert_eq!(config.ollama_url, "http://localhost:11434");
    assert_eq!(config.scoring.threshold, 0.4);
}

#[test]
fn test_config_defaults() {
    let config = AnalysisConfig::default();
    assert_eq!(config.model_dir, Path::new("models"));
    assert_eq!(config.llm_model, "phi3:latest");
    assert_eq!(config.explanation_timeout, Duration::from_secs(60));
    assert!(config.explain);
    assert_eq!(config.scoring.top_k, 5);
}

#[test]
fn test_config_from_env() {
    let config = AnalysisConfig::from_env_with(|key| match key {
        ENV_MODEL_DIR => Some("/srv/models".to_string()),
        ENV_OLLAMA_HOST => Some("127.0.0.1:11500".to_string()),
        ENV_LLM_TIMEOUT_SECS => Some("15".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.model_dir, Path::new("/srv/models"));
    assert_eq!(config.ollama_url, "http://127.0.0.1:11500");
    assert_eq!(config.explanation_timeout, Duration::from_secs(15));
    assert_eq!(config.llm_model, "phi3:latest");
}

#[test]
fn test_config_from_env_rejects_bad_timeout() {
    let result = AnalysisConfig::from_env_with(|key| {
        (key == ENV_LLM_TIMEOUT_SECS).then(|| "soon".to_string())
    });
    assert!(matches!(result, Err(AnalysisError::Configuration(_))));
}

#[test]
fn test_successful_analysis() {
    let response = pipeline().analyze_bytes(&encode_canonical(&textured(3)));
    let AnalysisResponse::Success(report) = response else {
        panic!("expected success");
    };
    assert_eq!(report.llm_explanation.as_deref(), Some("Generated explanation."));
    assert_eq!(report.verdict.top_features.len(), 5);
    assert!((0.0..=1.0).contains(&report.verdict.confidence));
}

#[test]
fn test_analysis_is_deterministic() {
    let pipeline = pipeline();
    let bytes = encode_canonical(&textured(11));
    assert_eq!(pipeline.predict_bytes(&bytes).unwrap(), pipeline.predict_bytes(&bytes).unwrap());
}

#[test]
fn test_reader_failure() {
    let pipeline = StegoAnalysisPipeline::with_custom(
        MockReader { should_fail: true, mock_data: None },
        MockTextGenerator::new("unused"),
        test_ensemble(),
        AnalysisConfig::default(),
    );
    let response = pipeline.analyze_bytes(b"anything");
    assert_eq!(response.error_kind(), Some(ErrorKind::InvalidInput));
}

#[test]
fn test_mock_reader_feeds_pipeline() {
    let pipeline = StegoAnalysisPipeline::with_custom(
        MockReader { should_fail: false, mock_data: None },
        MockTextGenerator::new("ok"),
        test_ensemble(),
        AnalysisConfig::default(),
    );
    assert!(pipeline.analyze_bytes(b"ignored").is_success());
}

#[test]
fn test_garbage_bytes_are_invalid_input() {
    let response = pipeline().analyze_bytes(b"definitely not an image");
    assert_eq!(response.error_kind(), Some(ErrorKind::InvalidInput));
}

#[test]
fn test_flat_image_is_rejected() {
    let flat = gray_image(|_, _| 128);
    let result = pipeline().predict_bytes(&encode_canonical(&flat));
    assert!(matches!(result, Err(AnalysisError::InsufficientTexture { .. })));

    let response = pipeline().analyze_bytes(&encode_canonical(&flat));
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["status"], "error");
    assert_eq!(value["error_kind"], "invalid_input");
}

#[test]
fn test_unavailable_explainer_falls_back() {
    let pipeline = pipeline_with(MockTextGenerator::unavailable(), AnalysisConfig::default());
    let response = pipeline.analyze_bytes(&encode_canonical(&textured(5)));
    let AnalysisResponse::Success(report) = response else {
        panic!("explanation failure must not fail the request");
    };
    assert_eq!(report.llm_explanation.as_deref(), Some(FALLBACK_EXPLANATION));
}

#[test]
fn test_slow_explainer_is_bounded() {
    let config = AnalysisConfig::builder()
        .explanation_timeout(Duration::from_millis(100))
        .build();
    let pipeline = pipeline_with(
        MockTextGenerator::new("late").with_delay(Duration::from_secs(3)),
        config,
    );
    let start = std::time::Instant::now();
    let response = pipeline.analyze_bytes(&encode_canonical(&textured(5)));
    assert!(start.elapsed() < Duration::from_secs(2));
    let AnalysisResponse::Success(report) = response else {
        panic!("expected success");
    };
    assert_eq!(report.llm_explanation.as_deref(), Some(FALLBACK_EXPLANATION));
}

#[test]
fn test_explanation_disabled_skips_generator() {
    let generator = Arc::new(MockTextGenerator::new("unused"));
    let config = AnalysisConfig::builder().explain(false).build();
    let pipeline = StegoAnalysisPipeline::with_custom(
        StandardImageReader,
        Arc::clone(&generator),
        test_ensemble(),
        config,
    );
    let response = pipeline.analyze_bytes(&encode_canonical(&textured(5)));
    assert!(response.is_success());
    assert!(serde_json::to_value(&response).unwrap().get("llm_explanation").is_none());
    assert_eq!(generator.calls(), 0);
}

#[test]
fn test_cancelled_request_still_returns_verdict() {
    let generator = Arc::new(MockTextGenerator::new("unused"));
    let pipeline = StegoAnalysisPipeline::with_custom(
        StandardImageReader,
        Arc::clone(&generator),
        test_ensemble(),
        AnalysisConfig::default(),
    );
    let token = CancellationToken::new();
    token.cancel();
    let response = pipeline.analyze_bytes_with_cancel(&encode_canonical(&textured(5)), &token);
    let AnalysisResponse::Success(report) = response else {
        panic!("expected success");
    };
    assert_eq!(report.llm_explanation.as_deref(), Some(FALLBACK_EXPLANATION));
    assert_eq!(generator.calls(), 0);
}

#[test]
fn test_schema_drift_is_a_configuration_error() {
    let narrow = FEATURE_COUNT - 1;
    let names = (0..narrow).map(|i| format!("f{}", i)).collect();
    let ensemble = Ensemble::new(names, 0.4, 5)
        .with_member(
            InputTransform::Identity,
            LogisticModel {
                coefficients: vec![0.1; narrow],
                intercept: 0.0,
            },
            1.0,
        )
        .unwrap();
    let pipeline = StegoAnalysisPipeline::with_custom(
        StandardImageReader,
        MockTextGenerator::new("unused"),
        Arc::new(ensemble),
        AnalysisConfig::default(),
    );
    let response = pipeline.analyze_bytes(&encode_canonical(&textured(5)));
    assert_eq!(response.error_kind(), Some(ErrorKind::Configuration));
}

#[test]
fn test_missing_file_is_invalid_input() {
    let response = pipeline().analyze_file("/nonexistent/stego.png");
    let AnalysisResponse::Error(report) = response else {
        panic!("expected error");
    };
    assert_eq!(report.error_kind, ErrorKind::InvalidInput);
    assert!(report.message.contains("does not exist"));
}

#[test]
fn test_file_analysis_through_trait() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.png");
    std::fs::write(&path, encode_canonical(&textured(9))).unwrap();

    let analyzer: Arc<dyn ImageAnalyzer> = Arc::new(pipeline());
    let response = analyzer.analyze_file_with_cancel(&path, &CancellationToken::new());
    assert!(response.is_success());
}

#[test]
fn test_timings_cover_each_step() {
    let (_, timings) = pipeline()
        .predict_bytes_with_timings(&encode_canonical(&textured(2)))
        .unwrap();
    let names: Vec<&str> = timings.steps().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["decode", "normalize", "extract_features", "score"]);
}

#[test]
fn test_new_fails_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = AnalysisConfig::builder().model_dir(dir.path()).build();
    let result = StegoAnalysisPipeline::new(config);
    assert!(matches!(result, Err(AnalysisError::ArtifactLoad(_))));
}

#[test]
fn test_new_loads_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let config = AnalysisConfig::builder().model_dir(dir.path()).explain(false).build();
    let pipeline = StegoAnalysisPipeline::new(config).unwrap();
    assert_eq!(pipeline.ensemble().expected_features(), FEATURE_COUNT);
    assert!(pipeline.analyze_bytes(&encode_canonical(&textured(4))).is_success());
}

#[test]
fn test_load_image_returns_canonical_buffer() {
    let image = textured(6);
    let loaded = pipeline().load_image(&encode_canonical(&image)).unwrap();
    assert_eq!(loaded, image);
}

#[test]
fn test_timings_reported_with_response() {
    let (response, timings) = pipeline()
        .analyze_bytes_with_timings(&encode_canonical(&textured(8)), &CancellationToken::new());
    assert!(response.is_success());
    assert!(timings.get_step("explain").is_some());
}

#[test]
fn test_timings_stop_at_failing_step() {
    let flat = gray_image(|_, _| 128);
    let (response, timings) = pipeline()
        .analyze_bytes_with_timings(&encode_canonical(&flat), &CancellationToken::new());
    assert!(!response.is_success());
    assert!(timings.get_step("decode").is_some());
    assert!(timings.get_step("extract_features").is_none());
}
