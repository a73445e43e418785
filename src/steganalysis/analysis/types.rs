use std::path::PathBuf;
use std::time::Duration;

use crate::steganalysis::common::error::{AnalysisError, Result};
use crate::steganalysis::explain::OllamaClient;
use crate::steganalysis::normalize::DEFAULT_MIN_STD_DEV;
use crate::steganalysis::scoring::ScoringConfig;

pub const ENV_MODEL_DIR: &str = "STEGO_MODEL_DIR";
pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
pub const ENV_LLM_MODEL: &str = "STEGO_LLM_MODEL";
pub const ENV_LLM_TIMEOUT_SECS: &str = "STEGO_LLM_TIMEOUT_SECS";

pub const DEFAULT_LLM_MODEL: &str = "phi3:latest";

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Directory holding `scaler.json`, `log_model.json` and `rf_model.json`
    pub model_dir: PathBuf,
    pub ollama_url: String,
    pub llm_model: String,
    pub explanation_timeout: Duration,
    /// When false the envelope carries no `llm_explanation`
    pub explain: bool,
    pub min_texture_std_dev: f64,
    pub parallel_features: bool,
    pub scoring: ScoringConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            ollama_url: OllamaClient::DEFAULT_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            explanation_timeout: OllamaClient::DEFAULT_TIMEOUT,
            explain: true,
            min_texture_std_dev: DEFAULT_MIN_STD_DEV,
            parallel_features: true,
            scoring: ScoringConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Defaults overridden by `STEGO_MODEL_DIR`, `OLLAMA_HOST`,
    /// `STEGO_LLM_MODEL` and `STEGO_LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(dir) = lookup(ENV_MODEL_DIR) {
            builder = builder.model_dir(dir);
        }
        if let Some(host) = lookup(ENV_OLLAMA_HOST) {
            builder = builder.ollama_url(normalize_host(&host));
        }
        if let Some(model) = lookup(ENV_LLM_MODEL) {
            builder = builder.llm_model(model);
        }
        if let Some(secs) = lookup(ENV_LLM_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                AnalysisError::Configuration(format!(
                    "{} must be a whole number of seconds, got `{}`",
                    ENV_LLM_TIMEOUT_SECS, secs
                ))
            })?;
            builder = builder.explanation_timeout(Duration::from_secs(secs));
        }
        Ok(builder.build())
    }
}

/// `OLLAMA_HOST` is commonly set without a scheme (`127.0.0.1:11434`).
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    model_dir: Option<PathBuf>,
    ollama_url: Option<String>,
    llm_model: Option<String>,
    explanation_timeout: Option<Duration>,
    explain: Option<bool>,
    min_texture_std_dev: Option<f64>,
    parallel_features: Option<bool>,
    scoring: Option<ScoringConfig>,
}

impl AnalysisConfigBuilder {
    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    pub fn ollama_url(mut self, url: impl Into<String>) -> Self {
        self.ollama_url = Some(url.into());
        self
    }

    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    pub fn explanation_timeout(mut self, timeout: Duration) -> Self {
        self.explanation_timeout = Some(timeout);
        self
    }

    pub fn explain(mut self, explain: bool) -> Self {
        self.explain = Some(explain);
        self
    }

    pub fn min_texture_std_dev(mut self, std_dev: f64) -> Self {
        self.min_texture_std_dev = Some(std_dev);
        self
    }

    pub fn parallel_features(mut self, parallel: bool) -> Self {
        self.parallel_features = Some(parallel);
        self
    }

    pub fn scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = Some(scoring);
        self
    }

    pub fn build(self) -> AnalysisConfig {
        let default = AnalysisConfig::default();
        AnalysisConfig {
            model_dir: self.model_dir.unwrap_or(default.model_dir),
            ollama_url: self.ollama_url.unwrap_or(default.ollama_url),
            llm_model: self.llm_model.unwrap_or(default.llm_model),
            explanation_timeout: self.explanation_timeout.unwrap_or(default.explanation_timeout),
            explain: self.explain.unwrap_or(default.explain),
            min_texture_std_dev: self.min_texture_std_dev.unwrap_or(default.min_texture_std_dev),
            parallel_features: self.parallel_features.unwrap_or(default.parallel_features),
            scoring: self.scoring.unwrap_or(default.scoring),
        }
    }
}
