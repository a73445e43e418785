use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of a single text-generation call. Never surfaced to clients:
/// the explainer logs them and substitutes the fallback text.
#[derive(Error, Debug)]
pub enum ExplanationError {
    #[error("Text generation service unreachable at {0}")]
    Connection(String),

    #[error("Text generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Text generation service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Text generation service returned an empty response")]
    EmptyResponse,

    #[error("Explanation request was cancelled")]
    Cancelled,

    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Local text-generation backend.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, ExplanationError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, ExplanationError> {
        (**self).generate(model, prompt)
    }
}

/// Ollama HTTP client for the `/api/generate` endpoint.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl OllamaClient {
    pub const DEFAULT_URL: &'static str = "http://localhost:11434";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Builds the blocking client. Must not be called from inside an async
    /// runtime.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExplanationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExplanationError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    /// Ollama at localhost:11434 with a 60 second timeout.
    pub fn default_local() -> Result<Self, ExplanationError> {
        Self::new(Self::DEFAULT_URL, Self::DEFAULT_TIMEOUT)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl TextGenerator for OllamaClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, ExplanationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_timeout() {
                ExplanationError::Timeout(self.timeout)
            } else if e.is_connect() {
                ExplanationError::Connection(self.base_url.clone())
            } else {
                ExplanationError::Client(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExplanationError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ExplanationError::ResponseParsing(e.to_string()))?;

        let text = parsed.response.trim();
        if text.is_empty() {
            return Err(ExplanationError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

/// Scripted generator for tests and offline runs.
pub struct MockTextGenerator {
    response: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockTextGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails as if the service were down.
    pub fn unavailable() -> Self {
        Self {
            response: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for MockTextGenerator {
    fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ExplanationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.response
            .clone()
            .ok_or_else(|| ExplanationError::Connection("mock".to_string()))
    }
}
