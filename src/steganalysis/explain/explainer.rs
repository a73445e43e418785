use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::steganalysis::common::cancel::CancellationToken;
use crate::steganalysis::explain::client::{ExplanationError, TextGenerator};
use crate::steganalysis::explain::prompt::{build_prompt, FALLBACK_EXPLANATION};
use crate::steganalysis::scoring::Verdict;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub prompt: String,
    pub text: String,
    /// False when `text` is the fallback.
    pub generated: bool,
}

/// Turns a verdict into prose through a [`TextGenerator`].
///
/// The call runs on a detached worker thread and is abandoned, not
/// interrupted, once the timeout elapses or the request is cancelled.
/// A late answer is discarded.
pub struct Explainer<G> {
    generator: Arc<G>,
    model: String,
    timeout: Duration,
}

impl<G: TextGenerator + 'static> Explainer<G> {
    pub fn new(generator: G, model: impl Into<String>, timeout: Duration) -> Self {
        Self::from_shared(Arc::new(generator), model, timeout)
    }

    pub fn from_shared(generator: Arc<G>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            generator,
            model: model.into(),
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Never fails: any generation error yields [`FALLBACK_EXPLANATION`].
    #[instrument(skip_all, fields(model = %self.model, label = %verdict.label))]
    pub fn explain(&self, verdict: &Verdict, cancel: &CancellationToken) -> Explanation {
        let prompt = build_prompt(verdict);
        match self.generate(&prompt, cancel) {
            Ok(text) => {
                debug!(chars = text.len(), "Explanation generated");
                Explanation {
                    prompt,
                    text,
                    generated: true,
                }
            }
            Err(e) => {
                warn!(error = %e, "Explanation generation failed, using fallback");
                Explanation {
                    prompt,
                    text: FALLBACK_EXPLANATION.to_string(),
                    generated: false,
                }
            }
        }
    }

    fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, ExplanationError> {
        if cancel.is_cancelled() {
            return Err(ExplanationError::Cancelled);
        }

        let (tx, rx) = mpsc::sync_channel(1);
        let generator = Arc::clone(&self.generator);
        let model = self.model.clone();
        let owned_prompt = prompt.to_string();
        std::thread::Builder::new()
            .name("explainer".to_string())
            .spawn(move || {
                // receiver may be gone after a timeout
                let _ = tx.send(generator.generate(&model, &owned_prompt));
            })
            .map_err(|e| ExplanationError::Client(e.to_string()))?;

        let deadline = Instant::now() + self.timeout;
        loop {
            if cancel.is_cancelled() {
                return Err(ExplanationError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ExplanationError::Timeout(self.timeout));
            }
            match rx.recv_timeout((deadline - now).min(POLL_INTERVAL)) {
                Ok(result) => {
                    let text = result?;
                    let text = text.trim();
                    if text.is_empty() {
                        return Err(ExplanationError::EmptyResponse);
                    }
                    return Ok(text.to_string());
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ExplanationError::Client(
                        "generator thread exited without a result".to_string(),
                    ));
                }
            }
        }
    }
}
