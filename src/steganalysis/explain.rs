//! Explanation module
//!
//! Builds a constrained natural-language prompt from a verdict and asks a
//! local text-generation service to phrase it. Generation is best effort:
//! any failure degrades to a fixed fallback sentence.

mod prompt;
mod client;
mod explainer;

pub use prompt::{build_prompt, FALLBACK_EXPLANATION};
pub use client::{ExplanationError, MockTextGenerator, OllamaClient, TextGenerator};
pub use explainer::{Explainer, Explanation};
