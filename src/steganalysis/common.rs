//! Common utilities module
//!
//! This module contains shared utilities used across the steganalysis pipeline.

pub mod error;
pub mod cancel;

pub use error::{AnalysisError, ErrorKind, Result};
pub use cancel::{CancelOnDrop, CancellationToken};
