//! Image normalization module
//!
//! This module decodes arbitrary raster images and coerces them into the
//! canonical 512x512 8-bit grayscale buffer consumed by feature extraction.

mod reader;
mod standard_reader;
mod normalizer;
pub mod types;

pub use reader::ImageReader;
pub use standard_reader::StandardImageReader;
pub use normalizer::{ImageNormalizer, DEFAULT_MIN_STD_DEV};
pub use types::{BitDepth, DecodedImage, GrayImage, Samples};
