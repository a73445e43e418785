//! Image data types

use crate::steganalysis::common::error::{AnalysisError, Result};

/// Sample depth of the decoded source before quantization to 8 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Eight,
    Sixteen,
    Float32,
}

/// Luminance samples kept at the width the source was stored with.
///
/// Only the canonical window is ever widened or quantized, so a large
/// 8-bit source costs one byte per pixel while it is held.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Eight(Vec<u8>),
    Sixteen(Vec<u16>),
    Float32(Vec<f32>),
}

impl Samples {
    pub fn bit_depth(&self) -> BitDepth {
        match self {
            Samples::Eight(_) => BitDepth::Eight,
            Samples::Sixteen(_) => BitDepth::Sixteen,
            Samples::Float32(_) => BitDepth::Float32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::Eight(v) => v.len(),
            Samples::Sixteen(v) => v.len(),
            Samples::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Heap bytes held by the sample buffer.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Samples::Eight(v) => v.len(),
            Samples::Sixteen(v) => v.len() * std::mem::size_of::<u16>(),
            Samples::Float32(v) => v.len() * std::mem::size_of::<f32>(),
        }
    }
}

/// Single channel luminance image as decoded from the source file
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Row-major luminance samples in the source's native range
    pub samples: Samples,
}

impl DecodedImage {
    pub fn from_gray8(width: usize, height: usize, pixels: &[u8]) -> Self {
        Self {
            width,
            height,
            samples: Samples::Eight(pixels.to_vec()),
        }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.samples.bit_depth()
    }
}

/// Canonical 512x512 single channel 8-bit image.
///
/// Only constructible with exactly `SIZE * SIZE` pixels, so every consumer
/// can index without bounds bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    pixels: Vec<u8>,
}

impl GrayImage {
    pub const SIZE: usize = 512;

    pub fn from_raw(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        if width != Self::SIZE || height != Self::SIZE || pixels.len() != Self::SIZE * Self::SIZE {
            return Err(AnalysisError::InvalidImage(format!(
                "expected a {0}x{0} buffer, got {1}x{2} with {3} pixels",
                Self::SIZE,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> usize {
        Self::SIZE
    }

    pub fn height(&self) -> usize {
        Self::SIZE
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.pixels[row * Self::SIZE + col]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, u8> {
        self.pixels.chunks_exact(Self::SIZE)
    }

    pub fn mean(&self) -> f64 {
        let sum: u64 = self.pixels.iter().map(|&p| u64::from(p)).sum();
        sum as f64 / self.pixels.len() as f64
    }

    /// Population standard deviation of the intensities.
    pub fn std_dev(&self) -> f64 {
        let mean = self.mean();
        let sum_sq: f64 = self
            .pixels
            .iter()
            .map(|&p| {
                let d = f64::from(p) - mean;
                d * d
            })
            .sum();
        (sum_sq / self.pixels.len() as f64).sqrt()
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_shape() {
        let result = GrayImage::from_raw(256, 512, vec![0; 256 * 512]);
        assert!(matches!(result, Err(AnalysisError::InvalidImage(_))));

        let result = GrayImage::from_raw(512, 512, vec![0; 100]);
        assert!(matches!(result, Err(AnalysisError::InvalidImage(_))));
    }

    #[test]
    fn samples_report_native_footprint() {
        let eight = Samples::Eight(vec![0; 600 * 400]);
        assert_eq!(eight.bit_depth(), BitDepth::Eight);
        assert_eq!(eight.size_in_bytes(), 600 * 400);

        let sixteen = Samples::Sixteen(vec![0; 10]);
        assert_eq!(sixteen.len(), 10);
        assert_eq!(sixteen.size_in_bytes(), 20);
        assert_eq!(Samples::Float32(Vec::new()).bit_depth(), BitDepth::Float32);
        assert!(Samples::Float32(Vec::new()).is_empty());
    }

    #[test]
    fn std_dev_of_two_level_image() {
        let pixels: Vec<u8> = (0..512 * 512).map(|i| if i % 2 == 0 { 0 } else { 100 }).collect();
        let image = GrayImage::from_raw(512, 512, pixels).unwrap();
        assert!((image.mean() - 50.0).abs() < 1e-12);
        assert!((image.std_dev() - 50.0).abs() < 1e-9);
    }
}
