use std::path::Path;

use tracing::{debug, instrument};

use crate::steganalysis::common::error::{AnalysisError, Result};
use crate::steganalysis::normalize::types::{DecodedImage, GrayImage, Samples};

/// Below this standard deviation an image is treated as blank.
pub const DEFAULT_MIN_STD_DEV: f64 = 1.0;

/// Coerces decoded images into the canonical [`GrayImage`].
///
/// Steps, in order: center-crop oversized dimensions, quantize the kept
/// window to 8 bits, mirror-pad undersized dimensions on the bottom/right, reject near-blank
/// results. The transform is pure and never resamples.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    min_std_dev: f64,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self {
            min_std_dev: DEFAULT_MIN_STD_DEV,
        }
    }
}

impl ImageNormalizer {
    pub fn new(min_std_dev: f64) -> Self {
        Self { min_std_dev }
    }

    /// Reads a file from disk. A missing or unreadable file is an
    /// `InvalidImage`, never an I/O panic.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalysisError::InvalidImage(format!(
                "Image file does not exist: {}",
                path.display()
            )));
        }
        std::fs::read(path)
            .map_err(|e| AnalysisError::InvalidImage(format!("{}: {}", path.display(), e)))
    }

    #[instrument(skip_all, fields(width = decoded.width, height = decoded.height))]
    pub fn normalize(&self, decoded: &DecodedImage) -> Result<GrayImage> {
        let expected = decoded.width * decoded.height;
        if expected == 0 || decoded.samples.len() != expected {
            return Err(AnalysisError::InvalidImage(format!(
                "decoded {}x{} image carries {} samples",
                decoded.width,
                decoded.height,
                decoded.samples.len()
            )));
        }

        let window = Window::centered(decoded.width, decoded.height);
        let cropped = quantize_window(&decoded.samples, decoded.width, &window);
        let canonical = reflect_pad(&cropped, window.width, window.height);
        let image = GrayImage::from_raw(GrayImage::SIZE, GrayImage::SIZE, canonical)?;

        let std_dev = image.std_dev();
        debug!(std_dev, "Normalized image");
        if std_dev < self.min_std_dev {
            return Err(AnalysisError::InsufficientTexture {
                std_dev,
                minimum: self.min_std_dev,
            });
        }

        Ok(image)
    }
}

/// Region of the source that survives cropping; every dimension larger
/// than the canonical size is center-cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    col: usize,
    row: usize,
    width: usize,
    height: usize,
}

impl Window {
    fn centered(width: usize, height: usize) -> Self {
        let (col, width) = crop_span(width, GrayImage::SIZE);
        let (row, height) = crop_span(height, GrayImage::SIZE);
        Self { col, row, width, height }
    }

    fn extract<T: Copy>(&self, samples: &[T], stride: usize) -> Vec<T> {
        let mut cropped = Vec::with_capacity(self.width * self.height);
        for row in self.row..self.row + self.height {
            let start = row * stride + self.col;
            cropped.extend_from_slice(&samples[start..start + self.width]);
        }
        cropped
    }
}

fn crop_span(len: usize, size: usize) -> (usize, usize) {
    if len > size {
        ((len - size) / 2, size)
    } else {
        (0, len)
    }
}

/// Crops `samples` to `window` and brings it to 8 bits. 8-bit sources pass
/// through; anything else is min-max stretched to 0..=255 and truncated,
/// with the range taken over the whole source.
fn quantize_window(samples: &Samples, stride: usize, window: &Window) -> Vec<u8> {
    match samples {
        Samples::Eight(pixels) => window.extract(pixels, stride),
        Samples::Sixteen(values) => {
            let range = value_range(values.iter().map(|&v| f64::from(v)));
            stretch(window.extract(values, stride).into_iter().map(f64::from), range)
        }
        Samples::Float32(values) => {
            let range = value_range(values.iter().map(|&v| f64::from(v)));
            stretch(window.extract(values, stride).into_iter().map(f64::from), range)
        }
    }
}

/// Minimum and spread of the finite values, if the spread is positive.
fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let range = max - min;
    (range.is_finite() && range > 0.0).then_some((min, range))
}

fn stretch(values: impl Iterator<Item = f64>, range: Option<(f64, f64)>) -> Vec<u8> {
    match range {
        Some((min, range)) => values
            .map(|v| {
                if v.is_finite() {
                    ((v - min) * 255.0 / range).clamp(0.0, 255.0) as u8
                } else {
                    0
                }
            })
            .collect(),
        None => values.map(|_| 0).collect(),
    }
}

/// Pads bottom/right up to the canonical size with edge-including mirror
/// reflection (`fedcba|abcdef|fedcba`).
fn reflect_pad(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let size = GrayImage::SIZE;
    if width == size && height == size {
        return pixels.to_vec();
    }

    let col_map: Vec<usize> = (0..size).map(|c| reflect_index(c, width)).collect();
    let mut padded = Vec::with_capacity(size * size);
    for row in 0..size {
        let src_row = &pixels[reflect_index(row, height) * width..][..width];
        padded.extend(col_map.iter().map(|&c| src_row[c]));
    }
    padded
}

/// Maps an out-of-range index back inside `0..len`, reflecting repeatedly
/// when the padding is wider than the source.
fn reflect_index(index: usize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let mut p = index as isize;
    let n = len as isize;
    while p < 0 || p >= n {
        if p < 0 {
            p = -p - 1;
        } else {
            p = n - 1 - (p - n);
        }
    }
    p as usize
}
