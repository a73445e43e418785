//! Image reader implementation using the image library.
//!
//! Supports the raster formats enabled on the `image` dependency (PNG, JPEG,
//! TIFF, BMP, GIF, WebP) with 8-bit, 16-bit and floating point samples.
//! Color sources are reduced to luminance here so the normalizer only ever
//! sees a single channel.

use image::DynamicImage;
use tracing::debug;

use crate::steganalysis::common::error::{AnalysisError, Result};
use crate::steganalysis::normalize::reader::ImageReader;
use crate::steganalysis::normalize::types::{DecodedImage, Samples};

/// Fixed point BT.601 luma weights with 14 fractional bits (R, G, B).
const LUMA_WEIGHTS: [u32; 3] = [4899, 9617, 1868];
const LUMA_SHIFT: u32 = 14;

/// Image reader backed by the `image` crate; the format is guessed from
/// the leading magic bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardImageReader;

impl ImageReader for StandardImageReader {
    fn read_image(&self, data: &[u8]) -> Result<DecodedImage> {
        debug!("Decoding image, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| AnalysisError::InvalidImage(e.to_string()))?;

        let width = decoded.width() as usize;
        let height = decoded.height() as usize;
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidImage(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }

        debug!("Decoded image: {}x{} {:?}", width, height, decoded.color());

        let samples = match decoded {
            DynamicImage::ImageLuma8(img) => Samples::Eight(img.into_raw()),
            DynamicImage::ImageLumaA8(img) => Samples::Eight(img.pixels().map(|p| p.0[0]).collect()),
            DynamicImage::ImageRgb8(img) => Samples::Eight(
                img.pixels()
                    .map(|p| luma_fixed(p.0[0].into(), p.0[1].into(), p.0[2].into()) as u8)
                    .collect(),
            ),
            DynamicImage::ImageRgba8(img) => Samples::Eight(
                img.pixels()
                    .map(|p| luma_fixed(p.0[0].into(), p.0[1].into(), p.0[2].into()) as u8)
                    .collect(),
            ),
            DynamicImage::ImageLuma16(img) => Samples::Sixteen(img.into_raw()),
            DynamicImage::ImageLumaA16(img) => Samples::Sixteen(img.pixels().map(|p| p.0[0]).collect()),
            DynamicImage::ImageRgb16(img) => Samples::Sixteen(
                img.pixels()
                    .map(|p| luma_fixed(p.0[0].into(), p.0[1].into(), p.0[2].into()) as u16)
                    .collect(),
            ),
            DynamicImage::ImageRgba16(img) => Samples::Sixteen(
                img.pixels()
                    .map(|p| luma_fixed(p.0[0].into(), p.0[1].into(), p.0[2].into()) as u16)
                    .collect(),
            ),
            DynamicImage::ImageRgb32F(img) => {
                Samples::Float32(img.pixels().map(|p| luma_float(p.0[0], p.0[1], p.0[2])).collect())
            }
            DynamicImage::ImageRgba32F(img) => {
                Samples::Float32(img.pixels().map(|p| luma_float(p.0[0], p.0[1], p.0[2])).collect())
            }
            other => Samples::Float32(
                other
                    .to_rgb32f()
                    .pixels()
                    .map(|p| luma_float(p.0[0], p.0[1], p.0[2]))
                    .collect(),
            ),
        };

        Ok(DecodedImage {
            width,
            height,
            samples,
        })
    }
}

/// Integer luma with round-half-up, bit exact for 8 and 16 bit sources.
/// The weights sum to `1 << LUMA_SHIFT`, so the result never exceeds the
/// largest input channel.
fn luma_fixed(r: u32, g: u32, b: u32) -> u32 {
    let weighted = r * LUMA_WEIGHTS[0] + g * LUMA_WEIGHTS[1] + b * LUMA_WEIGHTS[2];
    (weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT
}

fn luma_float(r: f32, g: f32, b: f32) -> f32 {
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) as f32
}
