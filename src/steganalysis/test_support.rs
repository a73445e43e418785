//! Synthetic images and model artifacts shared by the unit tests.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
use serde_json::json;

use crate::steganalysis::features::FEATURE_COUNT;
use crate::steganalysis::normalize::GrayImage;

pub fn gray_image(mut f: impl FnMut(usize, usize) -> u8) -> GrayImage {
    let size = GrayImage::SIZE;
    let pixels = (0..size * size).map(|i| f(i / size, i % size)).collect();
    GrayImage::from_raw(size, size, pixels).unwrap()
}

/// Single pixel 0/255 checkerboard.
pub fn checkerboard() -> GrayImage {
    gray_image(|r, c| if (r + c) % 2 == 0 { 0 } else { 255 })
}

/// Smooth diagonal ramp from 0 to 255.
pub fn gradient() -> GrayImage {
    gray_image(|r, c| ((r + c) / 4) as u8)
}

/// Ramp plus deterministic pseudo-random noise.
pub fn textured(seed: u64) -> GrayImage {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    gray_image(move |r, c| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let noise = ((state >> 33) % 41) as i32 - 20;
        (((r + c) / 5) as i32 + 20 + noise).clamp(0, 255) as u8
    })
}

fn encode(image: DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn encode_png_gray8(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
    let buffer = ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, pixels.to_vec()).unwrap();
    encode(DynamicImage::ImageLuma8(buffer))
}

pub fn encode_png_gray16(width: u32, height: u32, pixels: &[u16]) -> Vec<u8> {
    let buffer = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, pixels.to_vec()).unwrap();
    encode(DynamicImage::ImageLuma16(buffer))
}

pub fn encode_png_rgb8(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
    let buffer = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, pixels.to_vec()).unwrap();
    encode(DynamicImage::ImageRgb8(buffer))
}

pub fn encode_canonical(image: &GrayImage) -> Vec<u8> {
    encode_png_gray8(GrayImage::SIZE as u32, GrayImage::SIZE as u32, image.pixels())
}

/// Writes a small but complete artifact set: identity scaler, a logistic
/// model driven by the high-frequency ratio, and a single-stump forest
/// splitting on LSB transitions.
pub fn write_artifacts(dir: &Path) {
    write_artifacts_with_len(dir, FEATURE_COUNT);
}

pub fn write_artifacts_with_len(dir: &Path, n: usize) {
    let mut coefficients = vec![0.0; n];
    if n > 29 {
        coefficients[29] = 8.0;
    }
    let mut importances = vec![0.0; n];
    if n > 6 {
        importances[6] = 1.0;
    }

    let scaler = json!({ "mean": vec![0.0; n], "scale": vec![1.0; n] });
    let logistic = json!({ "coefficients": coefficients, "intercept": -2.0 });
    let forest = json!({
        "feature_importances": importances,
        "trees": [{
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [6, -2, -2],
            "threshold": [0.5, -2.0, -2.0],
            "value": [[0.5, 0.5], [0.9, 0.1], [0.2, 0.8]]
        }]
    });

    std::fs::write(dir.join("scaler.json"), scaler.to_string()).unwrap();
    std::fs::write(dir.join("log_model.json"), logistic.to_string()).unwrap();
    std::fs::write(dir.join("rf_model.json"), forest.to_string()).unwrap();
}
