//! High-pass residual statistics.
//!
//! The residual is the image minus a 3x3 Gaussian blur (kernel
//! `[1, 2, 1]^T [1, 2, 1] / 16`, reflect-101 borders, rounded to 8 bits).

use crate::steganalysis::features::stats::Moments;
use crate::steganalysis::normalize::GrayImage;

pub const LEN: usize = 3;

const KERNEL: [u32; 3] = [1, 2, 1];
const KERNEL_SHIFT: u32 = 4;

/// Residuals lie in -255..=255.
const RESIDUAL_OFFSET: i64 = -255;

/// Mirrors across the edge pixel without repeating it: -1 -> 1, n -> n - 2.
fn reflect_101(index: isize, len: usize) -> usize {
    let n = len as isize;
    let mirrored = if index < 0 {
        -index
    } else if index >= n {
        2 * n - 2 - index
    } else {
        index
    };
    mirrored as usize
}

/// 3x3 Gaussian blur with round-half-up to 8 bits.
pub fn gaussian_blur_3x3(image: &GrayImage) -> Vec<u8> {
    let size = GrayImage::SIZE;
    let pixels = image.pixels();

    // horizontal pass kept in integer units of 1/4
    let mut horizontal = vec![0u32; size * size];
    for row in 0..size {
        let src = &pixels[row * size..][..size];
        for col in 0..size {
            horizontal[row * size + col] = (0..3)
                .map(|k| {
                    let c = reflect_101(col as isize + k as isize - 1, size);
                    KERNEL[k] * u32::from(src[c])
                })
                .sum();
        }
    }

    let mut blurred = vec![0u8; size * size];
    for row in 0..size {
        for col in 0..size {
            let sum: u32 = (0..3)
                .map(|k| {
                    let r = reflect_101(row as isize + k as isize - 1, size);
                    KERNEL[k] * horizontal[r * size + col]
                })
                .sum();
            blurred[row * size + col] = ((sum + (1 << (KERNEL_SHIFT - 1))) >> KERNEL_SHIFT) as u8;
        }
    }
    blurred
}

/// variance, energy (sum of squares), skewness of the residual
pub fn residual_features(image: &GrayImage) -> [f64; LEN] {
    let blurred = gaussian_blur_3x3(image);
    let mut counts = [0u64; 511];
    for (&original, &smooth) in image.pixels().iter().zip(&blurred) {
        let residual = i64::from(original) - i64::from(smooth);
        counts[(residual - RESIDUAL_OFFSET) as usize] += 1;
    }

    let energy: f64 = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let r = (i as i64 + RESIDUAL_OFFSET) as f64;
            r * r * c as f64
        })
        .sum();
    let moments = Moments::from_histogram(&counts, RESIDUAL_OFFSET);

    [moments.variance(), energy, moments.skewness()]
}
