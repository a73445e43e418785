//! First-order intensity statistics.

use crate::steganalysis::features::stats::Moments;
use crate::steganalysis::normalize::GrayImage;

pub const LEN: usize = 4;

/// Occurrence count of every 8-bit intensity.
pub fn intensity_histogram(image: &GrayImage) -> [u64; 256] {
    let mut counts = [0u64; 256];
    for &p in image.pixels() {
        counts[p as usize] += 1;
    }
    counts
}

/// mean, variance, skewness, kurtosis
pub fn histogram_features(image: &GrayImage) -> [f64; LEN] {
    let moments = Moments::from_histogram(&intensity_histogram(image), 0);
    [
        moments.mean,
        moments.variance(),
        moments.skewness(),
        moments.kurtosis(),
    ]
}
