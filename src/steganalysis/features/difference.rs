//! Horizontal neighbour difference statistics.
//!
//! Differences are taken in wrapping 8-bit arithmetic, so `10 - 11` is
//! 255. The stored models were trained on features computed this way.

use crate::steganalysis::features::stats::Moments;
use crate::steganalysis::normalize::GrayImage;

pub const LEN: usize = 3;

/// mean, variance, skewness of `p[r][c] - p[r][c + 1]`
pub fn difference_features(image: &GrayImage) -> [f64; LEN] {
    let mut counts = [0u64; 256];
    for row in image.rows() {
        for pair in row.windows(2) {
            counts[pair[0].wrapping_sub(pair[1]) as usize] += 1;
        }
    }
    let moments = Moments::from_histogram(&counts, 0);
    [moments.mean, moments.variance(), moments.skewness()]
}
