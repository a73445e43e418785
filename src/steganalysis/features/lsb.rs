//! Least-significant-bit plane statistics.

use crate::steganalysis::features::schema::EPSILON;
use crate::steganalysis::features::stats::entropy_bits;
use crate::steganalysis::normalize::GrayImage;

pub const LEN: usize = 3;

/// entropy of the bit plane, ratio of 1-bits, horizontal transition rate
pub fn lsb_features(image: &GrayImage) -> [f64; LEN] {
    let total = image.pixels().len() as f64;
    let ones = image.pixels().iter().filter(|&&p| p & 1 == 1).count() as f64;
    let ratio = ones / total;
    let entropy = entropy_bits([1.0 - ratio, ratio], EPSILON);

    let (transitions, pairs) = image.rows().fold((0usize, 0usize), |(t, n), row| {
        let changed = row
            .windows(2)
            .filter(|w| (w[0] ^ w[1]) & 1 == 1)
            .count();
        (t + changed, n + row.len() - 1)
    });

    [entropy, ratio, transitions as f64 / pairs as f64]
}
