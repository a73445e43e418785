//! Frequency-domain statistics of the 2-D DFT magnitude.

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

use crate::steganalysis::features::schema::EPSILON;
use crate::steganalysis::features::stats::entropy_bits;
use crate::steganalysis::normalize::GrayImage;

pub const LEN: usize = 2;

/// Unshifted magnitude spectrum, row-major (`[u][v]` with `u` along rows).
pub fn magnitude_spectrum(image: &GrayImage) -> Vec<f64> {
    let size = GrayImage::SIZE;
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(size);

    let mut rows: Vec<Complex<f64>> = image
        .pixels()
        .iter()
        .map(|&p| Complex::new(f64::from(p), 0.0))
        .collect();
    // one transform per row
    fft.process(&mut rows);

    let mut columns = vec![Complex::new(0.0, 0.0); size * size];
    for r in 0..size {
        for c in 0..size {
            columns[c * size + r] = rows[r * size + c];
        }
    }
    fft.process(&mut columns);

    let mut magnitude = vec![0.0; size * size];
    for c in 0..size {
        for r in 0..size {
            magnitude[r * size + c] = columns[c * size + r].norm();
        }
    }
    magnitude
}

/// high-frequency energy ratio, spectral entropy
///
/// The high-frequency block is everything from a quarter of the way along
/// both axes to the end, i.e. the lower-right three-quarter block of the
/// unshifted spectrum.
pub fn frequency_features(image: &GrayImage) -> [f64; LEN] {
    let size = GrayImage::SIZE;
    let magnitude = magnitude_spectrum(image);
    let total: f64 = magnitude.iter().sum();

    let quarter = size / 4;
    let high: f64 = magnitude
        .chunks_exact(size)
        .skip(quarter)
        .map(|row| row[quarter..].iter().sum::<f64>())
        .sum();
    let high_freq_energy = high / (total + EPSILON);

    let spectral_entropy = entropy_bits(magnitude.iter().map(|m| m / (total + EPSILON)), EPSILON);

    [high_freq_energy, spectral_entropy]
}
