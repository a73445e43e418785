//! Gray-level co-occurrence texture properties.
//!
//! One symmetric, normalized 256x256 matrix per direction at distance 1.
//! Offsets are `(row, col)` steps; 45 and 135 degrees step down the rows.

use crate::steganalysis::normalize::GrayImage;

pub const LEVELS: usize = 256;
pub const LEN: usize = 16;

/// 0, 45, 90, 135 degrees.
pub const OFFSETS: [(usize, isize); 4] = [(0, 1), (1, 1), (1, 0), (1, -1)];

/// Standard deviations below this make correlation undefined; it is
/// reported as 1.0 instead.
const CORRELATION_STD_FLOOR: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureProperties {
    pub contrast: f64,
    pub correlation: f64,
    pub energy: f64,
    pub homogeneity: f64,
}

/// Contrast for all directions, then correlation, energy, homogeneity.
pub fn glcm_features(image: &GrayImage) -> [f64; LEN] {
    let props: Vec<TextureProperties> = OFFSETS
        .iter()
        .map(|&offset| texture_properties(&cooccurrence(image, offset)))
        .collect();

    let mut features = [0.0; LEN];
    for (angle, p) in props.iter().enumerate() {
        features[angle] = p.contrast;
        features[4 + angle] = p.correlation;
        features[8 + angle] = p.energy;
        features[12 + angle] = p.homogeneity;
    }
    features
}

/// Symmetric co-occurrence matrix normalized to sum to one, row-major.
pub fn cooccurrence(image: &GrayImage, (d_row, d_col): (usize, isize)) -> Vec<f64> {
    let size = GrayImage::SIZE;
    let mut counts = vec![0u32; LEVELS * LEVELS];

    let (col_start, col_end) = if d_col >= 0 {
        (0, size - d_col as usize)
    } else {
        (d_col.unsigned_abs(), size)
    };

    for row in 0..size - d_row {
        for col in col_start..col_end {
            let i = image.get(row, col) as usize;
            let j = image.get(row + d_row, col.wrapping_add_signed(d_col)) as usize;
            counts[i * LEVELS + j] += 1;
        }
    }

    let mut matrix = vec![0.0; LEVELS * LEVELS];
    let mut total = 0.0;
    for i in 0..LEVELS {
        for j in 0..LEVELS {
            let value = f64::from(counts[i * LEVELS + j] + counts[j * LEVELS + i]);
            matrix[i * LEVELS + j] = value;
            total += value;
        }
    }
    if total > 0.0 {
        matrix.iter_mut().for_each(|v| *v /= total);
    }
    matrix
}

pub fn texture_properties(matrix: &[f64]) -> TextureProperties {
    let mut contrast = 0.0;
    let mut asm = 0.0;
    let mut homogeneity = 0.0;
    let mut mean_i = 0.0;
    let mut mean_j = 0.0;

    for i in 0..LEVELS {
        for j in 0..LEVELS {
            let p = matrix[i * LEVELS + j];
            if p == 0.0 {
                continue;
            }
            let d = i as f64 - j as f64;
            contrast += p * d * d;
            asm += p * p;
            homogeneity += p / (1.0 + d * d);
            mean_i += p * i as f64;
            mean_j += p * j as f64;
        }
    }

    let mut var_i = 0.0;
    let mut var_j = 0.0;
    let mut covariance = 0.0;
    for i in 0..LEVELS {
        let di = i as f64 - mean_i;
        for j in 0..LEVELS {
            let p = matrix[i * LEVELS + j];
            if p == 0.0 {
                continue;
            }
            let dj = j as f64 - mean_j;
            var_i += p * di * di;
            var_j += p * dj * dj;
            covariance += p * di * dj;
        }
    }
    let (std_i, std_j) = (var_i.sqrt(), var_j.sqrt());
    let correlation = if std_i < CORRELATION_STD_FLOOR || std_j < CORRELATION_STD_FLOOR {
        1.0
    } else {
        covariance / (std_i * std_j)
    };

    TextureProperties {
        contrast,
        correlation,
        energy: asm.sqrt(),
        homogeneity,
    }
}
