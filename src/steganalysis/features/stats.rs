//! Population moment statistics.
//!
//! Variance divides by N, skewness is `m3 / m2^1.5` and kurtosis is the
//! Fisher (excess) form `m4 / m2^2 - 3`. Skewness and kurtosis are NaN for
//! numerically constant data.

/// Relative tolerance under which the second moment counts as zero.
const FLOAT_RESOLUTION: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub count: f64,
    pub mean: f64,
    /// Second central moment (population variance).
    pub m2: f64,
    pub m3: f64,
    pub m4: f64,
}

impl Moments {
    /// Moments of a sample given as `(value, multiplicity)` pairs, which
    /// lets integer-valued data be summarized through a histogram.
    pub fn from_weighted<I>(bins: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)> + Clone,
    {
        let (count, sum) = bins
            .clone()
            .into_iter()
            .fold((0.0, 0.0), |(n, s), (v, w)| (n + w, s + v * w));
        if count == 0.0 {
            return Self {
                count,
                mean: f64::NAN,
                m2: f64::NAN,
                m3: f64::NAN,
                m4: f64::NAN,
            };
        }
        let mean = sum / count;

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for (v, w) in bins {
            let d = v - mean;
            let d2 = d * d;
            m2 += w * d2;
            m3 += w * d2 * d;
            m4 += w * d2 * d2;
        }

        Self {
            count,
            mean,
            m2: m2 / count,
            m3: m3 / count,
            m4: m4 / count,
        }
    }

    pub fn from_values(values: &[f64]) -> Self {
        Self::from_weighted(values.iter().map(|&v| (v, 1.0)))
    }

    /// Moments of a histogram whose bin `i` holds the count of value `i + offset`.
    pub fn from_histogram(counts: &[u64], offset: i64) -> Self {
        Self::from_weighted(
            counts
                .iter()
                .enumerate()
                .filter(|(_, c)| **c > 0)
                .map(move |(i, &c)| ((i as i64 + offset) as f64, c as f64)),
        )
    }

    pub fn variance(&self) -> f64 {
        self.m2
    }

    fn is_degenerate(&self) -> bool {
        self.m2 <= (FLOAT_RESOLUTION * self.mean).powi(2)
    }

    pub fn skewness(&self) -> f64 {
        if self.is_degenerate() {
            return f64::NAN;
        }
        self.m3 / self.m2.powf(1.5)
    }

    pub fn kurtosis(&self) -> f64 {
        if self.is_degenerate() {
            return f64::NAN;
        }
        self.m4 / (self.m2 * self.m2) - 3.0
    }
}

/// Base-2 Shannon entropy of a probability distribution with the additive
/// epsilon inside the logarithm.
pub fn entropy_bits<I: IntoIterator<Item = f64>>(probabilities: I, epsilon: f64) -> f64 {
    -probabilities
        .into_iter()
        .map(|p| p * (p + epsilon).log2())
        .sum::<f64>()
}
