use serde::{Deserialize, Serialize};

/// Moments of a fitness sample. Every field is 0 for an empty sample, and
/// the standardized moments are 0 when the variance is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub count: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub skew: f64,
    /// Excess kurtosis (normal = 0).
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
}

impl Statistics {
    /// Population moments of `values`; non-finite entries are ignored.
    pub fn calculate(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Self::default();
        }

        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let variance = Self::central_moment(&finite, mean, 2);
        let std_dev = variance.sqrt();

        let (skew, kurtosis) = if variance > 0.0 {
            (
                Self::central_moment(&finite, mean, 3) / variance.powf(1.5),
                Self::central_moment(&finite, mean, 4) / (variance * variance) - 3.0,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            count: finite.len(),
            mean,
            variance,
            std_dev,
            skew,
            kurtosis,
            min: finite.iter().copied().fold(f64::INFINITY, f64::min),
            max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    fn central_moment(values: &[f64], mean: f64, order: i32) -> f64 {
        values.iter().map(|v| (v - mean).powi(order)).sum::<f64>() / values.len() as f64
    }
}

/// Population covariance over pairs where both values are finite.
pub fn covariance(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs = finite_pairs(xs, ys);
    if pairs.is_empty() {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    pairs
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>()
        / n
}

/// Pearson correlation; 0 when either side has no spread.
pub fn correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs = finite_pairs(xs, ys);
    let (left, right): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
    let sx = Statistics::calculate(&left).std_dev;
    let sy = Statistics::calculate(&right).std_dev;
    if sx == 0.0 || sy == 0.0 {
        return 0.0;
    }
    covariance(&left, &right) / (sx * sy)
}

fn finite_pairs(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect()
}
