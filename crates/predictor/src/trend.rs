//! Trend Statistics Computation

/// Summary of a short metric window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendStatistics {
    /// Least-squares slope against sample index (units per sample)
    pub slope: f64,
    /// Mean value
    pub mean: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Most recent value
    pub last: f64,
}

impl TrendStatistics {
    /// Compute trend statistics from a chronological slice of values
    pub fn compute(values: &[f64]) -> Self {
        let Some(&last) = values.last() else {
            return Self::default();
        };

        let min = values.iter().copied().fold(f64::MAX, f64::min);
        let max = values.iter().copied().fold(f64::MIN, f64::max);

        Self {
            slope: linear_slope(values),
            mean: mean(values),
            min,
            max,
            last,
        }
    }
}

/// Degree-1 least-squares slope of `values` against x = 0..n-1
///
/// slope = (n·Σxy − Σx·Σy) / (n·Σx² − (Σx)²); zero when the denominator is.
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;

    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Arithmetic mean; zero for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slope_of_linear_series() {
        let values: Vec<f64> = (0..10).map(|i| 60.0 + 5.0 * i as f64).collect();
        assert!((linear_slope(&values) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_slope_of_flat_series() {
        assert_eq!(linear_slope(&[42.0; 10]), 0.0);
    }

    #[test]
    fn test_slope_degenerate_inputs() {
        assert_eq!(linear_slope(&[]), 0.0);
        assert_eq!(linear_slope(&[7.0]), 0.0);
    }

    #[test]
    fn test_slope_negative_trend() {
        let values = [90.0, 80.0, 70.0, 60.0];
        assert!((linear_slope(&values) + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute() {
        let stats = TrendStatistics::compute(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((stats.mean - 3.0).abs() < 0.001);
        assert!((stats.slope - 1.0).abs() < 0.001);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.last, 5.0);
    }

    #[test]
    fn test_empty_values() {
        let stats = TrendStatistics::compute(&[]);
        assert_eq!(stats, TrendStatistics::default());
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.7000000000000001), 0.7);
        assert_eq!(round2(0.456), 0.46);
    }
}
