//! Predictor configuration

use serde::{Deserialize, Serialize};

/// Trend predictor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Samples kept per metric history
    pub history_capacity: usize,

    /// Samples required before predicting
    pub min_samples: usize,

    /// CPU samples used for the trend fit
    pub trend_window: usize,

    /// Slope (percent per sample) above which CPU counts as trending up
    pub trend_slope_threshold: f64,

    /// Last CPU value above which CPU counts as high
    pub high_cpu_percent: f64,

    /// Last memory value above which memory is critical
    pub critical_memory_percent: f64,

    /// Last memory value above which memory is high
    pub high_memory_percent: f64,

    /// Latency samples averaged for the latency check
    pub latency_window: usize,

    /// Average latency (ms) above which latency counts as high
    pub high_latency_ms: f64,

    /// Trailing samples inspected for offline entries
    pub instability_window: usize,

    /// Offline entries tolerated before flagging instability
    pub instability_tolerance: usize,

    /// Upper bound on the predicted probability
    pub max_probability: f64,

    /// Failure patterns retained for similarity matching
    pub pattern_capacity: usize,

    /// Similarity above which a stored pattern becomes a candidate cause
    pub similarity_threshold: f64,

    /// Weight applied to similarity to get candidate confidence
    pub similarity_weight: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            min_samples: 10,
            trend_window: 10,
            trend_slope_threshold: 2.0,
            high_cpu_percent: 85.0,
            critical_memory_percent: 90.0,
            high_memory_percent: 80.0,
            latency_window: 5,
            high_latency_ms: 3000.0,
            instability_window: 20,
            instability_tolerance: 2,
            max_probability: 0.95,
            pattern_capacity: 50,
            similarity_threshold: 0.7,
            similarity_weight: 0.8,
        }
    }
}
