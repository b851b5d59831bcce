//! Failure Prediction Engine
//!
//! Estimates near-term failure probability from a trailing window of
//! resource and latency samples, and attributes failures to likely causes
//! using threshold evidence and similarity to previously resolved failures.

mod config;
mod prediction;
mod root_cause;
mod trend;

pub use config::PredictorConfig;
pub use prediction::{Confidence, FailurePrediction, Recommendation, RiskFactor, TrendPredictor};
pub use root_cause::{
    pattern_similarity, recovery_actions, FailureContext, MetricPoint, Resolution, RootCause,
    RootCauseAnalysis,
};
pub use storage::{FailurePattern, FailureSnapshot};
pub use trend::{linear_slope, TrendStatistics};

use thiserror::Error;

/// Errors raised while setting up the predictor
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Pattern store error: {0}")]
    Store(#[from] storage::StorageError),
}
