//! Alert Suppression
//!
//! Decides whether a detected anomaly should be surfaced: repeats of the same
//! alert are deduplicated with severity-scaled suppression windows, and bursts
//! of same-type alerts trip a type-wide storm suppression.

mod config;
mod fingerprint;
mod severity;
mod suppressor;

pub use config::SuppressionConfig;
pub use fingerprint::fingerprint;
pub use severity::Severity;
pub use suppressor::{AlertDecision, AlertRecord, AlertSummary, AlertSuppressor, SuppressionStatus};

use thiserror::Error;

/// Alerting errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AlertingError {
    #[error("Unknown alert severity: {0}")]
    UnknownSeverity(String),
}
