//! Suppression configuration

use crate::Severity;
use serde::{Deserialize, Serialize};

/// Alert suppression configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionConfig {
    /// Alerts kept in history
    pub history_capacity: usize,
    /// Message characters that take part in the fingerprint
    pub fingerprint_prefix_chars: usize,
    /// Window in which a repeated fingerprint counts as a duplicate (minutes)
    pub duplicate_window_minutes: i64,
    /// Duplicate suppression for low severity (minutes)
    pub low_suppression_minutes: i64,
    /// Duplicate suppression for medium severity (minutes)
    pub medium_suppression_minutes: i64,
    /// Duplicate suppression for high severity (minutes)
    pub high_suppression_minutes: i64,
    /// Duplicate suppression for critical severity (minutes); kept short
    pub critical_suppression_minutes: i64,
    /// Duplicate suppression for any other severity (minutes)
    pub default_suppression_minutes: i64,
    /// Multiplier when a fingerprint re-offends after an earlier suppression
    pub repeat_multiplier: i64,
    /// Same-type alerts within the storm window that trip a storm
    pub storm_threshold: usize,
    /// Storm detection window (minutes)
    pub storm_window_minutes: i64,
    /// Type-wide suppression applied on a storm (minutes)
    pub storm_suppression_minutes: i64,
    /// Window covered by the alert summary (hours)
    pub summary_window_hours: i64,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            fingerprint_prefix_chars: 100,
            duplicate_window_minutes: 15,
            low_suppression_minutes: 30,
            medium_suppression_minutes: 60,
            high_suppression_minutes: 120,
            critical_suppression_minutes: 30,
            default_suppression_minutes: 60,
            repeat_multiplier: 2,
            storm_threshold: 5,
            storm_window_minutes: 10,
            storm_suppression_minutes: 30,
            summary_window_hours: 24,
        }
    }
}

impl SuppressionConfig {
    /// Base duplicate suppression for a severity (minutes)
    pub fn base_suppression_minutes(&self, severity: Severity) -> i64 {
        match severity {
            Severity::Low => self.low_suppression_minutes,
            Severity::Medium => self.medium_suppression_minutes,
            Severity::High => self.high_suppression_minutes,
            Severity::Critical => self.critical_suppression_minutes,
            Severity::Warning => self.default_suppression_minutes,
        }
    }
}
