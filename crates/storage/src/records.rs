//! Persisted Records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resource readings at the moment of a failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
}

impl FailureSnapshot {
    /// True when no reading is present
    pub fn is_empty(&self) -> bool {
        self.cpu.is_none() && self.memory.is_none() && self.latency.is_none()
    }
}

/// A resolved failure kept for similarity matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePattern {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub failure_snapshot: FailureSnapshot,
    pub resolved_cause: Option<String>,
    pub resolution_time_secs: Option<f64>,
    #[serde(default)]
    pub actions_taken: Vec<String>,
}

/// Healing attempt as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub issue_type: String,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub actions: Vec<String>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_skips_missing_fields() {
        let snapshot = FailureSnapshot {
            cpu: Some(92.5),
            ..Default::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"cpu":92.5}"#);

        let back: FailureSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert!(!back.is_empty());
        assert!(FailureSnapshot::default().is_empty());
    }
}
