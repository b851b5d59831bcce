//! Threshold alerts derived from each sample

use crate::{MonitorConfig, ResourceSample};
use alerting::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resource threshold breach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAlert {
    pub alert_type: String,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl ThresholdAlert {
    fn new(alert_type: &str, message: String, severity: Severity, timestamp: DateTime<Utc>) -> Self {
        Self {
            alert_type: alert_type.to_string(),
            message,
            severity,
            timestamp,
        }
    }
}

/// Breaches in `sample`, in cpu, memory, disk, latency order
pub fn threshold_alerts(
    sample: &ResourceSample,
    config: &MonitorConfig,
    now: DateTime<Utc>,
) -> Vec<ThresholdAlert> {
    let mut alerts = Vec::new();

    if sample.cpu_percent > config.alert_cpu_percent {
        alerts.push(ThresholdAlert::new(
            "cpu",
            format!("High CPU usage: {}%", sample.cpu_percent),
            Severity::Warning,
            now,
        ));
    }
    if sample.memory_percent > config.alert_memory_percent {
        alerts.push(ThresholdAlert::new(
            "memory",
            format!("High memory usage: {}%", sample.memory_percent),
            Severity::Critical,
            now,
        ));
    }
    if sample.disk_percent > config.alert_disk_percent {
        alerts.push(ThresholdAlert::new(
            "disk",
            format!("High disk usage: {}%", sample.disk_percent),
            Severity::Critical,
            now,
        ));
    }
    if sample.latency_ms > config.alert_latency_ms {
        alerts.push(ThresholdAlert::new(
            "latency",
            format!("High latency: {}ms", sample.latency_ms),
            Severity::Warning,
            now,
        ));
    }

    alerts
}
