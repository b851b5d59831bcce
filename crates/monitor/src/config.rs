//! Monitor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Control loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Name of the monitored deployment used in notifications and healing
    pub target: String,
    /// Seconds between ticks
    pub tick_interval_secs: u64,
    /// Seconds between suppression cleanups
    pub cleanup_interval_secs: u64,
    /// Prediction above which proactive remediation is launched
    pub proactive_probability: f64,
    /// CPU above which `cpu_overload` is healed immediately (%)
    pub heal_cpu_percent: f64,
    /// Memory above which `memory_pressure` is healed immediately (%)
    pub heal_memory_percent: f64,
    /// Rolling uptime window (hours)
    pub uptime_window_hours: i64,
    /// Threshold alerts kept in the status
    pub max_recent_alerts: usize,
    /// Threshold alert levels
    pub alert_cpu_percent: f64,
    pub alert_memory_percent: f64,
    pub alert_disk_percent: f64,
    pub alert_latency_ms: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target: "http://localhost".to_string(),
            tick_interval_secs: 3,
            cleanup_interval_secs: 3600,
            proactive_probability: 0.7,
            heal_cpu_percent: 90.0,
            heal_memory_percent: 95.0,
            uptime_window_hours: 24,
            max_recent_alerts: 50,
            alert_cpu_percent: 80.0,
            alert_memory_percent: 85.0,
            alert_disk_percent: 90.0,
            alert_latency_ms: 5000.0,
        }
    }
}

impl MonitorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}
