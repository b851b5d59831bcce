//! Remediation configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Remediation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    /// Healing attempts kept in history
    pub history_capacity: usize,

    /// memory_pressure succeeds below this usage (%)
    pub memory_target_percent: f64,

    /// Per-process CPU share that marks a process as a hog (%)
    pub cpu_process_threshold: f64,
    /// Hogs considered for renicing
    pub max_reniced_processes: usize,
    /// Niceness applied to hogs
    pub renice_niceness: i32,
    /// Processes never reniced
    pub protected_processes: Vec<String>,
    /// Wait before re-sampling CPU (milliseconds)
    pub cpu_settle_delay_ms: u64,
    /// cpu_overload succeeds below this usage (%)
    pub cpu_target_percent: f64,

    /// Well-known endpoints probed by network_issues
    pub network_probe_urls: Vec<String>,
    /// Probes that must answer 200 to treat the network as up
    pub network_min_successes: usize,
    /// Timeout for network_issues probes (seconds)
    pub network_probe_timeout_secs: u64,

    /// Timeout for service_unresponsive probes (seconds)
    pub service_probe_timeout_secs: u64,
    /// Pause for the generic service restart (milliseconds)
    pub service_restart_delay_ms: u64,

    /// Directories cleaned by disk_space
    pub temp_dirs: Vec<PathBuf>,
    /// Minimum age of a temp file before it is removed (seconds)
    pub temp_max_age_secs: u64,
    /// disk_space succeeds below this usage (%)
    pub disk_target_percent: f64,

    /// Proactive routine: heal memory above this usage (%)
    pub proactive_memory_percent: f64,
    /// Proactive routine: heal CPU above this usage (%)
    pub proactive_cpu_percent: f64,
    /// Proactive routine: heal the network above this latency (ms)
    pub proactive_latency_ms: f64,

    /// Suggestion thresholds
    pub suggest_cpu_percent: f64,
    pub suggest_memory_percent: f64,
    pub suggest_disk_percent: f64,
    pub suggest_latency_ms: f64,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            memory_target_percent: 85.0,
            cpu_process_threshold: 50.0,
            max_reniced_processes: 3,
            renice_niceness: 10,
            protected_processes: vec![
                "systemd".to_string(),
                "kernel".to_string(),
                "init".to_string(),
            ],
            cpu_settle_delay_ms: 5000,
            cpu_target_percent: 80.0,
            network_probe_urls: vec![
                "https://8.8.8.8".to_string(),
                "https://1.1.1.1".to_string(),
                "https://google.com".to_string(),
                "https://cloudflare.com".to_string(),
            ],
            network_min_successes: 2,
            network_probe_timeout_secs: 5,
            service_probe_timeout_secs: 10,
            service_restart_delay_ms: 2000,
            temp_dirs: vec![PathBuf::from("/tmp"), PathBuf::from("/var/tmp")],
            temp_max_age_secs: 86_400,
            disk_target_percent: 90.0,
            proactive_memory_percent: 80.0,
            proactive_cpu_percent: 75.0,
            proactive_latency_ms: 3000.0,
            suggest_cpu_percent: 70.0,
            suggest_memory_percent: 75.0,
            suggest_disk_percent: 80.0,
            suggest_latency_ms: 2000.0,
        }
    }
}

impl RemediationConfig {
    pub fn cpu_settle_delay(&self) -> Duration {
        Duration::from_millis(self.cpu_settle_delay_ms)
    }

    pub fn network_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.network_probe_timeout_secs)
    }

    pub fn service_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.service_probe_timeout_secs)
    }

    pub fn service_restart_delay(&self) -> Duration {
        Duration::from_millis(self.service_restart_delay_ms)
    }

    pub fn temp_max_age(&self) -> Duration {
        Duration::from_secs(self.temp_max_age_secs)
    }
}
