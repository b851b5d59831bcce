//! Agent configuration

use alerting::SuppressionConfig;
use monitor::MonitorConfig;
use predictor::PredictorConfig;
use remediation::RemediationConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Environment variable naming a configuration file
pub const CONFIG_PATH_ENV: &str = "SENTINEL_CONFIG";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Prometheus exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9100)),
        }
    }
}

/// Top-level agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Deployment URL probed every tick
    pub target_url: String,
    /// Availability probe timeout (seconds)
    pub probe_timeout_secs: u64,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub monitor: MonitorConfig,
    pub predictor: PredictorConfig,
    pub suppression: SuppressionConfig,
    pub remediation: RemediationConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            target_url: "http://localhost:8080".to_string(),
            probe_timeout_secs: 10,
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            monitor: MonitorConfig::default(),
            predictor: PredictorConfig::default(),
            suppression: SuppressionConfig::default(),
            remediation: RemediationConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Defaults, then the optional file, then `SENTINEL_*` variables
    ///
    /// Nested keys use a double underscore, e.g.
    /// `SENTINEL_MONITOR__TICK_INTERVAL_SECS=5`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&AgentConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SENTINEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Monitor settings with the probed URL as the target
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            target: self.target_url.clone(),
            ..self.monitor.clone()
        }
    }
}
