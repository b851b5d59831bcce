//! Collaborators consumed by the control loop

use crate::MonitorError;
use async_trait::async_trait;
use remediation::{RemediationContext, ResourceSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One observation of the monitored deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub latency_ms: f64,
    pub online: bool,
}

impl ResourceSample {
    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            cpu_percent: self.cpu_percent,
            memory_percent: self.memory_percent,
            disk_percent: self.disk_percent,
            latency_ms: self.latency_ms,
        }
    }

    pub fn remediation_context(&self, target: &str) -> RemediationContext {
        RemediationContext {
            cpu_percent: self.cpu_percent,
            memory_percent: self.memory_percent,
            latency_ms: self.latency_ms,
            url: Some(target.to_string()),
        }
    }
}

/// Source of samples, polled once per tick
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn sample(&self) -> Result<ResourceSample, MonitorError>;
}

/// Delivery of availability notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_down(&self, target: &str) -> Result<(), MonitorError>;

    async fn notify_recovered(&self, target: &str) -> Result<(), MonitorError>;
}

/// Sink that only writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify_down(&self, target: &str) -> Result<(), MonitorError> {
        warn!("Server {} is down", target);
        Ok(())
    }

    async fn notify_recovered(&self, target: &str) -> Result<(), MonitorError> {
        info!("Server {} recovered", target);
        Ok(())
    }
}
