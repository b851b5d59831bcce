//! Deployment Monitor
//!
//! The periodic control loop: samples the monitored deployment, feeds the
//! predictor, gates notifications through the alert suppressor and launches
//! remediation off the tick path.

mod alerts;
mod config;
mod control;
mod health;
mod launcher;
mod provider;
mod status;
mod uptime;

pub use alerts::{threshold_alerts, ThresholdAlert};
pub use config::MonitorConfig;
pub use control::{spawn_cleanup, ControlLoop, TickReport, Transition};
pub use health::{health_score, Availability};
pub use launcher::TaskLauncher;
pub use provider::{LogNotificationSink, MetricsProvider, NotificationSink, ResourceSample};
pub use status::{MonitorStatus, StatusHandle};
pub use uptime::{DailyReport, UptimeEntry, UptimeWindow};

use thiserror::Error;

/// Monitor errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Metrics provider error: {0}")]
    Provider(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Tick panicked: {0}")]
    Panicked(String),
}
