//! Shared view of the latest tick

use crate::{Availability, DailyReport, ResourceSample, ThresholdAlert};
use chrono::{DateTime, Utc};
use predictor::FailurePrediction;
use remediation::ProactiveSuggestion;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State published after every tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub availability: Availability,
    pub last_sample: Option<ResourceSample>,
    pub uptime_percentage: f64,
    pub health_score: u8,
    pub prediction: FailurePrediction,
    pub proactive_suggestions: Vec<ProactiveSuggestion>,
    /// Oldest first
    pub recent_alerts: Vec<ThresholdAlert>,
    pub tick_count: u64,
    pub last_checked: Option<DateTime<Utc>>,
    /// Report for the most recently completed UTC day
    pub last_daily_report: Option<DailyReport>,
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self {
            availability: Availability::Online,
            last_sample: None,
            uptime_percentage: 100.0,
            health_score: 100,
            prediction: FailurePrediction::default(),
            proactive_suggestions: Vec::new(),
            recent_alerts: Vec::new(),
            tick_count: 0,
            last_checked: None,
            last_daily_report: None,
        }
    }
}

/// Cloneable read handle to the monitor status
#[derive(Clone, Default)]
pub struct StatusHandle {
    inner: Arc<RwLock<MonitorStatus>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current status
    pub async fn snapshot(&self) -> MonitorStatus {
        self.inner.read().await.clone()
    }

    pub(crate) async fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut MonitorStatus),
    {
        let mut status = self.inner.write().await;
        apply(&mut status);
    }
}
