//! Alert Suppressor Implementation

use crate::{fingerprint, Severity, SuppressionConfig};
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Characters of a fingerprint shown in summaries
const FINGERPRINT_DISPLAY_CHARS: usize = 8;

/// Types listed in `AlertSummary::top_alert_types`
const TOP_ALERT_TYPES: usize = 5;

/// An alert that was allowed through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub fingerprint: String,
    pub alert_type: String,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of evaluating a candidate alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// Alert should be delivered
    Send,
    /// Fingerprint is under an active suppression
    Suppressed,
    /// Same fingerprint seen within the duplicate window
    Duplicate,
    /// Too many alerts of this type within the storm window
    Storm,
}

impl AlertDecision {
    pub fn is_send(&self) -> bool {
        matches!(self, AlertDecision::Send)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDecision::Send => "send",
            AlertDecision::Suppressed => "suppressed",
            AlertDecision::Duplicate => "duplicate",
            AlertDecision::Storm => "storm",
        }
    }
}

/// An active suppression, as reported in summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionStatus {
    /// Short fingerprint prefix
    pub fingerprint: String,
    pub minutes_remaining: i64,
}

/// Alert activity over the summary window
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total_alerts_24h: usize,
    /// Live suppressions only
    pub suppressed_count: usize,
    pub alert_types: BTreeMap<String, usize>,
    pub severity_breakdown: BTreeMap<String, usize>,
    /// Most frequent types, highest count first
    pub top_alert_types: Vec<(String, usize)>,
    pub suppression_status: Vec<SuppressionStatus>,
}

struct SuppressorState {
    history: RingBuffer<AlertRecord>,
    /// fingerprint -> suppressed until
    suppressions: HashMap<String, DateTime<Utc>>,
}

/// Deduplicating alert gate
///
/// History and suppression map sit behind one lock so that a single
/// evaluation is atomic with respect to concurrent callers.
pub struct AlertSuppressor {
    config: SuppressionConfig,
    state: Mutex<SuppressorState>,
}

impl AlertSuppressor {
    /// Create a new alert suppressor
    pub fn new(config: SuppressionConfig) -> Self {
        info!("Creating alert suppressor with config: {:?}", config);
        Self {
            state: Mutex::new(SuppressorState {
                history: RingBuffer::new(config.history_capacity),
                suppressions: HashMap::new(),
            }),
            config,
        }
    }

    pub fn config(&self) -> &SuppressionConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, SuppressorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether an alert should be delivered now
    pub fn should_send_alert(&self, alert_type: &str, message: &str, severity: Severity) -> bool {
        self.should_send_alert_at(alert_type, message, severity, Utc::now())
    }

    /// Whether an alert should be delivered at `now`
    pub fn should_send_alert_at(
        &self,
        alert_type: &str,
        message: &str,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> bool {
        self.evaluate_at(alert_type, message, severity, now).is_send()
    }

    /// Evaluate a candidate alert at `now`, recording it when it passes
    pub fn evaluate_at(
        &self,
        alert_type: &str,
        message: &str,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> AlertDecision {
        let fp = fingerprint(alert_type, message, self.config.fingerprint_prefix_chars);
        let mut state = self.lock();

        let mut repeat_offender = false;
        if let Some(&until) = state.suppressions.get(&fp) {
            if now < until {
                debug!("Alert suppressed: {} until {}", alert_type, until);
                counter!("sentinel_alerts_suppressed_total", "reason" => "active").increment(1);
                return AlertDecision::Suppressed;
            }
            state.suppressions.remove(&fp);
            repeat_offender = true;
        }

        let duplicate_cutoff = now - Duration::minutes(self.config.duplicate_window_minutes);
        let is_duplicate = state
            .history
            .iter_recent()
            .take_while(|alert| alert.timestamp >= duplicate_cutoff)
            .any(|alert| alert.fingerprint == fp);

        if is_duplicate {
            let mut minutes = self.config.base_suppression_minutes(severity);
            if repeat_offender {
                minutes *= self.config.repeat_multiplier;
            }
            state
                .suppressions
                .insert(fp, now + Duration::minutes(minutes));
            debug!(
                "Duplicate {} alert ({}), suppressing for {} minutes",
                alert_type, severity, minutes
            );
            counter!("sentinel_alerts_suppressed_total", "reason" => "duplicate").increment(1);
            return AlertDecision::Duplicate;
        }

        let storm_cutoff = now - Duration::minutes(self.config.storm_window_minutes);
        let recent_of_type = state
            .history
            .iter_recent()
            .take_while(|alert| alert.timestamp >= storm_cutoff)
            .filter(|alert| alert.alert_type == alert_type)
            .count();

        if recent_of_type >= self.config.storm_threshold {
            let until = now + Duration::minutes(self.config.storm_suppression_minutes);
            let storm_fingerprints: Vec<String> = state
                .history
                .iter()
                .filter(|alert| alert.alert_type == alert_type)
                .map(|alert| alert.fingerprint.clone())
                .collect();
            for storm_fp in storm_fingerprints {
                state.suppressions.insert(storm_fp, until);
            }
            warn!(
                "Alert storm: {} '{}' alerts in {} minutes, suppressing type for {} minutes",
                recent_of_type,
                alert_type,
                self.config.storm_window_minutes,
                self.config.storm_suppression_minutes
            );
            counter!("sentinel_alerts_suppressed_total", "reason" => "storm").increment(1);
            return AlertDecision::Storm;
        }

        state.history.push(AlertRecord {
            fingerprint: fp,
            alert_type: alert_type.to_string(),
            message: message.to_string(),
            severity,
            timestamp: now,
        });
        counter!("sentinel_alerts_sent_total").increment(1);
        info!("Alert allowed: {} ({})", alert_type, severity);

        AlertDecision::Send
    }

    /// Summarize recent alert activity
    pub fn get_alert_summary(&self) -> AlertSummary {
        self.get_alert_summary_at(Utc::now())
    }

    pub fn get_alert_summary_at(&self, now: DateTime<Utc>) -> AlertSummary {
        let state = self.lock();
        let cutoff = now - Duration::hours(self.config.summary_window_hours);

        let mut summary = AlertSummary::default();
        for alert in state.history.iter().filter(|a| a.timestamp >= cutoff) {
            summary.total_alerts_24h += 1;
            *summary
                .alert_types
                .entry(alert.alert_type.clone())
                .or_insert(0) += 1;
            *summary
                .severity_breakdown
                .entry(alert.severity.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut top: Vec<(String, usize)> = summary
            .alert_types
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        // Stable sort keeps ties in name order
        top.sort_by(|a, b| b.1.cmp(&a.1));
        top.truncate(TOP_ALERT_TYPES);
        summary.top_alert_types = top;

        let mut status: Vec<SuppressionStatus> = state
            .suppressions
            .iter()
            .filter(|(_, until)| **until > now)
            .map(|(fp, until)| SuppressionStatus {
                fingerprint: fp.chars().take(FINGERPRINT_DISPLAY_CHARS).collect(),
                minutes_remaining: (*until - now).num_minutes(),
            })
            .collect();
        status.sort_by(|a, b| {
            b.minutes_remaining
                .cmp(&a.minutes_remaining)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });
        summary.suppressed_count = status.len();
        summary.suppression_status = status;

        summary
    }

    /// Purge expired suppressions, returning how many were removed
    pub fn cleanup_old_data(&self) -> usize {
        self.cleanup_old_data_at(Utc::now())
    }

    pub fn cleanup_old_data_at(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.lock();
        let before = state.suppressions.len();
        state.suppressions.retain(|_, until| *until > now);
        let removed = before - state.suppressions.len();
        if removed > 0 {
            info!("Cleaned up {} expired alert suppressions", removed);
        }
        removed
    }

    /// Alerts currently held in history
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Suppression entries currently held, including expired ones not yet purged
    pub fn suppression_count(&self) -> usize {
        self.lock().suppressions.len()
    }
}

impl Default for AlertSuppressor {
    fn default() -> Self {
        Self::new(SuppressionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn minutes(m: i64) -> DateTime<Utc> {
        t0() + Duration::minutes(m)
    }

    #[test]
    fn test_first_alert_passes() {
        let suppressor = AlertSuppressor::default();
        assert!(suppressor.should_send_alert_at("server_down", "Server is down", Severity::Critical, t0()));
        assert_eq!(suppressor.history_len(), 1);
    }

    #[test]
    fn test_duplicate_is_suppressed() {
        let suppressor = AlertSuppressor::default();
        let msg = "Server example.com is down";

        assert!(suppressor.should_send_alert_at("server_down", msg, Severity::Critical, t0()));
        assert_eq!(
            suppressor.evaluate_at("server_down", msg, Severity::Critical, minutes(1)),
            AlertDecision::Duplicate
        );

        let summary = suppressor.get_alert_summary_at(minutes(1));
        assert_eq!(summary.suppressed_count, 1);
        assert_eq!(summary.suppression_status[0].minutes_remaining, 30);
        assert_eq!(summary.suppression_status[0].fingerprint.len(), 8);

        // While suppressed
        assert_eq!(
            suppressor.evaluate_at("server_down", msg, Severity::Critical, minutes(10)),
            AlertDecision::Suppressed
        );
    }

    #[test]
    fn test_suppression_expires() {
        let suppressor = AlertSuppressor::default();
        let msg = "Server example.com is down";

        assert!(suppressor.should_send_alert_at("server_down", msg, Severity::Critical, t0()));
        assert!(!suppressor.should_send_alert_at("server_down", msg, Severity::Critical, minutes(1)));
        // Suppressed until t0+31m, and the first alert is outside the duplicate window
        assert!(suppressor.should_send_alert_at("server_down", msg, Severity::Critical, minutes(32)));
    }

    #[test]
    fn test_outside_duplicate_window_passes() {
        let suppressor = AlertSuppressor::default();
        assert!(suppressor.should_send_alert_at("disk", "Disk full", Severity::Warning, t0()));
        assert!(suppressor.should_send_alert_at("disk", "Disk full", Severity::Warning, minutes(16)));
    }

    #[test]
    fn test_severity_durations() {
        let suppressor = AlertSuppressor::default();
        let cases = [
            ("a", Severity::Low, 30),
            ("b", Severity::Medium, 60),
            ("c", Severity::Warning, 60),
            ("d", Severity::High, 120),
            ("e", Severity::Critical, 30),
        ];
        for (alert_type, severity, _) in &cases {
            assert!(suppressor.should_send_alert_at(alert_type, "msg", *severity, t0()));
            assert!(!suppressor.should_send_alert_at(alert_type, "msg", *severity, t0()));
        }

        for (alert_type, severity, expected) in &cases {
            let fp: String = fingerprint(alert_type, "msg", 100).chars().take(8).collect();
            let summary = suppressor.get_alert_summary_at(t0());
            let status = summary
                .suppression_status
                .iter()
                .find(|s| s.fingerprint == fp)
                .unwrap();
            assert_eq!(status.minutes_remaining, *expected, "{:?}", severity);
        }
    }

    #[test]
    fn test_repeat_offender_is_doubled() {
        let config = SuppressionConfig {
            duplicate_window_minutes: 60,
            ..Default::default()
        };
        let suppressor = AlertSuppressor::new(config);
        let msg = "Latency spike";

        assert!(suppressor.should_send_alert_at("latency", msg, Severity::Critical, t0()));
        assert!(!suppressor.should_send_alert_at("latency", msg, Severity::Critical, minutes(1)));

        // Expired at t0+31m; first alert still within the 60 minute window
        assert_eq!(
            suppressor.evaluate_at("latency", msg, Severity::Critical, minutes(32)),
            AlertDecision::Duplicate
        );
        let summary = suppressor.get_alert_summary_at(minutes(32));
        assert_eq!(summary.suppression_status[0].minutes_remaining, 60);
    }

    #[test]
    fn test_storm_suppresses_type() {
        let suppressor = AlertSuppressor::default();

        for i in 0..5 {
            let msg = format!("CPU at {}%", 90 + i);
            assert!(suppressor.should_send_alert_at("cpu", &msg, Severity::Warning, minutes(i)));
        }

        assert_eq!(
            suppressor.evaluate_at("cpu", "CPU at 99%", Severity::Warning, minutes(5)),
            AlertDecision::Storm
        );

        // Every recorded cpu fingerprint is now suppressed
        assert_eq!(
            suppressor.evaluate_at("cpu", "CPU at 90%", Severity::Warning, minutes(20)),
            AlertDecision::Suppressed
        );
        assert_eq!(suppressor.get_alert_summary_at(minutes(5)).suppressed_count, 5);

        // Other types are unaffected
        assert!(suppressor.should_send_alert_at("memory", "Memory at 91%", Severity::Warning, minutes(5)));
    }

    #[test]
    fn test_identical_repeats_are_deduplicated_before_storm() {
        // A burst of one identical alert never reaches the storm count: the
        // second copy is a duplicate and the rest hit its suppression
        let suppressor = AlertSuppressor::default();
        assert!(suppressor.should_send_alert_at("X", "Y", Severity::Warning, t0()));
        for i in 1..6 {
            assert_eq!(
                suppressor.evaluate_at("X", "Y", Severity::Warning, minutes(i)),
                if i == 1 { AlertDecision::Duplicate } else { AlertDecision::Suppressed }
            );
        }
        assert_eq!(suppressor.history_len(), 1);
    }

    #[test]
    fn test_storm_window() {
        let suppressor = AlertSuppressor::default();
        for i in 0..5 {
            let msg = format!("Net issue {}", i);
            assert!(suppressor.should_send_alert_at("net", &msg, Severity::Low, minutes(i * 3)));
        }
        // Only alerts at 3, 6, 9, 12 are within 10 minutes of t0+13m
        assert!(suppressor.should_send_alert_at("net", "Net issue 5", Severity::Low, minutes(13)));
    }

    #[test]
    fn test_summary() {
        let suppressor = AlertSuppressor::default();
        suppressor.should_send_alert_at("old", "stale", Severity::Low, t0() - Duration::hours(30));
        suppressor.should_send_alert_at("cpu", "a", Severity::Warning, t0());
        suppressor.should_send_alert_at("cpu", "b", Severity::Critical, t0());
        suppressor.should_send_alert_at("memory", "c", Severity::Critical, t0());

        let summary = suppressor.get_alert_summary_at(minutes(1));
        assert_eq!(summary.total_alerts_24h, 3);
        assert_eq!(summary.alert_types.get("cpu"), Some(&2));
        assert_eq!(summary.alert_types.get("old"), None);
        assert_eq!(summary.severity_breakdown.get("critical"), Some(&2));
        assert_eq!(summary.top_alert_types[0], ("cpu".to_string(), 2));
        assert_eq!(summary.suppressed_count, 0);
    }

    #[test]
    fn test_cleanup_removes_expired() {
        let suppressor = AlertSuppressor::default();
        suppressor.should_send_alert_at("a", "m", Severity::Critical, t0());
        suppressor.should_send_alert_at("a", "m", Severity::Critical, t0());
        suppressor.should_send_alert_at("b", "m", Severity::High, t0());
        suppressor.should_send_alert_at("b", "m", Severity::High, t0());
        assert_eq!(suppressor.suppression_count(), 2);

        assert_eq!(suppressor.cleanup_old_data_at(minutes(10)), 0);
        assert_eq!(suppressor.cleanup_old_data_at(minutes(31)), 1);
        assert_eq!(suppressor.suppression_count(), 1);
        assert_eq!(suppressor.cleanup_old_data_at(minutes(121)), 1);
        assert_eq!(suppressor.suppression_count(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let config = SuppressionConfig {
            history_capacity: 3,
            storm_threshold: 100,
            ..Default::default()
        };
        let suppressor = AlertSuppressor::new(config);
        for i in 0..10 {
            suppressor.should_send_alert_at("t", &format!("m{}", i), Severity::Low, minutes(i));
        }
        assert_eq!(suppressor.history_len(), 3);
    }

    #[test]
    fn test_concurrent_duplicates_pass_once() {
        let suppressor = Arc::new(AlertSuppressor::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let suppressor = Arc::clone(&suppressor);
                std::thread::spawn(move || {
                    suppressor.should_send_alert_at("server_down", "down", Severity::Critical, t0())
                })
            })
            .collect();

        let passed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|sent| *sent)
            .count();
        assert_eq!(passed, 1);
    }
}
