//! Rolling uptime window and daily reports

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One availability check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UptimeEntry {
    pub timestamp: DateTime<Utc>,
    pub online: bool,
    pub latency_ms: f64,
}

/// Availability summary for one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub uptime_percentage: f64,
    pub avg_latency_ms: f64,
    /// Checks that found the deployment offline
    pub incidents: usize,
    pub total_checks: usize,
}

/// Checks within a trailing time window
#[derive(Debug, Clone)]
pub struct UptimeWindow {
    window: Duration,
    entries: VecDeque<UptimeEntry>,
}

impl UptimeWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: VecDeque::new(),
        }
    }

    /// Append a check at `now` and drop checks older than the window
    pub fn record(&mut self, now: DateTime<Utc>, online: bool, latency_ms: f64) {
        self.entries.push_back(UptimeEntry {
            timestamp: now,
            online,
            latency_ms,
        });
        let cutoff = now - self.window;
        self.entries.retain(|entry| entry.timestamp > cutoff);
    }

    /// Online share of the window (%), two decimals; 100 before any check
    pub fn uptime_percentage(&self) -> f64 {
        if self.entries.is_empty() {
            return 100.0;
        }
        let online = self.entries.iter().filter(|e| e.online).count();
        round2(online as f64 / self.entries.len() as f64 * 100.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &UptimeEntry> {
        self.entries.iter()
    }

    /// Most recent `count` checks, oldest first
    pub fn recent(&self, count: usize) -> Vec<UptimeEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).copied().collect()
    }

    pub fn daily_report(&self, date: NaiveDate) -> Option<DailyReport> {
        let day: Vec<&UptimeEntry> = self
            .entries
            .iter()
            .filter(|e| e.timestamp.date_naive() == date)
            .collect();
        if day.is_empty() {
            return None;
        }

        let total = day.len();
        let online = day.iter().filter(|e| e.online).count();
        let latency: f64 = day.iter().map(|e| e.latency_ms).sum();

        Some(DailyReport {
            date,
            uptime_percentage: round2(online as f64 / total as f64 * 100.0),
            avg_latency_ms: round2(latency / total as f64),
            incidents: total - online,
            total_checks: total,
        })
    }
}

impl Default for UptimeWindow {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_empty_window_is_fully_up() {
        assert_eq!(UptimeWindow::default().uptime_percentage(), 100.0);
    }

    #[test]
    fn test_uptime_percentage() {
        let mut window = UptimeWindow::default();
        window.record(at(1, 0), true, 100.0);
        window.record(at(1, 1), true, 100.0);
        window.record(at(1, 2), false, 0.0);
        assert_eq!(window.uptime_percentage(), 66.67);
    }

    #[test]
    fn test_prunes_entries_older_than_window() {
        let mut window = UptimeWindow::default();
        window.record(at(1, 0), false, 0.0);
        window.record(at(12, 0), true, 100.0);
        // Exactly 24h after the first entry drops it
        window.record(at(1, 0) + Duration::hours(24), true, 100.0);
        assert_eq!(window.len(), 2);
        assert_eq!(window.uptime_percentage(), 100.0);
    }

    #[test]
    fn test_daily_report() {
        let mut window = UptimeWindow::default();
        window.record(at(8, 0), true, 200.0);
        window.record(at(8, 1), false, 0.0);
        window.record(at(8, 2), true, 400.0);
        window.record(at(8, 3), true, 600.0);

        let report = window.daily_report(at(0, 0).date_naive()).unwrap();
        assert_eq!(report.total_checks, 4);
        assert_eq!(report.incidents, 1);
        assert_eq!(report.uptime_percentage, 75.0);
        assert_eq!(report.avg_latency_ms, 300.0);

        let other_day = at(0, 0).date_naive().succ_opt().unwrap();
        assert!(window.daily_report(other_day).is_none());
    }

    #[test]
    fn test_recent() {
        let mut window = UptimeWindow::default();
        for minute in 0..5 {
            window.record(at(2, minute), true, minute as f64);
        }
        let recent = window.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].latency_ms, 4.0);
    }
}
