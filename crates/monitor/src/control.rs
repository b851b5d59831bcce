//! Control Loop Implementation

use crate::{
    health_score, threshold_alerts, Availability, DailyReport, MetricsProvider, MonitorConfig,
    MonitorError, NotificationSink, ResourceSample, StatusHandle, TaskLauncher, ThresholdAlert,
    UptimeWindow,
};
use alerting::{AlertSuppressor, Severity};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use futures::FutureExt;
use metrics::{counter, gauge};
use predictor::TrendPredictor;
use remediation::{IssueType, RemediationContext, RemediationEngine};
use ring_buffer::RingBuffer;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Availability change observed by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentDown { notified: bool },
    Recovered { notified: bool },
}

/// What one tick observed and launched
#[derive(Debug, Clone)]
pub struct TickReport {
    pub sample: ResourceSample,
    pub failure_probability: f64,
    pub proactive_launched: bool,
    /// Issue types dispatched on thresholds, in dispatch order
    pub dispatched: Vec<IssueType>,
    pub transition: Option<Transition>,
    pub uptime_percentage: f64,
    pub health_score: u8,
    pub alerts: Vec<ThresholdAlert>,
    /// Set on the first tick of a new UTC day
    pub daily_report: Option<DailyReport>,
}

/// Periodic driver over the predictor, suppressor and remediation engine
pub struct ControlLoop {
    config: MonitorConfig,
    provider: Arc<dyn MetricsProvider>,
    notifier: Arc<dyn NotificationSink>,
    predictor: Arc<TrendPredictor>,
    suppressor: Arc<AlertSuppressor>,
    engine: Arc<RemediationEngine>,
    launcher: TaskLauncher,
    uptime: UptimeWindow,
    recent_alerts: RingBuffer<ThresholdAlert>,
    was_down: bool,
    last_tick_date: Option<NaiveDate>,
    status: StatusHandle,
}

impl ControlLoop {
    pub fn new(
        config: MonitorConfig,
        provider: Arc<dyn MetricsProvider>,
        notifier: Arc<dyn NotificationSink>,
        predictor: Arc<TrendPredictor>,
        suppressor: Arc<AlertSuppressor>,
        engine: Arc<RemediationEngine>,
    ) -> Self {
        info!("Creating control loop for {}", config.target);
        Self {
            uptime: UptimeWindow::new(ChronoDuration::hours(config.uptime_window_hours)),
            recent_alerts: RingBuffer::new(config.max_recent_alerts),
            launcher: TaskLauncher::new(),
            status: StatusHandle::new(),
            was_down: false,
            last_tick_date: None,
            config,
            provider,
            notifier,
            predictor,
            suppressor,
            engine,
        }
    }

    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn launcher(&self) -> TaskLauncher {
        self.launcher.clone()
    }

    pub fn uptime(&self) -> &UptimeWindow {
        &self.uptime
    }

    /// Tick until `shutdown` turns true; failed or panicking ticks are logged and skipped
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Control loop started, ticking every {:?}",
            self.config.tick_interval()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    counter!("sentinel_ticks_total").increment(1);
                    let outcome = AssertUnwindSafe(self.tick())
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            Err(MonitorError::Panicked(panic_message(panic.as_ref())))
                        });
                    match outcome {
                        Ok(report) => debug!(
                            "Tick: health {} uptime {}% p={}",
                            report.health_score, report.uptime_percentage, report.failure_probability
                        ),
                        Err(e) => {
                            counter!("sentinel_tick_failures_total").increment(1);
                            error!("Tick failed: {}", e);
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(
            "Control loop stopped with {} remediation task(s) in flight",
            self.launcher.in_flight()
        );
    }

    pub async fn tick(&mut self) -> Result<TickReport, MonitorError> {
        self.tick_at(Utc::now()).await
    }

    /// One pass of the loop, stamped `now`
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> Result<TickReport, MonitorError> {
        let sample = self.provider.sample().await?;

        self.predictor.add_sample_at(
            now,
            sample.cpu_percent,
            sample.memory_percent,
            sample.latency_ms,
            sample.online,
        );
        let prediction = self.predictor.predict_failure_probability();
        let context = sample.remediation_context(&self.config.target);

        let proactive_launched = prediction.probability > self.config.proactive_probability;
        if proactive_launched {
            warn!("High failure probability detected: {}", prediction.probability);
            let engine = Arc::clone(&self.engine);
            let context = context.clone();
            self.launcher.spawn("proactive_remediation", async move {
                for (issue_type, result) in engine.run_proactive_remediation(&context).await {
                    if let Err(e) = result {
                        debug!("Proactive {} not healed: {}", issue_type, e);
                    }
                }
            });
        }

        let mut dispatched = Vec::new();
        if sample.cpu_percent > self.config.heal_cpu_percent {
            dispatched.push(IssueType::CpuOverload);
        }
        if sample.memory_percent > self.config.heal_memory_percent {
            dispatched.push(IssueType::MemoryPressure);
        }
        if !sample.online {
            dispatched.push(IssueType::ServiceUnresponsive);
        }
        for issue_type in &dispatched {
            self.dispatch(*issue_type, context.clone());
        }

        let transition = self.check_transition(&sample, now).await;

        let daily_report = self.roll_day(now);
        self.uptime.record(now, sample.online, sample.latency_ms);
        let uptime_percentage = self.uptime.uptime_percentage();
        let score = health_score(&sample);

        let alerts = threshold_alerts(&sample, &self.config, now);
        self.recent_alerts.extend(alerts.iter().cloned());
        let suggestions = self.engine.suggest_proactive_actions(&sample.snapshot());

        gauge!("sentinel_health_score").set(score as f64);
        gauge!("sentinel_uptime_percentage").set(uptime_percentage);
        gauge!("sentinel_failure_probability").set(prediction.probability);

        let recent_alerts = self.recent_alerts.to_vec();
        let failure_probability = prediction.probability;
        let report_for_status = daily_report.clone();
        self.status
            .update(|status| {
                status.availability = Availability::from_online(sample.online);
                status.last_sample = Some(sample);
                status.uptime_percentage = uptime_percentage;
                status.health_score = score;
                status.prediction = prediction;
                status.proactive_suggestions = suggestions;
                status.recent_alerts = recent_alerts;
                status.tick_count += 1;
                status.last_checked = Some(now);
                if let Some(report) = report_for_status {
                    status.last_daily_report = Some(report);
                }
            })
            .await;

        debug!(
            "Metrics - CPU: {}%, Memory: {}%, Disk: {}%, Latency: {}ms",
            sample.cpu_percent, sample.memory_percent, sample.disk_percent, sample.latency_ms
        );

        Ok(TickReport {
            sample,
            failure_probability,
            proactive_launched,
            dispatched,
            transition,
            uptime_percentage,
            health_score: score,
            alerts,
            daily_report,
        })
    }

    /// Report on the previous UTC day once the first tick of a new day arrives
    fn roll_day(&mut self, now: DateTime<Utc>) -> Option<DailyReport> {
        let today = now.date_naive();
        let previous = self.last_tick_date.replace(today)?;
        if previous >= today {
            return None;
        }

        let report = self.uptime.daily_report(previous)?;
        info!(
            "Daily report for {}: uptime {}%, avg latency {}ms, {} incidents in {} checks",
            report.date,
            report.uptime_percentage,
            report.avg_latency_ms,
            report.incidents,
            report.total_checks
        );
        Some(report)
    }

    fn dispatch(&self, issue_type: IssueType, context: RemediationContext) {
        let engine = Arc::clone(&self.engine);
        self.launcher.spawn(issue_type.as_str(), async move {
            match engine.auto_heal(issue_type, &context).await {
                Ok(outcome) => info!("Healed {}: {}", issue_type, outcome.message),
                Err(e) => debug!("{}", e),
            }
        });
    }

    async fn check_transition(&mut self, sample: &ResourceSample, now: DateTime<Utc>) -> Option<Transition> {
        let target = self.config.target.clone();

        if !sample.online && !self.was_down {
            self.was_down = true;
            let notified = self.suppressor.should_send_alert_at(
                "server_down",
                &format!("Server {} is down", target),
                Severity::Critical,
                now,
            );
            if notified {
                if let Err(e) = self.notifier.notify_down(&target).await {
                    warn!("Down notification for {} failed: {}", target, e);
                }
            }
            return Some(Transition::WentDown { notified });
        }

        if sample.online && self.was_down {
            self.was_down = false;
            let notified = self.suppressor.should_send_alert_at(
                "server_recovered",
                &format!("Server {} recovered", target),
                Severity::Low,
                now,
            );
            if notified {
                if let Err(e) = self.notifier.notify_recovered(&target).await {
                    warn!("Recovery notification for {} failed: {}", target, e);
                }
            }
            return Some(Transition::Recovered { notified });
        }

        None
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Purge expired suppressions every `period` until `shutdown` turns true
pub fn spawn_cleanup(
    suppressor: Arc<AlertSuppressor>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = suppressor.cleanup_old_data();
                    debug!("Suppression cleanup removed {} entries", removed);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("Suppression cleanup stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::SuppressionConfig;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use predictor::PredictorConfig;
    use remediation::{NoopPrimitives, RemediationConfig};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct QueueProvider {
        samples: Mutex<VecDeque<ResourceSample>>,
    }

    impl QueueProvider {
        fn new(samples: Vec<ResourceSample>) -> Self {
            Self {
                samples: Mutex::new(samples.into()),
            }
        }
    }

    #[async_trait]
    impl MetricsProvider for QueueProvider {
        async fn sample(&self) -> Result<ResourceSample, MonitorError> {
            self.samples
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| MonitorError::Provider("target unreachable".to_string()))
        }
    }

    /// Healthy samples, except that the second call panics
    #[derive(Default)]
    struct PanicsOnSecondCall {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetricsProvider for PanicsOnSecondCall {
        async fn sample(&self) -> Result<ResourceSample, MonitorError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
                panic!("sensor driver crashed");
            }
            Ok(online(20.0, 40.0))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify_down(&self, target: &str) -> Result<(), MonitorError> {
            self.events.lock().unwrap().push(format!("down {}", target));
            Ok(())
        }

        async fn notify_recovered(&self, target: &str) -> Result<(), MonitorError> {
            self.events.lock().unwrap().push(format!("recovered {}", target));
            Ok(())
        }
    }

    struct Harness {
        control: ControlLoop,
        sink: Arc<RecordingSink>,
        predictor: Arc<TrendPredictor>,
        engine: Arc<RemediationEngine>,
    }

    fn harness(samples: Vec<ResourceSample>) -> Harness {
        harness_with(Arc::new(QueueProvider::new(samples)))
    }

    fn harness_with(provider: Arc<dyn MetricsProvider>) -> Harness {
        let sink = Arc::new(RecordingSink::default());
        let predictor = Arc::new(TrendPredictor::new(PredictorConfig::default()));
        let suppressor = Arc::new(AlertSuppressor::new(SuppressionConfig::default()));
        let engine = Arc::new(RemediationEngine::new(
            RemediationConfig {
                cpu_settle_delay_ms: 0,
                service_restart_delay_ms: 0,
                ..Default::default()
            },
            Arc::new(NoopPrimitives),
        ));
        let config = MonitorConfig {
            target: "example.com".to_string(),
            ..Default::default()
        };
        let control = ControlLoop::new(
            config,
            provider,
            sink.clone(),
            predictor.clone(),
            suppressor,
            engine.clone(),
        );
        Harness {
            control,
            sink,
            predictor,
            engine,
        }
    }

    fn online(cpu: f64, memory: f64) -> ResourceSample {
        ResourceSample {
            cpu_percent: cpu,
            memory_percent: memory,
            disk_percent: 40.0,
            latency_ms: 150.0,
            online: true,
        }
    }

    fn offline() -> ResourceSample {
        ResourceSample {
            online: false,
            ..online(20.0, 40.0)
        }
    }

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + ChronoDuration::minutes(minutes)
    }

    #[tokio::test]
    async fn test_tick_feeds_predictor_and_status() {
        let mut h = harness(vec![online(20.0, 40.0)]);
        let report = h.control.tick_at(t(0)).await.unwrap();

        assert_eq!(h.predictor.sample_count(), 1);
        assert_eq!(report.health_score, 100);
        assert_eq!(report.uptime_percentage, 100.0);
        assert!(report.dispatched.is_empty());
        assert!(report.transition.is_none());

        let status = h.control.status().snapshot().await;
        assert_eq!(status.tick_count, 1);
        assert_eq!(status.last_checked, Some(t(0)));
        assert_eq!(status.availability, Availability::Online);
    }

    #[tokio::test]
    async fn test_provider_failure_fails_the_tick_only() {
        let mut h = harness(vec![online(20.0, 40.0)]);
        h.control.tick_at(t(0)).await.unwrap();

        assert!(matches!(
            h.control.tick_at(t(1)).await,
            Err(MonitorError::Provider(_))
        ));
        assert_eq!(h.control.status().snapshot().await.tick_count, 1);
        assert_eq!(h.predictor.sample_count(), 1);
    }

    #[tokio::test]
    async fn test_transitions_notify_through_suppressor() {
        let mut h = harness(vec![
            online(20.0, 40.0),
            offline(),
            offline(),
            online(20.0, 40.0),
            offline(),
        ]);

        assert_eq!(h.control.tick_at(t(0)).await.unwrap().transition, None);
        assert_eq!(
            h.control.tick_at(t(1)).await.unwrap().transition,
            Some(Transition::WentDown { notified: true })
        );
        // Still down: no new transition
        assert_eq!(h.control.tick_at(t(2)).await.unwrap().transition, None);
        assert_eq!(
            h.control.tick_at(t(3)).await.unwrap().transition,
            Some(Transition::Recovered { notified: true })
        );
        // Down again within the duplicate window
        assert_eq!(
            h.control.tick_at(t(4)).await.unwrap().transition,
            Some(Transition::WentDown { notified: false })
        );

        h.control.launcher().wait_idle().await;
        assert_eq!(
            *h.sink.events.lock().unwrap(),
            vec!["down example.com".to_string(), "recovered example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_thresholds_dispatch_remediation() {
        let mut h = harness(vec![ResourceSample {
            cpu_percent: 95.0,
            memory_percent: 96.0,
            disk_percent: 40.0,
            latency_ms: 0.0,
            online: false,
        }]);

        let report = h.control.tick_at(t(0)).await.unwrap();
        assert_eq!(
            report.dispatched,
            vec![
                IssueType::CpuOverload,
                IssueType::MemoryPressure,
                IssueType::ServiceUnresponsive
            ]
        );
        assert!(!report.proactive_launched);

        h.control.launcher().wait_idle().await;
        let stats = h.engine.get_healing_stats();
        assert_eq!(stats.total_attempts, 3);
        // Generic service restart always succeeds; the others cannot verify without readings
        assert_eq!(stats.successful, 1);
        assert_eq!(h.control.launcher().panicked(), 0);
    }

    #[tokio::test]
    async fn test_high_probability_launches_proactive_healing() {
        let mut h = harness((0..10).map(|_| online(88.0, 92.0)).collect());

        for minute in 0..9 {
            let report = h.control.tick_at(t(minute)).await.unwrap();
            assert!(!report.proactive_launched);
        }
        let report = h.control.tick_at(t(9)).await.unwrap();
        assert!(report.failure_probability > 0.7);
        assert!(report.proactive_launched);
        assert!(report.dispatched.is_empty());

        h.control.launcher().wait_idle().await;
        let issues: Vec<IssueType> = h
            .engine
            .healing_history()
            .iter()
            .map(|attempt| attempt.issue_type)
            .collect();
        assert_eq!(issues, vec![IssueType::MemoryPressure, IssueType::CpuOverload]);
    }

    #[tokio::test]
    async fn test_uptime_and_alerts_accumulate() {
        let mut h = harness(vec![
            online(85.0, 40.0),
            offline(),
            online(20.0, 90.0),
            online(20.0, 40.0),
        ]);
        for minute in 0..4 {
            h.control.tick_at(t(minute)).await.unwrap();
        }

        let status = h.control.status().snapshot().await;
        assert_eq!(status.uptime_percentage, 75.0);
        let types: Vec<&str> = status
            .recent_alerts
            .iter()
            .map(|a| a.alert_type.as_str())
            .collect();
        assert_eq!(types, vec!["cpu", "memory"]);
        assert_eq!(h.control.uptime().len(), 4);
        h.control.launcher().wait_idle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let h = harness((0..20).map(|_| online(20.0, 40.0)).collect());
        let mut control = h.control;
        let status = control.status();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            control.run(rx).await;
        });
        tokio::time::sleep(Duration::from_secs(10)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(status.snapshot().await.tick_count >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_survives_a_panicking_tick() {
        let provider = Arc::new(PanicsOnSecondCall::default());
        let h = harness_with(provider.clone());
        let mut control = h.control;
        let status = control.status();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            control.run(rx).await;
        });
        // Ten tick periods
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!handle.is_finished());

        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(provider.calls.load(Ordering::SeqCst) >= 5);
        // Every call but the panicking one completed a tick
        assert_eq!(
            status.snapshot().await.tick_count as usize,
            provider.calls.load(Ordering::SeqCst) - 1
        );
    }

    #[tokio::test]
    async fn test_day_rollover_publishes_daily_report() {
        let mut h = harness(vec![
            online(20.0, 40.0),
            offline(),
            online(20.0, 40.0),
            online(20.0, 40.0),
        ]);
        let evening = Utc.with_ymd_and_hms(2024, 6, 1, 23, 58, 0).unwrap();

        assert!(h.control.tick_at(evening).await.unwrap().daily_report.is_none());
        let late = evening + ChronoDuration::minutes(1);
        assert!(h.control.tick_at(late).await.unwrap().daily_report.is_none());

        let after_midnight = evening + ChronoDuration::minutes(3);
        let report = h
            .control
            .tick_at(after_midnight)
            .await
            .unwrap()
            .daily_report
            .expect("first tick of the day reports on the previous one");
        assert_eq!(report.date, evening.date_naive());
        assert_eq!(report.total_checks, 2);
        assert_eq!(report.incidents, 1);
        assert_eq!(report.uptime_percentage, 50.0);
        assert_eq!(report.avg_latency_ms, 150.0);

        // Same day again: nothing new, and the status keeps the last report
        let later = after_midnight + ChronoDuration::minutes(1);
        assert!(h.control.tick_at(later).await.unwrap().daily_report.is_none());
        assert_eq!(h.control.status().snapshot().await.last_daily_report, Some(report));

        h.control.launcher().wait_idle().await;
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&"boom".to_string()), "boom");
        assert_eq!(panic_message(&42u8), "unknown panic payload");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_purges_expired_suppressions() {
        let suppressor = Arc::new(AlertSuppressor::default());
        let past = Utc::now() - ChronoDuration::hours(2);
        suppressor.should_send_alert_at("cpu", "High CPU", Severity::Critical, past);
        suppressor.should_send_alert_at("cpu", "High CPU", Severity::Critical, past);
        assert_eq!(suppressor.suppression_count(), 1);

        let (tx, rx) = watch::channel(false);
        let handle = spawn_cleanup(suppressor.clone(), Duration::from_secs(3600), rx);
        tokio::time::sleep(Duration::from_secs(3601)).await;
        assert_eq!(suppressor.suppression_count(), 0);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
