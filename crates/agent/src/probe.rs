//! Live metrics for the monitored deployment

use async_trait::async_trait;
use monitor::{MetricsProvider, MonitorError, ResourceSample};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Disks, System};
use tracing::debug;

/// Host resource usage from sysinfo plus an HTTP availability probe
///
/// CPU usage is the delta between consecutive refreshes, so the first
/// sample after start reads zero.
pub struct SystemMetricsProvider {
    client: reqwest::Client,
    target: String,
    timeout: Duration,
    system: Mutex<System>,
}

impl SystemMetricsProvider {
    pub fn new(target: impl Into<String>, timeout: Duration) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sentinel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MonitorError::Provider(format!("HTTP client: {}", e)))?;

        let mut system = System::new();
        system.refresh_cpu();

        Ok(Self {
            client,
            target: target.into(),
            timeout,
            system: Mutex::new(system),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn resource_usage(&self) -> (f64, f64) {
        let mut system = self.system.lock().unwrap_or_else(|p| p.into_inner());
        system.refresh_cpu();
        system.refresh_memory();
        let cpu = system.global_cpu_info().cpu_usage() as f64;
        let memory = percent(system.used_memory(), system.total_memory());
        (cpu, memory)
    }

    /// Availability is a 200 response within the timeout
    async fn check_availability(&self) -> (bool, f64) {
        let started = Instant::now();
        match self
            .client
            .get(&self.target)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                (response.status() == reqwest::StatusCode::OK, latency_ms)
            }
            Err(e) => {
                debug!("Availability probe of {} failed: {}", self.target, e);
                (false, 0.0)
            }
        }
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

fn root_disk_usage() -> f64 {
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))
        .map(|disk| {
            let total = disk.total_space();
            percent(total.saturating_sub(disk.available_space()), total)
        })
        .unwrap_or(0.0)
}

#[async_trait]
impl MetricsProvider for SystemMetricsProvider {
    async fn sample(&self) -> Result<ResourceSample, MonitorError> {
        let (cpu_percent, memory_percent) = self.resource_usage();
        let disk_percent = root_disk_usage();
        let (online, latency_ms) = self.check_availability().await;

        Ok(ResourceSample {
            cpu_percent,
            memory_percent,
            disk_percent,
            latency_ms,
            online,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(1, 0), 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_target_is_offline() {
        let provider =
            SystemMetricsProvider::new("http://127.0.0.1:9/health", Duration::from_millis(500))
                .unwrap();
        let sample = provider.sample().await.unwrap();

        assert!(!sample.online);
        assert_eq!(sample.latency_ms, 0.0);
        assert!((0.0..=100.0).contains(&sample.memory_percent));
        assert_eq!(provider.target(), "http://127.0.0.1:9/health");
    }
}
