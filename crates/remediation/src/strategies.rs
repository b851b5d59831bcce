//! Healing Strategies
//!
//! Each strategy runs a fixed sequence of best-effort steps. A failed step is
//! logged and skipped; only the final verification decides success.

use crate::{IssueType, RemediationConfig, RemediationContext, RemediationPrimitives};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// What a strategy did and whether it resolved the issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub success: bool,
    pub message: String,
    /// Steps taken, in order
    pub actions: Vec<String>,
}

impl StrategyReport {
    pub fn resolved(message: impl Into<String>, actions: Vec<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            actions,
        }
    }

    pub fn unresolved(message: impl Into<String>, actions: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            actions,
        }
    }
}

/// A remediation for one issue type
#[async_trait]
pub trait RemediationStrategy: Send + Sync {
    fn issue_type(&self) -> IssueType;

    async fn execute(
        &self,
        context: &RemediationContext,
        primitives: &dyn RemediationPrimitives,
    ) -> StrategyReport;
}

/// The five built-in strategies, configured from `config`
pub fn default_strategies(config: &RemediationConfig) -> Vec<Arc<dyn RemediationStrategy>> {
    vec![
        Arc::new(MemoryPressure {
            target_percent: config.memory_target_percent,
        }),
        Arc::new(CpuOverload {
            process_threshold: config.cpu_process_threshold,
            max_processes: config.max_reniced_processes,
            niceness: config.renice_niceness,
            protected: config.protected_processes.clone(),
            settle_delay: config.cpu_settle_delay(),
            target_percent: config.cpu_target_percent,
        }),
        Arc::new(NetworkIssues {
            probe_urls: config.network_probe_urls.clone(),
            min_successes: config.network_min_successes,
            timeout: config.network_probe_timeout(),
        }),
        Arc::new(ServiceUnresponsive {
            timeout: config.service_probe_timeout(),
            restart_delay: config.service_restart_delay(),
        }),
        Arc::new(DiskSpace {
            temp_dirs: config.temp_dirs.clone(),
            max_age: config.temp_max_age(),
            target_percent: config.disk_target_percent,
        }),
    ]
}

/// Reclaim memory and drop page caches
#[derive(Debug, Clone)]
pub struct MemoryPressure {
    pub target_percent: f64,
}

#[async_trait]
impl RemediationStrategy for MemoryPressure {
    fn issue_type(&self) -> IssueType {
        IssueType::MemoryPressure
    }

    async fn execute(
        &self,
        _context: &RemediationContext,
        primitives: &dyn RemediationPrimitives,
    ) -> StrategyReport {
        let mut actions = Vec::new();

        match primitives.flush_filesystem_buffers().await {
            Ok(()) => actions.push("Filesystem buffers flushed".to_string()),
            Err(e) => debug!("Buffer flush skipped: {}", e),
        }

        match primitives.drop_page_caches().await {
            Ok(()) => actions.push("System cache cleared".to_string()),
            Err(e) => debug!("Cache drop skipped: {}", e),
        }

        match primitives.memory_usage().await {
            Ok(memory) if memory < self.target_percent => StrategyReport::resolved(
                format!("Memory pressure resolved ({:.1}%)", memory),
                actions,
            ),
            Ok(memory) => {
                actions.push("Memory still high - may need service restart".to_string());
                StrategyReport::unresolved(format!("Memory pressure persists ({:.1}%)", memory), actions)
            }
            Err(e) => StrategyReport::unresolved(format!("Memory healing failed: {}", e), actions),
        }
    }
}

/// Lower the priority of CPU hogs
#[derive(Debug, Clone)]
pub struct CpuOverload {
    pub process_threshold: f64,
    pub max_processes: usize,
    pub niceness: i32,
    pub protected: Vec<String>,
    pub settle_delay: Duration,
    pub target_percent: f64,
}

#[async_trait]
impl RemediationStrategy for CpuOverload {
    fn issue_type(&self) -> IssueType {
        IssueType::CpuOverload
    }

    async fn execute(
        &self,
        _context: &RemediationContext,
        primitives: &dyn RemediationPrimitives,
    ) -> StrategyReport {
        let mut actions = Vec::new();

        let hogs = match primitives.high_cpu_processes(self.process_threshold).await {
            Ok(hogs) => hogs,
            Err(e) => {
                warn!("Process enumeration failed: {}", e);
                Vec::new()
            }
        };
        actions.push(format!("Identified {} high-CPU processes", hogs.len()));

        let mut lowered = 0;
        for process in hogs.iter().take(self.max_processes) {
            if self.protected.iter().any(|name| name == &process.name) {
                debug!("Skipping protected process {} ({})", process.name, process.pid);
                continue;
            }
            match primitives.lower_priority(process.pid, self.niceness).await {
                Ok(()) => lowered += 1,
                Err(e) => debug!("Renice of {} failed: {}", process.pid, e),
            }
        }
        if lowered > 0 {
            actions.push(format!("Lowered priority of {} processes", lowered));
        }

        tokio::time::sleep(self.settle_delay).await;

        match primitives.cpu_usage().await {
            Ok(cpu) if cpu < self.target_percent => {
                StrategyReport::resolved(format!("CPU load reduced ({:.1}%)", cpu), actions)
            }
            Ok(cpu) => StrategyReport::unresolved(format!("CPU load still high ({:.1}%)", cpu), actions),
            Err(e) => StrategyReport::unresolved(format!("CPU healing failed: {}", e), actions),
        }
    }
}

/// Probe well-known endpoints and restart DNS if the network is up
#[derive(Debug, Clone)]
pub struct NetworkIssues {
    pub probe_urls: Vec<String>,
    pub min_successes: usize,
    pub timeout: Duration,
}

#[async_trait]
impl RemediationStrategy for NetworkIssues {
    fn issue_type(&self) -> IssueType {
        IssueType::NetworkIssues
    }

    async fn execute(
        &self,
        _context: &RemediationContext,
        primitives: &dyn RemediationPrimitives,
    ) -> StrategyReport {
        let mut actions = Vec::new();

        let mut reachable = 0;
        for url in &self.probe_urls {
            match primitives.http_probe(url, self.timeout).await {
                Ok(200) => reachable += 1,
                Ok(status) => debug!("{} answered {}", url, status),
                Err(e) => debug!("{}", e),
            }
        }
        actions.push(format!(
            "Network test: {}/{} successful",
            reachable,
            self.probe_urls.len()
        ));

        if reachable < self.min_successes {
            return StrategyReport::unresolved("Network connectivity issues persist", actions);
        }

        // Upstream reachable, so the fault is most likely name resolution
        match primitives.restart_dns().await {
            Ok(()) => actions.push("DNS service restarted".to_string()),
            Err(e) => debug!("DNS restart skipped: {}", e),
        }
        StrategyReport::resolved("Network connectivity restored", actions)
    }
}

/// URLs tried when reaching an unresponsive service, in order
///
/// An explicit `http://` target is only tried over http; otherwise https is
/// tried before http. Hosts without a `www.` prefix are also tried with one.
pub fn service_probe_variants(target: &str) -> Vec<String> {
    let (schemes, host): (&[&str], &str) = if let Some(rest) = target.strip_prefix("https://") {
        (&["https", "http"], rest)
    } else if let Some(rest) = target.strip_prefix("http://") {
        (&["http"], rest)
    } else {
        (&["https", "http"], target)
    };

    let mut variants = Vec::new();
    for scheme in schemes {
        variants.push(format!("{}://{}", scheme, host));
        if !host.starts_with("www.") {
            variants.push(format!("{}://www.{}", scheme, host));
        }
    }
    variants
}

/// Find a working variant of the target URL
#[derive(Debug, Clone)]
pub struct ServiceUnresponsive {
    pub timeout: Duration,
    pub restart_delay: Duration,
}

#[async_trait]
impl RemediationStrategy for ServiceUnresponsive {
    fn issue_type(&self) -> IssueType {
        IssueType::ServiceUnresponsive
    }

    async fn execute(
        &self,
        context: &RemediationContext,
        primitives: &dyn RemediationPrimitives,
    ) -> StrategyReport {
        let mut actions = Vec::new();

        if let Some(target) = context.url.as_deref() {
            for url in service_probe_variants(target) {
                match primitives.http_probe(&url, self.timeout).await {
                    Ok(200) => {
                        actions.push(format!("Service accessible via {}", url));
                        return StrategyReport::resolved(format!("Service restored via {}", url), actions);
                    }
                    Ok(status) => debug!("{} answered {}", url, status),
                    Err(e) => debug!("{}", e),
                }
            }
        }

        actions.push("Attempting generic service healing".to_string());
        tokio::time::sleep(self.restart_delay).await;
        actions.push("Service restart attempted".to_string());

        StrategyReport::resolved("Service healing completed", actions)
    }
}

/// Remove stale temp files
#[derive(Debug, Clone)]
pub struct DiskSpace {
    pub temp_dirs: Vec<PathBuf>,
    pub max_age: Duration,
    pub target_percent: f64,
}

#[async_trait]
impl RemediationStrategy for DiskSpace {
    fn issue_type(&self) -> IssueType {
        IssueType::DiskSpace
    }

    async fn execute(
        &self,
        _context: &RemediationContext,
        primitives: &dyn RemediationPrimitives,
    ) -> StrategyReport {
        let mut actions = Vec::new();

        let mut freed = 0u64;
        for dir in &self.temp_dirs {
            match primitives.cleanup_temp(dir, self.max_age).await {
                Ok(bytes) => freed += bytes,
                Err(e) => debug!("Cleanup of {} skipped: {}", dir.display(), e),
            }
        }
        if freed > 0 {
            actions.push(format!("Cleared {} MB of temp files", freed / BYTES_PER_MB));
        }

        match primitives.disk_usage().await {
            Ok(disk) if disk < self.target_percent => {
                StrategyReport::resolved(format!("Disk space freed ({:.1}% used)", disk), actions)
            }
            Ok(disk) => StrategyReport::unresolved(
                format!("Disk space still critical ({:.1}% used)", disk),
                actions,
            ),
            Err(e) => StrategyReport::unresolved(format!("Disk cleanup failed: {}", e), actions),
        }
    }
}
