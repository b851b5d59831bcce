//! Capabilities used by healing strategies

use crate::RemediationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A running process as seen by the CPU strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
}

/// Host operations a strategy may perform
///
/// Every call is independent; strategies treat each failure as a skipped
/// step rather than an abort.
#[async_trait]
pub trait RemediationPrimitives: Send + Sync {
    /// Used memory (%)
    async fn memory_usage(&self) -> Result<f64, RemediationError>;

    /// Global CPU usage (%)
    async fn cpu_usage(&self) -> Result<f64, RemediationError>;

    /// Root filesystem usage (%)
    async fn disk_usage(&self) -> Result<f64, RemediationError>;

    /// Flush dirty filesystem buffers to disk
    async fn flush_filesystem_buffers(&self) -> Result<(), RemediationError>;

    /// Ask the kernel to drop clean page caches
    async fn drop_page_caches(&self) -> Result<(), RemediationError>;

    /// Processes above `threshold` percent CPU, busiest first
    async fn high_cpu_processes(&self, threshold: f64) -> Result<Vec<ProcessInfo>, RemediationError>;

    /// Lower a process's scheduling priority
    async fn lower_priority(&self, pid: u32, niceness: i32) -> Result<(), RemediationError>;

    /// GET `url` and return the HTTP status
    async fn http_probe(&self, url: &str, timeout: Duration) -> Result<u16, RemediationError>;

    /// Restart the DNS resolver service
    async fn restart_dns(&self) -> Result<(), RemediationError>;

    /// Remove regular files in `dir` older than `max_age`, returning bytes freed
    async fn cleanup_temp(&self, dir: &Path, max_age: Duration) -> Result<u64, RemediationError>;
}

/// Primitives for hosts where remediation is disabled
///
/// Actions are accepted and do nothing; readings are unavailable, so
/// strategies that verify their effect report failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPrimitives;

fn unavailable<T>(what: &str) -> Result<T, RemediationError> {
    Err(RemediationError::Primitive(format!("{} unavailable", what)))
}

#[async_trait]
impl RemediationPrimitives for NoopPrimitives {
    async fn memory_usage(&self) -> Result<f64, RemediationError> {
        unavailable("memory usage")
    }

    async fn cpu_usage(&self) -> Result<f64, RemediationError> {
        unavailable("cpu usage")
    }

    async fn disk_usage(&self) -> Result<f64, RemediationError> {
        unavailable("disk usage")
    }

    async fn flush_filesystem_buffers(&self) -> Result<(), RemediationError> {
        Ok(())
    }

    async fn drop_page_caches(&self) -> Result<(), RemediationError> {
        Ok(())
    }

    async fn high_cpu_processes(&self, _threshold: f64) -> Result<Vec<ProcessInfo>, RemediationError> {
        Ok(Vec::new())
    }

    async fn lower_priority(&self, _pid: u32, _niceness: i32) -> Result<(), RemediationError> {
        Ok(())
    }

    async fn http_probe(&self, url: &str, _timeout: Duration) -> Result<u16, RemediationError> {
        Err(RemediationError::Probe(format!("{}: probing disabled", url)))
    }

    async fn restart_dns(&self) -> Result<(), RemediationError> {
        Ok(())
    }

    async fn cleanup_temp(&self, _dir: &Path, _max_age: Duration) -> Result<u64, RemediationError> {
        Ok(0)
    }
}
