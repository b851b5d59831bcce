//! Host primitives backed by sysinfo, system commands and HTTP probes

use crate::{ProcessInfo, RemediationError, RemediationPrimitives};
use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, SystemTime};
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tokio::process::Command;
use tracing::debug;

const DROP_CACHES_PATH: &str = "/proc/sys/vm/drop_caches";
const DNS_SERVICE: &str = "systemd-resolved";
const CPU_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Primitives that act on the local host
pub struct SystemPrimitives {
    client: reqwest::Client,
}

impl SystemPrimitives {
    pub fn new() -> Result<Self, RemediationError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sentinel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemediationError::Primitive(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

async fn run_command(program: &str, args: &[&str]) -> Result<(), RemediationError> {
    debug!("Executing: {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| RemediationError::Primitive(format!("{}: {}", program, e)))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(RemediationError::Primitive(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

fn percent(used: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| used as f64 / total as f64 * 100.0)
}

#[async_trait]
impl RemediationPrimitives for SystemPrimitives {
    async fn memory_usage(&self) -> Result<f64, RemediationError> {
        let mut sys = System::new();
        sys.refresh_memory();
        percent(sys.used_memory(), sys.total_memory())
            .ok_or_else(|| RemediationError::Primitive("total memory unavailable".to_string()))
    }

    async fn cpu_usage(&self) -> Result<f64, RemediationError> {
        let mut sys = System::new();
        sys.refresh_cpu();
        tokio::time::sleep(CPU_SAMPLE_INTERVAL.max(MINIMUM_CPU_UPDATE_INTERVAL)).await;
        sys.refresh_cpu();
        Ok(sys.global_cpu_info().cpu_usage() as f64)
    }

    async fn disk_usage(&self) -> Result<f64, RemediationError> {
        let disks = Disks::new_with_refreshed_list();
        let root = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .ok_or_else(|| RemediationError::Primitive("root filesystem not found".to_string()))?;
        let total = root.total_space();
        percent(total.saturating_sub(root.available_space()), total)
            .ok_or_else(|| RemediationError::Primitive("root filesystem size unavailable".to_string()))
    }

    async fn flush_filesystem_buffers(&self) -> Result<(), RemediationError> {
        run_command("sync", &[]).await
    }

    async fn drop_page_caches(&self) -> Result<(), RemediationError> {
        tokio::fs::write(DROP_CACHES_PATH, "1\n")
            .await
            .map_err(|e| RemediationError::Primitive(format!("{}: {}", DROP_CACHES_PATH, e)))
    }

    async fn high_cpu_processes(&self, threshold: f64) -> Result<Vec<ProcessInfo>, RemediationError> {
        let mut sys = System::new();
        sys.refresh_processes();
        tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_processes();

        let mut hogs: Vec<ProcessInfo> = sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessInfo {
                pid: pid.as_u32(),
                name: process.name().to_string(),
                cpu_percent: process.cpu_usage() as f64,
            })
            .filter(|process| process.cpu_percent > threshold)
            .collect();
        hogs.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
        Ok(hogs)
    }

    async fn lower_priority(&self, pid: u32, niceness: i32) -> Result<(), RemediationError> {
        let niceness = niceness.to_string();
        let pid = pid.to_string();
        run_command("renice", &["-n", niceness.as_str(), "-p", pid.as_str()]).await
    }

    async fn http_probe(&self, url: &str, timeout: Duration) -> Result<u16, RemediationError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| RemediationError::Probe(format!("{}: {}", url, e)))?;
        Ok(response.status().as_u16())
    }

    async fn restart_dns(&self) -> Result<(), RemediationError> {
        run_command("systemctl", &["restart", DNS_SERVICE]).await
    }

    async fn cleanup_temp(&self, dir: &Path, max_age: Duration) -> Result<u64, RemediationError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(RemediationError::Primitive(format!("{}: {}", dir.display(), e)));
            }
        };

        let now = SystemTime::now();
        let mut freed = 0u64;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    debug!("Stopping scan of {}: {}", dir.display(), e);
                    break;
                }
            };

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => continue,
            };
            let stale = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .map_or(false, |age| age > max_age);
            if !stale {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => freed += metadata.len(),
                Err(e) => debug!("Could not remove {}: {}", entry.path().display(), e),
            }
        }

        Ok(freed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, 200), Some(25.0));
        assert_eq!(percent(10, 0), None);
    }

    #[tokio::test]
    async fn test_cleanup_of_missing_dir_frees_nothing() {
        let primitives = SystemPrimitives::new().unwrap();
        let freed = primitives
            .cleanup_temp(Path::new("/nonexistent/sentinel-temp"), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(freed, 0);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_files() {
        let dir = std::env::temp_dir().join(format!("sentinel-cleanup-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("fresh.log"), b"recent").await.unwrap();

        let primitives = SystemPrimitives::new().unwrap();
        let freed = primitives
            .cleanup_temp(&dir, Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(freed, 0);
        assert!(dir.join("fresh.log").exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
