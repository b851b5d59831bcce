//! Issue types and remediation inputs

use crate::RemediationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of issues the engine knows how to heal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    MemoryPressure,
    CpuOverload,
    NetworkIssues,
    ServiceUnresponsive,
    DiskSpace,
}

impl IssueType {
    pub const ALL: [IssueType; 5] = [
        IssueType::MemoryPressure,
        IssueType::CpuOverload,
        IssueType::NetworkIssues,
        IssueType::ServiceUnresponsive,
        IssueType::DiskSpace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::MemoryPressure => "memory_pressure",
            IssueType::CpuOverload => "cpu_overload",
            IssueType::NetworkIssues => "network_issues",
            IssueType::ServiceUnresponsive => "service_unresponsive",
            IssueType::DiskSpace => "disk_space",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = RemediationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueType::ALL
            .iter()
            .copied()
            .find(|issue| issue.as_str() == s)
            .ok_or_else(|| RemediationError::UnknownIssueType(s.to_string()))
    }
}

/// Readings and target handed to a strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemediationContext {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub latency_ms: f64,
    /// Monitored endpoint, used by `service_unresponsive`
    pub url: Option<String>,
}

/// Point-in-time resource usage used for proactive suggestions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub latency_ms: f64,
}
