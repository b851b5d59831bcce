//! Root-Cause Analysis

use crate::config::PredictorConfig;
use crate::prediction::Confidence;
use serde::{Deserialize, Serialize};
use storage::{FailurePattern, FailureSnapshot};
use tracing::debug;

pub const MEMORY_EXHAUSTION: &str = "Memory Exhaustion";
pub const CPU_OVERLOAD: &str = "CPU Overload";
pub const NETWORK_ISSUES: &str = "Network Issues";
pub const EXTERNAL_DEPENDENCY: &str = "External Service Dependency";
pub const UNKNOWN_CAUSE: &str = "Unknown";
const SIMILAR_HISTORICAL_ISSUE: &str = "Similar Historical Issue";

/// One point of a pre-failure window; missing readings count as zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub memory: f64,
    #[serde(default)]
    pub latency: f64,
}

/// Description of a failure handed to root-cause analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Samples leading up to the failure, oldest first
    #[serde(default)]
    pub pre_failure_metrics: Vec<MetricPoint>,
    /// Readings at the failure itself
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub memory: Option<f64>,
    #[serde(default)]
    pub latency: Option<f64>,
}

impl FailureContext {
    /// Context from a pre-failure window alone
    pub fn from_window(pre_failure_metrics: Vec<MetricPoint>) -> Self {
        Self {
            pre_failure_metrics,
            ..Default::default()
        }
    }

    /// Readings compared against stored patterns
    ///
    /// Uses the explicit failure readings when any is set, otherwise the last
    /// pre-failure point.
    pub fn snapshot(&self) -> FailureSnapshot {
        let explicit = FailureSnapshot {
            cpu: self.cpu,
            memory: self.memory,
            latency: self.latency,
        };
        if !explicit.is_empty() {
            return explicit;
        }
        match self.pre_failure_metrics.last() {
            Some(point) => FailureSnapshot {
                cpu: Some(point.cpu),
                memory: Some(point.memory),
                latency: Some(point.latency),
            },
            None => FailureSnapshot::default(),
        }
    }
}

/// How a failure was resolved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub cause: Option<String>,
    pub time_to_resolve_secs: Option<f64>,
    #[serde(default)]
    pub actions: Vec<String>,
}

/// A candidate cause with its confidence in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    pub cause: String,
    pub confidence: f64,
    pub evidence: String,
}

impl RootCause {
    fn new(cause: impl Into<String>, confidence: f64, evidence: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            confidence,
            evidence: evidence.into(),
        }
    }
}

/// Outcome of root-cause analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    pub primary_cause: String,
    pub confidence: f64,
    pub evidence: String,
    /// Every candidate other than the primary, in discovery order
    pub contributing_factors: Vec<RootCause>,
    pub recommended_actions: Vec<String>,
}

impl RootCauseAnalysis {
    /// Analysis for an empty pre-failure window
    pub fn unknown() -> Self {
        Self {
            primary_cause: UNKNOWN_CAUSE.to_string(),
            confidence: 0.0,
            evidence: "No pre-failure metrics available".to_string(),
            contributing_factors: Vec::new(),
            recommended_actions: recovery_actions(UNKNOWN_CAUSE),
        }
    }

    /// Confidence band of the primary cause
    pub fn confidence_level(&self) -> Confidence {
        if self.confidence >= 0.8 {
            Confidence::High
        } else if self.confidence >= 0.5 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Recommended recovery actions for a cause name
pub fn recovery_actions(cause: &str) -> Vec<String> {
    let actions: &[&str] = match cause {
        MEMORY_EXHAUSTION => &[
            "Restart application services",
            "Clear application caches",
            "Scale up memory resources",
            "Check for memory leaks",
        ],
        CPU_OVERLOAD => &[
            "Restart high-CPU processes",
            "Scale up CPU resources",
            "Optimize application performance",
            "Check for infinite loops",
        ],
        NETWORK_ISSUES => &[
            "Check network connectivity",
            "Restart network services",
            "Verify DNS resolution",
            "Check firewall rules",
        ],
        EXTERNAL_DEPENDENCY => &[
            "Check external service status",
            "Implement circuit breaker",
            "Use cached responses",
            "Switch to backup services",
        ],
        _ => &["Restart all services", "Check system logs", "Monitor closely"],
    };
    actions.iter().map(|a| a.to_string()).collect()
}

/// Mean per-field similarity `1 − |a−b| / max(a,b)` over fields present in both
///
/// Fields where both values are zero are skipped; no comparable field gives 0.
pub fn pattern_similarity(current: &FailureSnapshot, stored: &FailureSnapshot) -> f64 {
    let pairs = [
        (current.cpu, stored.cpu),
        (current.memory, stored.memory),
        (current.latency, stored.latency),
    ];

    let mut score = 0.0;
    let mut fields = 0usize;
    for (a, b) in pairs {
        let (Some(a), Some(b)) = (a, b) else { continue };
        let max = a.max(b);
        if max <= 0.0 {
            continue;
        }
        score += 1.0 - (a - b).abs() / max;
        fields += 1;
    }

    if fields == 0 {
        0.0
    } else {
        score / fields as f64
    }
}

fn tail(window: &[MetricPoint], count: usize) -> &[MetricPoint] {
    &window[window.len().saturating_sub(count)..]
}

/// Run the analysis against a set of stored patterns
pub fn analyze<'a>(
    context: &FailureContext,
    patterns: impl Iterator<Item = &'a FailurePattern>,
    config: &PredictorConfig,
) -> RootCauseAnalysis {
    let window = &context.pre_failure_metrics;
    if window.is_empty() {
        return RootCauseAnalysis::unknown();
    }

    let mut causes = Vec::new();

    if tail(window, 5).iter().any(|m| m.memory > 95.0) {
        causes.push(RootCause::new(MEMORY_EXHAUSTION, 0.9, "Memory usage >95%"));
    }
    if tail(window, 5).iter().any(|m| m.cpu > 90.0) {
        causes.push(RootCause::new(CPU_OVERLOAD, 0.8, "CPU usage >90%"));
    }
    if tail(window, 3).iter().any(|m| m.latency > 5000.0) {
        causes.push(RootCause::new(NETWORK_ISSUES, 0.7, "Latency >5000ms"));
    }

    let snapshot = context.snapshot();
    for pattern in patterns {
        let similarity = pattern_similarity(&snapshot, &pattern.failure_snapshot);
        if similarity > config.similarity_threshold {
            causes.push(RootCause::new(
                pattern
                    .resolved_cause
                    .as_deref()
                    .unwrap_or(SIMILAR_HISTORICAL_ISSUE),
                similarity * config.similarity_weight,
                format!(
                    "Similar to failure on {}",
                    pattern.timestamp.format("%Y-%m-%d %H:%M")
                ),
            ));
        }
    }

    if causes.is_empty() {
        causes.push(RootCause::new(
            EXTERNAL_DEPENDENCY,
            0.6,
            "No internal resource issues detected",
        ));
    }

    // First candidate wins ties
    let mut primary_idx = 0;
    for (i, cause) in causes.iter().enumerate().skip(1) {
        if cause.confidence > causes[primary_idx].confidence {
            primary_idx = i;
        }
    }
    let primary = causes.remove(primary_idx);

    debug!(
        "Root cause: {} ({:.2}), {} contributing",
        primary.cause,
        primary.confidence,
        causes.len()
    );

    RootCauseAnalysis {
        recommended_actions: recovery_actions(&primary.cause),
        primary_cause: primary.cause,
        confidence: primary.confidence,
        evidence: primary.evidence,
        contributing_factors: causes,
    }
}
