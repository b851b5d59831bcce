//! Proactive action suggestions

use crate::{RemediationConfig, ResourceSnapshot};
use serde::{Deserialize, Serialize};

/// Suggestion urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Medium,
    High,
}

/// An action worth taking before a threshold is breached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProactiveSuggestion {
    pub action: String,
    pub priority: Priority,
    pub description: String,
}

impl ProactiveSuggestion {
    fn new(action: &str, priority: Priority, description: &str) -> Self {
        Self {
            action: action.to_string(),
            priority,
            description: description.to_string(),
        }
    }
}

/// Static threshold table; several suggestions may fire at once
pub fn suggest_proactive_actions(
    snapshot: &ResourceSnapshot,
    config: &RemediationConfig,
) -> Vec<ProactiveSuggestion> {
    let mut suggestions = Vec::new();

    if snapshot.cpu_percent > config.suggest_cpu_percent {
        suggestions.push(ProactiveSuggestion::new(
            "cpu_optimization",
            Priority::Medium,
            "CPU usage approaching threshold, consider optimization",
        ));
    }
    if snapshot.memory_percent > config.suggest_memory_percent {
        suggestions.push(ProactiveSuggestion::new(
            "memory_cleanup",
            Priority::High,
            "Memory usage high, proactive cleanup recommended",
        ));
    }
    if snapshot.disk_percent > config.suggest_disk_percent {
        suggestions.push(ProactiveSuggestion::new(
            "disk_cleanup",
            Priority::High,
            "Disk space running low, cleanup needed",
        ));
    }
    if snapshot.latency_ms > config.suggest_latency_ms {
        suggestions.push(ProactiveSuggestion::new(
            "network_optimization",
            Priority::Medium,
            "High latency detected, network optimization suggested",
        ));
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_host_has_no_suggestions() {
        let snapshot = ResourceSnapshot {
            cpu_percent: 40.0,
            memory_percent: 50.0,
            disk_percent: 60.0,
            latency_ms: 300.0,
        };
        assert!(suggest_proactive_actions(&snapshot, &RemediationConfig::default()).is_empty());
    }

    #[test]
    fn test_all_thresholds_fire_together() {
        let snapshot = ResourceSnapshot {
            cpu_percent: 71.0,
            memory_percent: 76.0,
            disk_percent: 81.0,
            latency_ms: 2001.0,
        };
        let suggestions = suggest_proactive_actions(&snapshot, &RemediationConfig::default());
        let actions: Vec<&str> = suggestions.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["cpu_optimization", "memory_cleanup", "disk_cleanup", "network_optimization"]
        );
        assert_eq!(suggestions[1].priority, Priority::High);
        assert_eq!(suggestions[3].priority, Priority::Medium);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let snapshot = ResourceSnapshot {
            cpu_percent: 70.0,
            memory_percent: 75.0,
            disk_percent: 80.0,
            latency_ms: 2000.0,
        };
        assert!(suggest_proactive_actions(&snapshot, &RemediationConfig::default()).is_empty());
    }
}
