//! Remediation Engine Implementation

use crate::strategies::default_strategies;
use crate::{
    suggest_proactive_actions, IssueType, ProactiveSuggestion, RemediationConfig,
    RemediationContext, RemediationError, RemediationPrimitives, RemediationStrategy,
    ResourceSnapshot,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use storage::{HealingRecord, NoopPatternStore, PatternStore};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Attempts listed in `HealingStats::recent_healings`
const RECENT_HEALINGS: usize = 5;

/// One completed run of a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingAttempt {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub issue_type: IssueType,
    pub success: bool,
    pub message: String,
    pub actions: Vec<String>,
    pub duration_ms: u64,
}

impl From<&HealingAttempt> for HealingRecord {
    fn from(attempt: &HealingAttempt) -> Self {
        HealingRecord {
            id: attempt.id,
            timestamp: attempt.timestamp,
            issue_type: attempt.issue_type.as_str().to_string(),
            success: attempt.success,
            message: attempt.message.clone(),
            actions: attempt.actions.clone(),
            duration_ms: attempt.duration_ms,
        }
    }
}

impl TryFrom<HealingRecord> for HealingAttempt {
    type Error = RemediationError;

    fn try_from(record: HealingRecord) -> Result<Self, Self::Error> {
        Ok(HealingAttempt {
            id: record.id,
            timestamp: record.timestamp,
            issue_type: record.issue_type.parse()?,
            success: record.success,
            message: record.message,
            actions: record.actions,
            duration_ms: record.duration_ms,
        })
    }
}

/// A successful heal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealOutcome {
    pub attempt_id: Uuid,
    pub issue_type: IssueType,
    pub message: String,
    pub actions: Vec<String>,
    pub duration_ms: u64,
}

/// Aggregate view of the healing log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealingStats {
    pub total_attempts: usize,
    pub successful: usize,
    /// Percentage, one decimal
    pub success_rate: f64,
    /// Seconds, two decimals
    pub avg_healing_time_secs: f64,
    /// Newest last
    pub recent_healings: Vec<HealingAttempt>,
}

/// Releases an issue type from the active set when dropped
struct ActiveGuard<'a> {
    active: &'a Mutex<HashSet<IssueType>>,
    issue_type: IssueType,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        lock(self.active).remove(&self.issue_type);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Single-flight dispatcher for healing strategies
pub struct RemediationEngine {
    config: RemediationConfig,
    primitives: Arc<dyn RemediationPrimitives>,
    strategies: HashMap<IssueType, Arc<dyn RemediationStrategy>>,
    active: Mutex<HashSet<IssueType>>,
    history: Mutex<RingBuffer<HealingAttempt>>,
    store: Arc<dyn PatternStore>,
}

impl RemediationEngine {
    /// Create an engine with the built-in strategies and no persistence
    pub fn new(config: RemediationConfig, primitives: Arc<dyn RemediationPrimitives>) -> Self {
        info!("Creating remediation engine with config: {:?}", config);
        let mut engine = Self {
            strategies: HashMap::new(),
            active: Mutex::new(HashSet::new()),
            history: Mutex::new(RingBuffer::new(config.history_capacity)),
            store: Arc::new(NoopPatternStore),
            primitives,
            config,
        };
        for strategy in default_strategies(&engine.config) {
            engine.register(strategy);
        }
        engine
    }

    /// Create an engine that persists attempts to `store`, preloading its history
    pub fn with_store(
        config: RemediationConfig,
        primitives: Arc<dyn RemediationPrimitives>,
        store: Arc<dyn PatternStore>,
    ) -> Result<Self, RemediationError> {
        let stored = store.load_healings(config.history_capacity)?;
        let mut engine = Self::new(config, primitives);
        {
            let mut history = lock(&engine.history);
            for record in stored {
                match HealingAttempt::try_from(record) {
                    Ok(attempt) => {
                        history.push(attempt);
                    }
                    Err(e) => warn!("Skipping stored healing record: {}", e),
                }
            }
            info!("Loaded {} healing attempts from store", history.len());
        }
        engine.store = store;
        Ok(engine)
    }

    /// Install or replace the strategy for its issue type
    pub fn register(&mut self, strategy: Arc<dyn RemediationStrategy>) {
        self.strategies.insert(strategy.issue_type(), strategy);
    }

    /// Remove the strategy for an issue type
    pub fn unregister(&mut self, issue_type: IssueType) -> Option<Arc<dyn RemediationStrategy>> {
        self.strategies.remove(&issue_type)
    }

    pub fn config(&self) -> &RemediationConfig {
        &self.config
    }

    /// Whether a heal for `issue_type` is in flight
    pub fn is_active(&self, issue_type: IssueType) -> bool {
        lock(&self.active).contains(&issue_type)
    }

    /// Run the strategy for `issue_type` unless one is already running
    pub async fn auto_heal(
        &self,
        issue_type: IssueType,
        context: &RemediationContext,
    ) -> Result<HealOutcome, RemediationError> {
        let strategy = match self.strategies.get(&issue_type) {
            Some(strategy) => Arc::clone(strategy),
            None => {
                warn!("No healing strategy registered for {}", issue_type);
                return Err(RemediationError::UnknownIssueType(issue_type.to_string()));
            }
        };

        // Claimed before the first await; released on every exit path
        let _guard = {
            let mut active = lock(&self.active);
            if !active.insert(issue_type) {
                info!("Healing already in progress for {}", issue_type);
                counter!("sentinel_remediations_total", "issue_type" => issue_type.as_str(), "outcome" => "rejected")
                    .increment(1);
                return Err(RemediationError::AlreadyInProgress(issue_type));
            }
            ActiveGuard {
                active: &self.active,
                issue_type,
            }
        };

        debug!("Starting healing for {}", issue_type);
        let started = Instant::now();
        let report = strategy.execute(context, self.primitives.as_ref()).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let attempt = HealingAttempt {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            issue_type,
            success: report.success,
            message: report.message,
            actions: report.actions,
            duration_ms,
        };
        self.record(&attempt);

        if attempt.success {
            Ok(HealOutcome {
                attempt_id: attempt.id,
                issue_type,
                message: attempt.message,
                actions: attempt.actions,
                duration_ms,
            })
        } else {
            Err(RemediationError::StrategyFailure {
                issue_type,
                message: attempt.message,
            })
        }
    }

    /// `auto_heal` for an issue named by string
    pub async fn auto_heal_named(
        &self,
        issue_type: &str,
        context: &RemediationContext,
    ) -> Result<HealOutcome, RemediationError> {
        let issue_type: IssueType = issue_type.parse()?;
        self.auto_heal(issue_type, context).await
    }

    /// Heal whatever the current readings call for, one issue after another
    pub async fn run_proactive_remediation(
        &self,
        context: &RemediationContext,
    ) -> Vec<(IssueType, Result<HealOutcome, RemediationError>)> {
        let mut wanted = Vec::new();
        if context.memory_percent > self.config.proactive_memory_percent {
            wanted.push(IssueType::MemoryPressure);
        }
        if context.cpu_percent > self.config.proactive_cpu_percent {
            wanted.push(IssueType::CpuOverload);
        }
        if context.latency_ms > self.config.proactive_latency_ms {
            wanted.push(IssueType::NetworkIssues);
        }

        let mut results = Vec::with_capacity(wanted.len());
        for issue_type in wanted {
            info!("Proactive healing: {}", issue_type);
            let result = self.auto_heal(issue_type, context).await;
            results.push((issue_type, result));
        }
        results
    }

    fn record(&self, attempt: &HealingAttempt) {
        let outcome = if attempt.success { "success" } else { "failure" };
        counter!("sentinel_remediations_total", "issue_type" => attempt.issue_type.as_str(), "outcome" => outcome)
            .increment(1);

        if attempt.success {
            info!(
                "Healing recorded: {} - Success in {}ms ({})",
                attempt.issue_type, attempt.duration_ms, attempt.message
            );
        } else {
            warn!(
                "Healing recorded: {} - Failed in {}ms ({})",
                attempt.issue_type, attempt.duration_ms, attempt.message
            );
        }

        lock(&self.history).push(attempt.clone());

        if let Err(e) = self.store.save_healing(&HealingRecord::from(attempt)) {
            warn!("Failed to persist healing attempt {}: {}", attempt.id, e);
        }
    }

    /// Totals, success rate and the most recent attempts
    pub fn get_healing_stats(&self) -> HealingStats {
        let history = lock(&self.history);
        let total = history.len();
        if total == 0 {
            return HealingStats::default();
        }

        let successful = history.iter().filter(|a| a.success).count();
        let total_ms: u64 = history.iter().map(|a| a.duration_ms).sum();

        HealingStats {
            total_attempts: total,
            successful,
            success_rate: round_to(successful as f64 / total as f64 * 100.0, 1),
            avg_healing_time_secs: round_to(total_ms as f64 / total as f64 / 1000.0, 2),
            recent_healings: history.tail(RECENT_HEALINGS).cloned().collect(),
        }
    }

    /// All attempts in the log, oldest first
    pub fn healing_history(&self) -> Vec<HealingAttempt> {
        lock(&self.history).to_vec()
    }

    pub fn suggest_proactive_actions(&self, snapshot: &ResourceSnapshot) -> Vec<ProactiveSuggestion> {
        suggest_proactive_actions(snapshot, &self.config)
    }
}
