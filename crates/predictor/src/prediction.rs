//! Failure Prediction

use crate::config::PredictorConfig;
use crate::root_cause::{self, FailureContext, Resolution, RootCauseAnalysis};
use crate::trend::{mean, round2, TrendStatistics};
use crate::PredictorError;
use chrono::{DateTime, Utc};
use ring_buffer::{MetricSample, RingBuffer, SampleHistory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storage::{FailurePattern, NoopPatternStore, PatternStore};
use tracing::{debug, info, warn};
use uuid::Uuid;

const TREND_WEIGHT: f64 = 0.3;
const HIGH_CPU_WEIGHT: f64 = 0.4;
const CRITICAL_MEMORY_WEIGHT: f64 = 0.5;
const HIGH_MEMORY_WEIGHT: f64 = 0.2;
const HIGH_LATENCY_WEIGHT: f64 = 0.3;
const INSTABILITY_WEIGHT: f64 = 0.4;

/// How much history backs a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Confidence from the number of samples held
    pub fn from_history_len(len: usize) -> Self {
        if len > 50 {
            Confidence::High
        } else if len > 20 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// A condition that contributed to the failure score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskFactor {
    CpuTrendingUp { slope: f64 },
    HighCpu { cpu: f64 },
    CriticalMemory { memory: f64 },
    HighMemory { memory: f64 },
    HighLatency { avg_latency_ms: f64 },
    RecentInstability { offline_samples: usize },
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFactor::CpuTrendingUp { slope } => {
                write!(f, "CPU trending up ({:+.1}%/sample)", slope)
            }
            RiskFactor::HighCpu { cpu } => write!(f, "High CPU ({:.1}%)", cpu),
            RiskFactor::CriticalMemory { memory } => write!(f, "Critical memory ({:.1}%)", memory),
            RiskFactor::HighMemory { memory } => write!(f, "High memory ({:.1}%)", memory),
            RiskFactor::HighLatency { avg_latency_ms } => {
                write!(f, "High latency ({:.0}ms)", avg_latency_ms)
            }
            RiskFactor::RecentInstability { offline_samples } => {
                write!(f, "Recent instability ({} offline samples)", offline_samples)
            }
        }
    }
}

/// Operator guidance derived from the probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Critical,
    Warning,
    Caution,
    Healthy,
    InsufficientData,
}

impl Recommendation {
    /// Recommendation band for a probability
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            Recommendation::Critical
        } else if probability > 0.4 {
            Recommendation::Warning
        } else if probability > 0.2 {
            Recommendation::Caution
        } else {
            Recommendation::Healthy
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::Critical => {
                "CRITICAL: Immediate intervention required. Consider restarting services."
            }
            Recommendation::Warning => "WARNING: Monitor closely. Prepare for potential issues.",
            Recommendation::Caution => "CAUTION: System showing stress indicators.",
            Recommendation::Healthy => "HEALTHY: System operating normally.",
            Recommendation::InsufficientData => {
                "INSUFFICIENT DATA: Collecting samples before predicting."
            }
        }
    }
}

/// Near-term failure estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePrediction {
    /// Probability of failure in [0, 0.95], two decimals
    pub probability: f64,
    pub confidence: Confidence,
    /// Contributing factors in evaluation order
    pub factors: Vec<RiskFactor>,
    pub recommendation: Recommendation,
    /// Samples the estimate was computed from
    pub sample_count: usize,
}

impl FailurePrediction {
    /// Result returned while the history is too short
    pub fn insufficient_data(sample_count: usize) -> Self {
        Self {
            probability: 0.0,
            confidence: Confidence::Low,
            factors: Vec::new(),
            recommendation: Recommendation::InsufficientData,
            sample_count,
        }
    }

    /// Factor descriptions in evaluation order
    pub fn factor_descriptions(&self) -> Vec<String> {
        self.factors.iter().map(ToString::to_string).collect()
    }
}

impl Default for FailurePrediction {
    fn default() -> Self {
        Self::insufficient_data(0)
    }
}

/// Trend-based failure predictor
///
/// Owns the sample history and the failure-pattern log; both are only
/// reachable through these methods.
pub struct TrendPredictor {
    config: PredictorConfig,
    history: Mutex<SampleHistory>,
    patterns: Mutex<RingBuffer<FailurePattern>>,
    store: Arc<dyn PatternStore>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TrendPredictor {
    /// Create a predictor with in-memory pattern history only
    pub fn new(config: PredictorConfig) -> Self {
        info!(
            "Creating trend predictor (history={}, patterns={})",
            config.history_capacity, config.pattern_capacity
        );
        Self {
            history: Mutex::new(SampleHistory::new(config.history_capacity)),
            patterns: Mutex::new(RingBuffer::new(config.pattern_capacity)),
            store: Arc::new(NoopPatternStore),
            config,
        }
    }

    /// Create a predictor backed by a pattern store, preloading stored patterns
    pub fn with_store(
        config: PredictorConfig,
        store: Arc<dyn PatternStore>,
    ) -> Result<Self, PredictorError> {
        let stored = store.load_failure_patterns(config.pattern_capacity)?;
        let mut predictor = Self::new(config);
        info!("Loaded {} failure patterns from store", stored.len());
        lock(&predictor.patterns).extend(stored);
        predictor.store = store;
        Ok(predictor)
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Append one sample stamped with the current time
    pub fn add_sample(&self, cpu: f64, memory: f64, latency: f64, online: bool) {
        self.add_sample_at(Utc::now(), cpu, memory, latency, online);
    }

    /// Append one sample stamped with `timestamp`
    pub fn add_sample_at(
        &self,
        timestamp: DateTime<Utc>,
        cpu: f64,
        memory: f64,
        latency: f64,
        online: bool,
    ) {
        lock(&self.history).push(MetricSample {
            timestamp,
            cpu_percent: cpu,
            memory_percent: memory,
            latency_ms: latency,
            online,
        });
    }

    /// Number of samples currently held
    pub fn sample_count(&self) -> usize {
        lock(&self.history).len()
    }

    /// Estimate the probability of failure from the trailing history
    pub fn predict_failure_probability(&self) -> FailurePrediction {
        let history = lock(&self.history);
        let count = history.len();
        let cfg = &self.config;

        if count < cfg.min_samples.max(1) {
            debug!("Insufficient data for prediction ({} samples)", count);
            return FailurePrediction::insufficient_data(count);
        }

        let mut score = 0.0;
        let mut factors = Vec::new();

        let cpu_trend = TrendStatistics::compute(&SampleHistory::recent_values(
            history.cpu(),
            cfg.trend_window,
        ));
        if cpu_trend.slope > cfg.trend_slope_threshold {
            score += TREND_WEIGHT;
            factors.push(RiskFactor::CpuTrendingUp {
                slope: cpu_trend.slope,
            });
        }

        if cpu_trend.last > cfg.high_cpu_percent {
            score += HIGH_CPU_WEIGHT;
            factors.push(RiskFactor::HighCpu {
                cpu: cpu_trend.last,
            });
        }

        if let Some(memory) = history.memory().last().map(|e| e.value) {
            if memory > cfg.critical_memory_percent {
                score += CRITICAL_MEMORY_WEIGHT;
                factors.push(RiskFactor::CriticalMemory { memory });
            } else if memory > cfg.high_memory_percent {
                score += HIGH_MEMORY_WEIGHT;
                factors.push(RiskFactor::HighMemory { memory });
            }
        }

        let avg_latency_ms = mean(&SampleHistory::recent_values(
            history.latency(),
            cfg.latency_window,
        ));
        if avg_latency_ms > cfg.high_latency_ms {
            score += HIGH_LATENCY_WEIGHT;
            factors.push(RiskFactor::HighLatency { avg_latency_ms });
        }

        let offline_samples = history
            .cpu()
            .tail(cfg.instability_window)
            .filter(|e| !e.online)
            .count();
        if offline_samples > cfg.instability_tolerance {
            score += INSTABILITY_WEIGHT;
            factors.push(RiskFactor::RecentInstability { offline_samples });
        }

        let probability = round2(score.min(cfg.max_probability));
        let prediction = FailurePrediction {
            probability,
            confidence: Confidence::from_history_len(count),
            factors,
            recommendation: Recommendation::from_probability(probability),
            sample_count: count,
        };

        debug!(
            "Failure prediction: p={} confidence={} factors={}",
            prediction.probability,
            prediction.confidence.as_str(),
            prediction.factors.len()
        );
        prediction
    }

    /// Attribute a failure to candidate causes using its pre-failure window
    pub fn analyze_root_cause(&self, context: &FailureContext) -> RootCauseAnalysis {
        let patterns = lock(&self.patterns);
        root_cause::analyze(context, patterns.iter(), &self.config)
    }

    /// Remember a resolved failure for future similarity matching
    pub fn record_failure_pattern(
        &self,
        context: &FailureContext,
        resolution: Resolution,
    ) -> FailurePattern {
        let pattern = FailurePattern {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            failure_snapshot: context.snapshot(),
            resolved_cause: resolution.cause,
            resolution_time_secs: resolution.time_to_resolve_secs,
            actions_taken: resolution.actions,
        };

        lock(&self.patterns).push(pattern.clone());

        if let Err(e) = self.store.save_failure_pattern(&pattern) {
            warn!("Failed to persist failure pattern {}: {}", pattern.id, e);
        }

        info!(
            "Recorded failure pattern: {}",
            pattern.resolved_cause.as_deref().unwrap_or("unknown cause")
        );
        pattern
    }

    /// Number of failure patterns retained
    pub fn pattern_count(&self) -> usize {
        lock(&self.patterns).len()
    }
}

impl Default for TrendPredictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}
