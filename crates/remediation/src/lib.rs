//! Self-Healing Remediation
//!
//! Dispatches one bounded strategy per issue type, never more than one run
//! per type at a time, and keeps a log of healing attempts.

mod config;
mod engine;
mod issue;
mod primitives;
mod proactive;
mod strategies;
mod system;

pub use config::RemediationConfig;
pub use engine::{HealOutcome, HealingAttempt, HealingStats, RemediationEngine};
pub use issue::{IssueType, RemediationContext, ResourceSnapshot};
pub use primitives::{NoopPrimitives, ProcessInfo, RemediationPrimitives};
pub use proactive::{suggest_proactive_actions, Priority, ProactiveSuggestion};
pub use strategies::{
    default_strategies, service_probe_variants, CpuOverload, DiskSpace, MemoryPressure,
    NetworkIssues, RemediationStrategy, ServiceUnresponsive, StrategyReport,
};
pub use system::SystemPrimitives;

use thiserror::Error;

/// Remediation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemediationError {
    #[error("No healing strategy for {0}")]
    UnknownIssueType(String),

    #[error("Healing already in progress for {0}")]
    AlreadyInProgress(IssueType),

    #[error("Healing {issue_type} failed: {message}")]
    StrategyFailure { issue_type: IssueType, message: String },

    #[error("Primitive failed: {0}")]
    Primitive(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<storage::StorageError> for RemediationError {
    fn from(e: storage::StorageError) -> Self {
        RemediationError::Store(e.to_string())
    }
}
