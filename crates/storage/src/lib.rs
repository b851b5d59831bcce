//! Storage Layer
//!
//! Persisted record types for failure patterns and healing attempts, and the
//! optional `PatternStore` used to keep them across restarts. Running without
//! a store is supported through `NoopPatternStore`.

mod records;
mod repository;

pub use records::{FailurePattern, FailureSnapshot, HealingRecord};
pub use repository::Repository;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// A previous writer panicked while holding the store
    #[error("Store lock poisoned: {0}")]
    Lock(String),
}

/// Persistence capability for pattern and healing history
pub trait PatternStore: Send + Sync {
    /// Persist one failure pattern
    fn save_failure_pattern(&self, pattern: &FailurePattern) -> Result<(), StorageError>;

    /// Most recent failure patterns, oldest first
    fn load_failure_patterns(&self, limit: usize) -> Result<Vec<FailurePattern>, StorageError>;

    /// Persist one healing attempt
    fn save_healing(&self, record: &HealingRecord) -> Result<(), StorageError>;

    /// Most recent healing attempts, oldest first
    fn load_healings(&self, limit: usize) -> Result<Vec<HealingRecord>, StorageError>;
}

/// Store that keeps nothing; the in-memory histories are the only copy
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPatternStore;

impl PatternStore for NoopPatternStore {
    fn save_failure_pattern(&self, _pattern: &FailurePattern) -> Result<(), StorageError> {
        Ok(())
    }

    fn load_failure_patterns(&self, _limit: usize) -> Result<Vec<FailurePattern>, StorageError> {
        Ok(Vec::new())
    }

    fn save_healing(&self, _record: &HealingRecord) -> Result<(), StorageError> {
        Ok(())
    }

    fn load_healings(&self, _limit: usize) -> Result<Vec<HealingRecord>, StorageError> {
        Ok(Vec::new())
    }
}
