//! Repository Implementation

use crate::{FailurePattern, HealingRecord, PatternStore, StorageError};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

/// In-memory pattern store with retention limits
pub struct Repository {
    /// Failure patterns, oldest first
    patterns: Mutex<VecDeque<FailurePattern>>,
    /// Healing records, oldest first
    healings: Mutex<VecDeque<HealingRecord>>,
    /// Max failure patterns retained
    max_pattern_records: usize,
    /// Max healing records retained
    max_healing_records: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_limits(1_000, 10_000)
    }

    /// Create a repository with explicit retention limits
    pub fn with_limits(max_pattern_records: usize, max_healing_records: usize) -> Self {
        info!(
            "Creating in-memory repository (patterns={}, healings={})",
            max_pattern_records, max_healing_records
        );
        Self {
            patterns: Mutex::new(VecDeque::new()),
            healings: Mutex::new(VecDeque::new()),
            max_pattern_records: max_pattern_records.max(1),
            max_healing_records: max_healing_records.max(1),
        }
    }

    /// Get total pattern count
    pub fn pattern_count(&self) -> usize {
        self.patterns.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Get total healing count
    pub fn healing_count(&self) -> usize {
        self.healings.lock().map(|h| h.len()).unwrap_or(0)
    }
}

fn lock_error<T>(e: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Lock(e.to_string())
}

fn tail<T: Clone>(items: &VecDeque<T>, limit: usize) -> Vec<T> {
    items
        .iter()
        .skip(items.len().saturating_sub(limit))
        .cloned()
        .collect()
}

impl PatternStore for Repository {
    fn save_failure_pattern(&self, pattern: &FailurePattern) -> Result<(), StorageError> {
        let mut patterns = self.patterns.lock().map_err(lock_error)?;

        // Enforce retention
        while patterns.len() >= self.max_pattern_records {
            patterns.pop_front();
        }

        patterns.push_back(pattern.clone());
        debug!("Stored failure pattern {}", pattern.id);
        Ok(())
    }

    fn load_failure_patterns(&self, limit: usize) -> Result<Vec<FailurePattern>, StorageError> {
        let patterns = self.patterns.lock().map_err(lock_error)?;
        Ok(tail(&patterns, limit))
    }

    fn save_healing(&self, record: &HealingRecord) -> Result<(), StorageError> {
        let mut healings = self.healings.lock().map_err(lock_error)?;

        while healings.len() >= self.max_healing_records {
            healings.pop_front();
        }

        healings.push_back(record.clone());
        debug!("Stored healing record {} ({})", record.id, record.issue_type);
        Ok(())
    }

    fn load_healings(&self, limit: usize) -> Result<Vec<HealingRecord>, StorageError> {
        let healings = self.healings.lock().map_err(lock_error)?;
        Ok(tail(&healings, limit))
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
