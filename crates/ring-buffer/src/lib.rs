//! Bounded Ring Buffers
//!
//! Provides the fixed-capacity FIFO buffer used for every bounded log in the
//! monitor, plus the per-metric sample history consumed by the predictor.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One health sample as fed to the predictor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub latency_ms: f64,
    pub online: bool,
}

/// Single-metric history entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub online: bool,
}

/// Three independent per-metric histories (cpu, memory, latency)
///
/// Values are stored as given; range checking is the caller's concern.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    cpu: RingBuffer<HistoryEntry>,
    memory: RingBuffer<HistoryEntry>,
    latency: RingBuffer<HistoryEntry>,
}

impl SampleHistory {
    /// Create histories holding at most `capacity` entries each
    pub fn new(capacity: usize) -> Self {
        Self {
            cpu: RingBuffer::new(capacity),
            memory: RingBuffer::new(capacity),
            latency: RingBuffer::new(capacity),
        }
    }

    /// Append one sample to all three histories
    pub fn push(&mut self, sample: MetricSample) {
        let entry = |value| HistoryEntry {
            value,
            timestamp: sample.timestamp,
            online: sample.online,
        };
        self.cpu.push(entry(sample.cpu_percent));
        self.memory.push(entry(sample.memory_percent));
        self.latency.push(entry(sample.latency_ms));
    }

    pub fn cpu(&self) -> &RingBuffer<HistoryEntry> {
        &self.cpu
    }

    pub fn memory(&self) -> &RingBuffer<HistoryEntry> {
        &self.memory
    }

    pub fn latency(&self) -> &RingBuffer<HistoryEntry> {
        &self.latency
    }

    /// Number of samples held (all three histories move together)
    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }

    /// Trailing `count` values of one history, oldest first
    pub fn recent_values(history: &RingBuffer<HistoryEntry>, count: usize) -> Vec<f64> {
        history.tail(count).map(|e| e.value).collect()
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
