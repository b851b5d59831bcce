//! Bounded Ring Buffer Implementation

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default buffer capacity (100 samples = 5 min at one tick per 3s)
pub const DEFAULT_CAPACITY: usize = 100;

/// Fixed-capacity FIFO buffer; pushing into a full buffer evicts the oldest entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingBuffer<T> {
    /// Stored entries, oldest first
    items: VecDeque<T>,
    /// Maximum number of entries kept
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Create a buffer with default capacity (100 entries)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Push an entry, returning the evicted oldest entry if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Get the number of entries currently in the buffer
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Iterate newest to oldest
    pub fn iter_recent(&self) -> impl Iterator<Item = &T> {
        self.items.iter().rev()
    }

    /// The trailing `count` entries in chronological order
    pub fn tail(&self, count: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(count);
        self.items.iter().skip(skip)
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Read the last N entries (most recent first)
    pub fn read_last(&self, count: usize) -> Vec<T> {
        self.iter_recent().take(count).cloned().collect()
    }

    /// Copy all entries out, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_and_read() {
        let mut buffer = RingBuffer::new(10);

        for i in 0..5 {
            buffer.push(i * 100);
        }

        assert_eq!(buffer.len(), 5);

        let items = buffer.read_last(3);
        assert_eq!(items, vec![400, 300, 200]); // Most recent first
    }

    #[test]
    fn test_overwrite_oldest() {
        let mut buffer = RingBuffer::new(5);

        let mut evicted = Vec::new();
        for i in 0..8 {
            if let Some(old) = buffer.push(i) {
                evicted.push(old);
            }
        }

        assert_eq!(buffer.len(), 5);
        assert_eq!(evicted, vec![0, 1, 2]);
        assert_eq!(buffer.to_vec(), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_tail_is_chronological() {
        let mut buffer = RingBuffer::new(10);
        buffer.extend(1..=6);

        let tail: Vec<_> = buffer.tail(3).copied().collect();
        assert_eq!(tail, vec![4, 5, 6]);

        // Asking for more than stored returns everything
        assert_eq!(buffer.tail(50).count(), 6);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = RingBuffer::new(0);
        buffer.push("a");
        buffer.push("b");
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.last(), Some(&"b"));
    }

    proptest! {
        #[test]
        fn prop_len_bounded_and_order_kept(capacity in 1usize..64, values in prop::collection::vec(any::<u32>(), 0..256)) {
            let mut buffer = RingBuffer::new(capacity);
            buffer.extend(values.iter().copied());

            prop_assert!(buffer.len() <= capacity);

            let expected: Vec<u32> = values
                .iter()
                .skip(values.len().saturating_sub(capacity))
                .copied()
                .collect();
            prop_assert_eq!(buffer.to_vec(), expected);
        }
    }
}
