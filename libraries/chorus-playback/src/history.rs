//! Playback history tracking
//!
//! Maintains a bounded history of played entries for "previous" functionality

use crate::types::QueueEntry;
use std::collections::VecDeque;

/// Playback history with bounded size
///
/// Tracks recently played entries for "previous" navigation.
/// Implements a ring buffer that silently discards the oldest entries.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = back)
    entries: VecDeque<QueueEntry>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Add entry to history
    ///
    /// If history is full, the oldest entry is discarded and returned
    pub fn push(&mut self, entry: QueueEntry) -> Option<QueueEntry> {
        if self.max_size == 0 {
            return Some(entry);
        }

        let evicted = if self.entries.len() >= self.max_size {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Get most recent entry (without removing)
    pub fn peek(&self) -> Option<&QueueEntry> {
        self.entries.back()
    }

    /// Pop most recent entry from history
    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.entries.pop_back()
    }

    /// Iterate entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// Get number of entries in history
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get maximum history size
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}
