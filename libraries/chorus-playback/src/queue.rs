//! Pending queue
//!
//! Strict FIFO of entries waiting to play. The only non-FIFO operation is
//! [`PendingQueue::push_front`], used when "previous" puts tracks back ahead
//! of everything else.

use crate::types::QueueEntry;
use std::collections::VecDeque;

/// FIFO of entries awaiting playback
///
/// ```text
/// Currently Playing: Track A        (not in the queue)
/// ─────────────────────────────
/// Pending (next first):
///   - Track B
///   - Track C
/// ```
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    entries: VecDeque<QueueEntry>,
}

impl PendingQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entry at the back
    pub fn push_back(&mut self, entry: QueueEntry) {
        self.entries.push_back(entry);
    }

    /// Append entries at the back, preserving their order
    pub fn extend(&mut self, entries: impl IntoIterator<Item = QueueEntry>) {
        self.entries.extend(entries);
    }

    /// Put entry at the front so it plays next
    pub fn push_front(&mut self, entry: QueueEntry) {
        self.entries.push_front(entry);
    }

    /// Take the next entry to play
    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Peek at next entry without removing
    pub fn peek(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    /// Iterate entries in play order
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::{ReplyContext, TrackDescriptor};

    fn create_test_entry(title: &str) -> QueueEntry {
        QueueEntry::new(
            TrackDescriptor::new(title, "stream", "page"),
            ReplyContext::new("music"),
        )
    }

    #[test]
    fn fifo_order() {
        let mut queue = PendingQueue::new();
        queue.push_back(create_test_entry("1"));
        queue.extend(vec![create_test_entry("2"), create_test_entry("3")]);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().unwrap().title(), "1");
        assert_eq!(queue.pop_front().unwrap().title(), "1");
        assert_eq!(queue.pop_front().unwrap().title(), "2");
        assert_eq!(queue.pop_front().unwrap().title(), "3");
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn push_front_jumps_the_line() {
        let mut queue = PendingQueue::new();
        queue.push_back(create_test_entry("later"));
        queue.push_front(create_test_entry("second"));
        queue.push_front(create_test_entry("first"));

        let order: Vec<_> = queue.iter().map(QueueEntry::title).collect();
        assert_eq!(order, vec!["first", "second", "later"]);
    }

    #[test]
    fn clear_queue() {
        let mut queue = PendingQueue::new();
        queue.push_back(create_test_entry("1"));
        queue.clear();
        assert!(queue.is_empty());
    }
}
