//! Per-session queue state
//!
//! `SessionState` is plain data with synchronous transitions. It knows nothing
//! about drivers or locks; the sequencer owns it behind the session mutex and
//! pairs every transition with the matching driver call.

use crate::history::History;
use crate::queue::PendingQueue;
use crate::types::{QueueEntry, SessionSnapshot};
use chorus_core::{DriverStatus, EntryId, PlayToken, ReplyContext, SessionId};
use std::collections::HashSet;

/// Pending queue, bounded history, and current entry of one session
#[derive(Debug, Clone)]
pub struct SessionState {
    pending: PendingQueue,
    history: History,
    current: Option<QueueEntry>,

    /// Play attempt whose completion is still expected
    in_flight: Option<PlayToken>,
    next_token: PlayToken,

    /// Context of the last entry started, for the "queue finished" notice
    last_context: Option<ReplyContext>,
}

impl SessionState {
    /// Create empty state with the given history capacity
    pub fn new(history_size: usize) -> Self {
        Self {
            pending: PendingQueue::new(),
            history: History::new(history_size),
            current: None,
            in_flight: None,
            next_token: PlayToken::first(),
            last_context: None,
        }
    }

    /// Entries waiting to play
    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// Recently played entries
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Entry loaded in the driver
    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.as_ref()
    }

    /// Play attempt whose completion is still expected
    pub fn in_flight(&self) -> Option<PlayToken> {
        self.in_flight
    }

    /// Whether `token` identifies the expected completion
    pub fn is_in_flight(&self, token: PlayToken) -> bool {
        self.in_flight == Some(token)
    }

    /// Forget the expected completion; a late callback becomes stale
    pub fn clear_in_flight(&mut self) {
        self.in_flight = None;
    }

    /// Append entries to the back of the pending queue
    pub fn enqueue(&mut self, entries: impl IntoIterator<Item = QueueEntry>) {
        self.pending.extend(entries);
    }

    /// Pop the head of pending into `current` and open a new play attempt
    ///
    /// Returns `None` when pending is empty. The caller must hand the entry
    /// to the driver, or call [`retire_current`](Self::retire_current) and
    /// [`clear_in_flight`](Self::clear_in_flight) if that fails.
    pub fn begin_next(&mut self) -> Option<(PlayToken, QueueEntry)> {
        debug_assert!(self.current.is_none(), "begin_next with a current entry");

        let entry = self.pending.pop_front()?;
        let token = self.next_token;
        self.next_token = token.successor();
        self.in_flight = Some(token);
        self.last_context = Some(entry.context.clone());
        self.current = Some(entry.clone());
        Some((token, entry))
    }

    /// Move `current` into history, evicting the oldest entry if full
    ///
    /// Returns the ID of the retired entry.
    pub fn retire_current(&mut self) -> Option<EntryId> {
        let entry = self.current.take()?;
        let id = entry.id;
        self.history.push(entry);
        Some(id)
    }

    /// Queue surgery for "previous"
    ///
    /// Pops the most recent history entry; puts `current` (if any) back at
    /// the front of pending and the popped entry ahead of it. Leaves
    /// `current` empty and the in-flight token untouched, so the next advance
    /// plays the restored entry. Returns `false` if history is empty.
    pub fn rewind(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };

        if let Some(current) = self.current.take() {
            self.pending.push_front(current);
        }
        self.pending.push_front(previous);
        true
    }

    /// Clear pending and retire `current`
    ///
    /// Returns `true` if anything was playing or queued.
    pub fn stop(&mut self) -> bool {
        let had_work = self.current.is_some() || !self.pending.is_empty();
        self.pending.clear();
        self.retire_current();
        self.in_flight = None;
        self.last_context = None;
        had_work
    }

    /// Clear pending, history, and current
    ///
    /// Returns `true` if anything was cleared.
    pub fn reset(&mut self) -> bool {
        let had_state =
            self.current.is_some() || !self.pending.is_empty() || !self.history.is_empty();
        self.pending.clear();
        self.history.clear();
        self.current = None;
        self.in_flight = None;
        self.last_context = None;
        had_state
    }

    /// Context to notify that the queue ran dry, at most once per run
    pub fn take_finished_context(&mut self) -> Option<ReplyContext> {
        self.last_context.take()
    }

    /// Read-only copy for status display
    pub fn snapshot(&self, session: &SessionId, status: DriverStatus) -> SessionSnapshot {
        SessionSnapshot {
            session: session.clone(),
            status,
            current: self.current.clone(),
            pending: self.pending.iter().cloned().collect(),
            history: self.history.iter().cloned().collect(),
        }
    }

    /// Check structural invariants against the driver's status
    ///
    /// - `current` is set iff the driver is playing or paused
    /// - no entry appears in more than one of pending, current, history
    ///
    /// # Errors
    /// Returns a description of the first violation found
    pub fn verify(&self, status: DriverStatus) -> Result<(), String> {
        if self.current.is_some() != status.is_active() {
            return Err(format!(
                "current is {} but driver is {status:?}",
                if self.current.is_some() { "set" } else { "empty" }
            ));
        }

        let mut seen = HashSet::new();
        let all = self
            .pending
            .iter()
            .chain(self.current.iter())
            .chain(self.history.iter());
        for entry in all {
            if !seen.insert(entry.id) {
                return Err(format!("entry {} appears more than once", entry.id));
            }
        }

        Ok(())
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(History::default().max_size())
    }
}
