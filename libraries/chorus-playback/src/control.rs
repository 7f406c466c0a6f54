//! Control actions (skip / pause / resume / stop / previous / clear)
//!
//! Each action runs under the session lock, the same exclusion the
//! sequencer uses. Actions that do not apply return
//! [`ControlOutcome::NoOp`] instead of an error.

use crate::events::PlaybackEvent;
use crate::sequencer::Session;
use crate::session::SessionState;
use chorus_core::{ControlAction, ControlOutcome, DriverStatus, PlaybackOutcome};
use std::sync::Arc;
use tracing::{debug, info};

impl Session {
    /// Apply a control action
    pub async fn control(self: &Arc<Self>, action: ControlAction) -> ControlOutcome {
        let mut state = self.lock().await;

        let outcome = match action {
            ControlAction::Skip => self.skip_locked(&mut state),
            ControlAction::Pause => self.pause_locked(),
            ControlAction::Resume => self.resume_locked(),
            ControlAction::Stop => self.stop_locked(&mut state),
            ControlAction::Previous => self.previous_locked(&mut state),
            ControlAction::Clear => self.clear_locked(&mut state),
        };

        match &outcome {
            ControlOutcome::Applied => info!(session = %self.id(), %action, "control applied"),
            ControlOutcome::NoOp(reason) => {
                debug!(session = %self.id(), %action, %reason, "control had no effect");
            }
        }
        outcome
    }

    /// Clear pending, history, and current; stop the driver
    pub async fn reset(self: &Arc<Self>) -> ControlOutcome {
        self.control(ControlAction::Clear).await
    }

    fn skip_locked(self: &Arc<Self>, state: &mut SessionState) -> ControlOutcome {
        if self.driver().status().is_active() {
            // The stopped attempt's completion performs the advance
            self.driver().stop();
            self.retire_stopped(state);
            return ControlOutcome::Applied;
        }

        if state.in_flight().is_some() {
            if state.current().is_none() {
                // An earlier skip already retired the track; its completion advances
                return ControlOutcome::no_op("skip already pending");
            }
            // Natural end reported but not processed yet
            self.retire_stopped(state);
            return ControlOutcome::Applied;
        }

        if state.pending().is_empty() {
            return ControlOutcome::no_op("nothing to skip");
        }

        // Idle with work queued: an earlier start failed silently
        self.advance_locked(state);
        ControlOutcome::Applied
    }

    fn pause_locked(&self) -> ControlOutcome {
        if self.driver().status() != DriverStatus::Playing {
            return ControlOutcome::no_op("nothing is playing");
        }
        let status = self.driver().pause();
        self.emit_state(status);
        ControlOutcome::Applied
    }

    fn resume_locked(&self) -> ControlOutcome {
        if self.driver().status() != DriverStatus::Paused {
            return ControlOutcome::no_op("playback is not paused");
        }
        let status = self.driver().resume();
        self.emit_state(status);
        ControlOutcome::Applied
    }

    fn stop_locked(&self, state: &mut SessionState) -> ControlOutcome {
        // Invalidate first so the stop's completion arrives stale
        state.clear_in_flight();
        if self.driver().status().is_active() {
            self.driver().stop();
        }

        let current = state.current().map(|entry| entry.id);
        if !state.stop() {
            return ControlOutcome::no_op("nothing is playing");
        }

        if let Some(entry) = current {
            self.events().emit(PlaybackEvent::TrackFinished {
                session: self.id().clone(),
                entry,
                outcome: PlaybackOutcome::Stopped,
            });
        }
        self.emit_queue_changed(state);
        self.emit_state(DriverStatus::Idle);
        ControlOutcome::Applied
    }

    fn previous_locked(self: &Arc<Self>, state: &mut SessionState) -> ControlOutcome {
        if !state.rewind() {
            return ControlOutcome::no_op("no previous track");
        }
        self.emit_queue_changed(state);

        if state.in_flight().is_some() {
            // The completion of the interrupted attempt plays the restored entry
            if self.driver().status().is_active() {
                self.driver().stop();
            }
        } else {
            self.advance_locked(state);
        }
        ControlOutcome::Applied
    }

    fn clear_locked(&self, state: &mut SessionState) -> ControlOutcome {
        state.clear_in_flight();
        if self.driver().status().is_active() {
            self.driver().stop();
        }

        if !state.reset() {
            return ControlOutcome::no_op("session is already empty");
        }
        self.emit_queue_changed(state);
        self.emit_state(DriverStatus::Idle);
        ControlOutcome::Applied
    }

    /// Move `current` to history after a skip; the in-flight token stays
    fn retire_stopped(&self, state: &mut SessionState) {
        if let Some(entry) = state.retire_current() {
            self.events().emit(PlaybackEvent::TrackFinished {
                session: self.id().clone(),
                entry,
                outcome: PlaybackOutcome::Stopped,
            });
        }
    }

    fn emit_state(&self, status: DriverStatus) {
        self.events().emit(PlaybackEvent::StateChanged {
            session: self.id().clone(),
            status,
        });
    }
}
