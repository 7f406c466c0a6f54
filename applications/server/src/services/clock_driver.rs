/// Clock driver - a playback transport that only keeps time
///
/// "Plays" each track for its duration on a Tokio timer and reports the
/// natural end from the timer task. Stands in for a voice connection.
use chorus_core::{
    ChorusError, CompletionCallback, DriverFactory, DriverStatus, PlaybackDriver,
    PlaybackOutcome, Result, SessionId, TrackDescriptor,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;

pub struct ClockDriver {
    session: SessionId,
    runtime: Handle,
    unknown_length: Duration,
    state: Arc<Mutex<ClockState>>,
}

#[derive(Default)]
struct ClockState {
    status: DriverStatus,
    /// Bumped on every transition; timers armed for an older value are void
    generation: u64,
    remaining: Duration,
    resumed_at: Option<Instant>,
    callback: Option<CompletionCallback>,
}

impl ClockState {
    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

impl ClockDriver {
    pub fn new(session: SessionId, runtime: Handle, unknown_length: Duration) -> Self {
        Self {
            session,
            runtime,
            unknown_length,
            state: Arc::new(Mutex::new(ClockState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Finish the track after `after` unless another transition happens first
    fn arm(&self, generation: u64, after: Duration) {
        let state = Arc::clone(&self.state);
        let session = self.session.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(after).await;

            let callback = {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.generation != generation || state.status != DriverStatus::Playing {
                    return;
                }
                state.status = DriverStatus::Idle;
                state.resumed_at = None;
                state.callback.take()
            };

            tracing::debug!(session = %session, "clock driver reached end of track");
            if let Some(callback) = callback {
                callback(PlaybackOutcome::Finished);
            }
        });
    }
}

impl PlaybackDriver for ClockDriver {
    fn play(&self, track: &TrackDescriptor, on_complete: CompletionCallback) -> Result<()> {
        if track.playable.is_empty() {
            return Err(ChorusError::playback_start(format!(
                "{} has no playable stream",
                track.title
            )));
        }

        let length = track.duration.unwrap_or(self.unknown_length);
        let generation = {
            let mut state = self.lock();
            if state.status.is_active() {
                return Err(ChorusError::playback_start("a track is already loaded"));
            }
            state.status = DriverStatus::Playing;
            state.remaining = length;
            state.resumed_at = Some(Instant::now());
            state.callback = Some(on_complete);
            state.bump()
        };

        tracing::debug!(session = %self.session, title = %track.title, ?length, "clock driver playing");
        self.arm(generation, length);
        Ok(())
    }

    fn stop(&self) -> DriverStatus {
        let callback = {
            let mut state = self.lock();
            state.bump();
            state.status = DriverStatus::Idle;
            state.resumed_at = None;
            state.callback.take()
        };

        if let Some(callback) = callback {
            callback(PlaybackOutcome::Stopped);
        }
        DriverStatus::Idle
    }

    fn pause(&self) -> DriverStatus {
        let mut state = self.lock();
        if state.status == DriverStatus::Playing {
            let elapsed = state.resumed_at.map_or(Duration::ZERO, |at| at.elapsed());
            state.remaining = state.remaining.saturating_sub(elapsed);
            state.resumed_at = None;
            state.status = DriverStatus::Paused;
            state.bump();
        }
        state.status
    }

    fn resume(&self) -> DriverStatus {
        let rearm = {
            let mut state = self.lock();
            if state.status == DriverStatus::Paused {
                state.status = DriverStatus::Playing;
                state.resumed_at = Some(Instant::now());
                Some((state.bump(), state.remaining))
            } else {
                None
            }
        };

        if let Some((generation, remaining)) = rearm {
            self.arm(generation, remaining);
            return DriverStatus::Playing;
        }
        self.status()
    }

    fn status(&self) -> DriverStatus {
        self.lock().status
    }
}

/// Creates one [`ClockDriver`] per session
#[derive(Debug, Clone)]
pub struct ClockDriverFactory {
    runtime: Handle,
    unknown_length: Duration,
}

impl ClockDriverFactory {
    pub fn new(runtime: Handle, unknown_length: Duration) -> Self {
        Self {
            runtime,
            unknown_length,
        }
    }
}

impl DriverFactory for ClockDriverFactory {
    fn driver_for(&self, session: &SessionId) -> Arc<dyn PlaybackDriver> {
        Arc::new(ClockDriver::new(
            session.clone(),
            self.runtime.clone(),
            self.unknown_length,
        ))
    }
}
