//! Phase-cycle engine.
//!
//! A wall-clock-based state machine that walks a list of breath phases,
//! repeating the list until the session's target cycle count is reached.
//! It does not use internal threads or read the clock: the driver passes
//! `now_ms` into every time-dependent command and calls `tick()` at its own
//! cadence.
//!
//! ## State Transitions
//!
//! ```text
//! NeverStarted -> Running <-> Paused
//!                 Running -> Done
//! Done -> Running   (restart / extend)
//! *    -> NeverStarted (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PhaseCycleEngine::new(parse_pattern("4-4-4-4")?, 1.0)?;
//! engine.start(clock.now_ms());
//! // In the driver loop:
//! for event in engine.tick(clock.now_ms()) { /* render */ }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::interpolation::{time_ratio, value_at, ScaleBounds};
use crate::cue::{CueDispatcher, NoopCue};
use crate::error::ValidationError;
use crate::events::{timestamp, Event};
use crate::pattern::{cycle_seconds, Phase, PhaseLabel};

/// Where the engine is in its lifecycle. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    NeverStarted,
    /// `last_tick_ms` anchors session-elapsed accounting.
    Running { last_tick_ms: i64 },
    /// Exact time left in the active phase, frozen at the pause instant.
    Paused { remaining_ms: i64 },
    Done,
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::NeverStarted => SessionStatus::NeverStarted,
            SessionState::Running { .. } => SessionStatus::Running,
            SessionState::Paused { .. } => SessionStatus::Paused,
            SessionState::Done => SessionStatus::Done,
        }
    }
}

/// Payload-free view of [`SessionState`] for snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NeverStarted,
    Running,
    Paused,
    Done,
}

/// Core breathing session engine.
///
/// Operates on wall-clock deltas supplied by the caller.
/// All commands are synchronous and must come from a single driver.
pub struct PhaseCycleEngine {
    phases: Vec<Phase>,
    duration_min: f64,
    bounds: ScaleBounds,
    state: SessionState,
    session_id: Option<Uuid>,
    phase_index: usize,
    phase_start_ms: i64,
    phase_end_ms: i64,
    phase_total_ms: i64,
    from: f64,
    to: f64,
    value: f64,
    remaining_secs: u64,
    progress: f64,
    session_started_ms: i64,
    elapsed_session_ms: i64,
    completed_cycles: u64,
    cue: Box<dyn CueDispatcher + Send>,
}

impl PhaseCycleEngine {
    /// Create an engine for `phases` with a target session length in minutes.
    ///
    /// Starts in `NeverStarted` with the value resting at the lower bound.
    ///
    /// # Errors
    ///
    /// Returns an error if `phases` is empty, any phase has zero seconds,
    /// or `duration_min` is not a positive finite number.
    pub fn new(phases: Vec<Phase>, duration_min: f64) -> Result<Self, ValidationError> {
        if phases.is_empty() {
            return Err(ValidationError::EmptyCollection("phases".into()));
        }
        if let Some((index, phase)) = phases.iter().enumerate().find(|(_, p)| p.seconds == 0) {
            return Err(ValidationError::ZeroDurationPhase {
                index,
                label: phase.label.to_string(),
            });
        }
        validate_minutes("duration_min", duration_min)?;

        let bounds = ScaleBounds::default();
        Ok(Self {
            phases,
            duration_min,
            bounds,
            state: SessionState::NeverStarted,
            session_id: None,
            phase_index: 0,
            phase_start_ms: 0,
            phase_end_ms: 0,
            phase_total_ms: 0,
            from: bounds.min,
            to: bounds.min,
            value: bounds.min,
            remaining_secs: 0,
            progress: 0.0,
            session_started_ms: 0,
            elapsed_session_ms: 0,
            completed_cycles: 0,
            cue: Box::new(NoopCue),
        })
    }

    /// Replace the animated value's bounds. Resets to the new minimum if idle.
    pub fn with_bounds(mut self, bounds: ScaleBounds) -> Result<Self, ValidationError> {
        self.bounds = ScaleBounds::new(bounds.min, bounds.max)?;
        if self.state == SessionState::NeverStarted {
            self.rest_at_min();
        }
        Ok(self)
    }

    pub fn with_cue(mut self, cue: Box<dyn CueDispatcher + Send>) -> Self {
        self.cue = cue;
        self
    }

    pub fn set_cue(&mut self, cue: Box<dyn CueDispatcher + Send>) {
        self.cue = cue;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, SessionState::Paused { .. })
    }

    pub fn is_started(&self) -> bool {
        self.state != SessionState::NeverStarted
    }

    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    /// Active phase, or `None` before the first start.
    pub fn current_phase(&self) -> Option<&Phase> {
        if self.is_started() {
            self.phases.get(self.phase_index)
        } else {
            None
        }
    }

    /// Whole seconds left in the active phase, rounded up.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// 0.0 .. 1.0 progress within the active phase.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn progress_pct(&self) -> u8 {
        (self.progress * 100.0).round() as u8
    }

    /// Current interpolated scale.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn bounds(&self) -> ScaleBounds {
        self.bounds
    }

    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn cycle_duration_ms(&self) -> i64 {
        (cycle_seconds(&self.phases) as i64).saturating_mul(1000)
    }

    /// Full cycles that fit in the target duration, at least 1. 0 means unbounded.
    ///
    /// Computed on every read, so `set_duration` mid-session moves the goal.
    pub fn target_cycles(&self) -> u64 {
        let cycle_ms = self.cycle_duration_ms();
        if cycle_ms <= 0 {
            return 0;
        }
        let target_ms = self.duration_min * 60_000.0;
        ((target_ms / cycle_ms as f64).floor() as u64).max(1)
    }

    /// Running time of the session, excluding paused intervals.
    pub fn elapsed_session_ms(&self) -> i64 {
        self.elapsed_session_ms
    }

    pub fn session_started_ms(&self) -> i64 {
        self.session_started_ms
    }

    pub fn phase_start_ms(&self) -> i64 {
        self.phase_start_ms
    }

    pub fn phase_end_ms(&self) -> i64 {
        self.phase_end_ms
    }

    pub fn phase_total_ms(&self) -> i64 {
        self.phase_total_ms
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now_ms: i64) -> Event {
        Event::StateSnapshot {
            status: self.status(),
            phase_index: self.phase_index,
            label: self.current_phase().map(|p| p.label),
            remaining_secs: self.remaining_secs,
            progress_pct: self.progress_pct(),
            value: self.value,
            completed_cycles: self.completed_cycles,
            target_cycles: self.target_cycles(),
            elapsed_session_ms: self.elapsed_session_ms,
            at: timestamp(now_ms),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Fresh start from `NeverStarted`, resume from `Paused`, no-op otherwise.
    pub fn start(&mut self, now_ms: i64) -> Option<Event> {
        match self.state {
            SessionState::NeverStarted => Some(self.fresh_start(now_ms)),
            SessionState::Paused { remaining_ms } => Some(self.resume(now_ms, remaining_ms)),
            SessionState::Running { .. } | SessionState::Done => None,
        }
    }

    pub fn pause(&mut self, now_ms: i64) -> Option<Event> {
        let SessionState::Running { .. } = self.state else {
            return None;
        };
        // Flush running time up to the pause instant.
        self.flush_elapsed(now_ms);
        let remaining_ms = self.sample(now_ms);
        self.state = SessionState::Paused { remaining_ms };
        tracing::info!(
            phase_index = self.phase_index,
            remaining_ms,
            value = self.value,
            "session paused"
        );
        Some(Event::SessionPaused {
            phase_index: self.phase_index,
            remaining_ms,
            value: self.value,
            at: timestamp(now_ms),
        })
    }

    /// Call from the driver loop. Returns the events produced by this step.
    ///
    /// A single call may cross several phase boundaries; each one dispatches
    /// its cue, and every cycle wrap is checked against the target.
    pub fn tick(&mut self, now_ms: i64) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.is_running() {
            return events;
        }
        self.flush_elapsed(now_ms);

        loop {
            if self.sample(now_ms) > 0 {
                break;
            }

            // Next phase starts where this one ended, not at `now_ms`.
            let boundary_ms = self.phase_end_ms;
            let next = (self.phase_index + 1) % self.phases.len();
            let wrapped = next == 0;
            self.phase_index = next;
            self.dispatch_cue();
            self.setup_phase(boundary_ms, false);

            let phase = self.phase();
            tracing::debug!(
                phase_index = next,
                phase = %phase.label,
                seconds = phase.seconds,
                "phase entered"
            );
            events.push(Event::PhaseEntered {
                phase_index: next,
                label: phase.label,
                seconds: phase.seconds,
                at: timestamp(boundary_ms),
            });

            if wrapped {
                self.completed_cycles += 1;
                let target_cycles = self.target_cycles();
                events.push(Event::CycleCompleted {
                    completed_cycles: self.completed_cycles,
                    target_cycles,
                    at: timestamp(boundary_ms),
                });
                if target_cycles > 0 && self.completed_cycles >= target_cycles {
                    events.push(self.finish(boundary_ms, now_ms));
                    break;
                }
            }
        }
        events
    }

    /// Stop everything and return to `NeverStarted`.
    pub fn reset(&mut self, now_ms: i64) -> Event {
        self.state = SessionState::NeverStarted;
        self.session_id = None;
        self.phase_index = 0;
        self.phase_start_ms = 0;
        self.phase_end_ms = 0;
        self.phase_total_ms = 0;
        self.remaining_secs = 0;
        self.progress = 0.0;
        self.session_started_ms = 0;
        self.elapsed_session_ms = 0;
        self.completed_cycles = 0;
        self.rest_at_min();
        tracing::info!("session reset");
        Event::SessionReset {
            at: timestamp(now_ms),
        }
    }

    /// Fresh start regardless of the current state.
    pub fn restart(&mut self, now_ms: i64) -> Event {
        self.fresh_start(now_ms)
    }

    /// Lengthen the target by `additional_min` (floored, at least 1) and restart.
    ///
    /// Cycles already completed are discarded; the new session counts from 0.
    ///
    /// # Errors
    ///
    /// Returns an error if `additional_min` is not a positive finite number.
    pub fn extend(
        &mut self,
        additional_min: f64,
        now_ms: i64,
    ) -> Result<Vec<Event>, ValidationError> {
        validate_minutes("additional_min", additional_min)?;
        let added_min = additional_min.floor().max(1.0);
        self.duration_min += added_min;
        tracing::info!(added_min, duration_min = self.duration_min, "session extended");
        let extended = Event::SessionExtended {
            added_min,
            duration_min: self.duration_min,
            at: timestamp(now_ms),
        };
        Ok(vec![extended, self.restart(now_ms)])
    }

    /// Set the target duration in minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if `minutes` is not a positive finite number; the
    /// previous duration is kept.
    pub fn set_duration(&mut self, minutes: f64) -> Result<(), ValidationError> {
        validate_minutes("duration_min", minutes)?;
        self.duration_min = minutes;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn phase(&self) -> Phase {
        self.phases[self.phase_index]
    }

    fn fresh_start(&mut self, now_ms: i64) -> Event {
        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.phase_index = 0;
        self.completed_cycles = 0;
        self.elapsed_session_ms = 0;
        self.session_started_ms = now_ms;
        self.value = self.bounds.min;
        self.setup_phase(now_ms, true);
        self.dispatch_cue();
        self.state = SessionState::Running {
            last_tick_ms: now_ms,
        };

        let label = self.phase().label;
        let target_cycles = self.target_cycles();
        tracing::info!(
            %session_id,
            phase = %label,
            target_cycles,
            duration_min = self.duration_min,
            "session started"
        );
        Event::SessionStarted {
            session_id,
            label,
            phase_count: self.phases.len(),
            cycle_secs: cycle_seconds(&self.phases),
            target_cycles,
            duration_min: self.duration_min,
            at: timestamp(now_ms),
        }
    }

    fn resume(&mut self, now_ms: i64, remaining_ms: i64) -> Event {
        // Keep the phase's bounds and shift its window so the time ratio,
        // and with it the value, picks up exactly where it froze.
        self.phase_end_ms = now_ms.saturating_add(remaining_ms);
        self.phase_start_ms = self.phase_end_ms.saturating_sub(self.phase_total_ms);
        self.state = SessionState::Running {
            last_tick_ms: now_ms,
        };
        self.sample(now_ms);
        tracing::info!(phase_index = self.phase_index, remaining_ms, "session resumed");
        Event::SessionResumed {
            phase_index: self.phase_index,
            remaining_ms,
            at: timestamp(now_ms),
        }
    }

    /// Complete the session at `at_ms`, the boundary that closed the last cycle.
    ///
    /// The phase just entered is sampled at its own start, so the frozen value
    /// is its seed however late the completing tick arrived.
    fn finish(&mut self, at_ms: i64, now_ms: i64) -> Event {
        let overshoot_ms = now_ms.saturating_sub(at_ms).max(0);
        self.elapsed_session_ms = self.elapsed_session_ms.saturating_sub(overshoot_ms).max(0);
        self.sample(at_ms);
        self.from = self.value;
        self.to = self.value;
        self.state = SessionState::Done;
        tracing::info!(
            completed_cycles = self.completed_cycles,
            elapsed_session_ms = self.elapsed_session_ms,
            "session complete"
        );
        Event::SessionCompleted {
            completed_cycles: self.completed_cycles,
            elapsed_session_ms: self.elapsed_session_ms,
            duration_min: self.duration_min,
            at: timestamp(at_ms),
        }
    }

    /// Arm the phase at `phase_index`, starting at `start_ms`.
    fn setup_phase(&mut self, start_ms: i64, initial: bool) {
        let phase = self.phase();
        self.phase_total_ms = phase.duration_ms();
        self.phase_start_ms = start_ms;
        self.phase_end_ms = start_ms.saturating_add(self.phase_total_ms);
        self.remaining_secs = u64::from(phase.seconds);
        self.progress = 0.0;

        let seed = match (initial, phase.label) {
            (true, PhaseLabel::Inhale) => self.bounds.min,
            (true, PhaseLabel::Exhale) => self.bounds.max,
            _ => self.value,
        };
        self.from = seed;
        self.to = match phase.label {
            PhaseLabel::Inhale => self.bounds.max,
            PhaseLabel::Exhale => self.bounds.min,
            PhaseLabel::Hold => seed,
        };
        self.value = seed;
    }

    /// Recompute remaining/progress/value at `now_ms`. Returns ms left in the phase.
    ///
    /// A `now_ms` before the phase start reads as the full phase.
    fn sample(&mut self, now_ms: i64) -> i64 {
        let ms_left = self
            .phase_end_ms
            .saturating_sub(now_ms)
            .clamp(0, self.phase_total_ms);
        self.remaining_secs = ((ms_left + 999) / 1000) as u64;
        self.progress = time_ratio(ms_left, self.phase_total_ms);
        self.value = value_at(self.progress, self.from, self.to, self.phase().label.is_hold());
        ms_left
    }

    fn flush_elapsed(&mut self, now_ms: i64) {
        if let SessionState::Running { last_tick_ms } = self.state {
            let delta_ms = now_ms.saturating_sub(last_tick_ms).max(0);
            self.elapsed_session_ms = self.elapsed_session_ms.saturating_add(delta_ms);
            self.state = SessionState::Running {
                last_tick_ms: now_ms.max(last_tick_ms),
            };
        }
    }

    fn dispatch_cue(&mut self) {
        let label = self.phase().label;
        if let Err(err) = self.cue.on_phase_enter(label) {
            tracing::warn!(phase = %label, error = %err, "cue dispatch failed");
        }
    }

    fn rest_at_min(&mut self) {
        self.from = self.bounds.min;
        self.to = self.bounds.min;
        self.value = self.bounds.min;
    }
}

impl fmt::Debug for PhaseCycleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseCycleEngine")
            .field("phases", &self.phases)
            .field("duration_min", &self.duration_min)
            .field("state", &self.state)
            .field("phase_index", &self.phase_index)
            .field("phase_end_ms", &self.phase_end_ms)
            .field("value", &self.value)
            .field("completed_cycles", &self.completed_cycles)
            .finish_non_exhaustive()
    }
}

fn validate_minutes(field: &str, minutes: f64) -> Result<(), ValidationError> {
    if minutes.is_finite() && minutes > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("must be a positive number of minutes, got {minutes}"),
        ))
    }
}
