use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pattern::PhaseLabel;
use crate::session::SessionStatus;

/// Every state change in the engine produces an Event.
/// The CLI prints them; hosts may forward them anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A fresh start also enters phase 0; no separate `PhaseEntered` follows.
    SessionStarted {
        session_id: Uuid,
        label: PhaseLabel,
        phase_count: usize,
        cycle_secs: u64,
        target_cycles: u64,
        duration_min: f64,
        at: DateTime<Utc>,
    },
    PhaseEntered {
        phase_index: usize,
        label: PhaseLabel,
        seconds: u32,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase_index: usize,
        remaining_ms: i64,
        value: f64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        phase_index: usize,
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        completed_cycles: u64,
        target_cycles: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        completed_cycles: u64,
        elapsed_session_ms: i64,
        duration_min: f64,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    SessionExtended {
        added_min: f64,
        duration_min: f64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: SessionStatus,
        phase_index: usize,
        label: Option<PhaseLabel>,
        remaining_secs: u64,
        progress_pct: u8,
        value: f64,
        completed_cycles: u64,
        target_cycles: u64,
        elapsed_session_ms: i64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short machine name, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "SessionStarted",
            Event::PhaseEntered { .. } => "PhaseEntered",
            Event::SessionPaused { .. } => "SessionPaused",
            Event::SessionResumed { .. } => "SessionResumed",
            Event::CycleCompleted { .. } => "CycleCompleted",
            Event::SessionCompleted { .. } => "SessionCompleted",
            Event::SessionReset { .. } => "SessionReset",
            Event::SessionExtended { .. } => "SessionExtended",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}

/// Convert epoch milliseconds to a UTC timestamp, clamping out-of-range input to the epoch.
pub fn timestamp(now_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(now_ms).unwrap_or_default()
}
