//! Cue dispatch boundary.
//!
//! The engine calls [`CueDispatcher::on_phase_enter`] once per phase entry.
//! Whatever happens on the other side (audio, bell, log line) cannot change
//! engine state: errors are logged and dropped by the caller.

use serde::{Deserialize, Serialize};

use crate::error::CueError;
use crate::pattern::PhaseLabel;

/// Receives one pulse per phase entry.
pub trait CueDispatcher {
    fn on_phase_enter(&mut self, label: PhaseLabel) -> Result<(), CueError>;
}

/// A short sine tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

/// Tone played when entering a phase of `label`.
pub fn tone_for(label: PhaseLabel) -> Tone {
    match label {
        PhaseLabel::Inhale => Tone {
            frequency_hz: 580,
            duration_ms: 90,
        },
        PhaseLabel::Hold => Tone {
            frequency_hz: 800,
            duration_ms: 70,
        },
        PhaseLabel::Exhale => Tone {
            frequency_hz: 420,
            duration_ms: 90,
        },
    }
}

/// Discards every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCue;

impl CueDispatcher for NoopCue {
    fn on_phase_enter(&mut self, _label: PhaseLabel) -> Result<(), CueError> {
        Ok(())
    }
}

/// Emits each cue as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCue;

impl CueDispatcher for LogCue {
    fn on_phase_enter(&mut self, label: PhaseLabel) -> Result<(), CueError> {
        let tone = tone_for(label);
        tracing::info!(
            phase = %label,
            frequency_hz = tone.frequency_hz,
            duration_ms = tone.duration_ms,
            "cue"
        );
        Ok(())
    }
}
