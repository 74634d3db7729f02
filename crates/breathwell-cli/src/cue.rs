//! Terminal cue output.

use std::io::Write;
use std::time::{Duration, Instant};

use breathwell_core::{tone_for, CueDispatcher, CueError, PhaseLabel};

/// Cues closer together than this are dropped.
const MIN_GAP: Duration = Duration::from_millis(50);

/// Rings the terminal bell on phase entry.
#[derive(Debug)]
pub struct TerminalCue {
    volume: f64,
    last_emit: Option<Instant>,
}

impl TerminalCue {
    pub fn new(volume: f64) -> Self {
        Self {
            volume,
            last_emit: None,
        }
    }
}

impl CueDispatcher for TerminalCue {
    fn on_phase_enter(&mut self, label: PhaseLabel) -> Result<(), CueError> {
        let now = Instant::now();
        if self.last_emit.is_some_and(|last| now.duration_since(last) < MIN_GAP) {
            return Ok(());
        }
        self.last_emit = Some(now);

        if self.volume <= 0.0 {
            return Err(CueError::Unavailable("volume is zero".into()));
        }
        let tone = tone_for(label);
        tracing::debug!(
            phase = %label,
            frequency_hz = tone.frequency_hz,
            duration_ms = tone.duration_ms,
            "bell"
        );
        let mut stderr = std::io::stderr();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }
}
