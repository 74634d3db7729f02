//! # Breathwell Core Library
//!
//! This library provides the core logic for the Breathwell guided-breathing
//! timer. The CLI binary is a thin front end over the same library.
//!
//! ## Architecture
//!
//! - **Phase-Cycle Engine**: A wall-clock-based state machine; the caller
//!   passes `now_ms` and invokes `tick()` from its own driver loop
//! - **Patterns**: Parsing of `4-7-8` / "Inhale 4s, hold 7s" style instructions
//! - **Cues**: Once-per-phase-entry dispatch to audio/visual outputs
//! - **Techniques**: Built-in and JSON-backed technique catalogs
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`PhaseCycleEngine`]: Core session state machine
//! - [`Config`]: Application configuration management
//! - [`CueDispatcher`]: Trait for phase-entry cue outputs
//! - [`TechniqueProvider`]: Trait for technique sources

pub mod clock;
pub mod cue;
pub mod error;
pub mod events;
pub mod pattern;
pub mod session;
pub mod storage;
pub mod techniques;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cue::{tone_for, CueDispatcher, LogCue, NoopCue, Tone};
pub use error::{ConfigError, CoreError, CueError, PatternError, ValidationError};
pub use events::Event;
pub use pattern::{cycle_seconds, parse_pattern, Phase, PhaseLabel};
pub use session::{PhaseCycleEngine, ScaleBounds, SessionState, SessionStatus};
pub use storage::Config;
pub use techniques::{BuiltinCatalog, JsonCatalog, Technique, TechniqueProvider};
