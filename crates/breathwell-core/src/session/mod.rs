mod engine;
mod interpolation;

pub use engine::{PhaseCycleEngine, SessionState, SessionStatus};
pub use interpolation::{time_ratio, value_at, ScaleBounds, DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE};
