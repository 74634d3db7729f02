//! Continuous scale interpolation driven by phase progress.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_MIN_SCALE: f64 = 0.65;
pub const DEFAULT_MAX_SCALE: f64 = 1.16;

/// Lower and upper bound of the animated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl ScaleBounds {
    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ValidationError::invalid("bounds", "scale bounds must be finite"));
        }
        if min >= max {
            return Err(ValidationError::invalid(
                "bounds",
                format!("min ({min}) must be below max ({max})"),
            ));
        }
        Ok(Self { min, max })
    }
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_SCALE,
            max: DEFAULT_MAX_SCALE,
        }
    }
}

/// Fraction of the phase already elapsed, clamped to `[0, 1]`.
pub fn time_ratio(ms_left: i64, total_ms: i64) -> f64 {
    if total_ms <= 0 {
        return 0.0;
    }
    (1.0 - ms_left as f64 / total_ms as f64).clamp(0.0, 1.0)
}

/// Value at `progress` between `from` and `to`.
///
/// Holds never move. A finished phase lands exactly on `to`.
pub fn value_at(progress: f64, from: f64, to: f64, is_hold: bool) -> f64 {
    if is_hold {
        return from;
    }
    if progress >= 1.0 {
        return to;
    }
    from + (to - from) * progress.clamp(0.0, 1.0)
}
