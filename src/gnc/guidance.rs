use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{AdcsError, Result};

// ---------------------------------------------------------------------------
// Pointing goal
// ---------------------------------------------------------------------------

/// Where the controller should point, and how quickly to get there.
///
/// `jitter_tolerance`, `required_accuracy` and `hold_time` are carried for
/// mission bookkeeping; the pointing loop does not act on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub attitude: Vector3<f64>,
    pub ramp_time: Option<Clock>,
    pub jitter_tolerance: Option<f64>,
    pub required_accuracy: Option<f64>,
    pub hold_time: Option<Clock>,
}

impl Goal {
    pub fn new(attitude: Vector3<f64>) -> Self {
        Self {
            attitude,
            ramp_time: None,
            jitter_tolerance: None,
            required_accuracy: None,
            hold_time: None,
        }
    }

    pub fn ramp_time(mut self, v: Clock) -> Self { self.ramp_time = Some(v); self }
    pub fn jitter_tolerance(mut self, v: f64) -> Self { self.jitter_tolerance = Some(v); self }
    pub fn required_accuracy(mut self, v: f64) -> Self { self.required_accuracy = Some(v); self }
    pub fn hold_time(mut self, v: Clock) -> Self { self.hold_time = Some(v); self }

    pub fn validate(&self) -> Result<()> {
        if self.attitude.iter().any(|v| !v.is_finite()) {
            return Err(AdcsError::config("goal.attitude", "must be finite"));
        }
        Ok(())
    }

    /// Setpoint at `elapsed` since the slew began from `initial`.
    pub fn setpoint(&self, initial: &Vector3<f64>, elapsed: Clock) -> Vector3<f64> {
        ramp_target(initial, &self.attitude, ramp_factor(elapsed, self.ramp_time))
    }
}

// ---------------------------------------------------------------------------
// Ramp
// ---------------------------------------------------------------------------

/// Fraction of the slew completed: `min(1, elapsed / ramp_time)`, or 1 when
/// there is no ramp.
pub fn ramp_factor(elapsed: Clock, ramp_time: Option<Clock>) -> f64 {
    match ramp_time {
        Some(ramp) if !ramp.is_zero() => (elapsed.as_seconds() / ramp.as_seconds()).min(1.0),
        _ => 1.0,
    }
}

/// Linear interpolation from `initial` to `target`.
pub fn ramp_target(initial: &Vector3<f64>, target: &Vector3<f64>, factor: f64) -> Vector3<f64> {
    initial + (target - initial) * factor
}
