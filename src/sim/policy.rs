use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{AdcsError, Result};

// ---------------------------------------------------------------------------
// Step-size policy
// ---------------------------------------------------------------------------

/// How long each integration step is. Chosen once, at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepPolicy {
    Fixed {
        step: Clock,
    },
    /// Step so the worst-axis angular error over one step stays under
    /// `tolerance`: `dt = tolerance / max|alpha_b|`, clamped to
    /// `[min_step, max_step]`. `initial_step` covers the first step, before
    /// any acceleration has been computed.
    Adaptive {
        initial_step: Clock,
        min_step: Clock,
        max_step: Clock,
        tolerance: f64,
    },
}

impl StepPolicy {
    pub fn fixed(step: Clock) -> Self {
        StepPolicy::Fixed { step }
    }

    pub fn adaptive(min_step: Clock, max_step: Clock, tolerance: f64) -> Self {
        StepPolicy::Adaptive {
            initial_step: min_step,
            min_step,
            max_step,
            tolerance,
        }
    }

    pub fn is_adaptive(&self) -> bool {
        matches!(self, StepPolicy::Adaptive { .. })
    }

    pub fn first_step(&self) -> Clock {
        match *self {
            StepPolicy::Fixed { step } => step,
            StepPolicy::Adaptive { initial_step, min_step, max_step, .. } => {
                initial_step.clamp(min_step, max_step)
            }
        }
    }

    /// Next step length given the largest absolute body acceleration component.
    pub fn next_step(&self, peak_alpha: f64) -> Clock {
        match *self {
            StepPolicy::Fixed { step } => step,
            StepPolicy::Adaptive { min_step, max_step, tolerance, .. } => {
                if peak_alpha.is_nan() {
                    return min_step;
                }
                let dt = tolerance / peak_alpha;
                if peak_alpha <= 0.0 || dt >= max_step.as_seconds() {
                    return max_step;
                }
                Clock::from_secs_f64(dt).clamp(min_step, max_step)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            StepPolicy::Fixed { step } => {
                if step.is_zero() {
                    return Err(AdcsError::config("run.step", "fixed step must be nonzero"));
                }
            }
            StepPolicy::Adaptive { initial_step, min_step, max_step, tolerance } => {
                if min_step.is_zero() || min_step > max_step {
                    return Err(AdcsError::config(
                        "run.step",
                        format!("need 0 < min_step <= max_step, got {} and {}", min_step, max_step),
                    ));
                }
                if initial_step.is_zero() {
                    return Err(AdcsError::config("run.step.initial_step", "must be nonzero"));
                }
                if !(tolerance.is_finite() && tolerance > 0.0) {
                    return Err(AdcsError::config(
                        "run.step.tolerance",
                        format!("must be positive, got {}", tolerance),
                    ));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Run policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunPolicy {
    /// Simulated time at which the run ends with `SimulationTimeout`.
    pub timeout: Clock,
    pub step: StepPolicy,
    /// Minimum simulated time between snapshots sent to the sink. Zero
    /// reports every committed step.
    pub report_interval: Clock,
}

impl RunPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(AdcsError::config("run.timeout", "must be nonzero"));
        }
        self.step.validate()
    }
}

impl Default for RunPolicy {
    /// One hour of simulated time at a fixed 1 ms step, reporting every 100 ms.
    fn default() -> Self {
        Self {
            timeout: Clock::from_secs(3600),
            step: StepPolicy::fixed(Clock::new(1, 0)),
            report_interval: Clock::new(100, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn adaptive() -> StepPolicy {
        StepPolicy::adaptive(Clock::new(1, 0), Clock::new(100, 0), 1e-3)
    }

    #[test]
    fn fixed_ignores_acceleration() {
        let p = StepPolicy::fixed(Clock::new(5, 0));
        assert_eq!(p.next_step(0.0), Clock::new(5, 0));
        assert_eq!(p.next_step(1e6), Clock::new(5, 0));
        assert_eq!(p.first_step(), Clock::new(5, 0));
    }

    #[test]
    fn adaptive_stays_within_bounds() {
        let p = adaptive();
        for alpha in [0.0, 1e-9, 1e-3, 0.01, 0.1, 1.0, 10.0, 1e3, 1e9, f64::INFINITY] {
            let step = p.next_step(alpha);
            assert!(
                step >= Clock::new(1, 0) && step <= Clock::new(100, 0),
                "alpha {} gave step {}",
                alpha,
                step
            );
        }
        assert_eq!(p.next_step(f64::NAN), Clock::new(1, 0));
    }

    #[test]
    fn adaptive_step_shrinks_as_acceleration_grows() {
        let p = adaptive();
        let mut prev = p.next_step(0.0);
        for i in 1..200 {
            let alpha = 0.005 * i as f64;
            let step = p.next_step(alpha);
            assert!(step <= prev, "step grew from {} to {} at alpha {}", prev, step, alpha);
            prev = step;
        }
        // tolerance / alpha = 1e-3 / 0.1 = 10 ms
        assert_eq!(p.next_step(0.1), Clock::new(10, 0));
    }

    #[test]
    fn invalid_policies_rejected() {
        assert!(StepPolicy::fixed(Clock::ZERO).validate().is_err());
        assert!(StepPolicy::adaptive(Clock::new(50, 0), Clock::new(10, 0), 1e-3).validate().is_err());
        assert!(StepPolicy::adaptive(Clock::new(1, 0), Clock::new(10, 0), 0.0).validate().is_err());
        let run = RunPolicy { timeout: Clock::ZERO, ..RunPolicy::default() };
        assert!(run.validate().is_err());
        assert!(RunPolicy::default().validate().is_ok());
    }
}
