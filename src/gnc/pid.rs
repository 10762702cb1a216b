use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{AdcsError, Result};

// ---------------------------------------------------------------------------
// Gains
// ---------------------------------------------------------------------------

/// Per-axis PID gains plus the derivative filter constant `N` (rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: Vector3<f64>,
    pub ki: Vector3<f64>,
    pub kd: Vector3<f64>,
    pub filter: f64,
}

impl PidGains {
    /// Same gains on every axis.
    pub fn uniform(kp: f64, ki: f64, kd: f64, filter: f64) -> Self {
        Self {
            kp: Vector3::repeat(kp),
            ki: Vector3::repeat(ki),
            kd: Vector3::repeat(kd),
            filter,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let all = self.kp.iter().chain(self.ki.iter()).chain(self.kd.iter());
        if all.copied().any(|g| !g.is_finite()) {
            return Err(AdcsError::config("gains", "gains must be finite"));
        }
        if !(self.filter.is_finite() && self.filter >= 0.0) {
            return Err(AdcsError::config(
                "gains.filter",
                format!("must be non-negative, got {}", self.filter),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PID controller (three axes)
// ---------------------------------------------------------------------------

/// Discrete PID over a 3-axis error with a first-order filtered derivative:
///
///   D_k = (N·kd∘(e_k − e_{k−1}) + D_{k−1}) / (1 + N·dt)
///   I_k = I_{k−1} + e_k·dt
///   u_k = kp∘e_k + D_k + ki∘I_k
#[derive(Debug, Clone)]
pub struct AttitudePid {
    gains: PidGains,
    integral: Vector3<f64>,
    derivative: Vector3<f64>,
    prev_error: Vector3<f64>,
}

impl AttitudePid {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: Vector3::zeros(),
            derivative: Vector3::zeros(),
            prev_error: Vector3::zeros(),
        }
    }

    pub fn update(&mut self, error: Vector3<f64>, dt: f64) -> Vector3<f64> {
        let g = &self.gains;
        let delta = error - self.prev_error;
        self.derivative = (g.kd.component_mul(&delta) * g.filter + self.derivative) / (1.0 + g.filter * dt);
        self.integral += error * dt;
        self.prev_error = error;

        g.kp.component_mul(&error) + self.derivative + g.ki.component_mul(&self.integral)
    }

    pub fn reset(&mut self) {
        self.integral = Vector3::zeros();
        self.derivative = Vector3::zeros();
        self.prev_error = Vector3::zeros();
    }

    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    pub fn integral(&self) -> Vector3<f64> {
        self.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_error_zero_output() {
        let mut pid = AttitudePid::new(PidGains::uniform(1.0, 0.5, 2.0, 10.0));
        for _ in 0..50 {
            let out = pid.update(Vector3::zeros(), 0.02);
            assert_eq!(out, Vector3::zeros());
        }
        assert_eq!(pid.integral(), Vector3::zeros());
    }

    #[test]
    fn pid_proportional() {
        let mut pid = AttitudePid::new(PidGains::uniform(2.0, 0.0, 0.0, 0.0));
        let out = pid.update(Vector3::new(0.5, -0.25, 0.0), 0.01);
        assert!((out - Vector3::new(1.0, -0.5, 0.0)).norm() < 1e-12, "pure P should output kp * error");
    }

    #[test]
    fn integral_grows_linearly_under_constant_error() {
        let mut pid = AttitudePid::new(PidGains::uniform(0.0, 1.0, 0.0, 0.0));
        let error = Vector3::new(0.1, 0.0, -0.2);
        let mut outputs = vec![];
        for _ in 0..10 {
            outputs.push(pid.update(error, 0.1));
        }
        // I_k = k · e · dt
        for (k, out) in outputs.iter().enumerate() {
            let expected = error * 0.1 * (k + 1) as f64;
            assert!((out - expected).norm() < 1e-12, "step {}: {} vs {}", k, out, expected);
        }
        let steps: Vec<f64> = outputs.windows(2).map(|w| (w[1] - w[0]).norm()).collect();
        assert!(steps.iter().all(|s| (s - steps[0]).abs() < 1e-12));
    }

    #[test]
    fn derivative_is_filtered_and_decays() {
        let mut pid = AttitudePid::new(PidGains::uniform(0.0, 0.0, 1.0, 10.0));
        pid.update(Vector3::zeros(), 0.1);
        // Step change: D = N·kd·Δe / (1 + N·dt) = 10·1 / 2 = 5
        let first = pid.update(Vector3::new(1.0, 0.0, 0.0), 0.1);
        assert!((first.x - 5.0).abs() < 1e-12);
        let second = pid.update(Vector3::new(1.0, 0.0, 0.0), 0.1);
        assert!((second.x - 2.5).abs() < 1e-12, "held error should bleed the derivative off");
    }

    #[test]
    fn first_sample_kicks_from_zero_state() {
        let mut pid = AttitudePid::new(PidGains::uniform(0.0, 0.0, 1.0, 10.0));
        // D = N·kd·(e − 0) / (1 + N·dt) = 10·0.3 / 1.5 = 2
        let out = pid.update(Vector3::new(0.3, 0.0, 0.0), 0.05);
        assert!((out.x - 2.0).abs() < 1e-12, "first-sample derivative {} should be 2", out.x);
        assert_eq!(out.y, 0.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut pid = AttitudePid::new(PidGains::uniform(0.0, 1.0, 1.0, 5.0));
        pid.update(Vector3::new(1.0, 1.0, 1.0), 0.1);
        pid.update(Vector3::new(2.0, 1.0, 1.0), 0.1);
        pid.reset();
        assert_eq!(pid.integral(), Vector3::zeros());
        assert_eq!(pid.update(Vector3::zeros(), 0.1), Vector3::zeros());
        // Kicks again from zero, as on a fresh controller.
        pid.reset();
        let kicked = pid.update(Vector3::new(1.0, 0.0, 0.0), 0.1);
        let fresh = AttitudePid::new(PidGains::uniform(0.0, 1.0, 1.0, 5.0)).update(Vector3::new(1.0, 0.0, 0.0), 0.1);
        assert_eq!(kicked, fresh);
    }

    #[test]
    fn non_finite_gains_rejected() {
        let mut gains = PidGains::uniform(1.0, 0.0, 0.0, 1.0);
        gains.kd.y = f64::NAN;
        assert!(gains.validate().is_err());
        assert!(PidGains::uniform(1.0, 0.0, 0.0, -1.0).validate().is_err());
    }
}
