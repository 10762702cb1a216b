use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

// ---------------------------------------------------------------------------
// Satellite body
// ---------------------------------------------------------------------------

/// Rotational state of the satellite body, inertial frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteState {
    pub theta_b: Vector3<f64>,      // rad
    pub omega_b: Vector3<f64>,      // rad/s
    pub alpha_b: Vector3<f64>,      // rad/s^2
    pub inertia_b: Matrix3<f64>,    // kg·m^2, symmetric positive-definite
}

// ---------------------------------------------------------------------------
// Devices as seen by the simulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionWheelState {
    pub omega: f64,                 // rad/s about `axis`
    pub alpha: f64,                 // rad/s^2, set by commands only
    pub inertia: f64,               // kg·m^2 about `axis`
    pub axis: Vector3<f64>,         // unit vector, body frame
    pub position: Vector3<f64>,     // mount point, body frame
}

impl ReactionWheelState {
    /// Angular momentum stored in the wheel, body frame.
    pub fn momentum(&self) -> Vector3<f64> {
        self.axis * (self.omega * self.inertia)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelerometerState {
    pub measurement: Vector3<f64>,
    pub position: Vector3<f64>,
}

/// Gyroscope reading: attitude, rate and angular acceleration of the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GyroscopeState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    pub mount_position: Vector3<f64>,
    pub time_taken: Clock,
}

/// A single timestamped 3-axis reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: Vector3<f64>,
    pub time_taken: Clock,
}

// ---------------------------------------------------------------------------
// Whole system
// ---------------------------------------------------------------------------

/// Everything the simulator integrates. Owned by the simulator; sinks and
/// device queries only ever see it by shared reference or by copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub satellite: SatelliteState,
    pub accelerometer: AccelerometerState,
    pub gyroscope: GyroscopeState,
    pub reaction_wheels: Vec<ReactionWheelState>,
}

impl SystemSnapshot {
    /// Body plus wheel angular momentum, body frame.
    pub fn total_momentum(&self) -> Vector3<f64> {
        let wheels: Vector3<f64> = self.reaction_wheels.iter().map(|w| w.momentum()).sum();
        self.satellite.inertia_b * self.satellite.omega_b + wheels
    }
}
