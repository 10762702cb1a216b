//! In-memory configuration for one simulated satellite.
//!
//! Configs are plain serde-derivable structs so any loader can produce them;
//! this crate only validates and consumes them. Vector fields that belong to
//! devices are kept as slices so axis-count mistakes surface as
//! `InvalidDimensions` instead of being silently truncated.

pub mod presets;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::device::ActuatorBounds;
use crate::dynamics::state::{
    AccelerometerState, GyroscopeState, ReactionWheelState, SatelliteState, SystemSnapshot,
};
use crate::error::{AdcsError, Result};

pub use crate::sim::policy::{RunPolicy, StepPolicy};

const UNIT_AXIS_TOLERANCE: f64 = 1e-6;
const SYMMETRY_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Satellite body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub inertia: [[f64; 3]; 3],     // kg·m^2, row-major
    pub orientation: [f64; 3],      // rad
    pub angular_velocity: [f64; 3], // rad/s
}

impl BodyConfig {
    pub fn inertia_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_fn(|i, j| self.inertia[i][j])
    }

    pub fn validate(&self) -> Result<()> {
        let inertia = self.inertia_matrix();
        if inertia.iter().any(|v| !v.is_finite()) {
            return Err(AdcsError::config("body.inertia", "contains a non-finite entry"));
        }
        let scale = inertia.amax().max(1.0);
        if (inertia - inertia.transpose()).amax() > SYMMETRY_TOLERANCE * scale {
            return Err(AdcsError::config("body.inertia", "tensor is not symmetric"));
        }
        if inertia.cholesky().is_none() {
            return Err(AdcsError::config("body.inertia", "tensor is not positive-definite"));
        }
        if self.orientation.iter().chain(&self.angular_velocity).any(|v| !v.is_finite()) {
            return Err(AdcsError::config("body", "initial orientation/velocity must be finite"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub polling_interval: Clock,
    pub axes: usize,
    pub mount_position: Vec<f64>,
}

impl SensorConfig {
    pub fn new(polling_interval: Clock, mount_position: Vector3<f64>) -> Self {
        Self {
            polling_interval,
            axes: 3,
            mount_position: mount_position.as_slice().to_vec(),
        }
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if self.axes != 3 {
            return Err(AdcsError::InvalidDimensions {
                what: format!("{name} axes"),
                expected: 3,
                actual: self.axes,
            });
        }
        if self.mount_position.len() != self.axes {
            return Err(AdcsError::InvalidDimensions {
                what: format!("{name}.mount_position"),
                expected: self.axes,
                actual: self.mount_position.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reaction wheels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionWheelConfig {
    pub polling_interval: Clock,
    pub mount_position: Vec<f64>,
    pub axis_of_rotation: Vec<f64>,
    pub inertia: f64,                // kg·m^2 about the spin axis
    pub initial_velocity: f64,       // rad/s
    pub initial_acceleration: f64,   // rad/s^2
    pub bounds: ActuatorBounds,
}

impl ReactionWheelConfig {
    pub fn validate(&self, prefix: &str) -> Result<()> {
        let axis = vector3(&format!("{prefix}.axis_of_rotation"), &self.axis_of_rotation)?;
        vector3(&format!("{prefix}.mount_position"), &self.mount_position)?;

        if ((axis.norm() - 1.0).abs()) > UNIT_AXIS_TOLERANCE {
            return Err(AdcsError::config(
                format!("{prefix}.axis_of_rotation"),
                format!("must be a unit vector, norm is {}", axis.norm()),
            ));
        }
        if !(self.inertia.is_finite() && self.inertia > 0.0) {
            return Err(AdcsError::config(
                format!("{prefix}.inertia"),
                format!("must be positive, got {}", self.inertia),
            ));
        }
        if !(self.initial_velocity.is_finite() && self.initial_acceleration.is_finite()) {
            return Err(AdcsError::config(prefix, "initial velocity/acceleration must be finite"));
        }
        self.bounds.validate(&format!("{prefix}.bounds"))
    }
}

/// Builder with small-wheel defaults; only the axis is mandatory.
pub struct ReactionWheelBuilder {
    polling_interval: Clock,
    mount_position: Vector3<f64>,
    axis: Vector3<f64>,
    inertia: f64,
    initial_velocity: f64,
    initial_acceleration: f64,
    bounds: ActuatorBounds,
}

impl ReactionWheelBuilder {
    pub fn new(axis: Vector3<f64>) -> Self {
        Self {
            polling_interval: Clock::new(10, 0),
            mount_position: Vector3::zeros(),
            axis,
            inertia: 1e-4,
            initial_velocity: 0.0,
            initial_acceleration: 0.0,
            bounds: ActuatorBounds::symmetric(100.0, 650.0),
        }
    }

    pub fn polling_interval(mut self, v: Clock) -> Self { self.polling_interval = v; self }
    pub fn mount_position(mut self, v: Vector3<f64>) -> Self { self.mount_position = v; self }
    pub fn inertia(mut self, v: f64) -> Self { self.inertia = v; self }
    pub fn initial_velocity(mut self, v: f64) -> Self { self.initial_velocity = v; self }
    pub fn initial_acceleration(mut self, v: f64) -> Self { self.initial_acceleration = v; self }
    pub fn bounds(mut self, v: ActuatorBounds) -> Self { self.bounds = v; self }

    pub fn build(self) -> ReactionWheelConfig {
        ReactionWheelConfig {
            polling_interval: self.polling_interval,
            mount_position: self.mount_position.as_slice().to_vec(),
            axis_of_rotation: self.axis.as_slice().to_vec(),
            inertia: self.inertia,
            initial_velocity: self.initial_velocity,
            initial_acceleration: self.initial_acceleration,
            bounds: self.bounds,
        }
    }
}

// ---------------------------------------------------------------------------
// Whole satellite
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteConfig {
    pub body: BodyConfig,
    pub gyroscope: SensorConfig,
    pub accelerometer: SensorConfig,
    pub reaction_wheels: Vec<ReactionWheelConfig>,
    pub run: RunPolicy,
}

impl SatelliteConfig {
    pub fn validate(&self) -> Result<()> {
        self.body.validate()?;
        self.gyroscope.validate("gyroscope")?;
        self.accelerometer.validate("accelerometer")?;
        for (i, wheel) in self.reaction_wheels.iter().enumerate() {
            wheel.validate(&format!("reaction_wheels[{i}]"))?;
        }
        self.run.validate()
    }

    /// Validate and build the state the simulator starts from.
    pub fn initial_snapshot(&self) -> Result<SystemSnapshot> {
        self.validate()?;

        let omega_b = Vector3::from(self.body.angular_velocity);
        let theta_b = Vector3::from(self.body.orientation);

        let reaction_wheels = self
            .reaction_wheels
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let prefix = format!("reaction_wheels[{i}]");
                Ok(ReactionWheelState {
                    omega: w.initial_velocity,
                    alpha: w.initial_acceleration,
                    inertia: w.inertia,
                    axis: vector3(&format!("{prefix}.axis_of_rotation"), &w.axis_of_rotation)?.normalize(),
                    position: vector3(&format!("{prefix}.mount_position"), &w.mount_position)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SystemSnapshot {
            satellite: SatelliteState {
                theta_b,
                omega_b,
                alpha_b: Vector3::zeros(),
                inertia_b: self.body.inertia_matrix(),
            },
            accelerometer: AccelerometerState {
                measurement: Vector3::zeros(),
                position: vector3("accelerometer.mount_position", &self.accelerometer.mount_position)?,
            },
            gyroscope: GyroscopeState {
                position: theta_b,
                velocity: omega_b,
                acceleration: Vector3::zeros(),
                mount_position: vector3("gyroscope.mount_position", &self.gyroscope.mount_position)?,
                time_taken: Clock::ZERO,
            },
            reaction_wheels,
        })
    }
}

/// Builder for a full satellite; starts from a 0.05 kg·m^2 cube at rest with
/// no wheels, 20 ms sensors and a fixed 1 ms step.
pub struct SatelliteConfigBuilder {
    inertia: Matrix3<f64>,
    orientation: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    gyroscope: SensorConfig,
    accelerometer: SensorConfig,
    reaction_wheels: Vec<ReactionWheelConfig>,
    run: RunPolicy,
}

impl SatelliteConfigBuilder {
    pub fn new() -> Self {
        Self {
            inertia: Matrix3::from_diagonal_element(0.05),
            orientation: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            gyroscope: SensorConfig::new(Clock::new(20, 0), Vector3::zeros()),
            accelerometer: SensorConfig::new(Clock::new(20, 0), Vector3::new(0.05, 0.0, 0.0)),
            reaction_wheels: vec![],
            run: RunPolicy::default(),
        }
    }

    pub fn inertia(mut self, v: Matrix3<f64>) -> Self { self.inertia = v; self }
    pub fn orientation(mut self, v: Vector3<f64>) -> Self { self.orientation = v; self }
    pub fn angular_velocity(mut self, v: Vector3<f64>) -> Self { self.angular_velocity = v; self }
    pub fn gyroscope(mut self, v: SensorConfig) -> Self { self.gyroscope = v; self }
    pub fn accelerometer(mut self, v: SensorConfig) -> Self { self.accelerometer = v; self }
    pub fn wheel(mut self, v: ReactionWheelConfig) -> Self { self.reaction_wheels.push(v); self }
    pub fn run(mut self, v: RunPolicy) -> Self { self.run = v; self }

    pub fn build(self) -> SatelliteConfig {
        let m = &self.inertia;
        SatelliteConfig {
            body: BodyConfig {
                inertia: std::array::from_fn(|i| std::array::from_fn(|j| m[(i, j)])),
                orientation: self.orientation.into(),
                angular_velocity: self.angular_velocity.into(),
            },
            gyroscope: self.gyroscope,
            accelerometer: self.accelerometer,
            reaction_wheels: self.reaction_wheels,
            run: self.run,
        }
    }
}

impl Default for SatelliteConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Interpret a configured slice as a 3-vector.
pub fn vector3(what: &str, values: &[f64]) -> Result<Vector3<f64>> {
    if values.len() != 3 {
        return Err(AdcsError::InvalidDimensions {
            what: what.to_string(),
            expected: 3,
            actual: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AdcsError::config(what, "contains a non-finite entry"));
    }
    Ok(Vector3::from_column_slice(values))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SatelliteConfig {
        SatelliteConfigBuilder::new()
            .wheel(ReactionWheelBuilder::new(Vector3::x()).build())
            .wheel(ReactionWheelBuilder::new(Vector3::y()).build())
            .wheel(ReactionWheelBuilder::new(Vector3::z()).build())
            .build()
    }

    #[test]
    fn builder_output_is_valid() {
        let config = base();
        assert!(config.validate().is_ok());
        let snapshot = config.initial_snapshot().unwrap();
        assert_eq!(snapshot.reaction_wheels.len(), 3);
        assert_eq!(snapshot.satellite.inertia_b, Matrix3::from_diagonal_element(0.05));
    }

    #[test]
    fn inertia_rows_are_row_major() {
        let body = BodyConfig {
            inertia: [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
            orientation: [0.0; 3],
            angular_velocity: [0.0; 3],
        };
        let m = body.inertia_matrix();
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(2, 0)], 7.0);
        assert_eq!(m[(1, 1)], 5.0);

        let preset = presets::pyramid();
        assert_eq!(preset.body.inertia_matrix()[(1, 2)], 0.001);
    }

    #[test]
    fn asymmetric_inertia_rejected() {
        let mut config = base();
        config.body.inertia[0][1] = 0.01;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AdcsError::Configuration { ref field, .. } if field == "body.inertia"));
    }

    #[test]
    fn indefinite_inertia_rejected() {
        let mut config = base();
        config.body.inertia[2][2] = -0.05;
        assert!(matches!(config.validate(), Err(AdcsError::Configuration { .. })));
    }

    #[test]
    fn non_unit_axis_rejected() {
        let mut config = base();
        config.reaction_wheels[1].axis_of_rotation = vec![0.0, 2.0, 0.0];
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, AdcsError::Configuration { ref field, .. } if field == "reaction_wheels[1].axis_of_rotation"),
            "got {err}"
        );
    }

    #[test]
    fn short_axis_is_a_dimension_error() {
        let mut config = base();
        config.reaction_wheels[0].axis_of_rotation = vec![1.0, 0.0];
        assert!(matches!(
            config.validate(),
            Err(AdcsError::InvalidDimensions { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn non_positive_wheel_inertia_rejected() {
        let mut config = base();
        config.reaction_wheels[2].inertia = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn snapshot_carries_initial_motion() {
        let config = SatelliteConfigBuilder::new()
            .orientation(Vector3::new(0.1, 0.0, 0.0))
            .angular_velocity(Vector3::new(0.0, 0.0, 0.1))
            .build();
        let snapshot = config.initial_snapshot().unwrap();
        assert_eq!(snapshot.gyroscope.position, Vector3::new(0.1, 0.0, 0.0));
        assert_eq!(snapshot.satellite.omega_b, Vector3::new(0.0, 0.0, 0.1));
    }
}
