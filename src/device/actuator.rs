use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::{vector3, ReactionWheelConfig};
use crate::error::{AdcsError, Result};

use super::{DeviceBase, DeviceId, Plant};

// ---------------------------------------------------------------------------
// Commanded state and its bounds
// ---------------------------------------------------------------------------

/// Target (or reported) state of a single-axis actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub acceleration: f64,
    pub velocity: f64,
    pub position: f64,
    pub time: Clock,
}

/// Allowed magnitude range for one command field: `min ≤ |value| ≤ max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: f64,
    pub max: f64,
}

impl Bound {
    pub const UNBOUNDED: Bound = Bound { min: 0.0, max: f64::MAX };

    pub fn up_to(max: f64) -> Self {
        Bound { min: 0.0, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        let magnitude = value.abs();
        magnitude >= self.min && magnitude <= self.max
    }

    /// Pull the magnitude into range, keeping the sign (zero counts as positive).
    pub fn clamp(&self, value: f64) -> f64 {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * value.abs().clamp(self.min, self.max)
    }

    fn validate(&self, field: &str) -> Result<()> {
        if !(self.min >= 0.0 && self.min <= self.max) {
            return Err(AdcsError::config(
                field,
                format!("need 0 <= min <= max, got [{}, {}]", self.min, self.max),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorBounds {
    pub acceleration: Bound,
    pub velocity: Bound,
    pub position: Bound,
}

impl ActuatorBounds {
    /// Zero minimums, the given maximums, unbounded position.
    pub fn symmetric(max_acceleration: f64, max_velocity: f64) -> Self {
        Self {
            acceleration: Bound::up_to(max_acceleration),
            velocity: Bound::up_to(max_velocity),
            position: Bound::UNBOUNDED,
        }
    }

    pub fn validate(&self, prefix: &str) -> Result<()> {
        self.acceleration.validate(&format!("{prefix}.acceleration"))?;
        self.velocity.validate(&format!("{prefix}.velocity"))?;
        self.position.validate(&format!("{prefix}.position"))
    }

    pub fn check(&self, device: DeviceId, command: &ActuatorCommand) -> Result<()> {
        let fields = [
            ("acceleration", command.acceleration, self.acceleration),
            ("velocity", command.velocity, self.velocity),
            ("position", command.position, self.position),
        ];
        for (field, value, bound) in fields {
            if !bound.contains(value) {
                return Err(AdcsError::InvalidActuatorState {
                    device,
                    field,
                    value,
                    min: bound.min,
                    max: bound.max,
                });
            }
        }
        Ok(())
    }

    /// Pull every field into range.
    ///
    /// Only acceleration reaches the wheel, so a wheel already past its speed
    /// limit may not be pushed further out: an outward acceleration is
    /// replaced by the smallest allowed magnitude pointing back into range.
    pub fn clamp(&self, command: &ActuatorCommand) -> ActuatorCommand {
        let speeding = command.velocity.abs() > self.velocity.max;
        let acceleration = if speeding && command.acceleration * command.velocity >= 0.0 {
            -command.velocity.signum() * self.acceleration.min
        } else {
            self.acceleration.clamp(command.acceleration)
        };

        ActuatorCommand {
            acceleration,
            velocity: self.velocity.clamp(command.velocity),
            position: self.position.clamp(command.position),
            time: command.time,
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator capability
// ---------------------------------------------------------------------------

pub trait Actuator {
    fn base(&self) -> &DeviceBase;

    fn bounds(&self) -> &ActuatorBounds;

    /// Validate against bounds, then against the polling interval, then send.
    /// Returns the simulated time the command took effect.
    fn set_target_state<P: Plant>(&mut self, plant: &mut P, target: ActuatorCommand) -> Result<Clock>;

    fn get_current_state<P: Plant>(&mut self, plant: &mut P) -> Result<ActuatorCommand>;

    fn target_state(&self) -> Option<&ActuatorCommand>;

    fn check_valid_state(&self, state: &ActuatorCommand) -> Result<()> {
        self.bounds().check(self.base().id(), state)
    }

    fn time_until_ready<P: Plant>(&self, plant: &mut P) -> Result<Clock> {
        let now = plant.update_simulation()?;
        Ok(self.base().time_until_ready(now))
    }
}

// ---------------------------------------------------------------------------
// Reaction wheel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReactionWheel {
    base: DeviceBase,
    wheel_id: usize,
    bounds: ActuatorBounds,
    inertia: f64,
    axis: Vector3<f64>,
    position: Vector3<f64>,
    target: Option<ActuatorCommand>,
}

impl ReactionWheel {
    pub fn new(
        wheel_id: usize,
        polling_interval: Clock,
        bounds: ActuatorBounds,
        inertia: f64,
        axis: Vector3<f64>,
        position: Vector3<f64>,
    ) -> Self {
        Self {
            base: DeviceBase::new(DeviceId::ReactionWheel(wheel_id), polling_interval),
            wheel_id,
            bounds,
            inertia,
            axis,
            position,
            target: None,
        }
    }

    pub fn from_config(wheel_id: usize, config: &ReactionWheelConfig) -> Result<Self> {
        let prefix = format!("reaction_wheels[{wheel_id}]");
        config.validate(&prefix)?;
        let axis = vector3(&format!("{prefix}.axis_of_rotation"), &config.axis_of_rotation)?;
        let position = vector3(&format!("{prefix}.mount_position"), &config.mount_position)?;
        Ok(Self::new(
            wheel_id,
            config.polling_interval,
            config.bounds,
            config.inertia,
            axis.normalize(),
            position,
        ))
    }

    pub fn wheel_id(&self) -> usize {
        self.wheel_id
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn axis(&self) -> Vector3<f64> {
        self.axis
    }

    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    /// Largest torque the wheel can apply: `max_acceleration × inertia`.
    pub fn max_torque(&self) -> f64 {
        self.bounds.acceleration.max * self.inertia
    }
}

impl Actuator for ReactionWheel {
    fn base(&self) -> &DeviceBase {
        &self.base
    }

    fn bounds(&self) -> &ActuatorBounds {
        &self.bounds
    }

    fn set_target_state<P: Plant>(&mut self, plant: &mut P, target: ActuatorCommand) -> Result<Clock> {
        self.check_valid_state(&target)?;

        let now = plant.update_simulation()?;
        self.base.ensure_ready(now)?;

        let applied = plant.reaction_wheel_update_desired_state(self.wheel_id, target)?;
        self.base.update_poll_time(applied);
        self.target = Some(ActuatorCommand { time: applied, ..target });
        Ok(applied)
    }

    fn get_current_state<P: Plant>(&mut self, plant: &mut P) -> Result<ActuatorCommand> {
        plant.reaction_wheel_get_current_state(self.wheel_id)
    }

    fn target_state(&self) -> Option<&ActuatorCommand> {
        self.target.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::presets;
    use crate::sim::{FrozenClock, NullSink, Simulator};

    fn wheel(interval: Clock) -> ReactionWheel {
        ReactionWheel::new(
            0,
            interval,
            ActuatorBounds::symmetric(50.0, 600.0),
            1e-4,
            Vector3::x(),
            Vector3::zeros(),
        )
    }

    fn command(acceleration: f64) -> ActuatorCommand {
        ActuatorCommand { acceleration, ..Default::default() }
    }

    #[test]
    fn bounds_check_uses_magnitude() {
        let bounds = ActuatorBounds {
            acceleration: Bound { min: 1.0, max: 5.0 },
            velocity: Bound::UNBOUNDED,
            position: Bound::UNBOUNDED,
        };
        assert!(bounds.check(DeviceId::ReactionWheel(0), &command(-3.0)).is_ok());
        assert!(bounds.check(DeviceId::ReactionWheel(0), &command(5.0)).is_ok());

        let err = bounds.check(DeviceId::ReactionWheel(0), &command(0.5)).unwrap_err();
        assert!(matches!(err, AdcsError::InvalidActuatorState { field: "acceleration", .. }));
        assert!(bounds.check(DeviceId::ReactionWheel(0), &command(-7.0)).is_err());
    }

    #[test]
    fn clamp_keeps_sign() {
        let b = Bound { min: 1.0, max: 5.0 };
        assert_eq!(b.clamp(-9.0), -5.0);
        assert_eq!(b.clamp(0.2), 1.0);
        assert_eq!(b.clamp(0.0), 1.0);
        assert_eq!(b.clamp(3.0), 3.0);
    }

    #[test]
    fn clamp_stops_pushing_an_overspeed_wheel() {
        let bounds = ActuatorBounds::symmetric(100.0, 650.0);
        let outward = ActuatorCommand { acceleration: 40.0, velocity: 660.0, ..Default::default() };
        let clamped = bounds.clamp(&outward);
        assert_eq!(clamped.velocity, 650.0);
        assert_eq!(clamped.acceleration, 0.0);
        assert!(bounds.check(DeviceId::ReactionWheel(0), &clamped).is_ok());

        // Negative spin: same rule, mirrored.
        let outward = ActuatorCommand { acceleration: -40.0, velocity: -700.0, ..Default::default() };
        assert_eq!(bounds.clamp(&outward).acceleration, 0.0);

        // Slowing down is left alone.
        let inward = ActuatorCommand { acceleration: -40.0, velocity: 660.0, ..Default::default() };
        assert_eq!(bounds.clamp(&inward).acceleration, -40.0);

        // A nonzero acceleration floor points back into range.
        let floored = ActuatorBounds {
            acceleration: Bound { min: 2.0, max: 100.0 },
            ..bounds
        };
        assert_eq!(floored.clamp(&outward).acceleration, 2.0);
    }

    #[test]
    fn inverted_bound_is_a_config_error() {
        let bounds = ActuatorBounds {
            acceleration: Bound { min: 3.0, max: 1.0 },
            velocity: Bound::UNBOUNDED,
            position: Bound::UNBOUNDED,
        };
        assert!(matches!(bounds.validate("rw"), Err(AdcsError::Configuration { .. })));
    }

    #[test]
    fn command_reaches_simulator_and_respects_polling() {
        let mut sim = Simulator::from_config(&presets::orthogonal_triad(), NullSink, FrozenClock).unwrap();
        let mut rw = wheel(Clock::new(20, 0));

        // Out of bounds is rejected before readiness is even considered.
        let err = rw.set_target_state(&mut sim, command(80.0)).unwrap_err();
        assert!(matches!(err, AdcsError::InvalidActuatorState { .. }));

        let wait = rw.set_target_state(&mut sim, command(10.0)).unwrap_err().retry_after().unwrap();
        assert_eq!(wait, Clock::new(20, 0));
        sim.set_adcs_sleep(wait).unwrap();

        let applied = rw.set_target_state(&mut sim, command(10.0)).unwrap();
        assert_eq!(applied, Clock::new(20, 0));
        assert_eq!(rw.target_state().map(|t| t.acceleration), Some(10.0));

        sim.set_adcs_sleep(Clock::new(100, 0)).unwrap();
        let state = rw.get_current_state(&mut sim).unwrap();
        assert_eq!(state.acceleration, 10.0);
        assert!((state.velocity - 1.0).abs() < 1e-9, "wheel should spin up to 1 rad/s, got {}", state.velocity);
        assert_eq!(state.time, Clock::new(120, 0));
    }

    #[test]
    fn max_torque_from_acceleration_bound() {
        let rw = wheel(Clock::ZERO);
        assert!((rw.max_torque() - 5e-3).abs() < 1e-15);
    }
}
