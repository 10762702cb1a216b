//! Sensors, actuators and the polling discipline they share.
//!
//! Devices never hold the simulator. Every operation that touches physics
//! takes the [`Plant`] explicitly, and reaction wheels address their slot in
//! the simulator by index.

pub mod actuator;
pub mod sensor;
pub mod timer;

use std::fmt;

use crate::clock::Clock;
use crate::config::SatelliteConfig;
use crate::dynamics::state::{GyroscopeState, Measurement};
use crate::error::{AdcsError, Result};

pub use actuator::{Actuator, ActuatorBounds, ActuatorCommand, Bound, ReactionWheel};
pub use sensor::{Accelerometer, Gyroscope, Sensor};
pub use timer::Timer;

// ---------------------------------------------------------------------------
// Plant: what devices and controllers need from the simulation
// ---------------------------------------------------------------------------

/// Per-device entry points into the simulated world.
///
/// Every call first brings simulated time up to date, so the values returned
/// reflect "now". Any call may fail with `SimulationTimeout` once the run is
/// over.
pub trait Plant {
    fn update_simulation(&mut self) -> Result<Clock>;

    /// Advance by the elapsed wall-clock cost plus an explicit `duration`.
    fn set_adcs_sleep(&mut self, duration: Clock) -> Result<Clock>;

    fn reaction_wheel_update_desired_state(
        &mut self,
        wheel_id: usize,
        command: ActuatorCommand,
    ) -> Result<Clock>;

    fn reaction_wheel_get_current_state(&mut self, wheel_id: usize) -> Result<ActuatorCommand>;

    fn gyroscope_take_measurement(&mut self) -> Result<GyroscopeState>;

    fn accelerometer_take_measurement(&mut self) -> Result<Measurement>;
}

// ---------------------------------------------------------------------------
// Device identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    Gyroscope,
    Accelerometer,
    ReactionWheel(usize),
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Gyroscope => write!(f, "gyroscope"),
            DeviceId::Accelerometer => write!(f, "accelerometer"),
            DeviceId::ReactionWheel(i) => write!(f, "reaction wheel {}", i),
        }
    }
}

// ---------------------------------------------------------------------------
// Polling discipline
// ---------------------------------------------------------------------------

/// Minimum spacing between successive uses of a device.
///
/// `last_polled` starts at zero simulated time, so a device with a nonzero
/// interval is not ready until that interval has elapsed.
#[derive(Debug, Clone)]
pub struct DeviceBase {
    id: DeviceId,
    min_polling_increment: Clock,
    last_polled: Clock,
}

impl DeviceBase {
    pub fn new(id: DeviceId, min_polling_increment: Clock) -> Self {
        Self {
            id,
            min_polling_increment,
            last_polled: Clock::ZERO,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn min_polling_increment(&self) -> Clock {
        self.min_polling_increment
    }

    pub fn last_polled(&self) -> Clock {
        self.last_polled
    }

    /// Zero when ready, otherwise how long until the interval has elapsed.
    pub fn time_until_ready(&self, now: Clock) -> Clock {
        let elapsed = now - self.last_polled;
        if elapsed < self.min_polling_increment {
            self.min_polling_increment - elapsed
        } else {
            Clock::ZERO
        }
    }

    pub fn ensure_ready(&self, now: Clock) -> Result<()> {
        let remaining = self.time_until_ready(now);
        if remaining.is_zero() {
            Ok(())
        } else {
            Err(AdcsError::DeviceNotReady {
                device: self.id,
                remaining,
            })
        }
    }

    pub fn update_poll_time(&mut self, now: Clock) {
        self.last_polled = now;
    }
}

// ---------------------------------------------------------------------------
// Device set resolved from configuration
// ---------------------------------------------------------------------------

/// The fixed capability set of one satellite, resolved once at construction.
#[derive(Debug, Clone)]
pub struct DeviceSet {
    pub gyroscope: Gyroscope,
    pub accelerometer: Accelerometer,
    pub reaction_wheels: Vec<ReactionWheel>,
}

impl DeviceSet {
    pub fn from_config(config: &SatelliteConfig) -> Result<Self> {
        let reaction_wheels = config
            .reaction_wheels
            .iter()
            .enumerate()
            .map(|(i, wheel)| ReactionWheel::from_config(i, wheel))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            gyroscope: Gyroscope::from_config(&config.gyroscope)?,
            accelerometer: Accelerometer::from_config(&config.accelerometer)?,
            reaction_wheels,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_before_first_interval() {
        let base = DeviceBase::new(DeviceId::Gyroscope, Clock::new(100, 0));
        assert_eq!(base.time_until_ready(Clock::new(30, 0)), Clock::new(70, 0));
        assert_eq!(base.time_until_ready(Clock::new(100, 0)), Clock::ZERO);
    }

    #[test]
    fn poll_time_resets_the_interval() {
        let mut base = DeviceBase::new(DeviceId::ReactionWheel(2), Clock::new(250, 0));
        base.update_poll_time(Clock::new(0, 4));
        let err = base.ensure_ready(Clock::new(100, 4)).unwrap_err();
        assert_eq!(
            err,
            AdcsError::DeviceNotReady {
                device: DeviceId::ReactionWheel(2),
                remaining: Clock::new(150, 0),
            }
        );
        assert!(base.ensure_ready(Clock::new(250, 4)).is_ok());
    }

    #[test]
    fn zero_interval_is_always_ready() {
        let base = DeviceBase::new(DeviceId::Accelerometer, Clock::ZERO);
        assert!(base.ensure_ready(Clock::ZERO).is_ok());
    }

    #[test]
    fn device_id_display() {
        assert_eq!(DeviceId::ReactionWheel(3).to_string(), "reaction wheel 3");
        assert_eq!(DeviceId::Gyroscope.to_string(), "gyroscope");
    }
}
