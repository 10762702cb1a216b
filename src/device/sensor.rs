use nalgebra::Vector3;

use crate::clock::Clock;
use crate::config::{vector3, SensorConfig};
use crate::dynamics::state::{GyroscopeState, Measurement};
use crate::error::Result;

use super::{DeviceBase, DeviceId, Plant};

// ---------------------------------------------------------------------------
// Sensor capability
// ---------------------------------------------------------------------------

/// A polled, ideal (noiseless) sensor.
pub trait Sensor {
    type Reading: Clone;

    fn base(&self) -> &DeviceBase;

    /// Read the sensor, or `DeviceNotReady` if polled too soon.
    fn take_measurement<P: Plant>(&mut self, plant: &mut P) -> Result<Self::Reading>;

    /// Most recent successful reading.
    fn last_reading(&self) -> Option<&Self::Reading>;

    fn mount_position(&self) -> Vector3<f64>;

    fn time_until_ready<P: Plant>(&self, plant: &mut P) -> Result<Clock> {
        let now = plant.update_simulation()?;
        Ok(self.base().time_until_ready(now))
    }
}

// ---------------------------------------------------------------------------
// Gyroscope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Gyroscope {
    base: DeviceBase,
    mount_position: Vector3<f64>,
    last: Option<GyroscopeState>,
}

impl Gyroscope {
    pub fn new(polling_interval: Clock, mount_position: Vector3<f64>) -> Self {
        Self {
            base: DeviceBase::new(DeviceId::Gyroscope, polling_interval),
            mount_position,
            last: None,
        }
    }

    pub fn from_config(config: &SensorConfig) -> Result<Self> {
        config.validate("gyroscope")?;
        let position = vector3("gyroscope.mount_position", &config.mount_position)?;
        Ok(Self::new(config.polling_interval, position))
    }
}

impl Sensor for Gyroscope {
    type Reading = GyroscopeState;

    fn base(&self) -> &DeviceBase {
        &self.base
    }

    fn take_measurement<P: Plant>(&mut self, plant: &mut P) -> Result<GyroscopeState> {
        let now = plant.update_simulation()?;
        self.base.ensure_ready(now)?;

        let reading = plant.gyroscope_take_measurement()?;
        self.base.update_poll_time(reading.time_taken);
        self.last = Some(reading.clone());
        Ok(reading)
    }

    fn last_reading(&self) -> Option<&GyroscopeState> {
        self.last.as_ref()
    }

    fn mount_position(&self) -> Vector3<f64> {
        self.mount_position
    }
}

// ---------------------------------------------------------------------------
// Accelerometer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Accelerometer {
    base: DeviceBase,
    mount_position: Vector3<f64>,
    last: Option<Measurement>,
}

impl Accelerometer {
    pub fn new(polling_interval: Clock, mount_position: Vector3<f64>) -> Self {
        Self {
            base: DeviceBase::new(DeviceId::Accelerometer, polling_interval),
            mount_position,
            last: None,
        }
    }

    pub fn from_config(config: &SensorConfig) -> Result<Self> {
        config.validate("accelerometer")?;
        let position = vector3("accelerometer.mount_position", &config.mount_position)?;
        Ok(Self::new(config.polling_interval, position))
    }
}

impl Sensor for Accelerometer {
    type Reading = Measurement;

    fn base(&self) -> &DeviceBase {
        &self.base
    }

    fn take_measurement<P: Plant>(&mut self, plant: &mut P) -> Result<Measurement> {
        let now = plant.update_simulation()?;
        self.base.ensure_ready(now)?;

        let reading = plant.accelerometer_take_measurement()?;
        self.base.update_poll_time(reading.time_taken);
        self.last = Some(reading);
        Ok(reading)
    }

    fn last_reading(&self) -> Option<&Measurement> {
        self.last.as_ref()
    }

    fn mount_position(&self) -> Vector3<f64> {
        self.mount_position
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
