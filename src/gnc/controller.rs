use nalgebra::{DVector, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::SatelliteConfig;
use crate::device::{Actuator, ActuatorCommand, DeviceSet, Plant, Sensor, Timer};
use crate::error::{AdcsError, Result};

use super::allocation::TorqueAllocator;
use super::guidance::Goal;
use super::pid::{AttitudePid, PidGains};

/// Trait for attitude control loops.
///
/// A controller drives a [`Plant`] until the run times out. Timeout is the
/// normal way out and yields a summary; any other error is propagated.
pub trait Controller {
    fn run<P: Plant>(&mut self, plant: &mut P) -> Result<ControlSummary>;

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// What a finished control run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSummary {
    pub cycles: u64,
    pub started: Clock,
    pub finished: Clock,
    pub final_error: Vector3<f64>,
    pub final_wheel_torques: Vec<f64>,
    pub peak_wheel_torque: f64,
    pub saturated_cycles: u64,
    pub clamped_commands: u64,
}

fn require_paced_gyroscope(devices: &DeviceSet) -> Result<()> {
    if devices.gyroscope.base().min_polling_increment().is_zero() {
        return Err(AdcsError::config(
            "gyroscope.polling_interval",
            "must be nonzero, it paces the control loop",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pointing controller: ramped setpoint + PID + pseudo-inverse allocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PointingController {
    devices: DeviceSet,
    goal: Goal,
    pid: AttitudePid,
    allocator: TorqueAllocator,
    timer: Timer,
    summary: ControlSummary,
    origin: Vector3<f64>,
    last_time: Clock,
}

impl PointingController {
    pub fn new(devices: DeviceSet, gains: PidGains, goal: Goal) -> Result<Self> {
        require_paced_gyroscope(&devices)?;
        gains.validate()?;
        goal.validate()?;
        let allocator = TorqueAllocator::from_wheels(&devices.reaction_wheels)?;

        Ok(Self {
            devices,
            goal,
            pid: AttitudePid::new(gains),
            allocator,
            timer: Timer::new(),
            summary: ControlSummary::default(),
            origin: Vector3::zeros(),
            last_time: Clock::ZERO,
        })
    }

    pub fn from_config(config: &SatelliteConfig, gains: PidGains, goal: Goal) -> Result<Self> {
        Self::new(DeviceSet::from_config(config)?, gains, goal)
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn devices(&self) -> &DeviceSet {
        &self.devices
    }

    pub fn summary(&self) -> &ControlSummary {
        &self.summary
    }

    /// Wait for the gyroscope and take the ramp origin from its first reading.
    fn start<P: Plant>(&mut self, plant: &mut P) -> Result<()> {
        let gyro = &mut self.devices.gyroscope;
        let reading = self.timer.retry_until_ready(plant, |p| gyro.take_measurement(p))?;

        self.origin = reading.position;
        self.last_time = reading.time_taken;
        self.pid.reset();
        self.summary = ControlSummary {
            started: reading.time_taken,
            finished: reading.time_taken,
            ..ControlSummary::default()
        };
        info!(
            time = %reading.time_taken,
            origin = ?self.origin.as_slice(),
            target = ?self.goal.attitude.as_slice(),
            "pointing loop started"
        );
        Ok(())
    }

    fn cycle<P: Plant>(&mut self, plant: &mut P) -> Result<()> {
        let gyro = &mut self.devices.gyroscope;
        let reading = self.timer.retry_until_ready(plant, |p| gyro.take_measurement(p))?;
        let now = reading.time_taken;
        let dt = (now - self.last_time).as_seconds();
        self.last_time = now;

        let target = self.goal.setpoint(&self.origin, now - self.summary.started);
        let error = target - reading.position;
        let desired_torque = -self.pid.update(error, dt);

        let (torques, saturated) = self.allocator.saturate(self.allocator.allocate(&desired_torque));
        if saturated {
            debug!(time = %now, "wheel torques saturated, command scaled down");
            self.summary.saturated_cycles += 1;
        }
        self.command_wheels(plant, &torques)?;

        let peak = torques.amax();
        self.summary.cycles += 1;
        self.summary.finished = now;
        self.summary.final_error = error;
        self.summary.final_wheel_torques = torques.as_slice().to_vec();
        self.summary.peak_wheel_torque = self.summary.peak_wheel_torque.max(peak);
        Ok(())
    }

    fn command_wheels<P: Plant>(&mut self, plant: &mut P, torques: &DVector<f64>) -> Result<()> {
        let timer = self.timer;
        for (wheel, torque) in self.devices.reaction_wheels.iter_mut().zip(torques.iter()) {
            let current = wheel.get_current_state(plant)?;
            let command = ActuatorCommand {
                acceleration: torque / wheel.inertia(),
                velocity: current.velocity,
                position: current.position,
                time: current.time,
            };

            match timer.retry_until_ready(plant, |p| wheel.set_target_state(p, command)) {
                Ok(_) => {}
                Err(AdcsError::InvalidActuatorState { device, field, value, .. }) => {
                    // One clamped retry; a second rejection aborts the run. An
                    // overspeed wheel gets no further outward acceleration.
                    let clamped = wheel.bounds().clamp(&command);
                    warn!(%device, field, value, "command out of bounds, clamping");
                    self.summary.clamped_commands += 1;
                    timer.retry_until_ready(plant, |p| wheel.set_target_state(p, clamped))?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn control_loop<P: Plant>(&mut self, plant: &mut P) -> Result<()> {
        self.start(plant)?;
        loop {
            self.cycle(plant)?;
        }
    }
}

impl Controller for PointingController {
    fn run<P: Plant>(&mut self, plant: &mut P) -> Result<ControlSummary> {
        match self.control_loop(plant) {
            Err(AdcsError::SimulationTimeout { at }) => {
                info!(
                    controller = self.name(),
                    %at,
                    cycles = self.summary.cycles,
                    error = self.summary.final_error.norm(),
                    "control loop finished"
                );
                Ok(self.summary.clone())
            }
            Err(e) => Err(e),
            Ok(()) => Ok(self.summary.clone()),
        }
    }

    fn name(&self) -> &str {
        "PointingController"
    }
}

// ---------------------------------------------------------------------------
// Idle controller: sample every sensor, never actuate
// ---------------------------------------------------------------------------

/// Baseline loop that wakes every `interval`, reads both sensors and leaves
/// the wheels alone.
#[derive(Debug, Clone)]
pub struct IdleController {
    devices: DeviceSet,
    interval: Clock,
    timer: Timer,
    summary: ControlSummary,
}

impl IdleController {
    pub fn new(devices: DeviceSet, interval: Clock) -> Result<Self> {
        require_paced_gyroscope(&devices)?;
        Ok(Self {
            devices,
            interval,
            timer: Timer::new(),
            summary: ControlSummary::default(),
        })
    }

    pub fn from_config(config: &SatelliteConfig, interval: Clock) -> Result<Self> {
        Self::new(DeviceSet::from_config(config)?, interval)
    }

    fn control_loop<P: Plant>(&mut self, plant: &mut P) -> Result<()> {
        self.summary.started = self.timer.get_time(plant)?;
        loop {
            self.timer.sleep(plant, self.interval)?;

            let gyro = &mut self.devices.gyroscope;
            let reading = self.timer.retry_until_ready(plant, |p| gyro.take_measurement(p))?;
            let accel = &mut self.devices.accelerometer;
            self.timer.retry_until_ready(plant, |p| accel.take_measurement(p))?;

            self.summary.cycles += 1;
            self.summary.finished = reading.time_taken;
            self.summary.final_error = reading.position;
        }
    }
}

impl Controller for IdleController {
    fn run<P: Plant>(&mut self, plant: &mut P) -> Result<ControlSummary> {
        match self.control_loop(plant) {
            Err(AdcsError::SimulationTimeout { at }) => {
                info!(controller = self.name(), %at, cycles = self.summary.cycles, "control loop finished");
                Ok(self.summary.clone())
            }
            Err(e) => Err(e),
            Ok(()) => Ok(self.summary.clone()),
        }
    }

    fn name(&self) -> &str {
        "IdleController"
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ControllerBuilder {
    devices: Option<DeviceSet>,
    gains: Option<PidGains>,
    goal: Option<Goal>,
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn devices(mut self, v: DeviceSet) -> Self { self.devices = Some(v); self }
    pub fn gains(mut self, v: PidGains) -> Self { self.gains = Some(v); self }
    pub fn goal(mut self, v: Goal) -> Self { self.goal = Some(v); self }

    pub fn build(self) -> Result<PointingController> {
        let devices = self.devices.ok_or(AdcsError::NullParameter("devices"))?;
        let gains = self.gains.ok_or(AdcsError::NullParameter("gains"))?;
        let goal = self.goal.ok_or(AdcsError::NullParameter("goal"))?;
        PointingController::new(devices, gains, goal)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
