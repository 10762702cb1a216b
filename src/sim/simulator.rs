use std::time::Duration;

use nalgebra::Matrix3;
use tracing::{info, trace};

use crate::clock::Clock;
use crate::config::SatelliteConfig;
use crate::device::{ActuatorCommand, Plant};
use crate::dynamics::rigid_body::{euler_step, peak_body_acceleration};
use crate::dynamics::state::{GyroscopeState, Measurement, SystemSnapshot};
use crate::error::{AdcsError, Result};

use super::policy::RunPolicy;
use super::report::{ReportSink, TracingSink};
use super::wallclock::{MonotonicClock, WallClock};

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Owns the system state and the simulated clock.
///
/// Simulated time only moves when control code talks to the plant: every
/// query first folds in the host time spent since the previous query, and
/// sleeps add their explicit duration on top.
pub struct Simulator<S = TracingSink, C = MonotonicClock> {
    snapshot: SystemSnapshot,
    inertia_inv: Matrix3<f64>,
    policy: RunPolicy,
    time: Clock,
    last_step: Clock,
    last_report: Option<Clock>,
    last_wall: Option<Duration>,
    wheel_targets: Vec<ActuatorCommand>,
    steps: u64,
    timed_out: bool,
    sink: S,
    wall: C,
}

impl<S: ReportSink, C: WallClock> Simulator<S, C> {
    pub fn new(snapshot: SystemSnapshot, policy: RunPolicy, mut sink: S, wall: C) -> Result<Self> {
        policy.validate()?;
        let inertia_inv = snapshot
            .satellite
            .inertia_b
            .try_inverse()
            .ok_or_else(|| AdcsError::config("body.inertia", "tensor is singular"))?;

        info!(
            timeout = %policy.timeout,
            adaptive = policy.step.is_adaptive(),
            wheels = snapshot.reaction_wheels.len(),
            "starting simulation"
        );
        sink.start(&snapshot);
        sink.message("Starting simulation.");

        let wheel_targets = vec![ActuatorCommand::default(); snapshot.reaction_wheels.len()];
        Ok(Self {
            snapshot,
            inertia_inv,
            policy,
            time: Clock::ZERO,
            last_step: Clock::ZERO,
            last_report: None,
            last_wall: None,
            wheel_targets,
            steps: 0,
            timed_out: false,
            sink,
            wall,
        })
    }

    pub fn from_config(config: &SatelliteConfig, sink: S, wall: C) -> Result<Self> {
        let snapshot = config.initial_snapshot()?;
        Self::new(snapshot, config.run, sink, wall)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn time(&self) -> Clock {
        self.time
    }

    pub fn snapshot(&self) -> &SystemSnapshot {
        &self.snapshot
    }

    pub fn policy(&self) -> &RunPolicy {
        &self.policy
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Catch up with the host time spent since the previous call.
    pub fn update_simulation(&mut self) -> Result<Clock> {
        self.ensure_running()?;
        let passed = self.determine_time_passed();
        self.simulate(passed)?;
        Ok(self.time)
    }

    /// Catch up with host time, then sleep a further `duration`.
    pub fn set_adcs_sleep(&mut self, duration: Clock) -> Result<Clock> {
        self.ensure_running()?;
        let passed = self.determine_time_passed();
        self.simulate(passed + duration)?;
        Ok(self.time)
    }

    /// Whole milliseconds of host time since the last call; zero on the first.
    /// Sub-millisecond remainders carry over to the next call.
    fn determine_time_passed(&mut self) -> Clock {
        let now = self.wall.now();
        match self.last_wall {
            None => {
                self.last_wall = Some(now);
                Clock::ZERO
            }
            Some(last) => {
                let passed = Clock::from(now.saturating_sub(last));
                self.last_wall = Some(last + Duration::from(passed));
                passed
            }
        }
    }

    /// Length of the next integration step under the run's step policy.
    pub fn determine_timestep(&self) -> Clock {
        if self.steps == 0 {
            self.policy.step.first_step()
        } else {
            self.policy.step.next_step(peak_body_acceleration(&self.snapshot.satellite))
        }
    }

    /// Integrate forward by `duration`, landing exactly on the end time.
    ///
    /// Reaching the run timeout flushes the final snapshot to the sink and
    /// returns `SimulationTimeout`; so does every call after that.
    pub fn simulate(&mut self, duration: Clock) -> Result<()> {
        self.ensure_running()?;
        let end = self.time + duration;

        while self.time < end {
            let step = self.determine_timestep().min(end - self.time);
            self.time += step;
            self.timestep(step);
            self.report_if_due();

            if self.time >= self.policy.timeout {
                return Err(self.time_out());
            }
        }
        Ok(())
    }

    fn timestep(&mut self, step: Clock) {
        euler_step(&mut self.snapshot, &self.inertia_inv, step.as_seconds());
        self.snapshot.gyroscope.time_taken = self.time;
        self.last_step = step;
        self.steps += 1;
        trace!(time = %self.time, step_ms = step.as_millis(), "step");
    }

    fn report_if_due(&mut self) {
        let due = match self.last_report {
            None => true,
            Some(last) => self.time - last >= self.policy.report_interval,
        };
        if due {
            self.report();
        }
    }

    fn report(&mut self) {
        self.sink.record(&self.snapshot, self.time, self.last_step);
        self.last_report = Some(self.time);
    }

    fn time_out(&mut self) -> AdcsError {
        self.timed_out = true;
        if self.last_report != Some(self.time) {
            self.report();
        }
        info!(time = %self.time, steps = self.steps, "simulation timed out");
        self.sink.message(&format!("Simulation timed out at {}.", self.time));
        AdcsError::SimulationTimeout { at: self.time }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.timed_out {
            Err(AdcsError::SimulationTimeout { at: self.time })
        } else {
            Ok(())
        }
    }

    fn check_wheel(&self, wheel_id: usize) -> Result<()> {
        let count = self.snapshot.reaction_wheels.len();
        if wheel_id < count {
            Ok(())
        } else {
            Err(AdcsError::InvalidDimensions {
                what: format!("reaction wheel index {wheel_id} (wheel count)"),
                expected: count,
                actual: wheel_id + 1,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Device entry points
// ---------------------------------------------------------------------------

impl<S: ReportSink, C: WallClock> Plant for Simulator<S, C> {
    fn update_simulation(&mut self) -> Result<Clock> {
        Simulator::update_simulation(self)
    }

    fn set_adcs_sleep(&mut self, duration: Clock) -> Result<Clock> {
        Simulator::set_adcs_sleep(self, duration)
    }

    /// Only the acceleration drives the physics; the rest of the command is
    /// kept as the wheel's target.
    fn reaction_wheel_update_desired_state(
        &mut self,
        wheel_id: usize,
        command: ActuatorCommand,
    ) -> Result<Clock> {
        self.check_wheel(wheel_id)?;
        let now = Simulator::update_simulation(self)?;
        self.snapshot.reaction_wheels[wheel_id].alpha = command.acceleration;
        self.wheel_targets[wheel_id] = ActuatorCommand { time: now, ..command };
        Ok(now)
    }

    fn reaction_wheel_get_current_state(&mut self, wheel_id: usize) -> Result<ActuatorCommand> {
        self.check_wheel(wheel_id)?;
        let now = Simulator::update_simulation(self)?;
        let wheel = &self.snapshot.reaction_wheels[wheel_id];
        Ok(ActuatorCommand {
            acceleration: wheel.alpha,
            velocity: wheel.omega,
            position: self.wheel_targets[wheel_id].position,
            time: now,
        })
    }

    fn gyroscope_take_measurement(&mut self) -> Result<GyroscopeState> {
        let now = Simulator::update_simulation(self)?;
        Ok(GyroscopeState {
            time_taken: now,
            ..self.snapshot.gyroscope.clone()
        })
    }

    fn accelerometer_take_measurement(&mut self) -> Result<Measurement> {
        let now = Simulator::update_simulation(self)?;
        Ok(Measurement {
            value: self.snapshot.accelerometer.measurement,
            time_taken: now,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
