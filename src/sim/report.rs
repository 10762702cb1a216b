use tracing::{debug, info};

use crate::clock::Clock;
use crate::dynamics::state::SystemSnapshot;

// ---------------------------------------------------------------------------
// Reporting sink
// ---------------------------------------------------------------------------

/// Receives simulator output. How it is stored or displayed is up to the sink.
pub trait ReportSink {
    /// Header hook, called once when a simulator is created.
    fn start(&mut self, _initial: &SystemSnapshot) {}

    /// One committed snapshot at simulated `time`, after a step of `step`.
    fn record(&mut self, snapshot: &SystemSnapshot, time: Clock, step: Clock);

    /// Free-form notices ("starting simulation", timeout, ...).
    fn message(&mut self, _text: &str) {}
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn start(&mut self, initial: &SystemSnapshot) {
        (**self).start(initial)
    }

    fn record(&mut self, snapshot: &SystemSnapshot, time: Clock, step: Clock) {
        (**self).record(snapshot, time, step)
    }

    fn message(&mut self, text: &str) {
        (**self).message(text)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn record(&mut self, _snapshot: &SystemSnapshot, _time: Clock, _step: Clock) {}
}

/// Emits one structured `tracing` event per report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn start(&mut self, initial: &SystemSnapshot) {
        info!(wheels = initial.reaction_wheels.len(), "new simulation");
    }

    fn record(&mut self, snapshot: &SystemSnapshot, time: Clock, step: Clock) {
        let sat = &snapshot.satellite;
        debug!(
            %time,
            step_ms = step.as_millis(),
            theta = ?sat.theta_b.as_slice(),
            omega = ?sat.omega_b.as_slice(),
            alpha = ?sat.alpha_b.as_slice(),
            accel = ?snapshot.accelerometer.measurement.as_slice(),
            wheel_omega = ?snapshot.reaction_wheels.iter().map(|w| w.omega).collect::<Vec<_>>(),
            "snapshot"
        );
    }

    fn message(&mut self, text: &str) {
        info!("{}", text);
    }
}

/// A single recorded report.
#[derive(Debug, Clone)]
pub struct Report {
    pub snapshot: SystemSnapshot,
    pub time: Clock,
    pub step: Clock,
}

/// Keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub initial: Option<SystemSnapshot>,
    pub reports: Vec<Report>,
    pub messages: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Report> {
        self.reports.last()
    }
}

impl ReportSink for RecordingSink {
    fn start(&mut self, initial: &SystemSnapshot) {
        self.initial = Some(initial.clone());
    }

    fn record(&mut self, snapshot: &SystemSnapshot, time: Clock, step: Clock) {
        self.reports.push(Report {
            snapshot: snapshot.clone(),
            time,
            step,
        });
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> ReportSink for FnSink<F>
where
    F: FnMut(&SystemSnapshot, Clock, Clock),
{
    fn record(&mut self, snapshot: &SystemSnapshot, time: Clock, step: Clock) {
        (self.0)(snapshot, time, step)
    }
}
