use thiserror::Error;

use crate::clock::Clock;
use crate::device::DeviceId;

/// Every failure the simulator, devices and controllers can report.
///
/// `DeviceNotReady` and `SimulationTimeout` are part of normal operation:
/// the first asks the caller to sleep and retry, the second ends a run.
/// The remaining kinds abort whatever was in progress.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdcsError {
    #[error("configuration error in `{field}`: {reason}")]
    Configuration { field: String, reason: String },

    #[error("{device} not ready, retry in {remaining}")]
    DeviceNotReady { device: DeviceId, remaining: Clock },

    #[error("{device} rejected {field} = {value}: magnitude must lie in [{min}, {max}]")]
    InvalidActuatorState {
        device: DeviceId,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    InvalidDimensions {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("simulation timed out at {at}")]
    SimulationTimeout { at: Clock },

    #[error("required collaborator `{0}` was not provided")]
    NullParameter(&'static str),

    #[error("cannot allocate torque over {wheels} reaction wheel(s): {reason}")]
    DegenerateAllocation { wheels: usize, reason: String },
}

impl AdcsError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AdcsError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Time the caller should sleep before retrying, if this is a not-ready report.
    pub fn retry_after(&self) -> Option<Clock> {
        match self {
            AdcsError::DeviceNotReady { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AdcsError::SimulationTimeout { .. })
    }
}

pub type Result<T, E = AdcsError> = std::result::Result<T, E>;
