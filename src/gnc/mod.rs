pub mod allocation;
pub mod controller;
pub mod guidance;
pub mod pid;

pub use allocation::TorqueAllocator;
pub use controller::{ControlSummary, Controller, ControllerBuilder, IdleController, PointingController};
pub use guidance::{ramp_factor, ramp_target, Goal};
pub use pid::{AttitudePid, PidGains};
