pub mod rigid_body;
pub mod state;

pub use rigid_body::{body_acceleration, euler_step, peak_body_acceleration, wheel_torque};
pub use state::{
    AccelerometerState, GyroscopeState, Measurement, ReactionWheelState, SatelliteState,
    SystemSnapshot,
};
