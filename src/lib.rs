//! Software-in-the-loop test bed for satellite attitude control code.
//!
//! A [`Simulator`](sim::Simulator) integrates rigid-body attitude dynamics
//! with reaction-wheel momentum exchange. Control code talks to it only
//! through ideal sensors, bounded actuators and a [`Timer`](device::Timer),
//! all of which go through the [`Plant`](device::Plant) trait. Simulated time
//! advances when control code sleeps and, with a real wall clock, by however
//! long the control code itself took to run.
//!
//! ```no_run
//! use adcs_sim::config::presets;
//! use adcs_sim::gnc::{Controller, Goal, PidGains, PointingController};
//! use adcs_sim::sim::{FrozenClock, TracingSink, Simulator};
//! use nalgebra::Vector3;
//!
//! # fn main() -> adcs_sim::Result<()> {
//! let config = presets::orthogonal_triad();
//! let mut sim = Simulator::from_config(&config, TracingSink, FrozenClock)?;
//! let goal = Goal::new(Vector3::new(0.1, 0.0, 0.0));
//! let mut ctrl = PointingController::from_config(&config, PidGains::uniform(0.02, 2e-4, 0.1, 5.0), goal)?;
//! let summary = ctrl.run(&mut sim)?;
//! println!("{} cycles, final error {}", summary.cycles, summary.final_error.norm());
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod device;
pub mod dynamics;
pub mod error;
pub mod gnc;
pub mod sim;

pub use clock::Clock;
pub use error::{AdcsError, Result};
