pub mod policy;
pub mod report;
pub mod simulator;
pub mod wallclock;

pub use policy::{RunPolicy, StepPolicy};
pub use report::{FnSink, NullSink, RecordingSink, Report, ReportSink, TracingSink};
pub use simulator::Simulator;
pub use wallclock::{FrozenClock, MonotonicClock, TickingClock, WallClock};
