use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Host time sources
// ---------------------------------------------------------------------------

/// Host time as seen by the simulator. The simulator only ever looks at
/// differences between successive readings.
pub trait WallClock {
    fn now(&mut self) -> Duration;
}

/// Real monotonic host time. Control code that runs slowly genuinely costs
/// simulated time.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for MonotonicClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Host time that never moves: control code is free and runs are fully
/// reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrozenClock;

impl WallClock for FrozenClock {
    fn now(&mut self) -> Duration {
        Duration::ZERO
    }
}

/// Host time that advances by a fixed cost every time it is read, modelling
/// control code with a known, constant execution cost.
#[derive(Debug, Clone, Copy)]
pub struct TickingClock {
    per_read: Duration,
    elapsed: Duration,
}

impl TickingClock {
    pub fn new(per_read: Duration) -> Self {
        Self { per_read, elapsed: Duration::ZERO }
    }
}

impl WallClock for TickingClock {
    fn now(&mut self) -> Duration {
        let now = self.elapsed;
        self.elapsed += self.per_read;
        now
    }
}
