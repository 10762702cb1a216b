use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Simulated time
// ---------------------------------------------------------------------------

const MILLIS_PER_SECOND: u64 = 1000;

/// One full turn of the seconds field, in milliseconds. Arithmetic wraps here.
const WRAP_MILLIS: u64 = (u32::MAX as u64 + 1) * MILLIS_PER_SECOND;

/// Fixed-point simulated time: whole seconds plus a millisecond remainder.
///
/// Every constructor and operator rebalances the pair so `milliseconds < 1000`,
/// which makes the derived equality bit-exact. Addition and subtraction wrap
/// when the seconds field overflows or underflows; keeping runs inside the
/// ~136 year range is the caller's responsibility.
///
/// Used for "now", for deltas and for device polling intervals alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct Clock {
    seconds: u32,
    milliseconds: u32,
}

impl Clock {
    pub const ZERO: Clock = Clock { seconds: 0, milliseconds: 0 };

    /// Build from a (milliseconds, seconds) pair, carrying whole seconds out
    /// of the millisecond field.
    pub fn new(milliseconds: u32, seconds: u32) -> Self {
        Self::from_millis(u64::from(seconds) * MILLIS_PER_SECOND + u64::from(milliseconds))
    }

    pub fn from_millis(total: u64) -> Self {
        let total = total % WRAP_MILLIS;
        Clock {
            seconds: (total / MILLIS_PER_SECOND) as u32,
            milliseconds: (total % MILLIS_PER_SECOND) as u32,
        }
    }

    pub fn from_secs(seconds: u32) -> Self {
        Clock { seconds, milliseconds: 0 }
    }

    /// Nearest whole millisecond. Negative or non-finite input maps to zero.
    pub fn from_secs_f64(seconds: f64) -> Self {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Clock::ZERO;
        }
        Self::from_millis((seconds * MILLIS_PER_SECOND as f64).round() as u64)
    }

    pub fn milliseconds(&self) -> u32 {
        self.milliseconds
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn as_millis(&self) -> u64 {
        u64::from(self.seconds) * MILLIS_PER_SECOND + u64::from(self.milliseconds)
    }

    pub fn as_seconds(&self) -> f64 {
        f64::from(self.seconds) + f64::from(self.milliseconds) / MILLIS_PER_SECOND as f64
    }

    pub fn is_zero(&self) -> bool {
        *self == Clock::ZERO
    }
}

impl Ord for Clock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seconds
            .cmp(&other.seconds)
            .then(self.milliseconds.cmp(&other.milliseconds))
    }
}

impl PartialOrd for Clock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Clock {
    type Output = Clock;

    fn add(self, rhs: Clock) -> Clock {
        Clock::from_millis(self.as_millis() + rhs.as_millis())
    }
}

impl Sub for Clock {
    type Output = Clock;

    fn sub(self, rhs: Clock) -> Clock {
        Clock::from_millis(self.as_millis() + WRAP_MILLIS - rhs.as_millis())
    }
}

impl AddAssign for Clock {
    fn add_assign(&mut self, rhs: Clock) {
        *self = *self + rhs;
    }
}

impl SubAssign for Clock {
    fn sub_assign(&mut self, rhs: Clock) {
        *self = *self - rhs;
    }
}

impl From<u64> for Clock {
    fn from(millis: u64) -> Self {
        Clock::from_millis(millis)
    }
}

impl From<Clock> for u64 {
    fn from(clock: Clock) -> Self {
        clock.as_millis()
    }
}

impl From<Duration> for Clock {
    /// Truncates to whole milliseconds.
    fn from(d: Duration) -> Self {
        Clock::from_millis(d.as_millis() as u64)
    }
}

impl From<Clock> for Duration {
    fn from(clock: Clock) -> Self {
        Duration::from_millis(clock.as_millis())
    }
}

impl fmt::Display for Clock {
    /// `[mm:ss:msms]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.seconds / 60;
        let seconds = self.seconds % 60;
        write!(f, "[{:02}:{:02}:{:04}]", minutes, seconds, self.milliseconds)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
