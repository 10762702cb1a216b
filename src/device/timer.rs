use tracing::debug;

use crate::clock::Clock;
use crate::error::{AdcsError, Result};

use super::Plant;

/// Time source for control code: reads and sleeps go through the plant, so
/// "sleeping" advances simulated time instead of blocking the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer;

impl Timer {
    pub fn new() -> Self {
        Timer
    }

    pub fn get_time<P: Plant>(&self, plant: &mut P) -> Result<Clock> {
        plant.update_simulation()
    }

    pub fn sleep<P: Plant>(&self, plant: &mut P, duration: Clock) -> Result<Clock> {
        plant.set_adcs_sleep(duration)
    }

    /// Run `op`, sleeping out every `DeviceNotReady` it reports and retrying.
    /// Any other error, including the run timing out while asleep, is returned.
    pub fn retry_until_ready<P, T>(
        &self,
        plant: &mut P,
        mut op: impl FnMut(&mut P) -> Result<T>,
    ) -> Result<T>
    where
        P: Plant,
    {
        loop {
            match op(plant) {
                Err(AdcsError::DeviceNotReady { device, remaining }) => {
                    debug!(%device, %remaining, "device not ready, sleeping");
                    self.sleep(plant, remaining)?;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::presets;
    use crate::device::{Gyroscope, Sensor};
    use crate::sim::{FrozenClock, NullSink, Simulator};
    use nalgebra::Vector3;

    #[test]
    fn sleep_advances_simulated_time() {
        let mut sim = Simulator::from_config(&presets::orthogonal_triad(), NullSink, FrozenClock).unwrap();
        let timer = Timer::new();
        assert_eq!(timer.get_time(&mut sim).unwrap(), Clock::ZERO);
        assert_eq!(timer.sleep(&mut sim, Clock::new(250, 1)).unwrap(), Clock::new(250, 1));
        assert_eq!(timer.get_time(&mut sim).unwrap(), Clock::new(250, 1));
    }

    #[test]
    fn retry_sleeps_exactly_the_remainder() {
        let mut sim = Simulator::from_config(&presets::orthogonal_triad(), NullSink, FrozenClock).unwrap();
        let mut gyro = Gyroscope::new(Clock::new(40, 0), Vector3::zeros());
        let timer = Timer::new();

        let reading = timer.retry_until_ready(&mut sim, |p| gyro.take_measurement(p)).unwrap();
        assert_eq!(reading.time_taken, Clock::new(40, 0));
    }
}
