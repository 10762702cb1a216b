use nalgebra::{Matrix3, Vector3};

use super::{ReactionWheelBuilder, SatelliteConfig, SatelliteConfigBuilder, SensorConfig};
use crate::clock::Clock;
use crate::device::ActuatorBounds;
use crate::sim::policy::{RunPolicy, StepPolicy};

// ---------------------------------------------------------------------------
// Preset satellites
// ---------------------------------------------------------------------------

/// 3U-class body with one wheel on each body axis, at rest.
pub fn orthogonal_triad() -> SatelliteConfig {
    let wheel = |axis: Vector3<f64>| {
        ReactionWheelBuilder::new(axis)
            .polling_interval(Clock::new(10, 0))
            .mount_position(axis * 0.03)
            .inertia(1e-4)
            .bounds(ActuatorBounds::symmetric(100.0, 650.0))
            .build()
    };

    SatelliteConfigBuilder::new()
        .inertia(Matrix3::from_diagonal(&Vector3::new(0.04, 0.05, 0.06)))
        .gyroscope(SensorConfig::new(Clock::new(20, 0), Vector3::zeros()))
        .accelerometer(SensorConfig::new(Clock::new(20, 0), Vector3::new(0.05, 0.0, 0.0)))
        .wheel(wheel(Vector3::x()))
        .wheel(wheel(Vector3::y()))
        .wheel(wheel(Vector3::z()))
        .run(RunPolicy::default())
        .build()
}

/// Four wheels in the classic pyramid: spin axes tilted 35.26° above the
/// body x-y plane, 90° apart in azimuth. Any three span the body frame, so
/// one wheel can fail without losing full-axis control.
pub fn pyramid() -> SatelliteConfig {
    let elevation = (1.0_f64 / 3.0_f64.sqrt()).asin();
    #[rustfmt::skip]
    let inertia = Matrix3::new(
        0.080, 0.002, 0.000,
        0.002, 0.100, 0.001,
        0.000, 0.001, 0.120,
    );
    let mut builder = SatelliteConfigBuilder::new()
        .inertia(inertia)
        .gyroscope(SensorConfig::new(Clock::new(50, 0), Vector3::zeros()))
        .accelerometer(SensorConfig::new(Clock::new(50, 0), Vector3::new(0.0, 0.08, 0.0)))
        .run(RunPolicy {
            timeout: Clock::from_secs(120),
            step: StepPolicy::adaptive(Clock::new(1, 0), Clock::new(20, 0), 1e-4),
            report_interval: Clock::new(250, 0),
        });

    for i in 0..4 {
        let azimuth = i as f64 * std::f64::consts::FRAC_PI_2;
        let axis = Vector3::new(
            elevation.cos() * azimuth.cos(),
            elevation.cos() * azimuth.sin(),
            elevation.sin(),
        );
        builder = builder.wheel(
            ReactionWheelBuilder::new(axis)
                .polling_interval(Clock::new(10, 0))
                .mount_position(axis * 0.04)
                .inertia(2e-4)
                .bounds(ActuatorBounds::symmetric(80.0, 650.0))
                .build(),
        );
    }
    builder.build()
}
