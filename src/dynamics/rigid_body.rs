use nalgebra::{Matrix3, Vector3};

use crate::dynamics::state::{ReactionWheelState, SatelliteState, SystemSnapshot};

// ---------------------------------------------------------------------------
// Rotational equations of motion
// ---------------------------------------------------------------------------

/// Torque a single wheel exerts on the body, before the sign flip.
///
///   I_w·alpha_w·axis               (spin-up reaction)
/// + omega_b × (axis·omega_w·I_w)   (gyroscopic coupling of stored momentum)
pub fn wheel_torque(wheel: &ReactionWheelState, omega_b: &Vector3<f64>) -> Vector3<f64> {
    wheel.axis * (wheel.inertia * wheel.alpha) + omega_b.cross(&wheel.momentum())
}

/// Euler's rotational equation with internal momentum exchange:
///
///   alpha_b = I_b⁻¹ · ( −omega_b × (I_b·omega_b) − Σ wheel torques )
pub fn body_acceleration(
    satellite: &SatelliteState,
    inertia_inv: &Matrix3<f64>,
    wheels: &[ReactionWheelState],
) -> Vector3<f64> {
    let omega = &satellite.omega_b;
    let wheel_sum: Vector3<f64> = wheels.iter().map(|w| wheel_torque(w, omega)).sum();
    let gyroscopic = omega.cross(&(satellite.inertia_b * omega));
    inertia_inv * (-gyroscopic - wheel_sum)
}

// ---------------------------------------------------------------------------
// Explicit Euler step
// ---------------------------------------------------------------------------

/// Advance the whole system by `dt` seconds.
///
/// Wheel accelerations are inputs (set by actuator commands) and are not
/// integrated here. Sensor values are derived from the new body state; the
/// caller stamps the gyroscope with the step's end time.
pub fn euler_step(snapshot: &mut SystemSnapshot, inertia_inv: &Matrix3<f64>, dt: f64) {
    let alpha_b = body_acceleration(&snapshot.satellite, inertia_inv, &snapshot.reaction_wheels);

    let sat = &mut snapshot.satellite;
    sat.alpha_b = alpha_b;
    sat.omega_b += alpha_b * dt;
    sat.theta_b += sat.omega_b * dt;

    for wheel in snapshot.reaction_wheels.iter_mut() {
        wheel.omega += wheel.alpha * dt;
    }

    snapshot.accelerometer.measurement = alpha_b.cross(&snapshot.accelerometer.position);

    let gyro = &mut snapshot.gyroscope;
    gyro.position = sat.theta_b;
    gyro.velocity = sat.omega_b;
    gyro.acceleration = sat.alpha_b;
}

/// Largest absolute component of the body's angular acceleration.
pub fn peak_body_acceleration(satellite: &SatelliteState) -> f64 {
    satellite.alpha_b.amax()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::dynamics::state::{AccelerometerState, GyroscopeState};

    fn snapshot(inertia: Matrix3<f64>, omega: Vector3<f64>, wheels: Vec<ReactionWheelState>) -> SystemSnapshot {
        SystemSnapshot {
            satellite: SatelliteState {
                theta_b: Vector3::zeros(),
                omega_b: omega,
                alpha_b: Vector3::zeros(),
                inertia_b: inertia,
            },
            accelerometer: AccelerometerState {
                measurement: Vector3::zeros(),
                position: Vector3::new(0.5, 0.0, 0.0),
            },
            gyroscope: GyroscopeState {
                position: Vector3::zeros(),
                velocity: omega,
                acceleration: Vector3::zeros(),
                mount_position: Vector3::zeros(),
                time_taken: Clock::ZERO,
            },
            reaction_wheels: wheels,
        }
    }

    fn z_wheel(alpha: f64) -> ReactionWheelState {
        ReactionWheelState {
            omega: 0.0,
            alpha,
            inertia: 0.01,
            axis: Vector3::z(),
            position: Vector3::zeros(),
        }
    }

    fn integrate(s: &mut SystemSnapshot, steps: usize, dt: f64) {
        let inv = s.satellite.inertia_b.try_inverse().unwrap();
        for _ in 0..steps {
            euler_step(s, &inv, dt);
        }
    }

    #[test]
    fn body_at_rest_stays_at_rest() {
        let mut s = snapshot(Matrix3::from_diagonal(&Vector3::new(2.0, 3.0, 4.0)), Vector3::zeros(), vec![z_wheel(0.0)]);
        integrate(&mut s, 5_000, 0.001);
        assert!(s.satellite.theta_b.norm() < 1e-12, "theta drifted to {}", s.satellite.theta_b);
        assert!(s.satellite.omega_b.norm() < 1e-12);
    }

    #[test]
    fn principal_axis_spin_is_uniform() {
        let omega = Vector3::new(0.0, 0.0, 0.1);
        let mut s = snapshot(Matrix3::from_diagonal(&Vector3::new(2.0, 3.0, 4.0)), omega, vec![]);
        integrate(&mut s, 10_000, 0.001);
        let expected = omega * 10.0;
        assert!(
            (s.satellite.theta_b - expected).norm() < 1e-9,
            "theta {} should be omega·T {}",
            s.satellite.theta_b,
            expected
        );
        assert!(s.satellite.alpha_b.norm() < 1e-15);
    }

    #[test]
    fn wheel_spin_up_counter_rotates_body() {
        let mut s = snapshot(Matrix3::identity() * 2.0, Vector3::zeros(), vec![z_wheel(10.0)]);
        integrate(&mut s, 1_000, 0.001);
        assert!(s.satellite.omega_b.z < 0.0, "body should spin opposite to the wheel");
        assert!((s.reaction_wheels[0].omega - 10.0).abs() < 1e-9);
        // Single-axis exchange: total momentum stays at zero.
        assert!(s.total_momentum().norm() < 1e-12, "momentum {}", s.total_momentum());
    }

    #[test]
    fn gyroscopic_coupling_acts_off_axis() {
        let mut wheel = z_wheel(0.0);
        wheel.omega = 100.0;
        let torque = wheel_torque(&wheel, &Vector3::new(0.1, 0.0, 0.0));
        // x × z = −y
        assert!(torque.y < 0.0);
        assert!(torque.x.abs() < 1e-15 && torque.z.abs() < 1e-15);
    }

    #[test]
    fn accelerometer_sees_tangential_acceleration() {
        let mut s = snapshot(Matrix3::identity(), Vector3::zeros(), vec![z_wheel(1.0)]);
        integrate(&mut s, 1, 0.01);
        let expected = s.satellite.alpha_b.cross(&Vector3::new(0.5, 0.0, 0.0));
        assert!((s.accelerometer.measurement - expected).norm() < 1e-15);
        assert_eq!(s.gyroscope.acceleration, s.satellite.alpha_b);
        assert!(peak_body_acceleration(&s.satellite) > 0.0);
    }
}
