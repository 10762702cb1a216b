use nalgebra::{DVector, Matrix3, Matrix3xX, MatrixXx3, Vector3};

use crate::device::ReactionWheel;
use crate::error::{AdcsError, Result};

/// Reciprocal condition number of `A·Aᵗ` below which the wheel axes are
/// treated as not spanning the body frame.
const MIN_RECIPROCAL_CONDITION: f64 = 1e-9;

/// Fraction of the wheel limit that a saturated command is scaled to.
pub const SATURATION_MARGIN: f64 = 0.99;

// ---------------------------------------------------------------------------
// Torque allocation
// ---------------------------------------------------------------------------

/// Splits a body torque over N wheels with the minimum-norm solution
/// `t = Aᵗ(AAᵗ)⁻¹·τ`, where the columns of `A` are the wheel spin axes.
#[derive(Debug, Clone)]
pub struct TorqueAllocator {
    axes: Matrix3xX<f64>,
    pseudo_inverse: MatrixXx3<f64>,
    max_torque: DVector<f64>,
}

impl TorqueAllocator {
    pub fn new(axes: &[Vector3<f64>], max_torque: &[f64]) -> Result<Self> {
        if axes.len() != max_torque.len() {
            return Err(AdcsError::InvalidDimensions {
                what: "wheel torque limits".into(),
                expected: axes.len(),
                actual: max_torque.len(),
            });
        }
        if let Some((i, limit)) = max_torque.iter().enumerate().find(|(_, t)| !(t.is_finite() && **t > 0.0)) {
            return Err(AdcsError::config(
                format!("reaction_wheels[{}].max_torque", i),
                format!("must be positive, got {}", limit),
            ));
        }
        if axes.len() < 3 {
            return Err(AdcsError::DegenerateAllocation {
                wheels: axes.len(),
                reason: "at least three wheels are needed for three-axis control".into(),
            });
        }

        let a = Matrix3xX::from_columns(axes);
        let aat: Matrix3<f64> = &a * a.transpose();

        let sv = aat.singular_values();
        let (lo, hi) = (sv.min(), sv.max());
        if !(hi > 0.0 && lo / hi >= MIN_RECIPROCAL_CONDITION) {
            return Err(AdcsError::DegenerateAllocation {
                wheels: axes.len(),
                reason: format!("wheel axes do not span three dimensions (A·Aᵗ singular values {:.3e}..{:.3e})", lo, hi),
            });
        }
        let inverse = aat.try_inverse().ok_or_else(|| AdcsError::DegenerateAllocation {
            wheels: axes.len(),
            reason: "A·Aᵗ is not invertible".into(),
        })?;

        Ok(Self {
            pseudo_inverse: a.transpose() * inverse,
            axes: a,
            max_torque: DVector::from_column_slice(max_torque),
        })
    }

    pub fn from_wheels(wheels: &[ReactionWheel]) -> Result<Self> {
        let axes: Vec<Vector3<f64>> = wheels.iter().map(|w| w.axis()).collect();
        let limits: Vec<f64> = wheels.iter().map(|w| w.max_torque()).collect();
        Self::new(&axes, &limits)
    }

    pub fn wheel_count(&self) -> usize {
        self.axes.ncols()
    }

    /// Unsaturated per-wheel torques for `torque`.
    pub fn allocate(&self, torque: &Vector3<f64>) -> DVector<f64> {
        &self.pseudo_inverse * torque
    }

    /// Body torque produced by a set of wheel torques (`A·t`).
    pub fn body_torque(&self, wheel_torques: &DVector<f64>) -> Vector3<f64> {
        &self.axes * wheel_torques
    }

    /// Scale the whole command so the worst offender sits at
    /// `SATURATION_MARGIN` of its limit. Returns whether scaling happened.
    pub fn saturate(&self, mut wheel_torques: DVector<f64>) -> (DVector<f64>, bool) {
        let worst = wheel_torques
            .iter()
            .zip(self.max_torque.iter())
            .map(|(t, max)| t.abs() / max)
            .fold(0.0_f64, f64::max);

        if worst > 1.0 {
            wheel_torques *= SATURATION_MARGIN / worst;
            (wheel_torques, true)
        } else {
            (wheel_torques, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pyramid_axes() -> Vec<Vector3<f64>> {
        let s = 1.0 / 3.0_f64.sqrt();
        let c = (2.0_f64 / 3.0).sqrt();
        vec![
            Vector3::new(c, 0.0, s),
            Vector3::new(0.0, c, s),
            Vector3::new(-c, 0.0, s),
            Vector3::new(0.0, -c, s),
        ]
    }

    #[test]
    fn orthogonal_wheels_map_one_to_one() {
        let alloc = TorqueAllocator::new(&[Vector3::x(), Vector3::y(), Vector3::z()], &[1.0; 3]).unwrap();
        let t = alloc.allocate(&Vector3::new(0.1, -0.2, 0.3));
        assert!((t - DVector::from_column_slice(&[0.1, -0.2, 0.3])).norm() < 1e-12);
    }

    #[test]
    fn pseudo_inverse_reproduces_the_request() {
        let alloc = TorqueAllocator::new(&pyramid_axes(), &[1.0; 4]).unwrap();
        for torque in [
            Vector3::new(0.01, 0.0, 0.0),
            Vector3::new(-0.02, 0.03, 0.005),
            Vector3::new(0.0, 0.0, -0.04),
        ] {
            let wheels = alloc.allocate(&torque);
            assert_eq!(wheels.len(), 4);
            let back = alloc.body_torque(&wheels);
            assert!((back - torque).norm() < 1e-12, "A·t = {} but asked for {}", back, torque);
        }
    }

    #[test]
    fn saturation_preserves_direction() {
        let alloc = TorqueAllocator::new(&pyramid_axes(), &[0.01; 4]).unwrap();
        let torque = Vector3::new(0.05, -0.02, 0.01);
        let raw = alloc.allocate(&torque);
        let (sat, scaled) = alloc.saturate(raw.clone());
        assert!(scaled);

        let worst = sat.iter().fold(0.0_f64, |m, t| m.max(t.abs()));
        assert!((worst - 0.99 * 0.01).abs() < 1e-15, "worst wheel should sit at 99% of its limit");
        assert!(sat.iter().all(|t| t.abs() <= 0.01));

        let ratio = sat[0] / raw[0];
        for (s, r) in sat.iter().zip(raw.iter()) {
            assert!((s - ratio * r).abs() < 1e-15, "whole vector scales together");
        }
    }

    #[test]
    fn mixed_limits_bind_each_wheel_to_its_own_max() {
        let limits = [0.02, 0.005, 0.01, 0.001];
        let alloc = TorqueAllocator::new(&pyramid_axes(), &limits).unwrap();
        let (sat, scaled) = alloc.saturate(alloc.allocate(&Vector3::new(0.05, -0.02, 0.01)));
        assert!(scaled);

        for (i, (t, max)) in sat.iter().zip(limits.iter()).enumerate() {
            assert!(t.abs() <= *max, "wheel {} at {} exceeds its limit {}", i, t, max);
        }
        // The smallest-limit wheel is the worst offender here, not the largest torque.
        assert!((sat[3].abs() / limits[3] - 0.99).abs() < 1e-12);
        assert!(sat[0].abs() / limits[0] < 0.99);
    }

    #[test]
    fn non_positive_torque_limit_rejected() {
        for bad in [0.0, -0.01, f64::NAN] {
            let err = TorqueAllocator::new(&pyramid_axes(), &[0.01, bad, 0.01, 0.01]).unwrap_err();
            match err {
                AdcsError::Configuration { field, .. } => assert_eq!(field, "reaction_wheels[1].max_torque"),
                other => panic!("expected a configuration error for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn within_limits_is_untouched() {
        let alloc = TorqueAllocator::new(&pyramid_axes(), &[1.0; 4]).unwrap();
        let raw = alloc.allocate(&Vector3::new(0.01, 0.01, 0.01));
        let (out, scaled) = alloc.saturate(raw.clone());
        assert!(!scaled);
        assert_eq!(out, raw);
    }

    #[test]
    fn too_few_wheels_is_degenerate() {
        let err = TorqueAllocator::new(&[Vector3::x(), Vector3::y()], &[1.0; 2]).unwrap_err();
        assert!(matches!(err, AdcsError::DegenerateAllocation { wheels: 2, .. }));
    }

    #[test]
    fn coplanar_wheels_are_degenerate() {
        let axes = [
            Vector3::x(),
            Vector3::y(),
            Vector3::new(1.0, 1.0, 0.0).normalize(),
        ];
        let err = TorqueAllocator::new(&axes, &[1.0; 3]).unwrap_err();
        assert!(matches!(err, AdcsError::DegenerateAllocation { wheels: 3, .. }));
    }

    #[test]
    fn limit_count_must_match() {
        let err = TorqueAllocator::new(&pyramid_axes(), &[1.0; 3]).unwrap_err();
        assert!(matches!(err, AdcsError::InvalidDimensions { expected: 4, actual: 3, .. }));
    }
}
