//! Linear sliding surface and its affine derivative.

use nalgebra::Vector3;

use crate::dynamics::matrices::{INPUT, MassInverse, PlantMatrices};
use crate::dynamics::{PhysicsParams, State};

/// `s = k1·θ̇1 + k2·φ̇2 + λ1·θ1 + λ2·φ2 + k_ẋ·ẋ + k_x·x`, with `φ2 = θ2 − θ1`.
///
/// Measuring the second link relative to the first keeps every coefficient
/// positive for a stable manifold.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlidingSurface {
    pub k1: f64,
    pub k2: f64,
    pub lambda1: f64,
    pub lambda2: f64,
    pub k_cart_rate: f64,
    pub k_cart: f64,
}

/// `ṡ = a·u + b` at one state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRate {
    pub a: f64,
    pub b: f64,
}

impl SlidingSurface {
    /// Angle-only surface.
    pub fn new(k1: f64, k2: f64, lambda1: f64, lambda2: f64) -> Self {
        Self {
            k1,
            k2,
            lambda1,
            lambda2,
            ..Self::default()
        }
    }

    /// Adds cart position and rate terms.
    #[must_use]
    pub fn with_cart(self, k_cart_rate: f64, k_cart: f64) -> Self {
        Self {
            k_cart_rate,
            k_cart,
            ..self
        }
    }

    #[inline]
    pub fn value(&self, x: &State) -> f64 {
        let phi2 = x[2] - x[1];
        let dphi2 = x[5] - x[4];
        self.k1 * x[4]
            + self.k2 * dphi2
            + self.lambda1 * x[1]
            + self.lambda2 * phi2
            + self.k_cart_rate * x[3]
            + self.k_cart * x[0]
    }

    /// Row `L` with `s = L·q̇ + (position terms)`, in generalised coordinates.
    #[inline]
    pub fn rate_row(&self) -> Vector3<f64> {
        Vector3::new(self.k_cart_rate, self.k1 - self.k2, self.k2)
    }

    /// Position-term derivative, i.e. the part of `ṡ` that does not pass
    /// through the accelerations.
    #[inline]
    fn kinematic_rate(&self, x: &State) -> f64 {
        self.k_cart * x[3] + self.lambda1 * x[4] + self.lambda2 * (x[5] - x[4])
    }

    /// Affine decomposition of `ṡ` under the full model.
    pub fn rate(&self, p: &PhysicsParams, x: &State) -> SurfaceRate {
        let pm = PlantMatrices::full(p, x);
        let inv = MassInverse::for_params(&pm.mass, p);
        let l = self.rate_row();
        SurfaceRate {
            a: l.dot(&inv.apply(&INPUT)),
            b: l.dot(&inv.apply(&pm.drift())) + self.kinematic_rate(x),
        }
    }
}

/// `|a|` floored to `floor`, sign preserved (zero counts as positive).
#[inline]
pub fn floor_magnitude(a: f64, floor: f64) -> f64 {
    if a.abs() >= floor {
        a
    } else if a < 0.0 {
        -floor
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::{Dynamics, FullDynamics};

    #[test]
    fn affine_rate_matches_finite_difference() {
        let p = PhysicsParams::default();
        let d = FullDynamics::new(p.clone());
        let surf = SlidingSurface::new(1.0, 1.0, 2.0, 10.0).with_cart(0.4, 0.2);
        let x = State::new(0.1, 0.2, -0.1, 0.3, -0.5, 0.4);
        let u = 3.0;
        let r = surf.rate(&p, &x);
        let xd = d.derivative(&x, u);
        // ṡ is linear in ẋ(state), so the directional derivative is exact.
        let expected = surf.value(&xd);
        assert!((r.a * u + r.b - expected).abs() < 1e-9);
    }

    #[test]
    fn floor_keeps_sign() {
        assert_eq!(floor_magnitude(-1e-9, 1e-3), -1e-3);
        assert_eq!(floor_magnitude(0.0, 1e-3), 1e-3);
        assert_eq!(floor_magnitude(0.5, 1e-3), 0.5);
    }
}
