//! Configuration-dependent plant matrices and the guarded mass-matrix solve.

use nalgebra::{Matrix3, Vector3, Vector6};
use tracing::debug;

use super::params::PhysicsParams;

/// Input map: the actuator pushes the cart only.
pub const INPUT: Vector3<f64> = Vector3::new(1.0, 0.0, 0.0);

/// Terms of `M(q)·q̈ = B·u + friction − C(q,q̇)·q̇ − G(q)` at one state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlantMatrices {
    pub mass: Matrix3<f64>,
    /// Velocity coupling already multiplied by `q̇`.
    pub coriolis: Vector3<f64>,
    pub gravity: Vector3<f64>,
    pub friction: Vector3<f64>,
}

impl PlantMatrices {
    /// Every coupling term at `state`.
    pub fn full(p: &PhysicsParams, state: &Vector6<f64>) -> Self {
        let (th1, th2) = (state[1], state[2]);
        let (dth1, dth2) = (state[4], state[5]);
        let (h1, h2, h3) = (p.h1(), p.h2(), p.h3());
        let (s1, c1) = th1.sin_cos();
        let (s2, c2) = th2.sin_cos();
        let (s12, c12) = (th1 - th2).sin_cos();

        #[rustfmt::skip]
        let mass = Matrix3::new(
            p.total_mass(), h1 * c1, h2 * c2,
            h1 * c1, p.j1(), h3 * c12,
            h2 * c2, h3 * c12, p.j2(),
        );
        let coriolis = Vector3::new(
            -h1 * s1 * dth1 * dth1 - h2 * s2 * dth2 * dth2,
            h3 * s12 * dth2 * dth2,
            -h3 * s12 * dth1 * dth1,
        );
        let gravity = Vector3::new(0.0, -h1 * p.gravity * s1, -h2 * p.gravity * s2);
        Self {
            mass,
            coriolis,
            gravity,
            friction: friction(p, state),
        }
    }

    /// Small-angle model: mass matrix frozen at upright, no velocity
    /// coupling, `sinθ ≈ θ`.
    pub fn linearized(p: &PhysicsParams, state: &Vector6<f64>) -> Self {
        let (h1, h2) = (p.h1(), p.h2());
        Self {
            mass: upright_mass(p),
            coriolis: Vector3::zeros(),
            gravity: Vector3::new(0.0, -h1 * p.gravity * state[1], -h2 * p.gravity * state[2]),
            friction: friction(p, state),
        }
    }

    /// Everything on the right-hand side except the actuator term.
    #[inline]
    pub fn drift(&self) -> Vector3<f64> {
        self.friction - self.coriolis - self.gravity
    }

    /// `B·u + friction − C·q̇ − G`.
    #[inline]
    pub fn rhs(&self, u: f64) -> Vector3<f64> {
        INPUT * u + self.drift()
    }
}

/// Mass matrix at `θ1 = θ2 = 0`.
pub fn upright_mass(p: &PhysicsParams) -> Matrix3<f64> {
    let (h1, h2, h3) = (p.h1(), p.h2(), p.h3());
    #[rustfmt::skip]
    let m = Matrix3::new(
        p.total_mass(), h1, h2,
        h1, p.j1(), h3,
        h2, h3, p.j2(),
    );
    m
}

/// Viscous friction; the joint-2 term acts on the relative rate.
#[inline]
fn friction(p: &PhysicsParams, state: &Vector6<f64>) -> Vector3<f64> {
    let rel = state[5] - state[4];
    Vector3::new(
        -p.cart_friction * state[3],
        -p.joint1_friction * state[4] + p.joint2_friction * rel,
        -p.joint2_friction * rel,
    )
}

/// Induced 1-norm (maximum absolute column sum).
#[inline]
pub fn norm1(m: &Matrix3<f64>) -> f64 {
    m.column_iter().map(|c| c.lp_norm(1)).fold(0.0, f64::max)
}

/// 1-norm condition number, `None` if `m` is not invertible.
pub fn condition_number(m: &Matrix3<f64>) -> Option<f64> {
    m.try_inverse().map(|inv| norm1(m) * norm1(&inv))
}

/// Linear operator standing in for `M⁻¹`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassInverse {
    pub matrix: Matrix3<f64>,
    /// `true` when the Tikhonov fallback produced `matrix`.
    pub regularized: bool,
}

impl MassInverse {
    /// Plain inverse while `cond₁(M) ≤ threshold`, otherwise
    /// `(MᵀM + λI)⁻¹Mᵀ`.
    ///
    /// Runs on every derivative evaluation, so the fallback logs at debug
    /// level only.
    pub fn new(mass: &Matrix3<f64>, threshold: f64, lambda: f64) -> Self {
        if let Some(inv) = mass.try_inverse() {
            let cond = norm1(mass) * norm1(&inv);
            if cond <= threshold {
                return Self {
                    matrix: inv,
                    regularized: false,
                };
            }
            debug!(cond, threshold, "ill-conditioned mass matrix, using regularised solve");
        } else {
            debug!(threshold, "singular mass matrix, using regularised solve");
        }
        let mt = mass.transpose();
        let normal = mt * mass + Matrix3::identity() * lambda;
        let matrix = normal
            .cholesky()
            .map(|c| c.inverse() * mt)
            .unwrap_or_else(|| Matrix3::repeat(f64::NAN));
        Self {
            matrix,
            regularized: true,
        }
    }

    /// Using the thresholds carried by `p`.
    #[inline]
    pub fn for_params(mass: &Matrix3<f64>, p: &PhysicsParams) -> Self {
        Self::new(mass, p.condition_threshold, p.regularization)
    }

    #[inline]
    pub fn apply(&self, rhs: &Vector3<f64>) -> Vector3<f64> {
        self.matrix * rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_matrix_is_symmetric_positive_definite() {
        let p = PhysicsParams::default();
        let x = Vector6::new(0.3, 0.7, -1.2, 0.0, 0.0, 0.0);
        let m = PlantMatrices::full(&p, &x).mass;
        assert_eq!(m, m.transpose());
        assert!(m.cholesky().is_some());
    }

    #[test]
    fn upright_full_and_linearized_agree() {
        let p = PhysicsParams::default();
        let x = Vector6::zeros();
        assert_eq!(PlantMatrices::full(&p, &x), PlantMatrices::linearized(&p, &x));
    }

    #[test]
    fn singular_matrix_takes_regularized_path() {
        let m = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0);
        let inv = MassInverse::new(&m, 1e10, 1e-8);
        assert!(inv.regularized);
        assert!(inv.matrix.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn well_conditioned_matrix_inverts_exactly() {
        let p = PhysicsParams::default();
        let m = upright_mass(&p);
        let inv = MassInverse::for_params(&m, &p);
        assert!(!inv.regularized);
        assert!((inv.matrix * m - Matrix3::identity()).norm() < 1e-9);
    }
}
