/*!
Plant models of the cart + double pendulum.

What it does
- Maps `(state, force)` to the state derivative through
  `M(q)·q̈ = B·u + friction − C(q,q̇)·q̇ − G(q)`.
- Guards the mass-matrix solve against ill-conditioning (Tikhonov fallback).
- Offers three interchangeable models behind [`Dynamics`]:
  full nonlinear, small-angle linearised, and a Galerkin reduced-order model.

How to use
- Build a [`DynamicsModel`] from a [`DynamicsKind`] and [`PhysicsParams`].
- Call [`Dynamics::derivative`]; it is pure and safe to share across threads.

What it does NOT do
- No integration; see `sim`. No control; see `controllers`.
*/

pub mod full;
pub mod linearized;
pub mod matrices;
pub mod params;
pub mod reduced;

use nalgebra::{Matrix6, Vector6};
use serde::{Deserialize, Serialize};

pub use full::FullDynamics;
pub use linearized::LinearizedDynamics;
pub use matrices::{MassInverse, PlantMatrices};
pub use params::PhysicsParams;
pub use reduced::ReducedOrderDynamics;

use crate::error::{ConfigError, Result};

/// Plant state `[x, θ1, θ2, ẋ, θ̇1, θ̇2]`.
pub type State = Vector6<f64>;

/// Plug-in boundary for plant models.
pub trait Dynamics: Send + Sync {
    /// `ẋ = f(x, u)`. Pure.
    fn derivative(&self, state: &State, u: f64) -> State;

    fn params(&self) -> &PhysicsParams;
}

/// Which plant model to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicsKind {
    #[default]
    Full,
    Linearized,
    /// Projection onto the `rank` dominant controllable directions.
    ReducedOrder { rank: usize },
}

impl DynamicsKind {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        match *self {
            Self::ReducedOrder { rank } if !(1..=6).contains(&rank) => {
                Err(ConfigError::OutOfRange {
                    field: "dynamics.rank".into(),
                    value: rank as f64,
                    min: 1.0,
                    max: 6.0,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Closed set of plant models.
#[derive(Clone, Debug)]
pub enum DynamicsModel {
    Full(FullDynamics),
    Linearized(LinearizedDynamics),
    ReducedOrder(ReducedOrderDynamics),
}

impl DynamicsModel {
    /// Validate and build.
    pub fn new(kind: DynamicsKind, params: PhysicsParams) -> Result<Self> {
        params.validate()?;
        kind.validate()?;
        Ok(match kind {
            DynamicsKind::Full => Self::Full(FullDynamics::new(params)),
            DynamicsKind::Linearized => Self::Linearized(LinearizedDynamics::new(params)),
            DynamicsKind::ReducedOrder { rank } => {
                Self::ReducedOrder(ReducedOrderDynamics::new(params, rank)?)
            }
        })
    }

    pub fn kind(&self) -> DynamicsKind {
        match self {
            Self::Full(_) => DynamicsKind::Full,
            Self::Linearized(_) => DynamicsKind::Linearized,
            Self::ReducedOrder(r) => DynamicsKind::ReducedOrder { rank: r.rank() },
        }
    }
}

impl Dynamics for DynamicsModel {
    #[inline]
    fn derivative(&self, state: &State, u: f64) -> State {
        match self {
            Self::Full(d) => d.derivative(state, u),
            Self::Linearized(d) => d.derivative(state, u),
            Self::ReducedOrder(d) => d.derivative(state, u),
        }
    }

    fn params(&self) -> &PhysicsParams {
        match self {
            Self::Full(d) => d.params(),
            Self::Linearized(d) => d.params(),
            Self::ReducedOrder(d) => d.params(),
        }
    }
}

/// Kinetic plus potential energy of the full model (cart height is the datum).
pub fn mechanical_energy(p: &PhysicsParams, state: &State) -> f64 {
    let m = PlantMatrices::full(p, state).mass;
    let qd = state.fixed_rows::<3>(3);
    let kinetic = 0.5 * qd.dot(&(m * qd));
    let potential = p.gravity * (p.h1() * state[1].cos() + p.h2() * state[2].cos());
    kinetic + potential
}

/// Central-difference Jacobians `(A, B)` of `model` around `(state, u)`.
pub fn linearize<D: Dynamics + ?Sized>(model: &D, state: &State, u: f64) -> (Matrix6<f64>, State) {
    const EPS: f64 = 1e-6;
    let mut a = Matrix6::zeros();
    for j in 0..6 {
        let mut hi = *state;
        let mut lo = *state;
        hi[j] += EPS;
        lo[j] -= EPS;
        let col = (model.derivative(&hi, u) - model.derivative(&lo, u)) / (2.0 * EPS);
        a.set_column(j, &col);
    }
    let b = (model.derivative(state, u + EPS) - model.derivative(state, u - EPS)) / (2.0 * EPS);
    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_out_of_range_is_rejected() {
        let err = DynamicsModel::new(
            DynamicsKind::ReducedOrder { rank: 7 },
            PhysicsParams::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("dynamics.rank"));
    }

    #[test]
    fn upright_is_an_equilibrium() {
        for kind in [
            DynamicsKind::Full,
            DynamicsKind::Linearized,
            DynamicsKind::ReducedOrder { rank: 4 },
        ] {
            let m = DynamicsModel::new(kind, PhysicsParams::default()).unwrap();
            assert!(m.derivative(&State::zeros(), 0.0).norm() < 1e-12);
        }
    }

    #[test]
    fn energy_at_upright_rest() {
        let p = PhysicsParams::default();
        assert!((mechanical_energy(&p, &State::zeros()) - p.upright_energy()).abs() < 1e-12);
    }
}
