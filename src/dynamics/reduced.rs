//! Galerkin reduced-order model.
//!
//! The basis `Φ` spans the `rank` dominant left singular directions of the
//! column-normalised Krylov matrix `[B, AB, …, A⁵B]` of the upright
//! linearisation. The model evaluates `ΦΦᵀ·f(ΦΦᵀx, u)` with `f` the full
//! model, so `rank = 6` reproduces the full model up to round-off.

use nalgebra::{Const, Dyn, Matrix6, OMatrix, U6};

use super::full::FullDynamics;
use super::{Dynamics, PhysicsParams, State, linearize};
use crate::error::{ConfigError, Result};

#[derive(Clone, Debug)]
pub struct ReducedOrderDynamics {
    full: FullDynamics,
    basis: OMatrix<f64, U6, Dyn>,
    projector: Matrix6<f64>,
}

impl ReducedOrderDynamics {
    pub fn new(params: PhysicsParams, rank: usize) -> Result<Self> {
        if !(1..=6).contains(&rank) {
            return Err(ConfigError::OutOfRange {
                field: "dynamics.rank".into(),
                value: rank as f64,
                min: 1.0,
                max: 6.0,
            }
            .into());
        }
        let full = FullDynamics::new(params);
        let (a, b) = linearize(&full, &State::zeros(), 0.0);

        let mut krylov = Matrix6::zeros();
        let mut col = b;
        for j in 0..6 {
            let n = col.norm();
            if n > 0.0 && n.is_finite() {
                krylov.set_column(j, &(col / n));
            }
            col = a * col;
        }

        let svd = krylov.svd(true, false);
        let u = svd
            .u
            .ok_or_else(|| ConfigError::invalid("dynamics.rank", "basis decomposition failed"))?;
        let mut order: Vec<usize> = (0..6).collect();
        order.sort_by(|&i, &j| svd.singular_values[j].total_cmp(&svd.singular_values[i]));

        let mut basis = OMatrix::<f64, U6, Dyn>::zeros_generic(Const::<6>, Dyn(rank));
        for (k, &i) in order.iter().take(rank).enumerate() {
            basis.set_column(k, &u.column(i));
        }
        let projector = &basis * basis.transpose();
        Ok(Self {
            full,
            basis,
            projector,
        })
    }

    pub fn rank(&self) -> usize {
        self.basis.ncols()
    }

    /// Orthonormal basis, one column per retained direction.
    pub fn basis(&self) -> &OMatrix<f64, U6, Dyn> {
        &self.basis
    }
}

impl Dynamics for ReducedOrderDynamics {
    fn derivative(&self, state: &State, u: f64) -> State {
        let projected = self.projector * state;
        self.projector * self.full.derivative(&projected, u)
    }

    fn params(&self) -> &PhysicsParams {
        self.full.params()
    }
}
