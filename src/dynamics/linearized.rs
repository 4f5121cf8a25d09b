//! Small-angle model about the upright equilibrium.

use nalgebra::Matrix3;

use super::matrices::{MassInverse, PlantMatrices, upright_mass};
use super::{Dynamics, PhysicsParams, State};

/// The mass matrix is constant here, so its inverse is computed once.
#[derive(Clone, Debug)]
pub struct LinearizedDynamics {
    params: PhysicsParams,
    inverse: Matrix3<f64>,
}

impl LinearizedDynamics {
    pub fn new(params: PhysicsParams) -> Self {
        let inverse = MassInverse::for_params(&upright_mass(&params), &params).matrix;
        Self { params, inverse }
    }
}

impl Dynamics for LinearizedDynamics {
    fn derivative(&self, state: &State, u: f64) -> State {
        let pm = PlantMatrices::linearized(&self.params, state);
        let qdd = self.inverse * pm.rhs(u);
        State::new(state[3], state[4], state[5], qdd[0], qdd[1], qdd[2])
    }

    fn params(&self) -> &PhysicsParams {
        &self.params
    }
}
