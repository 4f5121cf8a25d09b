//! Full nonlinear model with every coupling term.

use super::matrices::{MassInverse, PlantMatrices};
use super::{Dynamics, PhysicsParams, State};

#[derive(Clone, Debug)]
pub struct FullDynamics {
    params: PhysicsParams,
}

impl FullDynamics {
    pub fn new(params: PhysicsParams) -> Self {
        Self { params }
    }
}

impl Dynamics for FullDynamics {
    fn derivative(&self, state: &State, u: f64) -> State {
        let pm = PlantMatrices::full(&self.params, state);
        let qdd = MassInverse::for_params(&pm.mass, &self.params).apply(&pm.rhs(u));
        State::new(state[3], state[4], state[5], qdd[0], qdd[1], qdd[2])
    }

    fn params(&self) -> &PhysicsParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushing_right_accelerates_cart_right_and_tips_links_left() {
        let d = FullDynamics::new(PhysicsParams::default());
        let xd = d.derivative(&State::zeros(), 10.0);
        assert!(xd[3] > 0.0);
        assert!(xd[4] < 0.0);
    }

    #[test]
    fn tilted_link_falls_further() {
        let d = FullDynamics::new(PhysicsParams::default());
        let xd = d.derivative(&State::new(0.0, 0.1, 0.1, 0.0, 0.0, 0.0), 0.0);
        assert!(xd[4] > 0.0);
    }
}
