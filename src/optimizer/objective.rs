//! Batched objective: gain vectors in, candidate costs out.

use crate::controllers::{Controller, ControllerConfig, ControllerKind};
use crate::dynamics::{Dynamics, DynamicsModel, State};
use crate::error::{ConfigError, Result};
use crate::sim::{BatchSimulator, SimulationConfig, SimulationResult};

use super::cost::{CandidateCost, CostEvaluator};

/// Everything needed to score a gain vector.
#[derive(Clone, Debug)]
pub struct Objective {
    simulator: BatchSimulator<DynamicsModel>,
    kind: ControllerKind,
    settings: ControllerConfig,
    initial_conditions: Vec<State>,
    evaluator: CostEvaluator,
}

impl Objective {
    pub fn new(
        dynamics: DynamicsModel,
        simulation: SimulationConfig,
        kind: ControllerKind,
        settings: ControllerConfig,
        initial_conditions: Vec<State>,
        evaluator: CostEvaluator,
    ) -> Result<Self> {
        if initial_conditions.is_empty() {
            return Err(ConfigError::empty("initial_conditions").into());
        }
        settings.validate()?;
        evaluator.weights().validate()?;
        Ok(Self {
            simulator: BatchSimulator::new(dynamics, simulation)?,
            kind,
            settings,
            initial_conditions,
            evaluator,
        })
    }

    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    pub fn evaluator(&self) -> &CostEvaluator {
        &self.evaluator
    }

    /// Fresh controllers for every candidate × initial condition, run as
    /// one batch (candidate-major).
    pub fn simulate(&self, candidates: &[Vec<f64>]) -> Result<Vec<SimulationResult>> {
        let physics = self.simulator.dynamics().params();
        let dt = self.simulator.config().dt;
        let n_ic = self.initial_conditions.len();
        let mut controllers = Vec::with_capacity(candidates.len() * n_ic);
        let mut initial = Vec::with_capacity(candidates.len() * n_ic);
        for gains in candidates {
            for x0 in &self.initial_conditions {
                controllers.push(Controller::new(self.kind, gains, physics, &self.settings, dt)?);
                initial.push(*x0);
            }
        }
        self.simulator.run(&mut controllers, &initial)
    }

    /// Group candidate-major runs back per candidate.
    pub fn measure(&self, runs: &[SimulationResult]) -> Vec<CandidateCost> {
        runs.chunks(self.initial_conditions.len())
            .map(|chunk| self.evaluator.candidate(chunk))
            .collect()
    }

    /// `measure(simulate(candidates))`.
    pub fn evaluate(&self, candidates: &[Vec<f64>]) -> Result<Vec<CandidateCost>> {
        let runs = self.simulate(candidates)?;
        Ok(self.measure(&runs))
    }
}
