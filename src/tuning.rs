/*!
Tuning orchestrator.

What it does
- validate config → check the cost ranks good gains above inert ones →
  run the swarm → re-simulate the winner one run at a time.

What it does NOT do
- No persistence or reporting; the caller owns the [`TuningReport`].
*/

use tracing::info;

use crate::config::TuningConfig;
use crate::controllers::Controller;
use crate::dynamics::Dynamics;
use crate::error::Result;
use crate::optimizer::{Hook, OptimizationResult, ParticleSwarmOptimizer, check_ordering};
use crate::sim::{SimulationResult, Simulator};

/// Mean costs of the reference gain vectors used for the sanity check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostSanity {
    /// Variant defaults.
    pub good: f64,
    /// All gains zero: no corrective action.
    pub bad: f64,
}

#[derive(Clone, Debug)]
pub struct TuningReport {
    pub optimization: OptimizationResult,
    /// `None` when `validate_cost` is off.
    pub sanity: Option<CostSanity>,
    /// Best gains re-run from each initial condition with the single-run simulator.
    pub verification: Vec<SimulationResult>,
    pub verification_cost: f64,
}

impl TuningReport {
    pub fn best_gains(&self) -> &[f64] {
        &self.optimization.best_gains
    }

    pub fn all_verified_runs_completed(&self) -> bool {
        self.verification.iter().all(|r| !r.is_diverged())
    }
}

pub fn tune(config: &TuningConfig) -> Result<TuningReport> {
    tune_with_hooks(config, Vec::new())
}

pub fn tune_with_hooks(config: &TuningConfig, hooks: Vec<Box<dyn Hook>>) -> Result<TuningReport> {
    config.validate()?;
    let objective = config.objective()?;
    let kind = config.controller;

    let sanity = if config.validate_cost {
        let refs = [kind.default_gains().to_vec(), kind.inert_gains()];
        let costs = objective.evaluate(&refs)?;
        let sanity = CostSanity {
            good: costs[0].cost,
            bad: costs[1].cost,
        };
        check_ordering(sanity.good, sanity.bad)?;
        info!(good = sanity.good, bad = sanity.bad, "cost function ordering verified");
        Some(sanity)
    } else {
        None
    };

    let mut pso = ParticleSwarmOptimizer::new(objective, config.bounds(), config.pso.clone(), config.seed)?;
    for h in hooks {
        pso = pso.with_hook(h);
    }
    let optimization = pso.optimize()?;
    info!(
        controller = kind.name(),
        best = optimization.best_cost,
        gains = ?optimization.best_gains,
        "swarm finished"
    );

    let simulator = Simulator::new(config.build_dynamics()?, config.simulation.clone())?;
    let evaluator = pso.objective().evaluator();
    let mut verification = Vec::with_capacity(config.initial_conditions.len());
    for x0 in config.initial_states() {
        let mut controller = Controller::new(
            kind,
            &optimization.best_gains,
            simulator.dynamics().params(),
            &config.controller_settings,
            config.simulation.dt,
        )?;
        verification.push(simulator.run(&mut controller, &x0));
    }
    let verification_cost = evaluator.candidate(&verification).cost;
    info!(cost = verification_cost, "verification re-run");

    Ok(TuningReport {
        optimization,
        sanity,
        verification,
        verification_cost,
    })
}
