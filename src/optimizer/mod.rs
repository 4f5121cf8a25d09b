/*!
Particle-swarm gain tuning.

What it does
- Searches gain space inside [`GainBounds`] with a seeded particle swarm.
- Each iteration is one pass of the refinement loop:
  `simulate` (one batch over particles × initial conditions),
  `measure` (mean cost per particle), `update` (bests, then move).
- Reports best gains, best cost and per-iteration statistics.

How to use
- Build an [`Objective`], then
  `ParticleSwarmOptimizer::new(objective, bounds, pso, seed)?.optimize()?`.
- Attach observers with [`ParticleSwarmOptimizer::with_hook`].

What it does NOT do
- No early stopping: the iteration budget is fixed. Use
  [`OptimizationResult::stalled`] to detect a plateau afterwards.
*/

pub mod cost;
pub mod hooks;
pub mod objective;
pub mod swarm;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use cost::{CandidateCost, CostBreakdown, CostEvaluator, CostWeights, check_ordering};
pub use hooks::{BestTrace, Hook};
pub use objective::Objective;
pub use swarm::{Particle, Swarm};

use crate::controllers::ControllerKind;
use crate::error::{ConfigError, Result, require_finite, require_non_negative, require_range};
use crate::mechanics::stoch::seeded;
use crate::refine_try;

/// What happens to a coordinate that leaves its bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Clamp to the bound and zero that velocity component.
    #[default]
    Clip,
    /// Mirror about the bound, negate the velocity component, then clamp.
    Reflect,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsoConfig {
    pub population: usize,
    pub iterations: usize,
    pub inertia_start: f64,
    pub inertia_end: f64,
    pub cognitive: f64,
    pub social: f64,
    /// Velocity limit as a fraction of each dimension's span.
    pub max_velocity_fraction: f64,
    /// Initial velocity range as a fraction of each dimension's span.
    pub init_velocity_fraction: f64,
    pub boundary: BoundaryPolicy,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            population: 20,
            iterations: 30,
            inertia_start: 0.9,
            inertia_end: 0.4,
            cognitive: 1.5,
            social: 1.5,
            max_velocity_fraction: 0.2,
            init_velocity_fraction: 0.1,
            boundary: BoundaryPolicy::Clip,
        }
    }
}

impl PsoConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.population == 0 {
            return Err(ConfigError::invalid("pso.population", "must be at least 1"));
        }
        if self.iterations == 0 {
            return Err(ConfigError::invalid("pso.iterations", "must be at least 1"));
        }
        require_range("pso.inertia_start", self.inertia_start, 0.0, 1.0)?;
        require_range("pso.inertia_end", self.inertia_end, 0.0, 1.0)?;
        require_non_negative("pso.cognitive", self.cognitive)?;
        require_non_negative("pso.social", self.social)?;
        require_range("pso.max_velocity_fraction", self.max_velocity_fraction, 0.0, 1.0)?;
        require_range("pso.init_velocity_fraction", self.init_velocity_fraction, 0.0, 1.0)?;
        Ok(())
    }

    /// Linearly annealed inertia for 0-based `iteration`.
    pub fn inertia(&self, iteration: usize) -> f64 {
        if self.iterations <= 1 {
            return self.inertia_start;
        }
        let t = iteration as f64 / (self.iterations - 1) as f64;
        self.inertia_start + (self.inertia_end - self.inertia_start) * t.min(1.0)
    }
}

/// Per-dimension search box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GainBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl GainBounds {
    /// `[0.1·g, 5·g]` around the variant's default gains.
    pub fn around_defaults(kind: ControllerKind) -> Self {
        let d = kind.default_gains();
        Self {
            lower: d.iter().map(|g| 0.1 * g).collect(),
            upper: d.iter().map(|g| 5.0 * g).collect(),
        }
    }

    pub fn dims(&self) -> usize {
        self.lower.len()
    }

    pub fn spans(&self) -> impl Iterator<Item = f64> + '_ {
        self.lower.iter().zip(&self.upper).map(|(lo, hi)| hi - lo)
    }

    pub fn contains(&self, gains: &[f64]) -> bool {
        gains.len() == self.dims()
            && gains
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(g, (lo, hi))| (lo..=hi).contains(&g))
    }

    /// Dimensions must match the controller; gains are non-negative, so is
    /// every lower bound.
    pub fn validate(&self, kind: ControllerKind) -> std::result::Result<(), ConfigError> {
        if self.lower.len() != self.upper.len() {
            return Err(ConfigError::invalid(
                "bounds.upper",
                format!(
                    "length {} differs from bounds.lower length {}",
                    self.upper.len(),
                    self.lower.len()
                ),
            ));
        }
        if self.lower.len() != kind.gain_count() {
            return Err(ConfigError::GainCount {
                field: "bounds.lower".into(),
                controller: kind.name(),
                expected: kind.gain_count(),
                got: self.lower.len(),
            });
        }
        for (i, (&lo, &hi)) in self.lower.iter().zip(&self.upper).enumerate() {
            require_non_negative(&format!("bounds.lower[{i}]"), lo)?;
            require_finite(&format!("bounds.upper[{i}]"), hi)?;
            if lo >= hi {
                return Err(ConfigError::InvertedBounds {
                    field: "bounds".into(),
                    index: i,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(())
    }
}

/// One row of the optimisation history.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    pub iteration: usize,
    /// Global best after this iteration.
    pub best_cost: f64,
    /// Lowest cost evaluated in this iteration.
    pub iteration_best: f64,
    /// Mean over the particles with a finite cost.
    pub mean_cost: f64,
    /// Share of all runs in this iteration that diverged.
    pub diverged_fraction: f64,
    pub inertia: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptimizationResult {
    pub best_gains: Vec<f64>,
    pub best_cost: f64,
    pub history: Vec<IterationStats>,
    /// Number of simulated runs.
    pub evaluations: usize,
}

impl OptimizationResult {
    /// `true` if the best cost improved by less than `rel_tol` (relative)
    /// over the last `window` iterations.
    pub fn stalled(&self, window: usize, rel_tol: f64) -> bool {
        let n = self.history.len();
        if window == 0 || n <= window {
            return false;
        }
        let old = self.history[n - 1 - window].best_cost;
        let new = self.history[n - 1].best_cost;
        match (old.is_finite(), new.is_finite()) {
            (false, false) => true,
            (false, true) => false,
            _ => old - new <= rel_tol * old.abs(),
        }
    }
}

/// Swarm state carried through the refinement loop.
#[derive(Clone, Debug)]
struct SearchState {
    swarm: Swarm,
    iteration: usize,
}

pub struct ParticleSwarmOptimizer {
    objective: Objective,
    bounds: GainBounds,
    config: PsoConfig,
    seed: u64,
    hooks: Vec<Box<dyn Hook>>,
}

impl ParticleSwarmOptimizer {
    pub fn new(objective: Objective, bounds: GainBounds, config: PsoConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        bounds.validate(objective.kind())?;
        Ok(Self {
            objective,
            bounds,
            config,
            seed,
            hooks: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_hook(mut self, hook: Box<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Run the full iteration budget.
    pub fn optimize(&mut self) -> Result<OptimizationResult> {
        let mut rng = seeded(self.seed);
        let swarm = Swarm::initialize(
            &mut rng,
            &self.bounds,
            self.config.population,
            self.config.init_velocity_fraction,
        );
        let mut history = Vec::with_capacity(self.config.iterations);
        let mut evaluations = 0usize;

        let objective = &self.objective;
        let bounds = &self.bounds;
        let cfg = &self.config;
        let hooks = &mut self.hooks;

        let simulate = |s: &SearchState| {
            let positions: Vec<Vec<f64>> =
                s.swarm.particles.iter().map(|p| p.position.clone()).collect();
            objective.simulate(&positions)
        };
        let measure = |runs: &Vec<crate::sim::SimulationResult>| {
            evaluations += runs.len();
            objective.measure(runs)
        };
        let update = |s: &SearchState, costs: &Vec<CandidateCost>| {
            let mut next = s.clone();
            let means: Vec<f64> = costs.iter().map(|c| c.cost).collect();
            for i in next.swarm.update_bests(&means) {
                for h in hooks.iter_mut() {
                    h.on_new_best(s.iteration, &next.swarm.particles[i].position, means[i]);
                }
            }

            let finite: Vec<f64> = means.iter().copied().filter(|c| c.is_finite()).collect();
            let inertia = cfg.inertia(s.iteration);
            let stats = IterationStats {
                iteration: s.iteration,
                best_cost: next.swarm.global_best_cost,
                iteration_best: means.iter().copied().fold(f64::INFINITY, f64::min),
                mean_cost: if finite.is_empty() {
                    f64::INFINITY
                } else {
                    finite.iter().sum::<f64>() / finite.len() as f64
                },
                diverged_fraction: costs.iter().map(|c| c.diverged_fraction).sum::<f64>()
                    / costs.len().max(1) as f64,
                inertia,
            };
            info!(
                iteration = stats.iteration,
                best = stats.best_cost,
                mean = stats.mean_cost,
                diverged = stats.diverged_fraction,
                "swarm iteration"
            );
            for h in hooks.iter_mut() {
                h.on_iteration(&stats);
            }
            history.push(stats);

            next.swarm.step(&mut rng, bounds, cfg, inertia);
            next.iteration += 1;
            next
        };

        let last = refine_try(
            SearchState { swarm, iteration: 0 },
            simulate,
            measure,
            update,
            |_, _| false,
            cfg.iterations,
        )?;

        Ok(OptimizationResult {
            best_gains: last.swarm.global_best_position,
            best_cost: last.swarm.global_best_cost,
            history,
            evaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inertia_anneals_linearly() {
        let cfg = PsoConfig {
            iterations: 5,
            ..Default::default()
        };
        assert_eq!(cfg.inertia(0), 0.9);
        assert!((cfg.inertia(4) - 0.4).abs() < 1e-12);
        assert!((cfg.inertia(2) - 0.65).abs() < 1e-12);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut b = GainBounds::around_defaults(ControllerKind::Classical);
        b.upper[2] = b.lower[2];
        assert!(matches!(
            b.validate(ControllerKind::Classical),
            Err(ConfigError::InvertedBounds { index: 2, .. })
        ));
    }

    #[test]
    fn stalled_detects_plateau() {
        let row = |i, c| IterationStats {
            iteration: i,
            best_cost: c,
            iteration_best: c,
            mean_cost: c,
            diverged_fraction: 0.0,
            inertia: 0.5,
        };
        let r = OptimizationResult {
            best_gains: vec![],
            best_cost: 1.0,
            history: vec![row(0, 10.0), row(1, 2.0), row(2, 1.0), row(3, 1.0), row(4, 1.0)],
            evaluations: 0,
        };
        assert!(r.stalled(2, 1e-6));
        assert!(!r.stalled(3, 1e-6));
        assert!(!r.stalled(10, 1e-6));
    }
}
