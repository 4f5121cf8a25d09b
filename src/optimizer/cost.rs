//! Scalar cost of a simulated run.
//!
//! `J = w_t·∫Σ w_j·x_j² dt + w_u·∫u² dt + w_c·Σ(Δu)²·dt (+ penalty)`.
//! Completed runs are capped at the penalty and diverged runs pay
//! `penalty·(1 + remaining_fraction)` on top of their accumulated terms, so
//! any diverged run scores strictly above any completed one. The same rule
//! applies to a candidate scored over several runs: one divergence is enough
//! to lift it above every candidate that completed all of its runs.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result, require_non_negative, require_positive};
use crate::sim::SimulationResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    /// Per-state weights `w_j` in the tracking integral, ordered like the state.
    pub state_weights: [f64; 6],
    pub tracking: f64,
    pub effort: f64,
    pub chattering: f64,
    pub instability_penalty: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            state_weights: [0.1, 1.0, 1.0, 0.1, 0.1, 0.1],
            tracking: 1.0,
            effort: 1e-3,
            chattering: 1e-4,
            instability_penalty: 1e4,
        }
    }
}

impl CostWeights {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (j, &w) in self.state_weights.iter().enumerate() {
            require_non_negative(&format!("cost.state_weights[{j}]"), w)?;
        }
        require_non_negative("cost.tracking", self.tracking)?;
        require_non_negative("cost.effort", self.effort)?;
        require_non_negative("cost.chattering", self.chattering)?;
        require_positive("cost.instability_penalty", self.instability_penalty)?;
        Ok(())
    }
}

/// Weighted components of one run's cost.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CostBreakdown {
    pub tracking: f64,
    pub effort: f64,
    pub chattering: f64,
    /// Divergence charge; zero for completed runs.
    pub penalty: f64,
    pub total: f64,
    pub diverged: bool,
}

impl CostBreakdown {
    /// Weighted terms without penalty or cap.
    #[inline]
    pub fn terms(&self) -> f64 {
        self.tracking + self.effort + self.chattering
    }
}

/// Cost of one candidate over every tuning initial condition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateCost {
    pub cost: f64,
    /// Share of this candidate's runs that diverged.
    pub diverged_fraction: f64,
}

#[derive(Clone, Debug, Default)]
pub struct CostEvaluator {
    weights: CostWeights,
}

impl CostEvaluator {
    pub fn new(weights: CostWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    pub fn evaluate(&self, run: &SimulationResult) -> CostBreakdown {
        let w = &self.weights;
        let dt = run.dt;
        let steps = run.steps();

        let tracking = run.states[..steps]
            .iter()
            .map(|x| {
                x.iter()
                    .zip(w.state_weights.iter())
                    .map(|(v, wj)| wj * v * v)
                    .sum::<f64>()
            })
            .sum::<f64>()
            * dt;
        let effort = run.controls.iter().map(|u| u * u).sum::<f64>() * dt;
        let chattering = run
            .controls
            .windows(2)
            .map(|p| (p[1] - p[0]).powi(2))
            .sum::<f64>()
            * dt;

        let tracking = w.tracking * tracking;
        let effort = w.effort * effort;
        let chattering = w.chattering * chattering;
        let terms = tracking + effort + chattering;
        let (penalty, total) = if run.is_diverged() {
            let p = w.instability_penalty * (1.0 + run.remaining_fraction());
            (p, p + terms)
        } else {
            (0.0, terms.min(w.instability_penalty))
        };
        CostBreakdown {
            tracking,
            effort,
            chattering,
            penalty,
            total: if total.is_nan() { f64::INFINITY } else { total },
            diverged: run.is_diverged(),
        }
    }

    /// Total cost; NaN maps to `+∞`.
    #[inline]
    pub fn cost(&self, run: &SimulationResult) -> f64 {
        self.evaluate(run).total
    }

    /// Score one gain vector from all of its runs.
    ///
    /// With any divergence the candidate pays
    /// `penalty·(1 + mean remaining_fraction)` plus its mean terms; otherwise
    /// its mean terms, capped at the penalty.
    pub fn candidate(&self, runs: &[SimulationResult]) -> CandidateCost {
        let penalty = self.weights.instability_penalty;
        let n = runs.len().max(1) as f64;
        let parts: Vec<CostBreakdown> = runs.iter().map(|r| self.evaluate(r)).collect();
        let terms = parts.iter().map(CostBreakdown::terms).sum::<f64>() / n;
        let diverged = parts.iter().filter(|c| c.diverged).count();

        let cost = if diverged > 0 {
            let remaining = runs.iter().map(SimulationResult::remaining_fraction).sum::<f64>() / n;
            penalty * (1.0 + remaining) + terms
        } else {
            terms.min(penalty)
        };
        CandidateCost {
            cost: if cost.is_nan() { f64::INFINITY } else { cost },
            diverged_fraction: diverged as f64 / n,
        }
    }
}

/// Reject a cost function that does not rank known-bad gains above
/// known-good ones.
pub fn check_ordering(good: f64, bad: f64) -> Result<()> {
    if bad > good {
        Ok(())
    } else {
        Err(Error::CostOrdering { good, bad })
    }
}
