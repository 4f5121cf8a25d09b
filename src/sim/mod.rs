/*!
Closed-loop simulation.

What it does
- [`Simulator`] runs one plant under one controller with zero-order hold:
  control, saturate, integrate, divergence check, record.
- [`BatchSimulator`] runs N such loops in one `6 × N` state matrix with
  masked columns for diverged runs (rayon across runs under `parallel`).

What it does NOT do
- No cost evaluation; see `optimizer::cost`.
*/

pub mod batch;
pub mod integrators;
pub mod single;

use serde::{Deserialize, Serialize};

pub use batch::BatchSimulator;
pub use integrators::Integrator;
pub use single::Simulator;

use crate::controllers::Phase;
use crate::dynamics::State;
use crate::error::{ConfigError, require_positive, require_range};

/// Step size, horizon, integrator and instability limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Control interval and fixed integration step (s).
    pub dt: f64,
    /// Horizon (s).
    pub duration: f64,
    pub integrator: Integrator,
    /// A run diverges once `|θ1|` or `|θ2|` exceeds this (rad); `None`
    /// checks finiteness only, as swing-up from hanging needs.
    pub max_angle: Option<f64>,
    /// Saturation duty above which a run is flagged and logged.
    pub saturation_warn_fraction: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            duration: 10.0,
            integrator: Integrator::Rk4,
            max_angle: Some(std::f64::consts::FRAC_PI_4),
            saturation_warn_fraction: 0.5,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("simulation.dt", self.dt)?;
        require_positive("simulation.duration", self.duration)?;
        if self.dt > self.duration {
            return Err(ConfigError::invalid(
                "simulation.dt",
                format!("step {} exceeds duration {}", self.dt, self.duration),
            ));
        }
        if let Some(limit) = self.max_angle {
            require_positive("simulation.max_angle", limit)?;
        }
        require_range(
            "simulation.saturation_warn_fraction",
            self.saturation_warn_fraction,
            0.0,
            1.0,
        )?;
        if let Integrator::AdaptiveRk45 { rel_tol, abs_tol } = self.integrator {
            require_positive("simulation.integrator.rel_tol", rel_tol)?;
            require_positive("simulation.integrator.abs_tol", abs_tol)?;
        }
        Ok(())
    }

    /// Number of control steps in the horizon.
    pub fn steps(&self) -> usize {
        (self.duration / self.dt).round() as usize
    }

    /// `true` if `x` is non-finite or tilted past `max_angle`.
    #[inline]
    pub fn is_unstable(&self, x: &State) -> bool {
        if !x.iter().all(|v| v.is_finite()) {
            return true;
        }
        self.max_angle
            .is_some_and(|limit| x[1].abs() > limit || x[2].abs() > limit)
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Completed,
    /// The initial state already failed the check; no control step ran.
    RejectedInitial,
    /// The state after control step `step` (0-based) failed the check;
    /// nothing from that step was recorded.
    Diverged { step: usize },
}

/// Trajectory and outcome of one run.
///
/// `states[k]` is the state at `t = k·dt`; `controls[k]` and `surfaces[k]`
/// were applied over `[k·dt, (k+1)·dt)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationResult {
    pub dt: f64,
    /// Steps the horizon asked for.
    pub horizon_steps: usize,
    pub states: Vec<State>,
    pub controls: Vec<f64>,
    pub surfaces: Vec<f64>,
    pub status: RunStatus,
    pub saturated_steps: usize,
    pub sliding_steps: usize,
    /// Saturation duty exceeded `saturation_warn_fraction`.
    pub saturation_flagged: bool,
}

impl SimulationResult {
    pub(crate) fn with_capacity(dt: f64, horizon_steps: usize, initial: State) -> Self {
        let mut states = Vec::with_capacity(horizon_steps + 1);
        states.push(initial);
        Self {
            dt,
            horizon_steps,
            states,
            controls: Vec::with_capacity(horizon_steps),
            surfaces: Vec::with_capacity(horizon_steps),
            status: RunStatus::Completed,
            saturated_steps: 0,
            sliding_steps: 0,
            saturation_flagged: false,
        }
    }

    #[inline]
    pub(crate) fn record_phase(&mut self, saturated: bool, phase: Phase) {
        if saturated {
            self.saturated_steps += 1;
        }
        if phase == Phase::Sliding {
            self.sliding_steps += 1;
        }
    }

    /// Control steps actually recorded.
    pub fn steps(&self) -> usize {
        self.controls.len()
    }

    pub fn is_diverged(&self) -> bool {
        matches!(self.status, RunStatus::Diverged { .. } | RunStatus::RejectedInitial)
    }

    pub fn final_state(&self) -> &State {
        // `states` always holds at least the initial state.
        &self.states[self.states.len() - 1]
    }

    /// Share of the horizon that was not simulated.
    pub fn remaining_fraction(&self) -> f64 {
        if self.horizon_steps == 0 {
            return 0.0;
        }
        let done = self.steps().min(self.horizon_steps);
        (self.horizon_steps - done) as f64 / self.horizon_steps as f64
    }

    pub fn saturation_fraction(&self) -> f64 {
        if self.steps() == 0 {
            0.0
        } else {
            self.saturated_steps as f64 / self.steps() as f64
        }
    }

    /// Time stamps matching `states`.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.states.len()).map(|k| k as f64 * self.dt)
    }
}
