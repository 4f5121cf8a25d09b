//! Top-level tuning configuration.
//!
//! Every section has defaults and its own `validate()`; [`TuningConfig::validate`]
//! runs them all and reports the first offending field by its dotted path.
//! Parsing a file into this struct is left to the caller (any serde format).

use serde::{Deserialize, Serialize};

use crate::controllers::{ControllerConfig, ControllerKind};
use crate::dynamics::{DynamicsKind, DynamicsModel, PhysicsParams, State};
use crate::error::{ConfigError, Result, require_finite};
use crate::optimizer::{CostEvaluator, CostWeights, GainBounds, Objective, PsoConfig};
use crate::sim::SimulationConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub physics: PhysicsParams,
    pub dynamics: DynamicsKind,
    pub simulation: SimulationConfig,
    pub controller: ControllerKind,
    pub controller_settings: ControllerConfig,
    /// Search box; `None` uses [`GainBounds::around_defaults`].
    pub bounds: Option<GainBounds>,
    pub cost: CostWeights,
    pub pso: PsoConfig,
    /// Initial states every candidate is scored from, `[x, θ1, θ2, ẋ, θ̇1, θ̇2]`.
    pub initial_conditions: Vec<[f64; 6]>,
    pub seed: u64,
    /// Check that the cost ranks default gains above inert gains before tuning.
    pub validate_cost: bool,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsParams::default(),
            dynamics: DynamicsKind::Full,
            simulation: SimulationConfig::default(),
            controller: ControllerKind::Classical,
            controller_settings: ControllerConfig::default(),
            bounds: None,
            cost: CostWeights::default(),
            pso: PsoConfig::default(),
            initial_conditions: vec![[0.0, 0.1, -0.05, 0.0, 0.0, 0.0]],
            seed: 42,
            validate_cost: true,
        }
    }
}

impl TuningConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.physics.validate()?;
        self.dynamics.validate()?;
        self.simulation.validate()?;
        self.controller_settings.validate()?;
        self.bounds().validate(self.controller)?;
        self.cost.validate()?;
        self.pso.validate()?;
        if self.initial_conditions.is_empty() {
            return Err(ConfigError::empty("initial_conditions"));
        }
        for (i, ic) in self.initial_conditions.iter().enumerate() {
            for (j, &v) in ic.iter().enumerate() {
                require_finite(&format!("initial_conditions[{i}][{j}]"), v)?;
            }
        }
        Ok(())
    }

    /// Configured bounds, or the defaults for the controller variant.
    pub fn bounds(&self) -> GainBounds {
        self.bounds
            .clone()
            .unwrap_or_else(|| GainBounds::around_defaults(self.controller))
    }

    pub fn initial_states(&self) -> Vec<State> {
        self.initial_conditions
            .iter()
            .map(|ic| State::from_column_slice(ic))
            .collect()
    }

    pub fn build_dynamics(&self) -> Result<DynamicsModel> {
        DynamicsModel::new(self.dynamics, self.physics.clone())
    }

    /// Batched objective over every initial condition.
    pub fn objective(&self) -> Result<Objective> {
        Objective::new(
            self.build_dynamics()?,
            self.simulation.clone(),
            self.controller,
            self.controller_settings.clone(),
            self.initial_states(),
            CostEvaluator::new(self.cost.clone()),
        )
    }
}
