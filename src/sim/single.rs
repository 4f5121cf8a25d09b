//! Single-run closed-loop simulator.

use tracing::{debug, warn};

use super::{RunStatus, SimulationConfig, SimulationResult};
use crate::controllers::{ControlHistory, ControlLaw};
use crate::dynamics::{Dynamics, State};
use crate::error::Result;

/// One plant, one controller, one initial state at a time.
#[derive(Clone, Debug)]
pub struct Simulator<D> {
    dynamics: D,
    config: SimulationConfig,
}

impl<D: Dynamics> Simulator<D> {
    pub fn new(dynamics: D, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { dynamics, config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn dynamics(&self) -> &D {
        &self.dynamics
    }

    /// Run to the horizon or the first unstable state.
    ///
    /// The controller is used as given; reset or rebuild it between runs.
    pub fn run<C: ControlLaw + ?Sized>(&self, controller: &mut C, initial: &State) -> SimulationResult {
        let cfg = &self.config;
        let steps = cfg.steps();
        let mut out = SimulationResult::with_capacity(cfg.dt, steps, *initial);
        if cfg.is_unstable(initial) {
            out.status = RunStatus::RejectedInitial;
            debug!("initial state outside the stability limits");
            return out;
        }

        let mut history = ControlHistory::default();
        let mut x = *initial;
        let mut previous = 0.0;
        for k in 0..steps {
            let ctl = controller.compute(&x, previous, &mut history);
            let next = cfg.integrator.step(&self.dynamics, &x, ctl.force, cfg.dt);
            if cfg.is_unstable(&next) {
                out.status = RunStatus::Diverged { step: k };
                debug!(step = k, t = k as f64 * cfg.dt, "run diverged");
                break;
            }
            out.states.push(next);
            out.controls.push(ctl.force);
            out.surfaces.push(ctl.surface);
            out.record_phase(ctl.saturated, ctl.phase);
            x = next;
            previous = ctl.force;
        }

        let duty = out.saturation_fraction();
        if duty > cfg.saturation_warn_fraction {
            out.saturation_flagged = true;
            warn!(
                duty,
                limit = cfg.saturation_warn_fraction,
                "actuator saturated for most of the run"
            );
        }
        out
    }
}
