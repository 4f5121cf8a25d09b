//! Batched simulation: N independent runs sharing one plant model.
//!
//! States live in one `6 × N` matrix, one column per run. Each control step
//! computes N forces, then the integrator stages are whole-matrix
//! combinations of per-column derivatives. A run that diverges is masked:
//! its column gets a zero derivative and its controller is never called
//! again, so shapes stay fixed for the rest of the horizon.
//!
//! # Determinism
//!
//! Column `j` is a pure function of its own initial state, its own controller
//! and the shared model, and the stage arithmetic matches
//! [`integrators`](super::integrators) term for term. Results are therefore
//! identical to N single runs and independent of rayon's scheduling.

use nalgebra::{DVector, Dyn, OMatrix, U6};
use tracing::debug;

use super::{Integrator, RunStatus, SimulationConfig, SimulationResult};
use crate::controllers::{ControlHistory, ControlLaw, ControlOutput};
use crate::dynamics::{Dynamics, State};
use crate::error::{Error, Result};

/// `6 × N` batch state.
pub type BatchState = OMatrix<f64, U6, Dyn>;

#[derive(Clone, Debug)]
pub struct BatchSimulator<D> {
    dynamics: D,
    config: SimulationConfig,
}

/// Map `f` over `0..n`, on rayon threads when `parallel` is enabled.
fn map_runs<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
        (0..n).into_par_iter().map(f).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(f).collect()
    }
}

impl<D: Dynamics> BatchSimulator<D> {
    /// Fails for adaptive integrators; batches use fixed steps only.
    pub fn new(dynamics: D, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        if !config.integrator.is_fixed_step() {
            return Err(Error::AdaptiveInBatch(config.integrator.name()));
        }
        Ok(Self { dynamics, config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn dynamics(&self) -> &D {
        &self.dynamics
    }

    /// Per-column derivative; masked columns stay zero.
    fn derivative(&self, x: &BatchState, u: &DVector<f64>, active: &[bool]) -> BatchState {
        let cols = map_runs(x.ncols(), |j| {
            if active[j] {
                let xj: State = x.column(j).into_owned();
                self.dynamics.derivative(&xj, u[j])
            } else {
                State::zeros()
            }
        });
        BatchState::from_columns(&cols)
    }

    /// One fixed step of the whole batch.
    fn integrate(&self, x: &BatchState, u: &DVector<f64>, active: &[bool]) -> BatchState {
        let dt = self.config.dt;
        match self.config.integrator {
            Integrator::Euler => x + self.derivative(x, u, active) * dt,
            // `new` rejects adaptive stepping, so anything else is RK4.
            Integrator::Rk4 | Integrator::AdaptiveRk45 { .. } => {
                let k1 = self.derivative(x, u, active);
                let k2 = self.derivative(&(x + &k1 * (dt / 2.0)), u, active);
                let k3 = self.derivative(&(x + &k2 * (dt / 2.0)), u, active);
                let k4 = self.derivative(&(x + &k3 * dt), u, active);
                x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
            }
        }
    }

    /// Run every controller from its initial state.
    ///
    /// `initial_states` holds one state per controller, or a single state
    /// broadcast to all of them. Controllers are used as given.
    pub fn run<C>(&self, controllers: &mut [C], initial_states: &[State]) -> Result<Vec<SimulationResult>>
    where
        C: ControlLaw + Send,
    {
        let n = controllers.len();
        let shape_ok = n > 0 && (initial_states.len() == n || initial_states.len() == 1);
        if !shape_ok {
            return Err(Error::BatchShape {
                controllers: n,
                initial_states: initial_states.len(),
            });
        }
        let initial = |j: usize| initial_states[if initial_states.len() == 1 { 0 } else { j }];

        let cfg = &self.config;
        let steps = cfg.steps();
        let mut x = BatchState::from_columns(&(0..n).map(initial).collect::<Vec<_>>());
        let mut u = DVector::zeros(n);
        let mut results: Vec<SimulationResult> = (0..n)
            .map(|j| SimulationResult::with_capacity(cfg.dt, steps, initial(j)))
            .collect();
        let mut active: Vec<bool> = (0..n).map(|j| !cfg.is_unstable(&initial(j))).collect();
        for (r, _) in results.iter_mut().zip(&active).filter(|(_, a)| !**a) {
            r.status = RunStatus::RejectedInitial;
        }
        let mut histories = vec![ControlHistory::default(); n];

        for k in 0..steps {
            if !active.iter().any(|&a| a) {
                break;
            }
            let outputs = self.control(controllers, &mut histories, &x, &u, &active);
            for (j, out) in outputs.iter().enumerate() {
                u[j] = out.map_or(0.0, |o| o.force);
            }
            let next = self.integrate(&x, &u, &active);

            for j in 0..n {
                let Some(out) = outputs[j] else { continue };
                let xj: State = next.column(j).into_owned();
                if cfg.is_unstable(&xj) {
                    active[j] = false;
                    results[j].status = RunStatus::Diverged { step: k };
                    u[j] = 0.0;
                    debug!(run = j, step = k, "batch run diverged");
                    continue;
                }
                let r = &mut results[j];
                r.states.push(xj);
                r.controls.push(out.force);
                r.surfaces.push(out.surface);
                r.record_phase(out.saturated, out.phase);
            }
            // Diverged columns are frozen at their last good state.
            for j in 0..n {
                if active[j] {
                    x.set_column(j, &next.column(j));
                }
            }
        }

        for (j, r) in results.iter_mut().enumerate() {
            if r.saturation_fraction() > cfg.saturation_warn_fraction {
                r.saturation_flagged = true;
                debug!(run = j, duty = r.saturation_fraction(), "batch run saturated");
            }
        }
        Ok(results)
    }

    /// One control step for every active run.
    fn control<C>(
        &self,
        controllers: &mut [C],
        histories: &mut [ControlHistory],
        x: &BatchState,
        u: &DVector<f64>,
        active: &[bool],
    ) -> Vec<Option<ControlOutput>>
    where
        C: ControlLaw + Send,
    {
        let step = |j: usize, c: &mut C, h: &mut ControlHistory| {
            active[j].then(|| {
                let xj: State = x.column(j).into_owned();
                c.compute(&xj, u[j], h)
            })
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};
            controllers
                .par_iter_mut()
                .zip(histories.par_iter_mut())
                .enumerate()
                .map(|(j, (c, h))| step(j, c, h))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            controllers
                .iter_mut()
                .zip(histories.iter_mut())
                .enumerate()
                .map(|(j, (c, h))| step(j, c, h))
                .collect()
        }
    }
}
