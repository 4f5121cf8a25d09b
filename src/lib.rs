/*!
`dip_smc`: sliding-mode control of a double inverted pendulum on a cart,
with particle-swarm gain tuning built on a closed-loop refinement harness.

What it does
- Simulates the cart + two-link plant (`dynamics`) under seven sliding-mode
  control laws (`controllers`), one run at a time or as a `6 × N` batch
  (`sim`).
- Scores runs (tracking, effort, chattering, divergence penalty) and tunes
  gains with a seeded particle swarm (`optimizer`).
- Composes caller-supplied functions
  (`simulate : Θ→D`, `measure : D→Π`, `update : Θ×Π→Θ`)
  into a single step `g(θ) = update(θ, measure(simulate(θ)))`; the swarm is
  one instance of that loop.

How to use (call surface only)
- Fill a [`config::TuningConfig`] (or deserialize one), then call
  [`tuning::tune`] for validate → sanity-check → optimise → verify.
- Or drive the pieces directly: build a `DynamicsModel`, a `Controller`, and
  run a `Simulator`.
- For the harness alone: `refine_det(θ₀, simulate, measure, update, converged, max_iters)`.

What it does NOT do
- No file parsing, plotting, hardware I/O or persistence.
*/

pub mod config;
pub mod controllers;
pub mod dynamics;
pub mod error;
pub mod mechanics;
pub mod optimizer;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, Error, Result};

/// Deterministic refinement: θ_{t+1} = update(θ_t, measure(simulate(θ_t))).
pub fn refine_det<P, D, M, Sim, Meas, Upd, Conv>(
    mut theta: P,
    mut simulate: Sim,
    mut measure: Meas,
    mut update: Upd,
    converged: Conv,
    max_iters: usize,
) -> P
where
    Sim: FnMut(&P) -> D,
    Meas: FnMut(&D) -> M,
    Upd: FnMut(&P, &M) -> P,
    Conv: Fn(&P, &P) -> bool,
{
    for _ in 0..max_iters {
        let data = simulate(&theta);
        let pi = measure(&data);
        let theta_next = update(&theta, &pi);
        if converged(&theta, &theta_next) {
            return theta_next;
        }
        theta = theta_next;
    }
    theta
}

/// [`refine_det`] with a fallible `simulate`; the first error stops the loop.
pub fn refine_try<P, D, M, E, Sim, Meas, Upd, Conv>(
    mut theta: P,
    mut simulate: Sim,
    mut measure: Meas,
    mut update: Upd,
    converged: Conv,
    max_iters: usize,
) -> std::result::Result<P, E>
where
    Sim: FnMut(&P) -> std::result::Result<D, E>,
    Meas: FnMut(&D) -> M,
    Upd: FnMut(&P, &M) -> P,
    Conv: Fn(&P, &P) -> bool,
{
    for _ in 0..max_iters {
        let data = simulate(&theta)?;
        let pi = measure(&data);
        let theta_next = update(&theta, &pi);
        if converged(&theta, &theta_next) {
            return Ok(theta_next);
        }
        theta = theta_next;
    }
    Ok(theta)
}
