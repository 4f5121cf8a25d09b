//! Explicit integrators over one zero-order-hold control interval.

use serde::{Deserialize, Serialize};

use crate::dynamics::{Dynamics, State};

/// Integration scheme for the plant between control updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Integrator {
    Euler,
    #[default]
    Rk4,
    /// Dormand–Prince 5(4) with step-size control inside each control
    /// interval. Single runs only.
    AdaptiveRk45 { rel_tol: f64, abs_tol: f64 },
}

impl Integrator {
    pub fn name(self) -> &'static str {
        match self {
            Self::Euler => "euler",
            Self::Rk4 => "rk4",
            Self::AdaptiveRk45 { .. } => "adaptive_rk45",
        }
    }

    pub fn is_fixed_step(self) -> bool {
        !matches!(self, Self::AdaptiveRk45 { .. })
    }

    /// Advance `x` by `dt` holding `u` constant.
    pub fn step<D: Dynamics + ?Sized>(self, d: &D, x: &State, u: f64, dt: f64) -> State {
        match self {
            Self::Euler => euler_step(d, x, u, dt),
            Self::Rk4 => rk4_step(d, x, u, dt),
            Self::AdaptiveRk45 { rel_tol, abs_tol } => rk45_interval(d, x, u, dt, rel_tol, abs_tol),
        }
    }
}

#[inline]
pub fn euler_step<D: Dynamics + ?Sized>(d: &D, x: &State, u: f64, dt: f64) -> State {
    x + d.derivative(x, u) * dt
}

pub fn rk4_step<D: Dynamics + ?Sized>(d: &D, x: &State, u: f64, dt: f64) -> State {
    let k1 = d.derivative(x, u);
    let k2 = d.derivative(&(x + k1 * (dt / 2.0)), u);
    let k3 = d.derivative(&(x + k2 * (dt / 2.0)), u);
    let k4 = d.derivative(&(x + k3 * dt), u);
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

// Dormand–Prince tableau; the plant is autonomous so stage times are unused.
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;
// 5th-order minus embedded 4th-order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const MAX_SUBSTEPS: usize = 10_000;

/// One Dormand–Prince trial step: `(x_next, error_estimate)`.
fn dopri_trial<D: Dynamics + ?Sized>(d: &D, x: &State, u: f64, h: f64) -> (State, State) {
    let k1 = d.derivative(x, u);
    let k2 = d.derivative(&(x + k1 * (h * A21)), u);
    let k3 = d.derivative(&(x + (k1 * A31 + k2 * A32) * h), u);
    let k4 = d.derivative(&(x + (k1 * A41 + k2 * A42 + k3 * A43) * h), u);
    let k5 = d.derivative(&(x + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h), u);
    let k6 = d.derivative(
        &(x + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h),
        u,
    );
    let next = x + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h;
    let k7 = d.derivative(&next, u);
    let err = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;
    (next, err)
}

/// Integrate across `[0, dt]` with adaptive sub-steps.
///
/// The last sub-step is shortened to land exactly on `dt`. A non-finite
/// trial state is returned as is so the caller's divergence check fires.
pub fn rk45_interval<D: Dynamics + ?Sized>(
    d: &D,
    x: &State,
    u: f64,
    dt: f64,
    rel_tol: f64,
    abs_tol: f64,
) -> State {
    let mut t = 0.0;
    let mut h = dt;
    let mut state = *x;
    let h_min = dt * 1e-9;
    for _ in 0..MAX_SUBSTEPS {
        if t >= dt {
            break;
        }
        h = h.min(dt - t);
        let (next, err) = dopri_trial(d, &state, u, h);
        if !next.iter().all(|v| v.is_finite()) {
            return next;
        }
        let norm = err
            .iter()
            .zip(state.iter().zip(next.iter()))
            .map(|(e, (a, b))| {
                let scale = abs_tol + rel_tol * a.abs().max(b.abs());
                (e / scale).powi(2)
            })
            .sum::<f64>();
        let norm = (norm / 6.0).sqrt();
        if norm <= 1.0 || h <= h_min {
            t += h;
            state = next;
        }
        let factor = if norm > 0.0 {
            (0.9 * norm.powf(-0.2)).clamp(0.2, 5.0)
        } else {
            5.0
        };
        h = (h * factor).max(h_min);
    }
    state
}
