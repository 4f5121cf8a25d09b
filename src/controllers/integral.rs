//! Integral sliding mode: the surface carries the integral of the angle
//! error, removing steady offsets from constant disturbances.

use super::{ControlLaw, ControllerConfig, LawOutput, SlidingSurface, floor_magnitude};
use crate::dynamics::{PhysicsParams, State};
use crate::mechanics::control::switching;

/// `s' = s + ki·σ` with `σ̇ = λ1·θ1 + λ2·φ2`;
/// `u = (−b − ki·σ̇ − K·switch(s') − kd·s') / a`.
#[derive(Clone, Debug)]
pub struct IntegralSmc {
    surface: SlidingSurface,
    ki: f64,
    gain: f64,
    damping: f64,
    sigma: f64,
    physics: PhysicsParams,
    settings: ControllerConfig,
}

impl IntegralSmc {
    /// Gains `[k1, k2, λ1, λ2, ki, K, kd]`.
    pub fn new(gains: &[f64], physics: PhysicsParams, settings: ControllerConfig) -> Self {
        Self {
            surface: SlidingSurface::new(gains[0], gains[1], gains[2], gains[3]),
            ki: gains[4],
            gain: gains[5],
            damping: gains[6],
            sigma: 0.0,
            physics,
            settings,
        }
    }

    pub fn integral(&self) -> f64 {
        self.sigma
    }
}

impl ControlLaw for IntegralSmc {
    fn law(&mut self, state: &State) -> LawOutput {
        let sigma_rate =
            self.surface.lambda1 * state[1] + self.surface.lambda2 * (state[2] - state[1]);
        let s = self.surface.value(state) + self.ki * self.sigma;
        let rate = self.surface.rate(&self.physics, state);
        let a = floor_magnitude(rate.a, self.settings.singularity_floor);
        let corrective = -self.gain
            * switching(s, self.settings.boundary_layer, self.settings.switching)
            - self.damping * s;
        let force = (-rate.b - self.ki * sigma_rate + corrective) / a;

        let limit = self.settings.integral.integral_limit;
        self.sigma = (self.sigma + sigma_rate * self.settings.dt).clamp(-limit, limit);
        LawOutput { force, surface: s }
    }

    fn settings(&self) -> &ControllerConfig {
        &self.settings
    }

    fn reset(&mut self) {
        self.sigma = 0.0;
    }
}
