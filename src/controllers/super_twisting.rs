//! Second-order (super-twisting) sliding mode.
//!
//! The discontinuity sits under an integrator, so the applied force is
//! continuous: `u = (−b − K1·√|s|·switch(s) + z) / a`, `ż = −K2·switch(s)`.

use super::{ControlLaw, ControllerConfig, LawOutput, SlidingSurface, floor_magnitude};
use crate::dynamics::{PhysicsParams, State};
use crate::mechanics::control::switching;

#[derive(Clone, Debug)]
pub struct SuperTwistingSmc {
    surface: SlidingSurface,
    k1: f64,
    k2: f64,
    z: f64,
    physics: PhysicsParams,
    settings: ControllerConfig,
}

impl SuperTwistingSmc {
    /// Gains `[K1, K2, k1, k2, λ1, λ2]`.
    pub fn new(gains: &[f64], physics: PhysicsParams, settings: ControllerConfig) -> Self {
        Self {
            surface: SlidingSurface::new(gains[2], gains[3], gains[4], gains[5]),
            k1: gains[0],
            k2: gains[1],
            z: 0.0,
            physics,
            settings,
        }
    }

    /// Current integral term.
    pub fn integral(&self) -> f64 {
        self.z
    }
}

impl ControlLaw for SuperTwistingSmc {
    fn law(&mut self, state: &State) -> LawOutput {
        let s = self.surface.value(state);
        let rate = self.surface.rate(&self.physics, state);
        let a = floor_magnitude(rate.a, self.settings.singularity_floor);
        let sw = switching(s, self.settings.boundary_layer, self.settings.switching);
        let corrective = -self.k1 * s.abs().sqrt() * sw + self.z;
        let limit = self.settings.super_twisting.integral_limit;
        self.z = (self.z - self.k2 * sw * self.settings.dt).clamp(-limit, limit);
        LawOutput {
            force: (-rate.b + corrective) / a,
            surface: s,
        }
    }

    fn settings(&self) -> &ControllerConfig {
        &self.settings
    }

    fn reset(&mut self) {
        self.z = 0.0;
    }
}
