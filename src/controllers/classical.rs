//! Fixed-gain sliding mode with a boundary layer.

use super::{ControlLaw, ControllerConfig, LawOutput, SlidingSurface, floor_magnitude};
use crate::dynamics::{PhysicsParams, State};
use crate::mechanics::control::switching;

/// `u = (−b − K·switch(s/φ) − kd·s) / a`.
#[derive(Clone, Debug)]
pub struct ClassicalSmc {
    surface: SlidingSurface,
    gain: f64,
    damping: f64,
    physics: PhysicsParams,
    settings: ControllerConfig,
}

impl ClassicalSmc {
    /// Gains `[k1, k2, λ1, λ2, K, kd]`.
    pub fn new(gains: &[f64], physics: PhysicsParams, settings: ControllerConfig) -> Self {
        Self {
            surface: SlidingSurface::new(gains[0], gains[1], gains[2], gains[3]),
            gain: gains[4],
            damping: gains[5],
            physics,
            settings,
        }
    }

    pub fn surface(&self) -> &SlidingSurface {
        &self.surface
    }
}

impl ControlLaw for ClassicalSmc {
    fn law(&mut self, state: &State) -> LawOutput {
        let s = self.surface.value(state);
        let rate = self.surface.rate(&self.physics, state);
        let a = floor_magnitude(rate.a, self.settings.singularity_floor);
        let corrective = -self.gain
            * switching(s, self.settings.boundary_layer, self.settings.switching)
            - self.damping * s;
        LawOutput {
            force: (-rate.b + corrective) / a,
            surface: s,
        }
    }

    fn settings(&self) -> &ControllerConfig {
        &self.settings
    }

    fn reset(&mut self) {}
}
