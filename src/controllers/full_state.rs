//! Full-state sliding mode: the surface includes cart position and rate,
//! so the cart is driven back to the origin alongside the links.

use super::{ControlLaw, ControllerConfig, LawOutput, SlidingSurface, floor_magnitude};
use crate::dynamics::{PhysicsParams, State};
use crate::mechanics::control::switching;

#[derive(Clone, Debug)]
pub struct FullStateSmc {
    surface: SlidingSurface,
    gain: f64,
    damping: f64,
    physics: PhysicsParams,
    settings: ControllerConfig,
}

impl FullStateSmc {
    /// Gains `[k1, k2, λ1, λ2, k_ẋ, k_x, K, kd]`.
    pub fn new(gains: &[f64], physics: PhysicsParams, settings: ControllerConfig) -> Self {
        Self {
            surface: SlidingSurface::new(gains[0], gains[1], gains[2], gains[3])
                .with_cart(gains[4], gains[5]),
            gain: gains[6],
            damping: gains[7],
            physics,
            settings,
        }
    }
}

impl ControlLaw for FullStateSmc {
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
