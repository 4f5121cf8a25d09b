//! Sliding mode with a self-adjusting switching gain.

use super::{ControlLaw, ControllerConfig, LawOutput, SlidingSurface, floor_magnitude};
use crate::dynamics::{PhysicsParams, State};
use crate::mechanics::control::{AdaptationLaw, adapt_gain, switching};

/// `u = (−b − K·switch(s) − α·s) / a`, with `K` updated by
/// [`adapt_gain`] after every step.
#[derive(Clone, Debug)]
pub struct AdaptiveSmc {
    surface: SlidingSurface,
    adaptation: AdaptationLaw,
    gain: f64,
    physics: PhysicsParams,
    settings: ControllerConfig,
}

impl AdaptiveSmc {
    /// Gains `[k1, k2, λ1, λ2, γ]`.
    pub fn new(gains: &[f64], physics: PhysicsParams, settings: ControllerConfig) -> Self {
        let a = &settings.adaptive;
        let adaptation = AdaptationLaw {
            rate: gains[4],
            leak: a.leak,
            dead_zone: a.dead_zone,
            min: a.min_gain,
            max: a.max_gain,
        };
        Self {
            surface: SlidingSurface::new(gains[0], gains[1], gains[2], gains[3]),
            adaptation,
            gain: a.initial_gain,
            physics,
            settings,
        }
    }

    /// Current switching gain `K`.
    pub fn gain(&self) -> f64 {
        self.gain
    }
}

impl ControlLaw for AdaptiveSmc {
    fn law(&mut self, state: &State) -> LawOutput {
        let s = self.surface.value(state);
        let rate = self.surface.rate(&self.physics, state);
        let a = floor_magnitude(rate.a, self.settings.singularity_floor);
        let sw = switching(s, self.settings.boundary_layer, self.settings.switching);
        let corrective = -self.gain * sw - self.settings.adaptive.alpha * s;
        self.gain = adapt_gain(self.gain, s, self.settings.dt, &self.adaptation);
        LawOutput {
            force: (-rate.b + corrective) / a,
            surface: s,
        }
    }

    fn settings(&self) -> &ControllerConfig {
        &self.settings
    }

    fn reset(&mut self) {
        self.gain = self.settings.adaptive.initial_gain;
    }
}
