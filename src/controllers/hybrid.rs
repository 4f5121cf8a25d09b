//! Hybrid adaptive super-twisting.
//!
//! Both twisting gains adapt with the dead-zone/leak rule. The equivalent
//! term is faded by `w = clamp((|a| − a_low)/(a_high − a_low), 0, 1)` so it
//! vanishes near a singular input map, where the corrective divisor is also
//! floored at `a_high`.

use super::{ControlLaw, ControllerConfig, LawOutput, SlidingSurface, floor_magnitude};
use crate::dynamics::{PhysicsParams, State};
use crate::mechanics::control::{AdaptationLaw, adapt_gain, switching};

#[derive(Clone, Debug)]
pub struct HybridAdaptiveSta {
    surface: SlidingSurface,
    law_k1: AdaptationLaw,
    law_k2: AdaptationLaw,
    k1: f64,
    k2: f64,
    z: f64,
    physics: PhysicsParams,
    settings: ControllerConfig,
}

impl HybridAdaptiveSta {
    /// Gains `[k1, λ1, k2, λ2]`.
    pub fn new(gains: &[f64], physics: PhysicsParams, settings: ControllerConfig) -> Self {
        let h = &settings.hybrid;
        let law = |rate| AdaptationLaw {
            rate,
            leak: h.leak,
            dead_zone: h.dead_zone,
            min: h.min_gain,
            max: h.max_gain,
        };
        Self {
            surface: SlidingSurface::new(gains[0], gains[2], gains[1], gains[3]),
            law_k1: law(h.rate_k1),
            law_k2: law(h.rate_k2),
            k1: h.initial_k1,
            k2: h.initial_k2,
            z: 0.0,
            physics,
            settings,
        }
    }

    /// Current `(K1, K2)`.
    pub fn gains(&self) -> (f64, f64) {
        (self.k1, self.k2)
    }

    /// Equivalent-term weight for a given `|a|`.
    pub fn blend(&self, a: f64) -> f64 {
        let h = &self.settings.hybrid;
        ((a.abs() - h.a_low) / (h.a_high - h.a_low)).clamp(0.0, 1.0)
    }
}

impl ControlLaw for HybridAdaptiveSta {
    fn law(&mut self, state: &State) -> LawOutput {
        let cfg = &self.settings;
        let s = self.surface.value(state);
        let rate = self.surface.rate(&self.physics, state);
        let a_eq = floor_magnitude(rate.a, cfg.singularity_floor);
        let a_corr = floor_magnitude(rate.a, cfg.hybrid.a_high);
        let w = self.blend(rate.a);

        let sw = switching(s, cfg.boundary_layer, cfg.switching);
        let corrective = -self.k1 * s.abs().sqrt() * sw + self.z - cfg.hybrid.damping * s;
        let force = -w * rate.b / a_eq + corrective / a_corr;

        let limit = cfg.hybrid.integral_limit;
        let dt = cfg.dt;
        self.z = (self.z - self.k2 * sw * dt).clamp(-limit, limit);
        self.k1 = adapt_gain(self.k1, s, dt, &self.law_k1);
        self.k2 = adapt_gain(self.k2, s, dt, &self.law_k2);
        LawOutput { force, surface: s }
    }

    fn settings(&self) -> &ControllerConfig {
        &self.settings
    }

    fn reset(&mut self) {
        self.k1 = self.settings.hybrid.initial_k1;
        self.k2 = self.settings.hybrid.initial_k2;
        self.z = 0.0;
    }
}
