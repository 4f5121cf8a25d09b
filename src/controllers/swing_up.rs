//! Energy-based swing-up with hand-over to a classical stabiliser.

use super::classical::ClassicalSmc;
use super::{ControlLaw, ControllerConfig, LawOutput};
use crate::dynamics::{PhysicsParams, State, mechanical_energy};
use crate::mechanics::control::{saturate, wrap_angle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwingMode {
    Swinging,
    Stabilizing,
}

/// Pumps energy toward the upright level with
/// `u = −k_swing·(E_up − E)·sgn(θ̇1·cosθ1) − k_cart·x − k_cart_damp·ẋ`
/// until both links are near upright, then runs the embedded stabiliser on
/// the angle-wrapped state.
#[derive(Clone, Debug)]
pub struct SwingUpController {
    k_swing: f64,
    k_cart: f64,
    k_cart_damp: f64,
    stabilizer: ClassicalSmc,
    mode: SwingMode,
    physics: PhysicsParams,
    settings: ControllerConfig,
}

impl SwingUpController {
    /// Gains `[k_swing, k_cart, k_cart_damp]` followed by the six
    /// classical stabiliser gains.
    pub fn new(gains: &[f64], physics: PhysicsParams, settings: ControllerConfig) -> Self {
        Self {
            k_swing: gains[0],
            k_cart: gains[1],
            k_cart_damp: gains[2],
            stabilizer: ClassicalSmc::new(&gains[3..9], physics.clone(), settings.clone()),
            mode: SwingMode::Swinging,
            physics,
            settings,
        }
    }

    pub fn mode(&self) -> SwingMode {
        self.mode
    }
}

impl ControlLaw for SwingUpController {
    fn law(&mut self, state: &State) -> LawOutput {
        let mut wrapped = *state;
        wrapped[1] = wrap_angle(state[1]);
        wrapped[2] = wrap_angle(state[2]);
        let (w1, w2) = (wrapped[1].abs(), wrapped[2].abs());
        let cfg = &self.settings.swing_up;

        self.mode = match self.mode {
            SwingMode::Swinging if w1 < cfg.switch_angle && w2 < cfg.switch_angle => {
                SwingMode::Stabilizing
            }
            SwingMode::Stabilizing if w1 > cfg.exit_angle || w2 > cfg.exit_angle => {
                SwingMode::Swinging
            }
            m => m,
        };

        match self.mode {
            SwingMode::Stabilizing => self.stabilizer.law(&wrapped),
            SwingMode::Swinging => {
                let deficit = self.physics.upright_energy() - mechanical_energy(&self.physics, state);
                let pump = state[4] * state[1].cos();
                let direction = if pump >= 0.0 { 1.0 } else { -1.0 };
                let u = -self.k_swing * deficit * direction
                    - self.k_cart * state[0]
                    - self.k_cart_damp * state[3];
                LawOutput {
                    force: saturate(u, cfg.force_limit),
                    surface: self.stabilizer.surface().value(&wrapped),
                }
            }
        }
    }

    fn settings(&self) -> &ControllerConfig {
        &self.settings
    }

    fn reset(&mut self) {
        self.mode = SwingMode::Swinging;
        self.stabilizer.reset();
    }
}
