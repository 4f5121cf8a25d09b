/*!
Sliding-mode control laws.

What it does
- Computes the actuator force from the plant state for seven variants
  (classical, super-twisting, adaptive, hybrid adaptive super-twisting,
  energy swing-up, integral and full-state sliding mode).
- Every variant builds on one [`SlidingSurface`] and the affine
  decomposition `ṡ = a·u + b`; the force is `(−b + corrective)/a`.
- Applies the shared post-processing: optional slew limit, saturation to
  `max_force`, and the Reaching/Sliding phase machine.

How to use
- `Controller::new(kind, &gains, &physics, &settings, dt)?`, then call
  [`ControlLaw::compute`] once per control interval with a
  [`ControlHistory`] owned by the run.
- Build a fresh controller (or call [`ControlLaw::reset`]) per run; adaptive
  gains and integrators live inside the instance.

What it does NOT do
- No integration, no cost bookkeeping.
*/

pub mod adaptive;
pub mod classical;
pub mod full_state;
pub mod hybrid;
pub mod integral;
pub mod super_twisting;
pub mod surface;
pub mod swing_up;

use serde::{Deserialize, Serialize};

pub use adaptive::AdaptiveSmc;
pub use classical::ClassicalSmc;
pub use full_state::FullStateSmc;
pub use hybrid::HybridAdaptiveSta;
pub use integral::IntegralSmc;
pub use super_twisting::SuperTwistingSmc;
pub use surface::{SlidingSurface, SurfaceRate, floor_magnitude};
pub use swing_up::SwingUpController;

use crate::dynamics::{PhysicsParams, State};
use crate::error::{
    ConfigError, Result, require_non_negative, require_positive, require_range,
};
use crate::mechanics::control::{SwitchingFunction, saturate, slew};

/// Reaching or sliding, tracked per run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Reaching,
    Sliding,
}

/// What one control step produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlOutput {
    /// Force after slew limiting and saturation.
    pub force: f64,
    pub surface: f64,
    pub phase: Phase,
    /// `true` if the unclipped force exceeded `max_force`.
    pub saturated: bool,
}

/// Phase-machine state carried between control steps. Saturation and
/// sliding counts live on the run result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlHistory {
    pub previous_surface: Option<f64>,
    pub phase: Phase,
    pub steps: usize,
}

impl ControlHistory {
    /// Advance the phase machine with surface value `s`.
    ///
    /// Reaching → Sliding on a zero crossing or `|s| ≤ band`;
    /// Sliding → Reaching once `|s| > 2·band`.
    pub fn advance(&mut self, s: f64, band: f64) -> Phase {
        self.phase = match self.phase {
            Phase::Reaching => {
                let crossed = self.previous_surface.is_some_and(|prev| prev * s <= 0.0);
                if crossed || s.abs() <= band {
                    Phase::Sliding
                } else {
                    Phase::Reaching
                }
            }
            Phase::Sliding if s.abs() > 2.0 * band => Phase::Reaching,
            Phase::Sliding => Phase::Sliding,
        };
        self.previous_surface = Some(s);
        self.steps += 1;
        self.phase
    }
}

/// Unsaturated output of a control law.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LawOutput {
    pub force: f64,
    pub surface: f64,
}

/// Plug-in boundary for control laws.
pub trait ControlLaw {
    /// Raw force and surface value at `state`; may advance internal state
    /// (adaptive gains, integrators) by one control interval.
    fn law(&mut self, state: &State) -> LawOutput;

    fn settings(&self) -> &ControllerConfig;

    /// Restore the freshly-constructed internal state.
    fn reset(&mut self);

    /// One control step: law, slew limit, saturation, phase update.
    fn compute(
        &mut self,
        state: &State,
        previous_control: f64,
        history: &mut ControlHistory,
    ) -> ControlOutput {
        let raw = self.law(state);
        let cfg = self.settings();
        let mut force = raw.force;
        if let Some(rate) = cfg.max_slew_rate {
            force = slew(previous_control, force, rate * cfg.dt);
        }
        // A NaN force stays NaN so the run is flagged as diverged.
        let saturated = force.abs() > cfg.max_force;
        let force = saturate(force, cfg.max_force);
        let band = if cfg.boundary_layer > 0.0 {
            cfg.boundary_layer
        } else {
            cfg.reaching_threshold
        };
        let phase = history.advance(raw.surface, band);
        ControlOutput {
            force,
            surface: raw.surface,
            phase,
            saturated,
        }
    }
}

/// Which control law to build; fixes the gain-vector layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerKind {
    /// `[k1, k2, λ1, λ2, K, kd]`
    #[default]
    Classical,
    /// `[K1, K2, k1, k2, λ1, λ2]`
    SuperTwisting,
    /// `[k1, k2, λ1, λ2, γ]`
    Adaptive,
    /// `[k1, λ1, k2, λ2]`
    HybridAdaptiveSta,
    /// `[k_swing, k_cart, k_cart_damp, k1, k2, λ1, λ2, K, kd]`
    SwingUp,
    /// `[k1, k2, λ1, λ2, ki, K, kd]`
    IntegralSmc,
    /// `[k1, k2, λ1, λ2, k_ẋ, k_x, K, kd]`
    FullStateSmc,
}

impl ControllerKind {
    pub const ALL: [ControllerKind; 7] = [
        Self::Classical,
        Self::SuperTwisting,
        Self::Adaptive,
        Self::HybridAdaptiveSta,
        Self::SwingUp,
        Self::IntegralSmc,
        Self::FullStateSmc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Classical => "classical",
            Self::SuperTwisting => "super_twisting",
            Self::Adaptive => "adaptive",
            Self::HybridAdaptiveSta => "hybrid_adaptive_sta",
            Self::SwingUp => "swing_up",
            Self::IntegralSmc => "integral_smc",
            Self::FullStateSmc => "full_state_smc",
        }
    }

    pub fn default_gains(self) -> &'static [f64] {
        match self {
            Self::Classical => &[1.0, 1.0, 2.0, 10.0, 5.0, 1.0],
            Self::SuperTwisting => &[5.0, 3.0, 1.0, 1.0, 2.0, 10.0],
            Self::Adaptive => &[1.0, 1.0, 2.0, 10.0, 4.0],
            Self::HybridAdaptiveSta => &[1.0, 2.0, 1.0, 10.0],
            Self::SwingUp => &[50.0, 2.0, 2.0, 1.0, 1.0, 2.0, 10.0, 5.0, 1.0],
            Self::IntegralSmc => &[1.0, 1.0, 2.0, 10.0, 0.5, 5.0, 1.0],
            Self::FullStateSmc => &[1.1, 1.0, 2.6, 10.4, 0.36, 0.17, 5.0, 1.0],
        }
    }

    pub fn gain_count(self) -> usize {
        self.default_gains().len()
    }

    /// Gains with no corrective action at all: the surface is identically
    /// zero and every law outputs zero force.
    pub fn inert_gains(self) -> Vec<f64> {
        vec![0.0; self.gain_count()]
    }

    /// Length, finiteness and sign of a gain vector.
    pub fn validate_gains(self, field: &str, gains: &[f64]) -> std::result::Result<(), ConfigError> {
        if gains.len() != self.gain_count() {
            return Err(ConfigError::GainCount {
                field: field.to_string(),
                controller: self.name(),
                expected: self.gain_count(),
                got: gains.len(),
            });
        }
        for (i, &g) in gains.iter().enumerate() {
            require_non_negative(&format!("{field}[{i}]"), g)?;
        }
        Ok(())
    }
}

/// Super-twisting settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperTwistingConfig {
    /// Anti-windup bound on the integral term `z`.
    pub integral_limit: f64,
}

impl Default for SuperTwistingConfig {
    fn default() -> Self {
        Self {
            integral_limit: 50.0,
        }
    }
}

/// Adaptive-gain settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub initial_gain: f64,
    pub min_gain: f64,
    pub max_gain: f64,
    pub leak: f64,
    pub dead_zone: f64,
    /// Proportional term `α·s` added to the switching term.
    pub alpha: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            initial_gain: 10.0,
            min_gain: 0.1,
            max_gain: 100.0,
            leak: 0.01,
            dead_zone: 0.01,
            alpha: 0.5,
        }
    }
}

/// Hybrid adaptive super-twisting settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub initial_k1: f64,
    pub initial_k2: f64,
    pub rate_k1: f64,
    pub rate_k2: f64,
    pub min_gain: f64,
    pub max_gain: f64,
    pub leak: f64,
    pub dead_zone: f64,
    /// Below this `|a|` the equivalent term is fully faded out.
    pub a_low: f64,
    /// Above this `|a|` the equivalent term is fully applied; also the
    /// floor of the corrective divisor.
    pub a_high: f64,
    pub damping: f64,
    pub integral_limit: f64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            initial_k1: 5.0,
            initial_k2: 2.0,
            rate_k1: 2.0,
            rate_k2: 0.5,
            min_gain: 0.1,
            max_gain: 50.0,
            leak: 0.01,
            dead_zone: 0.01,
            a_low: 0.05,
            a_high: 0.2,
            damping: 1.0,
            integral_limit: 50.0,
        }
    }
}

/// Energy swing-up settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingUpConfig {
    /// Hand over to the stabiliser when both wrapped angles are inside this.
    pub switch_angle: f64,
    /// Return to swinging when either wrapped angle leaves this.
    pub exit_angle: f64,
    pub force_limit: f64,
}

impl Default for SwingUpConfig {
    fn default() -> Self {
        Self {
            switch_angle: 0.35,
            exit_angle: 0.6,
            force_limit: 50.0,
        }
    }
}

/// Integral sliding-mode settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegralConfig {
    /// Bound on the accumulated surface integral `σ`.
    pub integral_limit: f64,
}

impl Default for IntegralConfig {
    fn default() -> Self {
        Self {
            integral_limit: 10.0,
        }
    }
}

/// Settings shared by every control law plus per-variant sections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Control interval; set from the simulation step.
    #[serde(skip)]
    pub dt: f64,
    pub max_force: f64,
    /// Boundary-layer width `φ`; `0` means hard sign.
    pub boundary_layer: f64,
    pub switching: SwitchingFunction,
    /// Phase band used when `boundary_layer` is zero.
    pub reaching_threshold: f64,
    /// Minimum `|a|` in `ṡ = a·u + b`.
    pub singularity_floor: f64,
    /// Slew limit in N/s; `None` disables it.
    pub max_slew_rate: Option<f64>,
    pub super_twisting: SuperTwistingConfig,
    pub adaptive: AdaptiveConfig,
    pub hybrid: HybridConfig,
    pub swing_up: SwingUpConfig,
    pub integral: IntegralConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            max_force: 150.0,
            boundary_layer: 0.1,
            switching: SwitchingFunction::Saturation,
            reaching_threshold: 1e-3,
            singularity_floor: 1e-4,
            max_slew_rate: None,
            super_twisting: SuperTwistingConfig::default(),
            adaptive: AdaptiveConfig::default(),
            hybrid: HybridConfig::default(),
            swing_up: SwingUpConfig::default(),
            integral: IntegralConfig::default(),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        const P: &str = "controller_settings";
        require_positive(&format!("{P}.max_force"), self.max_force)?;
        require_non_negative(&format!("{P}.boundary_layer"), self.boundary_layer)?;
        require_positive(&format!("{P}.reaching_threshold"), self.reaching_threshold)?;
        require_positive(&format!("{P}.singularity_floor"), self.singularity_floor)?;
        if let Some(rate) = self.max_slew_rate {
            require_positive(&format!("{P}.max_slew_rate"), rate)?;
        }
        require_positive(
            &format!("{P}.super_twisting.integral_limit"),
            self.super_twisting.integral_limit,
        )?;

        let a = &self.adaptive;
        require_positive(&format!("{P}.adaptive.min_gain"), a.min_gain)?;
        require_range(&format!("{P}.adaptive.max_gain"), a.max_gain, a.min_gain, f64::MAX)?;
        require_range(
            &format!("{P}.adaptive.initial_gain"),
            a.initial_gain,
            a.min_gain,
            a.max_gain,
        )?;
        require_non_negative(&format!("{P}.adaptive.leak"), a.leak)?;
        require_non_negative(&format!("{P}.adaptive.dead_zone"), a.dead_zone)?;
        require_non_negative(&format!("{P}.adaptive.alpha"), a.alpha)?;

        let h = &self.hybrid;
        require_positive(&format!("{P}.hybrid.min_gain"), h.min_gain)?;
        require_range(&format!("{P}.hybrid.max_gain"), h.max_gain, h.min_gain, f64::MAX)?;
        require_range(&format!("{P}.hybrid.initial_k1"), h.initial_k1, h.min_gain, h.max_gain)?;
        require_range(&format!("{P}.hybrid.initial_k2"), h.initial_k2, h.min_gain, h.max_gain)?;
        require_non_negative(&format!("{P}.hybrid.rate_k1"), h.rate_k1)?;
        require_non_negative(&format!("{P}.hybrid.rate_k2"), h.rate_k2)?;
        require_non_negative(&format!("{P}.hybrid.leak"), h.leak)?;
        require_non_negative(&format!("{P}.hybrid.dead_zone"), h.dead_zone)?;
        require_non_negative(&format!("{P}.hybrid.a_low"), h.a_low)?;
        if h.a_high <= h.a_low {
            return Err(ConfigError::invalid(
                format!("{P}.hybrid.a_high"),
                format!("must exceed a_low ({}), got {}", h.a_low, h.a_high),
            ));
        }
        require_non_negative(&format!("{P}.hybrid.damping"), h.damping)?;
        require_positive(&format!("{P}.hybrid.integral_limit"), h.integral_limit)?;

        let s = &self.swing_up;
        require_positive(&format!("{P}.swing_up.switch_angle"), s.switch_angle)?;
        if s.exit_angle <= s.switch_angle {
            return Err(ConfigError::invalid(
                format!("{P}.swing_up.exit_angle"),
                format!("must exceed switch_angle ({}), got {}", s.switch_angle, s.exit_angle),
            ));
        }
        require_positive(&format!("{P}.swing_up.force_limit"), s.force_limit)?;
        require_positive(&format!("{P}.integral.integral_limit"), self.integral.integral_limit)?;
        Ok(())
    }
}

/// Closed set of control laws.
#[derive(Clone, Debug)]
pub enum Controller {
    Classical(ClassicalSmc),
    SuperTwisting(SuperTwistingSmc),
    Adaptive(AdaptiveSmc),
    HybridAdaptiveSta(HybridAdaptiveSta),
    SwingUp(SwingUpController),
    IntegralSmc(IntegralSmc),
    FullStateSmc(FullStateSmc),
}

impl Controller {
    /// Validate and build. `dt` is the control interval.
    pub fn new(
        kind: ControllerKind,
        gains: &[f64],
        physics: &PhysicsParams,
        settings: &ControllerConfig,
        dt: f64,
    ) -> Result<Self> {
        kind.validate_gains("gains", gains)?;
        require_positive("dt", dt)?;
        let settings = ControllerConfig {
            dt,
            ..settings.clone()
        };
        let physics = physics.clone();
        Ok(match kind {
            ControllerKind::Classical => {
                Self::Classical(ClassicalSmc::new(gains, physics, settings))
            }
            ControllerKind::SuperTwisting => {
                Self::SuperTwisting(SuperTwistingSmc::new(gains, physics, settings))
            }
            ControllerKind::Adaptive => Self::Adaptive(AdaptiveSmc::new(gains, physics, settings)),
            ControllerKind::HybridAdaptiveSta => {
                Self::HybridAdaptiveSta(HybridAdaptiveSta::new(gains, physics, settings))
            }
            ControllerKind::SwingUp => Self::SwingUp(SwingUpController::new(gains, physics, settings)),
            ControllerKind::IntegralSmc => {
                Self::IntegralSmc(IntegralSmc::new(gains, physics, settings))
            }
            ControllerKind::FullStateSmc => {
                Self::FullStateSmc(FullStateSmc::new(gains, physics, settings))
            }
        })
    }

    pub fn kind(&self) -> ControllerKind {
        match self {
            Self::Classical(_) => ControllerKind::Classical,
            Self::SuperTwisting(_) => ControllerKind::SuperTwisting,
            Self::Adaptive(_) => ControllerKind::Adaptive,
            Self::HybridAdaptiveSta(_) => ControllerKind::HybridAdaptiveSta,
            Self::SwingUp(_) => ControllerKind::SwingUp,
            Self::IntegralSmc(_) => ControllerKind::IntegralSmc,
            Self::FullStateSmc(_) => ControllerKind::FullStateSmc,
        }
    }
}

impl ControlLaw for Controller {
    fn law(&mut self, state: &State) -> LawOutput {
        match self {
            Self::Classical(c) => c.law(state),
            Self::SuperTwisting(c) => c.law(state),
            Self::Adaptive(c) => c.law(state),
            Self::HybridAdaptiveSta(c) => c.law(state),
            Self::SwingUp(c) => c.law(state),
            Self::IntegralSmc(c) => c.law(state),
            Self::FullStateSmc(c) => c.law(state),
        }
    }

    fn settings(&self) -> &ControllerConfig {
        match self {
            Self::Classical(c) => c.settings(),
            Self::SuperTwisting(c) => c.settings(),
            Self::Adaptive(c) => c.settings(),
            Self::HybridAdaptiveSta(c) => c.settings(),
            Self::SwingUp(c) => c.settings(),
            Self::IntegralSmc(c) => c.settings(),
            Self::FullStateSmc(c) => c.settings(),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Classical(c) => c.reset(),
            Self::SuperTwisting(c) => c.reset(),
            Self::Adaptive(c) => c.reset(),
            Self::HybridAdaptiveSta(c) => c.reset(),
            Self::SwingUp(c) => c.reset(),
            Self::IntegralSmc(c) => c.reset(),
            Self::FullStateSmc(c) => c.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_count_mismatch_names_variant() {
        let err = ControllerKind::Adaptive
            .validate_gains("controller_gains", &[1.0, 2.0])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "controller_gains: adaptive expects 5 gains, got 2"
        );
    }

    #[test]
    fn negative_gain_names_index() {
        let err = ControllerKind::Classical
            .validate_gains("gains", &[1.0, 1.0, 2.0, -10.0, 5.0, 1.0])
            .unwrap_err();
        assert_eq!(err.field(), "gains[3]");
    }

    #[test]
    fn inert_gains_zero_every_entry() {
        for kind in ControllerKind::ALL {
            let inert = kind.inert_gains();
            assert_eq!(inert.len(), kind.gain_count());
            assert!((4..=9).contains(&inert.len()), "{}", kind.name());
            assert!(inert.iter().all(|g| *g == 0.0));
        }
    }

    #[test]
    fn default_gains_are_valid_for_every_variant() {
        for kind in ControllerKind::ALL {
            assert!(kind.validate_gains("gains", kind.default_gains()).is_ok());
        }
    }

    #[test]
    fn phase_enters_sliding_on_zero_crossing() {
        let mut h = ControlHistory::default();
        assert_eq!(h.advance(1.0, 0.1), Phase::Reaching);
        assert_eq!(h.advance(0.5, 0.1), Phase::Reaching);
        assert_eq!(h.advance(-0.15, 0.1), Phase::Sliding);
        assert_eq!(h.advance(0.15, 0.1), Phase::Sliding);
        assert_eq!(h.advance(0.25, 0.1), Phase::Reaching);
        assert_eq!(h.steps, 5);
    }

    #[test]
    fn default_settings_validate() {
        assert!(ControllerConfig::default().validate().is_ok());
        let bad = ControllerConfig {
            swing_up: SwingUpConfig {
                exit_angle: 0.1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(bad.validate().unwrap_err().field(), "controller_settings.swing_up.exit_angle");
    }
}
