// tests/controllers.rs
use dip_smc::controllers::swing_up::SwingMode;
use dip_smc::controllers::{
    ControlHistory, ControlLaw, Controller, ControllerConfig, ControllerKind, Phase,
};
use dip_smc::dynamics::{DynamicsKind, DynamicsModel, PhysicsParams, State};
use dip_smc::mechanics::{SwitchingFunction, seeded, uniform};
use dip_smc::sim::{SimulationConfig, SimulationResult, Simulator};
use std::f64::consts::PI;

const DT: f64 = 0.01;

fn build(kind: ControllerKind, gains: &[f64], settings: &ControllerConfig) -> Controller {
    Controller::new(kind, gains, &PhysicsParams::default(), settings, DT).unwrap()
}

fn run_with(kind: ControllerKind, gains: &[f64], settings: &ControllerConfig, x0: State) -> SimulationResult {
    let sim = Simulator::new(
        DynamicsModel::new(DynamicsKind::Full, PhysicsParams::default()).unwrap(),
        SimulationConfig::default(),
    )
    .unwrap();
    let mut c = build(kind, gains, settings);
    sim.run(&mut c, &x0)
}

fn chattering(run: &SimulationResult) -> f64 {
    run.controls.windows(2).map(|p| (p[1] - p[0]).powi(2)).sum()
}

/* ──────────────────────────────────────────────────────────────────────────
Actuator limits
────────────────────────────────────────────────────────────────────────── */

#[test]
fn every_variant_respects_max_force_on_arbitrary_states() {
    let settings = ControllerConfig::default();
    let mut rng = seeded(2024);
    for kind in ControllerKind::ALL {
        let mut c = build(kind, kind.default_gains(), &settings);
        let mut h = ControlHistory::default();
        let mut previous = 0.0;
        for _ in 0..300 {
            let x = State::new(
                uniform(&mut rng, -2.0, 2.0),
                uniform(&mut rng, -PI, PI),
                uniform(&mut rng, -PI, PI),
                uniform(&mut rng, -5.0, 5.0),
                uniform(&mut rng, -10.0, 10.0),
                uniform(&mut rng, -10.0, 10.0),
            );
            let out = c.compute(&x, previous, &mut h);
            assert!(
                out.force.abs() <= settings.max_force,
                "{} produced {} at {:?}",
                kind.name(),
                out.force,
                x.as_slice()
            );
            previous = out.force;
        }
    }
}

#[test]
fn slew_limit_bounds_force_increments() {
    let settings = ControllerConfig {
        max_slew_rate: Some(20.0),
        ..Default::default()
    };
    let mut c = build(ControllerKind::Classical, ControllerKind::Classical.default_gains(), &settings);
    let mut h = ControlHistory::default();
    let x = State::new(0.0, 0.3, -0.2, 0.0, 0.0, 0.0);
    let mut previous = 0.0;
    for _ in 0..20 {
        let out = c.compute(&x, previous, &mut h);
        assert!((out.force - previous).abs() <= 20.0 * DT + 1e-12);
        previous = out.force;
    }
}

#[test]
fn tiny_actuator_saturates_and_is_flagged() {
    let settings = ControllerConfig {
        max_force: 1.0,
        ..Default::default()
    };
    let run = run_with(
        ControllerKind::Classical,
        ControllerKind::Classical.default_gains(),
        &settings,
        State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0),
    );
    assert!(run.controls.iter().all(|u| u.abs() <= 1.0));
    assert!(run.steps() > 0);
    assert_eq!(run.saturated_steps, run.steps());
    assert_eq!(run.saturation_fraction(), 1.0);
    assert!(run.saturation_flagged);
}

/* ──────────────────────────────────────────────────────────────────────────
Switching and phases
────────────────────────────────────────────────────────────────────────── */

#[test]
fn thinner_boundary_layer_chatters_more() {
    let x0 = State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0);
    let gains = ControllerKind::Classical.default_gains();
    let smooth = run_with(ControllerKind::Classical, gains, &ControllerConfig::default(), x0);
    let relay = run_with(
        ControllerKind::Classical,
        gains,
        &ControllerConfig {
            boundary_layer: 0.0,
            ..Default::default()
        },
        x0,
    );
    assert!(!smooth.is_diverged() && !relay.is_diverged());
    assert!(chattering(&relay) > 10.0 * chattering(&smooth));
}

#[test]
fn switching_functions_all_stabilize_the_default_case() {
    let x0 = State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0);
    for switching in [
        SwitchingFunction::Sign,
        SwitchingFunction::Saturation,
        SwitchingFunction::Tanh,
    ] {
        let settings = ControllerConfig {
            switching,
            ..Default::default()
        };
        let run = run_with(
            ControllerKind::Classical,
            ControllerKind::Classical.default_gains(),
            &settings,
            x0,
        );
        assert!(!run.is_diverged(), "{switching:?} diverged");
    }
}

#[test]
fn run_reaches_the_sliding_phase() {
    let run = run_with(
        ControllerKind::Classical,
        ControllerKind::Classical.default_gains(),
        &ControllerConfig::default(),
        State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0),
    );
    assert!(run.sliding_steps > run.steps() / 2);
}

#[test]
fn history_phase_follows_surface_sign() {
    let settings = ControllerConfig::default();
    let mut c = build(ControllerKind::Classical, ControllerKind::Classical.default_gains(), &settings);
    let mut h = ControlHistory::default();
    let far = State::new(0.0, 0.3, 0.3, 0.0, 0.0, 0.0);
    assert_eq!(c.compute(&far, 0.0, &mut h).phase, Phase::Reaching);
    let mirrored = State::new(0.0, -0.3, -0.3, 0.0, 0.0, 0.0);
    assert_eq!(c.compute(&mirrored, 0.0, &mut h).phase, Phase::Sliding);
    assert_eq!(h.steps, 2);
}

/* ──────────────────────────────────────────────────────────────────────────
Default gains per variant
────────────────────────────────────────────────────────────────────────── */

#[test]
fn stabilizing_variants_hold_the_pendulum_with_default_gains() {
    let x0 = State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0);
    let settings = ControllerConfig::default();
    for kind in ControllerKind::ALL {
        if kind == ControllerKind::SwingUp {
            continue;
        }
        let run = run_with(kind, kind.default_gains(), &settings, x0);
        assert!(!run.is_diverged(), "{} diverged", kind.name());
        let x = run.final_state();
        assert!(x[1].abs() < 1e-2 && x[2].abs() < 1e-2, "{} did not settle", kind.name());
    }
}

#[test]
fn inert_gains_let_the_pendulum_fall() {
    let x0 = State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0);
    let settings = ControllerConfig::default();
    for kind in ControllerKind::ALL {
        if kind == ControllerKind::SwingUp {
            continue;
        }
        let run = run_with(kind, &kind.inert_gains(), &settings, x0);
        assert!(run.is_diverged(), "{} stayed up with zero gains", kind.name());
    }
}

#[test]
fn full_state_surface_recenters_the_cart() {
    let x0 = State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0);
    let settings = ControllerConfig::default();
    let classical = run_with(
        ControllerKind::Classical,
        ControllerKind::Classical.default_gains(),
        &settings,
        x0,
    );
    let full = run_with(
        ControllerKind::FullStateSmc,
        ControllerKind::FullStateSmc.default_gains(),
        &settings,
        x0,
    );
    assert!(full.final_state()[0].abs() < 0.1 * classical.final_state()[0].abs());
}

/* ──────────────────────────────────────────────────────────────────────────
Internal state
────────────────────────────────────────────────────────────────────────── */

#[test]
fn reset_restores_fresh_behaviour() {
    let settings = ControllerConfig::default();
    let x = State::new(0.0, 0.2, -0.1, 0.0, 0.5, 0.0);
    for kind in ControllerKind::ALL {
        let mut fresh = build(kind, kind.default_gains(), &settings);
        let mut used = build(kind, kind.default_gains(), &settings);
        let mut h = ControlHistory::default();
        for _ in 0..50 {
            used.compute(&x, 0.0, &mut h);
        }
        used.reset();
        let a = fresh.law(&x);
        let b = used.law(&x);
        assert_eq!(a, b, "{} kept state across reset", kind.name());
    }
}

#[test]
fn controllers_do_not_share_adaptive_state() {
    let settings = ControllerConfig::default();
    let gains = ControllerKind::Adaptive.default_gains();
    let mut a = build(ControllerKind::Adaptive, gains, &settings);
    let b = build(ControllerKind::Adaptive, gains, &settings);
    let mut h = ControlHistory::default();
    for _ in 0..20 {
        a.compute(&State::new(0.0, 0.2, -0.1, 0.0, 0.0, 0.0), 0.0, &mut h);
    }
    let (Controller::Adaptive(a), Controller::Adaptive(b)) = (a, b) else {
        panic!("wrong variant");
    };
    assert!(a.gain() > b.gain());
    assert_eq!(b.gain(), settings.adaptive.initial_gain);
}

#[test]
fn super_twisting_integral_is_clamped() {
    let settings = ControllerConfig::default();
    let mut c = build(
        ControllerKind::SuperTwisting,
        &[5.0, 1_000.0, 1.0, 1.0, 2.0, 10.0],
        &settings,
    );
    let mut h = ControlHistory::default();
    let x = State::new(0.0, 0.3, 0.1, 0.0, 0.0, 0.0);
    for _ in 0..100 {
        c.compute(&x, 0.0, &mut h);
    }
    let Controller::SuperTwisting(sta) = c else {
        panic!("wrong variant");
    };
    assert_eq!(sta.integral().abs(), settings.super_twisting.integral_limit);
}

#[test]
fn integral_term_accumulates_angle_error() {
    let settings = ControllerConfig::default();
    let kind = ControllerKind::IntegralSmc;
    let mut c = build(kind, kind.default_gains(), &settings);
    let mut h = ControlHistory::default();
    // σ̇ = λ1·θ1 + λ2·(θ2 − θ1) = 2·0.1 with both links tilted together.
    let x = State::new(0.0, 0.1, 0.1, 0.0, 0.0, 0.0);
    for _ in 0..10 {
        c.compute(&x, 0.0, &mut h);
    }
    let Controller::IntegralSmc(smc) = c else {
        panic!("wrong variant");
    };
    assert!((smc.integral() - 0.02).abs() < 1e-12);
}

#[test]
fn hybrid_gains_adapt_and_stay_bounded() {
    let settings = ControllerConfig::default();
    let mut c = build(
        ControllerKind::HybridAdaptiveSta,
        ControllerKind::HybridAdaptiveSta.default_gains(),
        &settings,
    );
    let mut h = ControlHistory::default();
    let x = State::new(0.0, 0.4, -0.3, 0.0, 1.0, 0.0);
    for _ in 0..5_000 {
        c.compute(&x, 0.0, &mut h);
    }
    let Controller::HybridAdaptiveSta(hy) = c else {
        panic!("wrong variant");
    };
    let (k1, k2) = hy.gains();
    assert!(k1 > settings.hybrid.initial_k1);
    assert!(k1 <= settings.hybrid.max_gain && k2 <= settings.hybrid.max_gain);
}

/* ──────────────────────────────────────────────────────────────────────────
Swing-up supervisor
────────────────────────────────────────────────────────────────────────── */

#[test]
fn swing_up_mode_switch_has_hysteresis() {
    let settings = ControllerConfig::default();
    let kind = ControllerKind::SwingUp;
    let Controller::SwingUp(mut c) = build(kind, kind.default_gains(), &settings) else {
        panic!("wrong variant");
    };
    assert_eq!(c.mode(), SwingMode::Swinging);

    // Hanging: keep pumping.
    c.law(&State::new(0.0, PI - 0.1, PI - 0.1, 0.0, 0.0, 0.0));
    assert_eq!(c.mode(), SwingMode::Swinging);

    // Inside the capture angle: hand over.
    c.law(&State::new(0.0, 0.2, -0.2, 0.0, 0.0, 0.0));
    assert_eq!(c.mode(), SwingMode::Stabilizing);

    // Between capture and exit angles: stay with the stabiliser.
    c.law(&State::new(0.0, 0.5, 0.0, 0.0, 0.0, 0.0));
    assert_eq!(c.mode(), SwingMode::Stabilizing);

    // Beyond the exit angle: back to pumping.
    c.law(&State::new(0.0, 0.8, 0.0, 0.0, 0.0, 0.0));
    assert_eq!(c.mode(), SwingMode::Swinging);

    // A full extra turn wraps to the same capture region.
    c.law(&State::new(0.0, 0.1 + 2.0 * PI, -0.1, 0.0, 0.0, 0.0));
    assert_eq!(c.mode(), SwingMode::Stabilizing);
}

#[test]
fn swing_up_pumping_respects_its_own_force_limit() {
    let settings = ControllerConfig::default();
    let kind = ControllerKind::SwingUp;
    let mut c = build(kind, kind.default_gains(), &settings);
    let mut h = ControlHistory::default();
    let out = c.compute(&State::new(0.0, PI, PI, 0.0, 0.0, 0.0), 0.0, &mut h);
    assert!(out.force.abs() <= settings.swing_up.force_limit);
    assert!(out.force.abs() > 0.0);
}
