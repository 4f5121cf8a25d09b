// tests/core.rs
use dip_smc::controllers::{Controller, ControllerConfig, ControllerKind};
use dip_smc::dynamics::{DynamicsKind, DynamicsModel, PhysicsParams, State};
use dip_smc::sim::{SimulationConfig, SimulationResult, Simulator};
use dip_smc::{refine_det, refine_try};
use std::cell::RefCell;
use std::rc::Rc;

/* ──────────────────────────────────────────────────────────────────────────
1) Proportional loop on a first-order lag: steady state converges to target
────────────────────────────────────────────────────────────────────────── */

/// ẏ = −y + k·(r − y), integrated with forward Euler until settled.
fn settle(k: f64) -> f64 {
    let (r, dt) = (1.0, 0.01);
    let mut y = 0.0;
    for _ in 0..5_000 {
        y += dt * (-y + k * (r - y));
    }
    y
}

#[test]
fn proportional_gain_converges_to_steady_state_target() {
    // y_ss = k / (1 + k); target 0.9 ⇒ k = 9.
    let target = 0.9;
    let eta = 20.0;

    let k = refine_det(
        2.0_f64,
        |k: &f64| settle(*k),
        |y: &f64| target - y,
        |k: &f64, err: &f64| k + eta * err,
        |a: &f64, b: &f64| (a - b).abs() < 1e-10,
        10_000,
    );

    assert!((k - 9.0).abs() < 1e-6, "gain not at 9: {k}");
    assert!((settle(k) - target).abs() < 1e-6);
}

/* ──────────────────────────────────────────────────────────────────────────
2) Iteration budget: loop stops after max_iters even if never converged
────────────────────────────────────────────────────────────────────────── */

#[test]
fn iteration_budget_is_respected() {
    let calls = Rc::new(RefCell::new(0usize));

    let simulate = {
        let calls = Rc::clone(&calls);
        move |_t: &u32| {
            *calls.borrow_mut() += 1;
        }
    };
    let measure = |_d: &()| ();
    let update = |t: &u32, _m: &()| t + 1;

    let out = refine_det(0u32, simulate, measure, update, |_, _| false, 37);

    assert_eq!(out, 37);
    assert_eq!(*calls.borrow(), 37);
}

/* ──────────────────────────────────────────────────────────────────────────
3) Fallible simulate: the first error stops the loop and is returned
────────────────────────────────────────────────────────────────────────── */

#[test]
fn fallible_loop_stops_at_first_error() {
    let seen = Rc::new(RefCell::new(Vec::new()));

    let simulate = {
        let seen = Rc::clone(&seen);
        move |t: &i32| -> Result<i32, String> {
            seen.borrow_mut().push(*t);
            if *t > 3 { Err(format!("rejected {t}")) } else { Ok(*t) }
        }
    };

    let out = refine_try(0, simulate, |d: &i32| *d, |t: &i32, _m: &i32| t + 1, |_, _| false, 100);

    assert_eq!(out, Err("rejected 4".to_string()));
    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn fallible_loop_returns_converged_value() {
    let out: Result<f64, ()> = refine_try(
        1.0,
        |t: &f64| Ok(*t),
        |d: &f64| d / 2.0,
        |_t: &f64, m: &f64| *m,
        |a: &f64, b: &f64| (a - b).abs() < 1e-12,
        1_000,
    );
    let v = out.unwrap();
    assert!(v.abs() < 1e-11, "not converged to 0: {v}");
}

/* ──────────────────────────────────────────────────────────────────────────
4) Closed loop: raise the damping gain until the pendulum stays up
────────────────────────────────────────────────────────────────────────── */

#[test]
fn refinement_over_real_simulations_finds_a_stabilizing_gain() {
    let physics = PhysicsParams::default();
    let settings = ControllerConfig::default();
    let sim = Simulator::new(
        DynamicsModel::new(DynamicsKind::Full, physics.clone()).unwrap(),
        SimulationConfig::default(),
    )
    .unwrap();
    let x0 = State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0);

    // θ = [k1, k2, λ1, λ2, K, kd]; start from the inert vector and raise
    // the switching gain and damping together.
    let simulate = |gains: &Vec<f64>| -> SimulationResult {
        let mut c = Controller::new(ControllerKind::Classical, gains, &physics, &settings, sim.config().dt)
            .unwrap();
        sim.run(&mut c, &x0)
    };
    let measure = |r: &SimulationResult| r.is_diverged();
    let update = |gains: &Vec<f64>, diverged: &bool| {
        if *diverged {
            let defaults = ControllerKind::Classical.default_gains();
            gains
                .iter()
                .zip(defaults)
                .map(|(g, d)| (g + 0.25 * d).min(*d))
                .collect::<Vec<f64>>()
        } else {
            gains.clone()
        }
    };

    let gains = refine_det(
        vec![0.0; 6],
        simulate,
        measure,
        update,
        |a: &Vec<f64>, b: &Vec<f64>| a == b,
        10,
    );

    let mut c = Controller::new(ControllerKind::Classical, &gains, &physics, &settings, sim.config().dt).unwrap();
    let run = sim.run(&mut c, &x0);
    assert!(!run.is_diverged(), "no stabilizing gains found: {gains:?}");
    assert!(gains.iter().all(|g| *g > 0.0));
}
