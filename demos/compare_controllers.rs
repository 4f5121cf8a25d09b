// demos/compare_controllers.rs
// Run with:
//   cargo run --example compare_controllers

use dip_smc::controllers::{ControlLaw, Controller, ControllerConfig, ControllerKind};
use dip_smc::dynamics::{DynamicsKind, DynamicsModel, PhysicsParams, State};
use dip_smc::optimizer::{CostEvaluator, CostWeights};
use dip_smc::sim::{RunStatus, SimulationConfig, Simulator};

fn main() -> dip_smc::Result<()> {
    let physics = PhysicsParams::default();
    let settings = ControllerConfig::default();
    let evaluator = CostEvaluator::new(CostWeights::default());
    let x0 = State::new(0.0, 0.1, -0.05, 0.0, 0.0, 0.0);

    for dynamics in [DynamicsKind::Full, DynamicsKind::Linearized] {
        let sim = Simulator::new(
            DynamicsModel::new(dynamics, physics.clone())?,
            SimulationConfig::default(),
        )?;
        println!("== {dynamics:?} plant, x0 = {:?} ==", x0.as_slice());
        for kind in ControllerKind::ALL {
            if kind == ControllerKind::SwingUp {
                continue;
            }
            let mut c = Controller::new(kind, kind.default_gains(), &physics, &settings, sim.config().dt)?;
            let run = sim.run(&mut c, &x0);
            let status = match run.status {
                RunStatus::Completed => "completed".to_string(),
                RunStatus::RejectedInitial => "rejected start".to_string(),
                RunStatus::Diverged { step } => format!("diverged @ {step}"),
            };
            let peak = run.controls.iter().fold(0.0_f64, |m, u| m.max(u.abs()));
            println!(
                "{:<22} {:<16} cost {:>9.4}  |u|max {:>7.2}  sliding {:>5.1}%  final θ ({:+.4}, {:+.4})",
                kind.name(),
                status,
                evaluator.cost(&run),
                peak,
                100.0 * run.sliding_steps as f64 / run.steps().max(1) as f64,
                run.final_state()[1],
                run.final_state()[2],
            );
            c.reset();
        }
    }

    // Swing-up from hanging: no angle limit, report the energy climb.
    let sim = Simulator::new(
        DynamicsModel::new(DynamicsKind::Full, physics.clone())?,
        SimulationConfig {
            duration: 5.0,
            max_angle: None,
            ..Default::default()
        },
    )?;
    let kind = ControllerKind::SwingUp;
    let mut c = Controller::new(kind, kind.default_gains(), &physics, &settings, sim.config().dt)?;
    let hanging = State::new(0.0, std::f64::consts::PI - 0.1, std::f64::consts::PI - 0.1, 0.0, 0.0, 0.0);
    let run = sim.run(&mut c, &hanging);
    let energy = |x: &State| dip_smc::dynamics::mechanical_energy(&physics, x);
    println!("== swing-up ==");
    println!(
        "E0 {:.3}  E_end {:.3}  E_up {:.3}",
        energy(&hanging),
        energy(run.final_state()),
        physics.upright_energy()
    );
    Ok(())
}
