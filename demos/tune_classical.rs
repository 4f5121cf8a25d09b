// demos/tune_classical.rs
// Run with:
//   cargo run --release --example tune_classical --features parallel

use dip_smc::config::TuningConfig;
use dip_smc::controllers::ControllerKind;
use dip_smc::optimizer::{BestTrace, PsoConfig};
use dip_smc::tuning::tune_with_hooks;
use std::cell::RefCell;
use std::rc::Rc;

fn main() -> dip_smc::Result<()> {
    let cfg = TuningConfig {
        controller: ControllerKind::Classical,
        pso: PsoConfig {
            population: 16,
            iterations: 12,
            ..Default::default()
        },
        // Three tuning starts: both links leaning, opposite lean, cart offset.
        initial_conditions: vec![
            [0.0, 0.1, -0.05, 0.0, 0.0, 0.0],
            [0.0, -0.08, 0.12, 0.0, 0.0, 0.0],
            [0.2, 0.05, 0.05, 0.0, 0.1, 0.0],
        ],
        seed: 7,
        ..Default::default()
    };

    let trace = Rc::new(RefCell::new(BestTrace::default()));
    let report = tune_with_hooks(&cfg, vec![Box::new(Rc::clone(&trace))])?;

    println!("== Classical SMC tuning ==");
    if let Some(s) = report.sanity {
        println!("sanity   good {:.3}  bad {:.3}", s.good, s.bad);
    }
    for row in &report.optimization.history {
        println!(
            "iter {:>3}  best {:>10.4}  mean {:>10.4}  diverged {:>5.1}%  w {:.3}",
            row.iteration,
            row.best_cost,
            row.mean_cost,
            100.0 * row.diverged_fraction,
            row.inertia
        );
    }
    println!("improvements   {}", trace.borrow().improvements.len());
    println!("best gains     {:?}", report.best_gains());
    println!("best cost      {:.4}", report.optimization.best_cost);
    println!("verified cost  {:.4}", report.verification_cost);
    println!("all completed  {}", report.all_verified_runs_completed());
    println!("stalled (5)    {}", report.optimization.stalled(5, 1e-3));
    Ok(())
}
