//! Observer protocol for the swarm loop.
//!
//! Hooks see every iteration's statistics and every improvement of the
//! global best. They cannot alter the search, so attaching one never changes
//! the result for a given seed.

use std::cell::RefCell;
use std::rc::Rc;

use super::IterationStats;

pub trait Hook {
    /// (Optional) called once per iteration after bests are updated.
    fn on_iteration(&mut self, _stats: &IterationStats) {}

    /// (Optional) called whenever the global best improves.
    fn on_new_best(&mut self, _iteration: usize, _gains: &[f64], _cost: f64) {}
}

/// Keeps every improvement, in order.
#[derive(Clone, Debug, Default)]
pub struct BestTrace {
    pub improvements: Vec<(usize, Vec<f64>, f64)>,
}

impl Hook for BestTrace {
    fn on_new_best(&mut self, iteration: usize, gains: &[f64], cost: f64) {
        self.improvements.push((iteration, gains.to_vec(), cost));
    }
}

/// Shared hook: the caller keeps a handle and reads it after the run.
impl<H: Hook> Hook for Rc<RefCell<H>> {
    fn on_iteration(&mut self, stats: &IterationStats) {
        self.borrow_mut().on_iteration(stats);
    }

    fn on_new_best(&mut self, iteration: usize, gains: &[f64], cost: f64) {
        self.borrow_mut().on_new_best(iteration, gains, cost);
    }
}
