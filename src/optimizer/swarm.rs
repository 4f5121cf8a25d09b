//! Particles, swarm state and the velocity/position update.

use bevy_prng::WyRand;

use super::{BoundaryPolicy, GainBounds, PsoConfig};
use crate::mechanics::stoch::{uniform, uniform01};

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub best_position: Vec<f64>,
    /// `+∞` until the particle has been evaluated.
    pub best_cost: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Swarm {
    pub particles: Vec<Particle>,
    pub global_best_position: Vec<f64>,
    pub global_best_cost: f64,
}

impl Swarm {
    /// Positions uniform in the bounds, velocities uniform in
    /// `±init_velocity_fraction·span`. The global best starts at the first
    /// particle so it is always a position the swarm actually holds.
    pub fn initialize(
        rng: &mut WyRand,
        bounds: &GainBounds,
        population: usize,
        init_velocity_fraction: f64,
    ) -> Self {
        let particles: Vec<Particle> = (0..population)
            .map(|_| {
                let position: Vec<f64> = bounds
                    .lower
                    .iter()
                    .zip(&bounds.upper)
                    .map(|(&lo, &hi)| uniform(rng, lo, hi))
                    .collect();
                let velocity: Vec<f64> = bounds
                    .spans()
                    .map(|span| {
                        let v = init_velocity_fraction * span;
                        uniform(rng, -v, v)
                    })
                    .collect();
                Particle {
                    best_position: position.clone(),
                    position,
                    velocity,
                    best_cost: f64::INFINITY,
                }
            })
            .collect();
        let global_best_position = particles
            .first()
            .map(|p| p.position.clone())
            .unwrap_or_default();
        Self {
            particles,
            global_best_position,
            global_best_cost: f64::INFINITY,
        }
    }

    /// Fold one iteration's costs into personal and global bests, in particle
    /// order. Returns the indices that improved the global best.
    pub fn update_bests(&mut self, costs: &[f64]) -> Vec<usize> {
        let mut improved = Vec::new();
        for (i, (p, &c)) in self.particles.iter_mut().zip(costs).enumerate() {
            if c < p.best_cost {
                p.best_cost = c;
                p.best_position.clone_from(&p.position);
            }
            if c < self.global_best_cost {
                self.global_best_cost = c;
                self.global_best_position.clone_from(&p.position);
                improved.push(i);
            }
        }
        improved
    }

    /// `v ← w·v + c1·r1·(pbest − x) + c2·r2·(gbest − x)`, clamp, move, then
    /// apply the boundary policy.
    pub fn step(&mut self, rng: &mut WyRand, bounds: &GainBounds, cfg: &PsoConfig, inertia: f64) {
        let gbest = &self.global_best_position;
        for p in &mut self.particles {
            for d in 0..p.position.len() {
                let (lo, hi) = (bounds.lower[d], bounds.upper[d]);
                let vmax = cfg.max_velocity_fraction * (hi - lo);
                let r1 = uniform01(rng);
                let r2 = uniform01(rng);
                let x = p.position[d];
                let v = inertia * p.velocity[d]
                    + cfg.cognitive * r1 * (p.best_position[d] - x)
                    + cfg.social * r2 * (gbest[d] - x);
                let v = v.clamp(-vmax, vmax);
                let (x, v) = apply_boundary(cfg.boundary, x + v, v, lo, hi);
                p.position[d] = x;
                p.velocity[d] = v;
            }
        }
    }
}

/// Bring `x` back into `[lo, hi]`; returns the new `(x, v)`.
#[inline]
pub fn apply_boundary(policy: BoundaryPolicy, x: f64, v: f64, lo: f64, hi: f64) -> (f64, f64) {
    if (lo..=hi).contains(&x) {
        return (x, v);
    }
    match policy {
        BoundaryPolicy::Clip => (x.clamp(lo, hi), 0.0),
        BoundaryPolicy::Reflect => {
            let mirrored = if x < lo { lo + (lo - x) } else { hi - (x - hi) };
            (mirrored.clamp(lo, hi), -v)
        }
    }
}
