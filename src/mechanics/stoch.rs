/// Stochastic mechanics: seeded RNG context and sampling helpers.
/// Note: the swarm owns one `bevy_prng::WyRand`; every draw goes through
/// these helpers so a fixed seed reproduces a run bit for bit.
use bevy_prng::WyRand;
use rand_core::{RngCore, SeedableRng};

/// RNG seeded from a `u64`.
#[inline]
pub fn seeded(seed: u64) -> WyRand {
    WyRand::from_seed(seed.to_le_bytes())
}

/// Uniform in `[0, 1)` with 53 bits of mantissa.
#[inline]
pub fn uniform01(rng: &mut WyRand) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Uniform in `[lo, hi)`.
#[inline]
pub fn uniform(rng: &mut WyRand, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * uniform01(rng)
}
