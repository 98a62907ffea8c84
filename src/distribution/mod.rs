//! The shared source of uniform random variates and the Box-Muller transform
//! used to generate gating noise.

use std::f64::consts::PI;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::Standard;


/// A single, globally ordered source of uniform variates in `[0, 1)`
pub trait UniformSource {
    /// Draws the next uniform variate
    fn next_uniform(&mut self) -> f64;
}

/// Uniform source backed by a seeded [`StdRng`], two sources created with
/// the same seed produce the same sequence
#[derive(Debug, Clone)]
pub struct SeededUniform {
    /// Seed used to create the generator
    pub seed: u64,
    rng: StdRng,
    draws: u64,
}

impl SeededUniform {
    /// Creates a new source from the given seed
    pub fn new(seed: u64) -> Self {
        SeededUniform {
            seed,
            rng: StdRng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Number of variates consumed so far
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl UniformSource for SeededUniform {
    fn next_uniform(&mut self) -> f64 {
        self.draws += 1;
        self.rng.sample(Standard)
    }
}

/// Gaussian increment from two uniform variates (Fox, 1997), `variance` is the
/// per step variance of the increment, a negative variance or `u1 == 0` gives a
/// non-finite value which callers treat as an unusable candidate
pub fn box_muller(u1: f64, u2: f64, variance: f64) -> f64 {
    (-(variance * u1.ln())).sqrt() * (2. * PI * u2).cos()
}
