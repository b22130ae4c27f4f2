//! Injectable uniform random source for population and update draws

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of independent uniform draws in `[0, 1)`
pub trait UniformSource {
    /// Next draw in `[0, 1)`
    fn uniform(&mut self) -> f64;

    /// Draw in `[lo, hi]` as `lo + u * (hi - lo)`
    fn uniform_in(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.uniform() * (hi - lo)
    }
}

impl UniformSource for ChaCha8Rng {
    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }
}

/// Seeded generator, or one drawn from OS entropy when no seed is given
pub fn seeded_source(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
