//! Swarm initialization and storage

use super::codec::{Position, SearchBounds};
use super::rng::UniformSource;
use serde::{Deserialize, Serialize};

/// Draw `pop_size` positions, each component uniform within its bound
pub fn initialize_population<S: UniformSource + ?Sized>(
    pop_size: usize,
    bounds: &SearchBounds,
    rng: &mut S,
) -> Vec<Position> {
    (0..pop_size)
        .map(|_| {
            let mut wolf = [0.0; super::codec::DIM];
            for (value, bound) in wolf.iter_mut().zip(bounds.dims().iter()) {
                *value = rng.uniform_in(bound.lo, bound.hi);
            }
            wolf
        })
        .collect()
}

/// Positions and their fitness, index-aligned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Swarm {
    positions: Vec<Position>,
    fitness: Vec<f64>,
}

impl Swarm {
    /// Pair positions with their scores; lengths must match
    pub(crate) fn new(positions: Vec<Position>, fitness: Vec<f64>) -> Self {
        debug_assert_eq!(positions.len(), fitness.len());
        Self { positions, fitness }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Replace every member and score at once, keeping the two aligned
    pub(crate) fn replace(&mut self, positions: Vec<Position>, fitness: Vec<f64>) {
        debug_assert_eq!(positions.len(), fitness.len());
        self.positions = positions;
        self.fitness = fitness;
    }

    /// Highest observed fitness, if any
    pub fn max_fitness(&self) -> Option<f64> {
        self.fitness.iter().copied().reduce(f64::max)
    }
}
