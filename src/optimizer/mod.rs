//! Grey Wolf Optimizer for decision-tree hyperparameters
//!
//! A swarm of continuous positions is scored by cross-validated accuracy,
//! ranked into alpha/beta/delta leaders, and moved toward them each iteration:
//! - [`codec`] maps positions to [`TreeParams`]
//! - [`population`] draws the initial swarm
//! - [`update`] ranks leaders and moves wolves
//! - [`fitness`] scores positions
//! - [`driver`] runs INIT -> ITERATING -> DONE

pub mod codec;
mod config;
pub mod driver;
pub mod fitness;
pub mod population;
pub mod rng;
pub mod update;

pub use codec::{decode, encode, Bound, Position, SearchBounds, TreeParams, DIM};
pub use config::{GwoConfig, MAX_ITER_RANGE, POP_SIZE_RANGE};
pub use driver::{optimize_tree, GreyWolfOptimizer, OptimizationResult, Phase};
pub use fitness::{CrossValidatedAccuracy, Fitness};
pub use population::{initialize_population, Swarm};
pub use rng::{seeded_source, UniformSource};
pub use update::{
    control_parameter, rank_by_fitness, select_leaders, update_position, Leader, Leaders,
};
