//! Grey Wolf Optimizer run loop

use super::codec::{decode, Position, TreeParams};
use super::config::GwoConfig;
use super::fitness::{CrossValidatedAccuracy, Fitness};
use super::population::{initialize_population, Swarm};
use super::rng::{seeded_source, UniformSource};
use super::update::{control_parameter, select_leaders, update_position, Leaders};
use crate::error::{GreyWolfError, Result};
use ndarray::{Array1, Array2};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Swarm not yet built
    Init,
    /// Swarm scored; `completed` update iterations done so far
    Iterating { completed: usize },
    /// All iterations done, no further mutation
    Done,
}

/// Outcome of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Final alpha position
    pub best_position: Position,
    /// Final alpha decoded into tree hyperparameters
    pub best_params: TreeParams,
    /// Final alpha fitness
    pub best_fitness: f64,
    /// Alpha fitness after each iteration
    pub fitness_history: Vec<f64>,
    /// Fitness evaluations performed
    pub evaluations: usize,
    /// Wall time of the run
    pub duration_secs: f64,
}

/// Grey Wolf Optimizer over decision-tree hyperparameters
pub struct GreyWolfOptimizer<F, S = ChaCha8Rng> {
    config: GwoConfig,
    fitness: F,
    rng: S,
    phase: Phase,
    swarm: Swarm,
    leaders: Option<Leaders>,
    history: Vec<f64>,
    evaluations: usize,
    started: Option<Instant>,
}

impl<F: Fitness> GreyWolfOptimizer<F, ChaCha8Rng> {
    /// Create an optimizer drawing from a generator seeded by `config.seed`
    pub fn new(config: GwoConfig, fitness: F) -> Result<Self> {
        let rng = seeded_source(config.seed);
        Self::with_source(config, fitness, rng)
    }
}

impl<F: Fitness, S: UniformSource> GreyWolfOptimizer<F, S> {
    /// Create an optimizer with an explicit random source
    pub fn with_source(config: GwoConfig, fitness: F, rng: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fitness,
            rng,
            phase: Phase::Init,
            swarm: Swarm::default(),
            leaders: None,
            history: Vec::new(),
            evaluations: 0,
            started: None,
        })
    }

    pub fn config(&self) -> &GwoConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub fn leaders(&self) -> Option<&Leaders> {
        self.leaders.as_ref()
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Build and score the initial swarm, then pick the first leaders
    pub fn initialize(&mut self) -> Result<()> {
        if self.phase != Phase::Init {
            return Err(GreyWolfError::ConfigError(
                "optimizer is already initialized".to_string(),
            ));
        }

        self.started = Some(Instant::now());
        self.history.clear();
        info!(
            pop_size = self.config.pop_size,
            max_iter = self.config.max_iter,
            budget = self.config.evaluation_budget(),
            "Starting grey wolf optimization"
        );

        let positions = initialize_population(self.config.pop_size, &self.config.bounds, &mut self.rng);
        let fitness = self.score(&positions)?;
        self.swarm = Swarm::new(positions, fitness);
        self.leaders = Some(self.current_leaders()?);

        self.phase = if self.config.max_iter == 0 {
            Phase::Done
        } else {
            Phase::Iterating { completed: 0 }
        };
        Ok(())
    }

    /// Run one update iteration. Returns `false` once the run is done.
    pub fn step(&mut self) -> Result<bool> {
        let completed = match self.phase {
            Phase::Init => {
                return Err(GreyWolfError::ConfigError(
                    "optimizer must be initialized before stepping".to_string(),
                ))
            }
            Phase::Done => return Ok(false),
            Phase::Iterating { completed } => completed,
        };

        let max_iter = self.config.max_iter;
        let a = control_parameter(completed, max_iter);
        let leaders = self.leaders.ok_or_else(|| {
            GreyWolfError::ConfigError("no leaders selected".to_string())
        })?;

        // Leaders are a snapshot from the previous pass; every wolf moves, leaders included
        let bounds = self.config.bounds;
        let positions: Vec<Position> = self
            .swarm
            .positions()
            .iter()
            .map(|wolf| update_position(wolf, &leaders, a, &bounds, &mut self.rng))
            .collect();
        let fitness = self.score(&positions)?;
        self.swarm.replace(positions, fitness);

        let leaders = self.current_leaders()?;
        let alpha_fitness = leaders.alpha.fitness;
        self.leaders = Some(leaders);
        self.history.push(alpha_fitness);

        info!(
            iteration = completed + 1,
            max_iter,
            best_fitness = alpha_fitness,
            a,
            "Iteration {}/{} | Best Fitness: {:.4}",
            completed + 1,
            max_iter,
            alpha_fitness
        );

        self.phase = if completed + 1 >= max_iter {
            Phase::Done
        } else {
            Phase::Iterating { completed: completed + 1 }
        };
        Ok(self.phase != Phase::Done)
    }

    /// Drive the run from its current phase to completion
    pub fn run(&mut self) -> Result<OptimizationResult> {
        if self.phase == Phase::Init {
            self.initialize()?;
        }
        while self.step()? {}
        self.result()
    }

    /// Final alpha and history; only available once the run is done
    pub fn result(&self) -> Result<OptimizationResult> {
        if self.phase != Phase::Done {
            return Err(GreyWolfError::ConfigError(
                "optimization has not finished".to_string(),
            ));
        }
        let alpha = self
            .leaders
            .map(|l| l.alpha)
            .ok_or_else(|| GreyWolfError::ConfigError("no leaders selected".to_string()))?;

        let result = OptimizationResult {
            best_position: alpha.position,
            best_params: decode(&alpha.position),
            best_fitness: alpha.fitness,
            fitness_history: self.history.clone(),
            evaluations: self.evaluations,
            duration_secs: self.started.map_or(0.0, |s| s.elapsed().as_secs_f64()),
        };

        info!(
            best_fitness = result.best_fitness,
            best_params = %result.best_params,
            evaluations = result.evaluations,
            "Grey wolf optimization finished"
        );
        Ok(result)
    }

    fn current_leaders(&self) -> Result<Leaders> {
        select_leaders(self.swarm.positions(), self.swarm.fitness()).ok_or_else(|| {
            GreyWolfError::ConfigError(format!(
                "cannot select leaders from {} wolves",
                self.swarm.len()
            ))
        })
    }

    fn score(&mut self, positions: &[Position]) -> Result<Vec<f64>> {
        let fitness = &self.fitness;
        let scores = if self.config.parallel {
            positions
                .par_iter()
                .map(|p| fitness.evaluate(p))
                .collect::<Result<Vec<f64>>>()?
        } else {
            positions
                .iter()
                .map(|p| fitness.evaluate(p))
                .collect::<Result<Vec<f64>>>()?
        };
        self.evaluations += scores.len();
        Ok(scores)
    }
}

/// Tune a decision tree on `(features, labels)` by cross-validated accuracy
pub fn optimize_tree(
    features: &Array2<f64>,
    labels: &Array1<f64>,
    config: &GwoConfig,
    cv_folds: usize,
    tree_seed: u64,
) -> Result<OptimizationResult> {
    let fitness = CrossValidatedAccuracy::new(features, labels)
        .with_folds(cv_folds)
        .with_seed(tree_seed);
    GreyWolfOptimizer::new(config.clone(), fitness)?.run()
}
