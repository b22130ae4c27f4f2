//! Integration tests for the grey wolf optimizer

use greywolf::optimizer::{
    decode, optimize_tree, select_leaders, CrossValidatedAccuracy, Fitness, GreyWolfOptimizer,
    GwoConfig, Phase, Position, SearchBounds, UniformSource,
};
use greywolf::training::Criterion;
use greywolf::{GreyWolfError, Result};
use ndarray::{Array1, Array2};
use std::sync::Mutex;

/// 100 rows: class 0 at x in [0, 50), class 1 at x in [100, 150), plus a noise column
fn gap_dataset() -> (Array2<f64>, Array1<f64>) {
    let n = 100;
    let x = Array2::from_shape_fn((n, 2), |(i, j)| match j {
        0 if i < n / 2 => i as f64,
        0 => 50.0 + i as f64,
        _ => ((i * 7) % 11) as f64,
    });
    let y = Array1::from_shape_fn(n, |i| if i < n / 2 { 0.0 } else { 1.0 });
    (x, y)
}

/// 100 rows, labels alternate 0/1; column 0 leans on the label, the others are residue noise
fn noisy_parity_dataset() -> (Array2<f64>, Array1<f64>) {
    let n = 100;
    let x = Array2::from_shape_fn((n, 3), |(i, j)| match j {
        0 => ((i * 3) % 13 + 4 * (i % 2)) as f64,
        1 => ((i * 13) % 17) as f64,
        _ => ((i * 5) % 23) as f64,
    });
    let y = Array1::from_shape_fn(n, |i| (i % 2) as f64);
    (x, y)
}

struct Constant(f64);

impl UniformSource for Constant {
    fn uniform(&mut self) -> f64 {
        self.0
    }
}

/// Records every evaluated position
struct Recorder {
    seen: Mutex<Vec<Position>>,
}

impl Fitness for Recorder {
    fn evaluate(&self, position: &Position) -> Result<f64> {
        self.seen.lock().unwrap().push(*position);
        Ok(fitness_of(position))
    }
}

#[test]
fn test_end_to_end_on_separable_data() {
    let (x, y) = gap_dataset();
    let config = GwoConfig::new().with_pop_size(5).with_max_iter(3).with_seed(Some(7));

    let result = optimize_tree(&x, &y, &config, 5, 42).unwrap();

    assert_eq!(result.best_fitness, 1.0);
    assert_eq!(result.fitness_history, vec![1.0; 3]);
    assert_eq!(result.evaluations, 5 * 4);
    assert_eq!(result.best_params, decode(&result.best_position));
    assert!(SearchBounds::default().contains(&result.best_position));
}

#[test]
fn test_baseline_on_noisy_parity_data() {
    let (x, y) = noisy_parity_dataset();
    assert_eq!(y.sum(), 50.0);
    let config = GwoConfig::new().with_pop_size(5).with_max_iter(3).with_seed(Some(7));

    let result = optimize_tree(&x, &y, &config, 5, 42).unwrap();

    assert_eq!(result.best_params.criterion, Criterion::Entropy);
    assert_eq!(result.best_params.max_depth, 4);
    assert_eq!(result.best_params.min_samples_split, 7);
    assert_eq!(result.best_params.min_samples_leaf, 9);
    assert_eq!(
        result.best_position,
        [0.5105937728015497, 3.8891689392986932, 6.64039630506121, 8.52208267186348]
    );
    assert_eq!(result.best_fitness, 0.7100000000000001);
    assert_eq!(
        result.fitness_history,
        vec![0.6900000000000001, 0.7100000000000001, 0.7100000000000001]
    );
    assert_eq!(result.evaluations, 20);
}

#[test]
fn test_baseline_history_can_fall_without_elitism() {
    let (x, y) = noisy_parity_dataset();
    let config = GwoConfig::new().with_pop_size(5).with_max_iter(3).with_seed(Some(8));

    let result = optimize_tree(&x, &y, &config, 5, 42).unwrap();

    assert_eq!(result.best_params.criterion, Criterion::Entropy);
    assert_eq!(result.best_params.max_depth, 4);
    assert_eq!(result.best_params.min_samples_split, 7);
    assert_eq!(result.best_params.min_samples_leaf, 8);
    assert_eq!(result.best_fitness, 0.7300000000000001);
    assert_eq!(result.fitness_history, vec![0.7699999999999999, 0.74, 0.7300000000000001]);
}

#[test]
fn test_midpoint_draws_on_noisy_parity_data() {
    let (x, y) = noisy_parity_dataset();
    let fitness = CrossValidatedAccuracy::new(&x, &y);
    let config = GwoConfig::new().with_pop_size(5).with_max_iter(3);

    let mut gwo = GreyWolfOptimizer::with_source(config, fitness, Constant(0.5)).unwrap();
    let result = gwo.run().unwrap();

    assert_eq!(result.best_position, [0.5, 6.0, 6.0, 5.5]);
    assert_eq!(result.best_params.criterion, Criterion::Gini);
    assert_eq!(result.best_params.max_depth, 6);
    assert_eq!(result.best_params.min_samples_split, 6);
    assert_eq!(result.best_params.min_samples_leaf, 6);
    assert_eq!(result.best_fitness, 0.6699999999999999);
    assert_eq!(result.fitness_history, vec![0.6699999999999999; 3]);
}

#[test]
fn test_same_seed_same_result() {
    let (x, y) = gap_dataset();
    let config = GwoConfig::new().with_pop_size(6).with_max_iter(4).with_seed(Some(123));

    let first = optimize_tree(&x, &y, &config, 5, 42).unwrap();
    let second = optimize_tree(&x, &y, &config, 5, 42).unwrap();

    assert_eq!(first.best_position, second.best_position);
    assert_eq!(first.best_params, second.best_params);
    assert_eq!(first.fitness_history, second.fitness_history);
}

#[test]
fn test_parallel_scoring_matches_sequential() {
    let (x, y) = gap_dataset();
    let config = GwoConfig::new().with_pop_size(5).with_max_iter(3);

    let sequential = optimize_tree(&x, &y, &config, 5, 42).unwrap();
    let parallel = optimize_tree(&x, &y, &config.clone().with_parallel(true), 5, 42).unwrap();

    assert_eq!(sequential.best_position, parallel.best_position);
    assert_eq!(sequential.fitness_history, parallel.fitness_history);
}

#[test]
fn test_zero_iterations_returns_initial_alpha() {
    let fitness = Recorder { seen: Mutex::new(Vec::new()) };
    let config = GwoConfig::new().with_pop_size(4).with_max_iter(0);

    let mut gwo = GreyWolfOptimizer::new(config, &fitness).unwrap();
    let result = gwo.run().unwrap();

    assert_eq!(gwo.phase(), Phase::Done);
    assert!(result.fitness_history.is_empty());
    assert_eq!(result.evaluations, 4);

    let seen = fitness.seen.lock().unwrap();
    let best = seen
        .iter()
        .map(fitness_of)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(result.best_fitness, best);
}

fn fitness_of(p: &Position) -> f64 {
    -p.iter().map(|v| (v - 3.0).abs()).sum::<f64>()
}

#[test]
fn test_every_evaluated_position_is_in_bounds() {
    let fitness = Recorder { seen: Mutex::new(Vec::new()) };
    let config = GwoConfig::new().with_pop_size(8).with_max_iter(10).with_seed(Some(99));

    GreyWolfOptimizer::new(config, &fitness).unwrap().run().unwrap();

    let seen = fitness.seen.lock().unwrap();
    assert_eq!(seen.len(), 8 * 11);
    let bounds = SearchBounds::default();
    assert!(seen.iter().all(|p| bounds.contains(p)));
}

#[test]
fn test_midpoint_draws_collapse_onto_center() {
    // Every draw is 0.5: wolves start at the bound centers and A = 0 keeps them there
    let fitness = Recorder { seen: Mutex::new(Vec::new()) };
    let config = GwoConfig::new().with_pop_size(5).with_max_iter(3);

    let mut gwo = GreyWolfOptimizer::with_source(config, &fitness, Constant(0.5)).unwrap();
    let result = gwo.run().unwrap();

    assert_eq!(result.best_position, [0.5, 6.0, 6.0, 5.5]);
    // 0.5 and 5.5 round half to even
    assert_eq!(result.best_params.criterion, Criterion::Gini);
    assert_eq!(result.best_params.max_depth, 6);
    assert_eq!(result.best_params.min_samples_split, 6);
    assert_eq!(result.best_params.min_samples_leaf, 6);
}

#[test]
fn test_leader_selection_ties_keep_population_order() {
    let positions: Vec<Position> = (0..5).map(|i| [0.0, i as f64, 2.0, 1.0]).collect();
    let fitness = [0.5, 0.9, 0.7, 0.9, 0.3];

    let leaders = select_leaders(&positions, &fitness).unwrap();

    assert_eq!(leaders.alpha.index, 1);
    assert_eq!(leaders.beta.index, 3);
    assert_eq!(leaders.delta.index, 2);
    assert_eq!(leaders.alpha.position, positions[1]);
}

#[test]
fn test_unusable_labels_abort_the_run() {
    let (x, _) = gap_dataset();
    // Class 1 has 2 rows, fewer than 5 folds
    let y = Array1::from_shape_fn(100, |i| if i < 98 { 0.0 } else { 1.0 });
    let config = GwoConfig::new().with_pop_size(5).with_max_iter(3);

    let err = optimize_tree(&x, &y, &config, 5, 42).unwrap_err();
    assert!(matches!(err, GreyWolfError::InputError(_)));
}

#[test]
fn test_too_small_population_rejected() {
    let (x, y) = gap_dataset();
    let config = GwoConfig::new().with_pop_size(2);
    assert!(matches!(
        optimize_tree(&x, &y, &config, 5, 42),
        Err(GreyWolfError::InvalidParameter { .. })
    ));
}
