//! Grey wolf position update and leader selection

use super::codec::{Position, SearchBounds, DIM};
use super::rng::UniformSource;
use serde::{Deserialize, Serialize};

/// Index and fitness of one pack leader
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    pub index: usize,
    pub position: Position,
    pub fitness: f64,
}

/// The three best wolves at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leaders {
    pub alpha: Leader,
    pub beta: Leader,
    pub delta: Leader,
}

/// Indices sorted by fitness descending; equal scores keep population order
pub fn rank_by_fitness(fitness: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));
    order
}

/// Pick alpha, beta and delta from an aligned population; `None` below three wolves
pub fn select_leaders(positions: &[Position], fitness: &[f64]) -> Option<Leaders> {
    if positions.len() < 3 || positions.len() != fitness.len() {
        return None;
    }
    let order = rank_by_fitness(fitness);
    let leader = |rank: usize| {
        let index = order[rank];
        Leader {
            index,
            position: positions[index],
            fitness: fitness[index],
        }
    };
    Some(Leaders {
        alpha: leader(0),
        beta: leader(1),
        delta: leader(2),
    })
}

/// Exploration control `a`, decreasing linearly from 2 toward 0 over the run
pub fn control_parameter(iteration: usize, max_iter: usize) -> f64 {
    if max_iter == 0 {
        return 2.0;
    }
    2.0 - iteration as f64 * (2.0 / max_iter as f64)
}

/// Candidate coordinate pulled toward one leader
fn pull<S: UniformSource + ?Sized>(leader: f64, wolf: f64, a: f64, rng: &mut S) -> f64 {
    let r1 = rng.uniform();
    let r2 = rng.uniform();
    let big_a = 2.0 * a * r1 - a;
    let c = 2.0 * r2;
    let d = (c * leader - wolf).abs();
    leader - big_a * d
}

/// Move `wolf` toward the three leaders.
///
/// Per dimension, draws `(r1, r2)` for alpha, then beta, then delta, averages
/// the three pulled coordinates and clips into the dimension's bound.
pub fn update_position<S: UniformSource + ?Sized>(
    wolf: &Position,
    leaders: &Leaders,
    a: f64,
    bounds: &SearchBounds,
    rng: &mut S,
) -> Position {
    let mut next = [0.0; DIM];
    for i in 0..DIM {
        let x1 = pull(leaders.alpha.position[i], wolf[i], a, rng);
        let x2 = pull(leaders.beta.position[i], wolf[i], a, rng);
        let x3 = pull(leaders.delta.position[i], wolf[i], a, rng);
        next[i] = bounds.0[i].clip((x1 + x2 + x3) / 3.0);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::rng::{seeded_source, testing::ScriptedDraws};

    fn leaders_at(alpha: Position, beta: Position, delta: Position) -> Leaders {
        let leader = |index, position| Leader { index, position, fitness: 0.0 };
        Leaders {
            alpha: leader(0, alpha),
            beta: leader(1, beta),
            delta: leader(2, delta),
        }
    }

    #[test]
    fn test_leader_selection_ties_keep_population_order() {
        let positions: Vec<Position> = (0..5).map(|i| [i as f64; 4]).collect();
        let fitness = [0.5, 0.9, 0.7, 0.9, 0.3];

        let leaders = select_leaders(&positions, &fitness).unwrap();
        assert_eq!(leaders.alpha.index, 1);
        assert_eq!(leaders.beta.index, 3);
        assert_eq!(leaders.delta.index, 2);
        assert_eq!(leaders.alpha.fitness, 0.9);
        assert_eq!(leaders.beta.fitness, 0.9);
        assert_eq!(leaders.delta.fitness, 0.7);
        assert_eq!(leaders.delta.position, [2.0; 4]);
    }

    #[test]
    fn test_select_leaders_needs_three() {
        let positions = vec![[0.0; 4]; 2];
        assert!(select_leaders(&positions, &[0.1, 0.2]).is_none());
        assert!(select_leaders(&[[0.0; 4]; 3], &[0.1, 0.2]).is_none());
    }

    #[test]
    fn test_control_parameter_schedule() {
        assert_eq!(control_parameter(0, 4), 2.0);
        assert_eq!(control_parameter(1, 4), 1.5);
        assert_eq!(control_parameter(3, 4), 0.5);
        assert_eq!(control_parameter(0, 0), 2.0);
    }

    #[test]
    fn test_midpoint_draws_average_leaders() {
        // r1 = r2 = 0.5 gives A = 0 and C = 1, so every pull lands on its leader
        let leaders = leaders_at([0.9, 8.0, 3.0, 2.0], [0.6, 6.0, 5.0, 4.0], [0.3, 4.0, 7.0, 6.0]);
        let mut draws = ScriptedDraws::constant(0.5);
        let next = update_position(&[0.1, 2.0, 9.0, 1.0], &leaders, 1.3, &SearchBounds::default(), &mut draws);

        let expected = [0.6, 6.0, 5.0, 4.0];
        for (got, want) in next.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
        assert_eq!(draws.consumed(), 6 * DIM);
    }

    #[test]
    fn test_zero_draws_push_away_from_leaders() {
        // r1 = r2 = 0 gives A = -a and C = 0, so X = L + a * |wolf|
        let leaders = leaders_at([0.2, 3.0, 3.0, 3.0], [0.2, 3.0, 3.0, 3.0], [0.2, 3.0, 3.0, 3.0]);
        let mut draws = ScriptedDraws::constant(0.0);
        let wolf = [0.1, 2.0, 2.0, 2.0];
        let next = update_position(&wolf, &leaders, 1.0, &SearchBounds::default(), &mut draws);

        assert!((next[0] - 0.3).abs() < 1e-12);
        assert_eq!(next[1], 5.0);
        assert_eq!(next[2], 5.0);
        assert_eq!(next[3], 5.0);
    }

    #[test]
    fn test_draw_order_alpha_beta_delta() {
        // Only alpha's draws are 0.5; beta and delta get r1 = 1, r2 = 0 => A = a, C = 0
        let leaders = leaders_at([0.5, 5.0, 5.0, 5.0], [0.5, 5.0, 5.0, 5.0], [0.5, 5.0, 5.0, 5.0]);
        let mut draws = ScriptedDraws::new(vec![0.5, 0.5, 1.0, 0.0, 1.0, 0.0]);
        let wolf = [0.0, 4.0, 4.0, 4.0];
        let next = update_position(&wolf, &leaders, 0.25, &SearchBounds::default(), &mut draws);

        // alpha pull = 5, beta/delta pull = 5 - 0.25 * 4 = 4 => mean 13/3
        assert!((next[1] - 13.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_clips_adversarial_inputs() {
        let bounds = SearchBounds::default();
        let leaders = leaders_at(
            [50.0, -40.0, 1e6, -1e6],
            [-7.0, 99.0, -3.0, 42.0],
            [3.0, 0.0, 500.0, -0.5],
        );
        let mut rng = seeded_source(Some(3));
        let wolves = [[-100.0, 1e9, -1e9, 0.0], [0.5, 5.0, 5.0, 5.0], [f64::MAX, f64::MIN, 0.0, 11.0]];

        for wolf in &wolves {
            for step in 0..10 {
                let a = control_parameter(step, 10);
                let next = update_position(wolf, &leaders, a, &bounds, &mut rng);
                assert!(bounds.contains(&next), "{next:?} escaped bounds");
            }
        }
    }
}
