//! Optimization configuration

use super::codec::SearchBounds;
use crate::error::{GreyWolfError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Population sizes offered to interactive callers
pub const POP_SIZE_RANGE: RangeInclusive<usize> = 5..=30;
/// Iteration counts offered to interactive callers
pub const MAX_ITER_RANGE: RangeInclusive<usize> = 10..=50;

/// Configuration for one Grey Wolf Optimizer run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GwoConfig {
    /// Number of wolves
    pub pop_size: usize,

    /// Number of update iterations after initialization
    pub max_iter: usize,

    /// Search bounds for initialization and clipping
    pub bounds: SearchBounds,

    /// Seed for population and update draws; `None` draws from OS entropy
    pub seed: Option<u64>,

    /// Score the swarm with rayon instead of sequentially
    pub parallel: bool,
}

impl Default for GwoConfig {
    fn default() -> Self {
        Self {
            pop_size: 15,
            max_iter: 30,
            bounds: SearchBounds::default(),
            seed: Some(42),
            parallel: false,
        }
    }
}

impl GwoConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the interactive controls, rejecting values outside their ranges
    pub fn from_controls(pop_size: usize, max_iter: usize) -> Result<Self> {
        check_range("pop_size", pop_size, &POP_SIZE_RANGE)?;
        check_range("max_iter", max_iter, &MAX_ITER_RANGE)?;
        Ok(Self::default().with_pop_size(pop_size).with_max_iter(max_iter))
    }

    /// Builder method to set population size
    pub fn with_pop_size(mut self, n: usize) -> Self {
        self.pop_size = n;
        self
    }

    /// Builder method to set iteration count
    pub fn with_max_iter(mut self, n: usize) -> Self {
        self.max_iter = n;
        self
    }

    /// Builder method to set search bounds
    pub fn with_bounds(mut self, bounds: SearchBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Builder method to set or clear the seed
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to enable parallel swarm scoring
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of fitness evaluations a full run performs
    pub fn evaluation_budget(&self) -> usize {
        self.pop_size * (1 + self.max_iter)
    }

    /// Check the run can select three leaders and the bounds are usable
    pub fn validate(&self) -> Result<()> {
        if self.pop_size < 3 {
            return Err(GreyWolfError::InvalidParameter {
                name: "pop_size".to_string(),
                value: self.pop_size.to_string(),
                reason: "need at least 3 wolves for alpha, beta and delta".to_string(),
            });
        }
        self.bounds.validate()
    }
}

fn check_range(name: &str, value: usize, range: &RangeInclusive<usize>) -> Result<()> {
    if !range.contains(&value) {
        return Err(GreyWolfError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: format!("must be within [{}, {}]", range.start(), range.end()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GwoConfig::default();
        assert_eq!(config.pop_size, 15);
        assert_eq!(config.max_iter, 30);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.evaluation_budget(), 15 * 31);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = GwoConfig::new()
            .with_pop_size(5)
            .with_max_iter(0)
            .with_seed(None)
            .with_parallel(true);

        assert_eq!(config.pop_size, 5);
        assert_eq!(config.max_iter, 0);
        assert!(config.seed.is_none());
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_pop_size() {
        let config = GwoConfig::new().with_pop_size(2);
        assert!(matches!(
            config.validate(),
            Err(GreyWolfError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_from_controls() {
        assert!(GwoConfig::from_controls(5, 10).is_ok());
        assert!(GwoConfig::from_controls(30, 50).is_ok());
        assert!(GwoConfig::from_controls(4, 30).is_err());
        assert!(GwoConfig::from_controls(15, 51).is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: GwoConfig = serde_json::from_str(r#"{"pop_size": 8}"#).unwrap();
        assert_eq!(config.pop_size, 8);
        assert_eq!(config.max_iter, 30);
    }
}
