use evonet_env::StepLimit;
use serde::{Deserialize, Serialize};

use crate::DEFAULT_MUTATION_RATE;

pub const DEFAULT_SELECTION_RATIO: f64 = 0.25;

/// Parameters of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticParams {
    /// Number of agents alive in every generation.
    pub population_size: usize,
    pub generation_count: usize,
    /// Standard deviation of the Gaussian noise applied to offspring.
    pub mutation_rate: f64,
    /// Fraction of the population kept as elites.
    pub selection_ratio: f64,
    /// Step cap of every evaluation episode.
    pub step_limit: StepLimit,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population_size: 20,
            generation_count: 20,
            mutation_rate: DEFAULT_MUTATION_RATE,
            selection_ratio: DEFAULT_SELECTION_RATIO,
            step_limit: StepLimit::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
pub enum InvalidParamsError {
    #[display("population size must be at least 2, got {size}")]
    PopulationTooSmall { size: usize },
    #[display("generation count must be at least 1")]
    NoGenerations,
    #[display("mutation rate must be finite and non-negative, got {rate}")]
    InvalidMutationRate { rate: f64 },
    #[display("selection ratio must lie strictly between 0 and 1, got {ratio}")]
    InvalidSelectionRatio { ratio: f64 },
    #[display("selection ratio {ratio} keeps no elites out of {size} agents")]
    NoElites { ratio: f64, size: usize },
}

impl GeneticParams {
    pub fn validate(&self) -> Result<(), InvalidParamsError> {
        if self.population_size < 2 {
            return Err(InvalidParamsError::PopulationTooSmall {
                size: self.population_size,
            });
        }
        if self.generation_count == 0 {
            return Err(InvalidParamsError::NoGenerations);
        }
        if !self.mutation_rate.is_finite() || self.mutation_rate < 0.0 {
            return Err(InvalidParamsError::InvalidMutationRate {
                rate: self.mutation_rate,
            });
        }
        if !(self.selection_ratio > 0.0 && self.selection_ratio < 1.0) {
            return Err(InvalidParamsError::InvalidSelectionRatio {
                ratio: self.selection_ratio,
            });
        }
        if self.elite_count() == 0 {
            return Err(InvalidParamsError::NoElites {
                ratio: self.selection_ratio,
                size: self.population_size,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn elite_count(&self) -> usize {
        elite_count(self.selection_ratio, self.population_size)
    }
}

/// Number of elites kept out of `population_size` agents: `floor(ratio × size)`.
#[must_use]
pub fn elite_count(ratio: f64, population_size: usize) -> usize {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let count = (ratio * population_size as f64).floor() as usize;
    count.min(population_size)
}
