//! Population and fitness-proportional reproduction.
//!
//! # Selection
//!
//! Given an evaluated population of `N` agents and a selection ratio `r`:
//!
//! 1. `E = floor(r × N)` elites are drawn **without replacement**, each draw
//!    proportional to fitness among the agents not drawn yet
//! 2. The remaining `N − E` slots are filled with children of elites. Parents are
//!    drawn **with replacement**, proportional to fitness among the elites only
//! 3. The next population is the elites, unchanged and in draw order, followed by
//!    the children
//!
//! Fitness-proportional draws need non-negative, finite fitness values with a
//! positive total. Anything else is a [`DegenerateFitnessError`]; there is no
//! fallback to uniform sampling.

use evonet_network::{InvalidMutationRateError, NetworkShape};
use rand::{
    Rng,
    distr::{Distribution as _, weighted::WeightedIndex},
};

use crate::{Agent, FitnessStats, params};

/// An ordered collection of agents.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    /// Creates `count` agents with freshly initialized networks of the same shape.
    pub fn random<R>(shape: &NetworkShape, count: usize, rate: f64, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let agents = (0..count)
            .map(|_| Agent::random(shape.clone(), rate, rng))
            .collect();
        Self { agents }
    }

    #[must_use]
    pub fn from_agents(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn reset_fitness(&mut self) {
        for agent in &mut self.agents {
            agent.reset();
        }
    }

    /// Returns the fittest agent, the earliest one on ties.
    #[must_use]
    pub fn best_agent(&self) -> Option<&Agent> {
        let (first, rest) = self.agents.split_first()?;
        Some(rest.iter().fold(first, |best, agent| {
            if agent.fitness() > best.fitness() {
                agent
            } else {
                best
            }
        }))
    }

    #[must_use]
    pub fn fitness_stats(&self) -> Option<FitnessStats> {
        FitnessStats::new(self.agents.iter().map(Agent::fitness))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
pub enum DegenerateFitnessError {
    #[display(
        "agent {index} has fitness {fitness}; fitness-proportional selection needs \
         finite, non-negative values"
    )]
    InvalidFitness { index: usize, fitness: f64 },
    #[display("total fitness {total} is not positive; fitness-proportional selection is undefined")]
    NonPositiveTotal { total: f64 },
    #[display("only {available} agent(s) have positive fitness but {required} elites are needed")]
    TooFewCandidates { available: usize, required: usize },
}

#[derive(
    Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum SelectionError {
    #[display("cannot select elites")]
    DegenerateFitness(DegenerateFitnessError),
    #[display("cannot produce offspring")]
    Mutation(InvalidMutationRateError),
}

/// Controls how one generation turns into the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationEvolver {
    /// Fraction of the population kept as elites.
    pub selection_ratio: f64,
    /// Mutation rate for offspring; `None` lets each child inherit its parent's rate.
    pub mutation_rate: Option<f64>,
}

impl PopulationEvolver {
    /// Splits a population size into `(elite_count, child_count)`.
    #[must_use]
    pub fn split(&self, population_size: usize) -> (usize, usize) {
        let elites = params::elite_count(self.selection_ratio, population_size);
        (elites, population_size - elites)
    }

    /// Builds the next generation from an evaluated population.
    ///
    /// The result always has the same size as `population`.
    pub fn evolve<R>(
        &self,
        population: &Population,
        rng: &mut R,
    ) -> Result<Population, SelectionError>
    where
        R: Rng + ?Sized,
    {
        let (elite_count, child_count) = self.split(population.len());
        let fitness = population
            .agents
            .iter()
            .map(Agent::fitness)
            .collect::<Vec<_>>();

        let elite_indices = sample_without_replacement(&fitness, elite_count, rng)?;
        log::debug!("selected elites {elite_indices:?}");
        let elites = elite_indices
            .iter()
            .map(|&i| population.agents[i].clone())
            .collect::<Vec<_>>();

        let mut children = Vec::with_capacity(child_count);
        if child_count > 0 {
            let elite_fitness = elites.iter().map(Agent::fitness).collect::<Vec<_>>();
            let parents = proportional_index(&elite_fitness)?;
            for _ in 0..child_count {
                let parent = &elites[parents.sample(rng)];
                children.push(parent.child(self.mutation_rate, rng)?);
            }
        }

        let mut next = elites;
        next.extend(children);
        assert_eq!(next.len(), population.len());
        Ok(Population { agents: next })
    }
}

fn check_fitness(fitness: &[f64]) -> Result<f64, DegenerateFitnessError> {
    if let Some((index, &value)) = fitness
        .iter()
        .enumerate()
        .find(|(_, f)| !f.is_finite() || **f < 0.0)
    {
        return Err(DegenerateFitnessError::InvalidFitness {
            index,
            fitness: value,
        });
    }
    let total = fitness.iter().sum::<f64>();
    if total <= 0.0 || !total.is_finite() {
        return Err(DegenerateFitnessError::NonPositiveTotal { total });
    }
    Ok(total)
}

fn proportional_index(fitness: &[f64]) -> Result<WeightedIndex<f64>, DegenerateFitnessError> {
    let total = check_fitness(fitness)?;
    WeightedIndex::new(fitness).map_err(|_| DegenerateFitnessError::NonPositiveTotal { total })
}

/// Draws `count` distinct indices; each draw is proportional to `weights` among the
/// indices not drawn yet.
fn sample_without_replacement<R>(
    weights: &[f64],
    count: usize,
    rng: &mut R,
) -> Result<Vec<usize>, DegenerateFitnessError>
where
    R: Rng + ?Sized,
{
    check_fitness(weights)?;
    let available = weights.iter().filter(|w| **w > 0.0).count();
    if available < count {
        return Err(DegenerateFitnessError::TooFewCandidates {
            available,
            required: count,
        });
    }

    let mut remaining = weights.iter().copied().enumerate().collect::<Vec<_>>();
    let mut chosen = Vec::with_capacity(count);
    for _ in 0..count {
        let current = remaining.iter().map(|(_, w)| *w).collect::<Vec<_>>();
        let pick = proportional_index(&current)?.sample(rng);
        chosen.push(remaining.remove(pick).0);
    }
    Ok(chosen)
}
