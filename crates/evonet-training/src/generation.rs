use std::{error::Error, fmt, panic, thread};

use evonet_env::{EnvWrapper, Environment, EpisodeError, EpisodeSummary};
use evonet_network::NetworkShape;
use rand::Rng;

use crate::{
    Agent, BestTracker, FitnessStats, GeneticParams, InvalidParamsError, Population,
    PopulationEvolver, SelectionError,
};

/// Summary of one completed generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    /// Zero-based index of the generation.
    pub generation: usize,
    /// Fitness of the agents as evaluated this generation, before selection.
    pub evaluated: FitnessStats,
    /// Best fitness in the population after selection.
    pub best_fitness: f64,
    /// Best fitness seen in any generation so far.
    pub best_ever: f64,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation {:2}: {:.1}", self.generation, self.best_fitness)
    }
}

#[derive(Debug)]
pub enum TrainingError<E> {
    Episode(EpisodeError<E>),
    Selection(SelectionError),
}

impl<E> fmt::Display for TrainingError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Episode(_) => write!(f, "agent evaluation failed"),
            Self::Selection(_) => write!(f, "selection failed"),
        }
    }
}

impl<E> Error for TrainingError<E>
where
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Episode(e) => Some(e),
            Self::Selection(e) => Some(e),
        }
    }
}

impl<E> From<EpisodeError<E>> for TrainingError<E> {
    fn from(e: EpisodeError<E>) -> Self {
        Self::Episode(e)
    }
}

impl<E> From<SelectionError> for TrainingError<E> {
    fn from(e: SelectionError) -> Self {
        Self::Selection(e)
    }
}

/// Runs the genetic algorithm: reset, evaluate and select, once per generation.
///
/// ```
/// use evonet_env::{CartPole, CartPoleConfig, EnvWrapper};
/// use evonet_training::{Generation, GeneticParams};
/// use rand::SeedableRng as _;
///
/// let params = GeneticParams {
///     population_size: 8,
///     generation_count: 2,
///     ..GeneticParams::default()
/// };
/// let shape = "4,4:relu,2:sign".parse().unwrap();
/// let rng = rand_pcg::Pcg32::seed_from_u64(1);
/// let generation = Generation::new(shape, params, rng).unwrap();
///
/// let mut env = EnvWrapper::new(CartPole::new(CartPoleConfig::default(), 1));
/// let best = generation.run(&mut env).unwrap();
/// assert!(best.fitness() >= 1.0);
/// ```
#[derive(Debug)]
pub struct Generation<R> {
    params: GeneticParams,
    evolver: PopulationEvolver,
    population: Population,
    best: BestTracker,
    completed: usize,
    rng: R,
}

impl<R> Generation<R>
where
    R: Rng,
{
    /// Creates the initial population of `params.population_size` random agents.
    pub fn new(
        shape: NetworkShape,
        params: GeneticParams,
        mut rng: R,
    ) -> Result<Self, InvalidParamsError> {
        params.validate()?;
        let population = Population::random(
            &shape,
            params.population_size,
            params.mutation_rate,
            &mut rng,
        );
        Ok(Self {
            params,
            evolver: PopulationEvolver {
                selection_ratio: params.selection_ratio,
                mutation_rate: Some(params.mutation_rate),
            },
            population,
            best: BestTracker::new(),
            completed: 0,
            rng,
        })
    }

    #[must_use]
    pub fn params(&self) -> &GeneticParams {
        &self.params
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Fittest agent seen in any generation so far.
    #[must_use]
    pub fn best(&self) -> Option<&Agent> {
        self.best.best()
    }

    /// Number of generations run so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.completed >= self.params.generation_count
    }

    /// Runs one generation, evaluating every agent in turn on `env`.
    pub fn step<E>(
        &mut self,
        env: &mut EnvWrapper<E>,
    ) -> Result<GenerationReport, TrainingError<E::Error>>
    where
        E: Environment,
    {
        self.population.reset_fitness();
        for agent in self.population.agents_mut() {
            env.execute(agent, self.params.step_limit)?;
            self.best.observe(agent);
        }
        self.select()
    }

    /// Runs one generation, evaluating all agents concurrently.
    ///
    /// Every agent plays on its own environment, built by `make_env` from the agent's
    /// position in the population. The best agent is recorded after all episodes
    /// finished, in population order, so the outcome matches [`Generation::step`]
    /// given equivalent environments.
    pub fn step_parallel<E, F>(
        &mut self,
        make_env: F,
    ) -> Result<GenerationReport, TrainingError<E::Error>>
    where
        E: Environment,
        E::Error: Send,
        F: Fn(usize) -> E + Sync,
    {
        let limit = self.params.step_limit;
        self.population.reset_fitness();

        let results: Vec<Result<EpisodeSummary, EpisodeError<E::Error>>> = thread::scope(|s| {
            let handles = self
                .population
                .agents_mut()
                .iter_mut()
                .enumerate()
                .map(|(i, agent)| {
                    let make_env = &make_env;
                    s.spawn(move || -> Result<EpisodeSummary, EpisodeError<E::Error>> {
                        let mut env = EnvWrapper::new(make_env(i));
                        let summary = env.execute(agent, limit)?;
                        env.close().map_err(EpisodeError::Environment)?;
                        Ok(summary)
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                .collect()
        });

        for (agent, result) in self.population.agents().iter().zip(results) {
            result?;
            self.best.observe(agent);
        }
        self.select()
    }

    fn select<E>(&mut self) -> Result<GenerationReport, TrainingError<E>> {
        let evaluated = self
            .population
            .fitness_stats()
            .expect("population is never empty");

        self.population = self.evolver.evolve(&self.population, &mut self.rng)?;
        for agent in self.population.agents() {
            self.best.observe(agent);
        }

        let best_fitness = self
            .population
            .best_agent()
            .map_or(evaluated.max, Agent::fitness);
        let report = GenerationReport {
            generation: self.completed,
            evaluated,
            best_fitness,
            best_ever: self.best.fitness().unwrap_or(best_fitness),
        };
        self.completed += 1;

        log::info!("{report}");
        Ok(report)
    }

    /// Runs all remaining generations and returns the fittest agent seen.
    pub fn run<E>(mut self, env: &mut EnvWrapper<E>) -> Result<Agent, TrainingError<E::Error>>
    where
        E: Environment,
    {
        while !self.is_finished() {
            self.step(env)?;
        }
        Ok(self.into_best())
    }

    /// Like [`Generation::run`], evaluating each generation with
    /// [`Generation::step_parallel`].
    pub fn run_parallel<E, F>(mut self, make_env: F) -> Result<Agent, TrainingError<E::Error>>
    where
        E: Environment,
        E::Error: Send,
        F: Fn(usize) -> E + Sync,
    {
        while !self.is_finished() {
            self.step_parallel(&make_env)?;
        }
        Ok(self.into_best())
    }

    fn into_best(self) -> Agent {
        self.best
            .into_best()
            .expect("at least one generation has been evaluated")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(generation: usize, best_fitness: f64) -> GenerationReport {
        GenerationReport {
            generation,
            evaluated: FitnessStats::new([best_fitness]).unwrap(),
            best_fitness,
            best_ever: best_fitness,
        }
    }

    #[test]
    fn test_report_display_pads_generation_and_rounds_fitness() {
        assert_eq!(report(3, 5.0).to_string(), "Generation  3: 5.0");
        assert_eq!(report(12, 187.25).to_string(), "Generation 12: 187.2");
        assert_eq!(report(140, 500.0).to_string(), "Generation 140: 500.0");
    }
}
