//! Evolving network weights with a genetic algorithm.
//!
//! Every agent owns a [`Network`](evonet_network::Network) whose weights are never
//! trained directly. Instead, each generation plays one episode per agent and the
//! reward it collects becomes its fitness. Fitter agents are more likely to survive
//! and to have mutated offspring.
//!
//! # How Training Works
//!
//! 1. **Init** - [`Generation::new`] creates `population_size` agents with random
//!    weights drawn from `[-5, 5)`
//! 2. **Reset** - every agent's fitness goes back to zero
//! 3. **Simulate** - each agent plays exactly one episode through
//!    [`EnvWrapper::execute`](evonet_env::EnvWrapper::execute); the
//!    [`BestTracker`] keeps a copy of any agent that beats the best fitness so far
//! 4. **Select** - [`PopulationEvolver::evolve`] keeps fitness-proportional elites
//!    and fills the population back up with their mutated children
//! 5. **Repeat** steps 2-4 `generation_count` times, then return the best agent
//!
//! # Randomness
//!
//! Nothing here reaches for a global generator. Initialization, selection and
//! mutation all draw from the generator handed to [`Generation::new`], so a seeded
//! generator and deterministic environments reproduce a run exactly.
//!
//! # Parallel Evaluation
//!
//! Agents do not share state while they are evaluated, so
//! [`Generation::step_parallel`] can run every episode on its own thread with its own
//! environment. Selection still happens on the calling thread after all episodes
//! have finished.
//!
//! # Current Limitations
//!
//! - **Fitness must be non-negative**: roulette-wheel selection is undefined for
//!   negative rewards or an all-zero generation, and fails with
//!   [`DegenerateFitnessError`] rather than guessing
//! - **Mutation only**: there is no crossover between parents
//! - **One episode per agent**: noisy environments give noisy fitness

pub use self::{agent::*, best::*, generation::*, genetic::*, params::*, stats::*};

mod agent;
mod best;
mod generation;
mod genetic;
mod params;
mod stats;
