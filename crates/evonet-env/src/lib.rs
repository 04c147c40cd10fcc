//! The environment side of neuroevolution: an episodic, stateful simulation that a
//! [`Policy`] drives one step at a time.
//!
//! # Protocol
//!
//! [`EnvWrapper::execute`] runs exactly one episode:
//!
//! 1. [`Environment::reset`] starts the episode and yields the first observation
//! 2. Until the [`StepLimit`] is reached or the environment reports `done`:
//!    - optionally [`Environment::render`]
//!    - ask the policy for an action ([`Policy::act`])
//!    - [`Environment::step`] with that action
//!    - credit the reward to the policy ([`Policy::award`])
//!
//! Failures are never retried: a policy that cannot read the observation or an
//! environment that fails aborts the episode with an [`EpisodeError`].
//!
//! # Environments
//!
//! [`CartPole`] is the classic pole-balancing task, and the only environment shipped
//! here. Anything else implementing [`Environment`] can be plugged in.

use std::{error::Error, fmt};

use evonet_network::DimensionMismatchError;

pub use self::{cart_pole::*, step_limit::*, wrapper::*};

mod cart_pole;
mod step_limit;
mod wrapper;

/// Result of advancing an environment by one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub observation: Vec<f64>,
    pub reward: f64,
    /// The episode is over; further steps are meaningless.
    pub done: bool,
}

/// A stateful, episodic simulation with a discrete action space.
///
/// Implementations are not expected to be shareable across threads; parallel
/// evaluation creates one environment per worker.
pub trait Environment {
    type Error;

    /// Length of every observation vector this environment produces.
    fn observation_len(&self) -> usize;

    /// Number of discrete actions; valid actions are `0..action_count()`.
    fn action_count(&self) -> usize;

    /// Starts a new episode and returns its initial observation.
    fn reset(&mut self) -> Result<Vec<f64>, Self::Error>;

    fn step(&mut self, action: usize) -> Result<Transition, Self::Error>;

    /// Visualizes the current state. Headless environments do nothing.
    fn render(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Releases any resources held by the environment.
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Something that picks actions from observations and collects rewards.
pub trait Policy {
    fn act(&self, observation: &[f64]) -> Result<usize, DimensionMismatchError>;

    fn award(&mut self, reward: f64);
}

/// Why an episode was aborted.
#[derive(Debug)]
pub enum EpisodeError<E> {
    /// The policy could not evaluate the observation it was given.
    Policy(DimensionMismatchError),
    Environment(E),
}

impl<E> fmt::Display for EpisodeError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Policy(e) => write!(f, "policy failed to act: {e}"),
            Self::Environment(e) => write!(f, "environment failed: {e}"),
        }
    }
}

impl<E> Error for EpisodeError<E>
where
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Policy(e) => Some(e),
            Self::Environment(e) => Some(e),
        }
    }
}

impl<E> From<DimensionMismatchError> for EpisodeError<E> {
    fn from(e: DimensionMismatchError) -> Self {
        Self::Policy(e)
    }
}
