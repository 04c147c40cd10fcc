use evonet_env::Policy;
use evonet_network::{DimensionMismatchError, InvalidMutationRateError, Network, NetworkShape};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default standard deviation of the Gaussian noise used for reproduction.
pub const DEFAULT_MUTATION_RATE: f64 = 0.5;

/// One candidate solution: a network plus the reward it earned this generation.
///
/// Fitness starts at zero, grows through [`Agent::award`] while the agent plays an
/// episode, and is cleared with [`Agent::reset`] before the next generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    network: Network,
    rate: f64,
    fitness: f64,
}

impl Agent {
    /// Creates an agent with freshly initialized parameters.
    pub fn random<R>(shape: NetworkShape, rate: f64, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::from_network(Network::random(shape, rng), rate)
    }

    #[must_use]
    pub fn from_network(network: Network, rate: f64) -> Self {
        Self {
            network,
            rate,
            fitness: 0.0,
        }
    }

    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[must_use]
    pub fn shape(&self) -> &NetworkShape {
        self.network.shape()
    }

    /// Standard deviation used when this agent reproduces.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Picks the action for `observation`. Fitness is not affected.
    pub fn act(&self, observation: &[f64]) -> Result<usize, DimensionMismatchError> {
        self.network.evaluate(observation)
    }

    pub fn award(&mut self, reward: f64) {
        self.fitness += reward;
    }

    pub fn reset(&mut self) {
        self.fitness = 0.0;
    }

    /// Produces an offspring whose parameters are this agent's parameters plus
    /// Gaussian noise.
    ///
    /// `rate` defaults to the parent's rate and is inherited by the child. The child
    /// starts with zero fitness and the parent is left unchanged.
    pub fn child<R>(&self, rate: Option<f64>, rng: &mut R) -> Result<Self, InvalidMutationRateError>
    where
        R: Rng + ?Sized,
    {
        let rate = rate.unwrap_or(self.rate);
        let network = self.network.mutated(rate, rng)?;
        Ok(Self::from_network(network, rate))
    }

    /// Returns an independent copy, fitness included.
    ///
    /// The copy shares nothing with `self`, so it stays valid however the original
    /// is later reset or replaced.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}

impl Policy for Agent {
    fn act(&self, observation: &[f64]) -> Result<usize, DimensionMismatchError> {
        Agent::act(self, observation)
    }

    fn award(&mut self, reward: f64) {
        Agent::award(self, reward);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn agent(rng: &mut Pcg32) -> Agent {
        Agent::random("4,8:relu,2:sign".parse().unwrap(), DEFAULT_MUTATION_RATE, rng)
    }

    #[test]
    fn test_award_and_reset() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut agent = agent(&mut rng);
        assert_eq!(agent.fitness(), 0.0);
        agent.award(1.0);
        agent.award(2.5);
        assert_eq!(agent.fitness(), 3.5);
        agent.reset();
        assert_eq!(agent.fitness(), 0.0);
    }

    #[test]
    fn test_act_leaves_fitness_alone() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut agent = agent(&mut rng);
        agent.award(4.0);
        let first = agent.act(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        let second = agent.act(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(first, second);
        assert_eq!(agent.fitness(), 4.0);
    }

    #[test]
    fn test_child_starts_with_zero_fitness() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut parent = agent(&mut rng);
        parent.award(123.0);
        let before = parent.clone();

        let child = parent.child(None, &mut rng).unwrap();
        assert_eq!(child.fitness(), 0.0);
        assert_eq!(child.rate(), parent.rate());
        assert_eq!(child.shape(), parent.shape());
        assert_ne!(child.network(), parent.network());
        assert_eq!(parent, before);
    }

    #[test]
    fn test_child_rate_override() {
        let mut rng = Pcg32::seed_from_u64(4);
        let parent = agent(&mut rng);
        let child = parent.child(Some(0.0), &mut rng).unwrap();
        assert_eq!(child.rate(), 0.0);
        assert_eq!(child.network().params(), parent.network().params());
    }

    #[test]
    fn test_child_rejects_negative_rate() {
        let mut rng = Pcg32::seed_from_u64(5);
        let parent = agent(&mut rng);
        assert!(parent.child(Some(-1.0), &mut rng).is_err());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut agent = agent(&mut rng);
        agent.award(10.0);
        let snapshot = agent.snapshot();
        agent.reset();
        agent = agent.child(None, &mut rng).unwrap();
        assert_eq!(snapshot.fitness(), 10.0);
        assert_ne!(snapshot.network(), agent.network());
    }
}
