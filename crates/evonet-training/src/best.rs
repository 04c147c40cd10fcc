use crate::Agent;

/// Remembers the fittest agent seen so far.
///
/// The tracker stores its own copy of the agent, so later resets or replacement of
/// the population never affect it. It only changes when a strictly fitter agent is
/// observed, so its fitness never decreases.
#[derive(Debug, Clone, Default)]
pub struct BestTracker {
    best: Option<Agent>,
}

impl BestTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a snapshot of `agent` if it beats the current best.
    ///
    /// Returns whether the tracked agent changed.
    pub fn observe(&mut self, agent: &Agent) -> bool {
        let improved = self
            .best
            .as_ref()
            .is_none_or(|best| agent.fitness() > best.fitness());
        if improved {
            self.best = Some(agent.snapshot());
        }
        improved
    }

    #[must_use]
    pub fn best(&self) -> Option<&Agent> {
        self.best.as_ref()
    }

    #[must_use]
    pub fn fitness(&self) -> Option<f64> {
        self.best.as_ref().map(Agent::fitness)
    }

    #[must_use]
    pub fn into_best(self) -> Option<Agent> {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn agent_with_fitness(fitness: f64, rng: &mut Pcg32) -> Agent {
        let mut agent = Agent::random("3,2:sign".parse().unwrap(), 0.5, rng);
        agent.award(fitness);
        agent
    }

    #[test]
    fn test_first_observation_is_taken() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut tracker = BestTracker::new();
        assert!(tracker.best().is_none());
        assert!(tracker.observe(&agent_with_fitness(0.0, &mut rng)));
        assert_eq!(tracker.fitness(), Some(0.0));
    }

    #[test]
    fn test_only_strict_improvements_replace() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut tracker = BestTracker::new();
        let first = agent_with_fitness(5.0, &mut rng);
        let tie = agent_with_fitness(5.0, &mut rng);
        let worse = agent_with_fitness(2.0, &mut rng);
        let better = agent_with_fitness(7.0, &mut rng);

        tracker.observe(&first);
        assert!(!tracker.observe(&tie));
        assert_eq!(tracker.best(), Some(&first));
        assert!(!tracker.observe(&worse));
        assert!(tracker.observe(&better));
        assert_eq!(tracker.best(), Some(&better));
    }

    #[test]
    fn test_snapshot_survives_reset() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut tracker = BestTracker::new();
        let mut agent = agent_with_fitness(9.0, &mut rng);
        tracker.observe(&agent);
        agent.reset();
        assert_eq!(tracker.fitness(), Some(9.0));
    }
}
