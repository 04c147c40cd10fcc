use crate::{Environment, EpisodeError, Policy, StepLimit};

/// Outcome of one episode driven by [`EnvWrapper::execute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    /// Number of environment steps taken.
    pub steps: usize,
    /// Sum of the rewards credited to the policy during this episode.
    pub total_reward: f64,
    /// The environment reported `done`, as opposed to hitting the step limit.
    pub finished: bool,
}

/// Drives episodes of an [`Environment`] with a [`Policy`].
#[derive(Debug)]
pub struct EnvWrapper<E> {
    env: E,
    render: bool,
}

impl<E> EnvWrapper<E>
where
    E: Environment,
{
    #[must_use]
    pub fn new(env: E) -> Self {
        Self { env, render: false }
    }

    /// Renders the environment before every step when enabled.
    #[must_use]
    pub fn render(self, render: bool) -> Self {
        Self { render, ..self }
    }

    #[must_use]
    pub fn env(&self) -> &E {
        &self.env
    }

    #[must_use]
    pub fn into_inner(self) -> E {
        self.env
    }

    /// Runs one episode, crediting every reward to `policy`.
    ///
    /// The policy is updated in place: after this returns its accumulated reward
    /// includes the whole episode. Rewards from earlier episodes are kept, so callers
    /// reset the policy's fitness themselves when they want a fresh count.
    pub fn execute<P>(
        &mut self,
        policy: &mut P,
        limit: StepLimit,
    ) -> Result<EpisodeSummary, EpisodeError<E::Error>>
    where
        P: Policy + ?Sized,
    {
        let mut observation = self.env.reset().map_err(EpisodeError::Environment)?;
        let mut summary = EpisodeSummary {
            steps: 0,
            total_reward: 0.0,
            finished: false,
        };

        while limit.allows(summary.steps) {
            if self.render {
                self.env.render().map_err(EpisodeError::Environment)?;
            }
            let action = policy.act(&observation)?;
            let transition = self.env.step(action).map_err(EpisodeError::Environment)?;
            log::trace!(
                "step {}: action={action} reward={} done={}",
                summary.steps,
                transition.reward,
                transition.done
            );

            policy.award(transition.reward);
            summary.steps += 1;
            summary.total_reward += transition.reward;
            observation = transition.observation;

            if transition.done {
                summary.finished = true;
                break;
            }
        }

        log::debug!(
            "episode ended after {} steps with reward {} ({})",
            summary.steps,
            summary.total_reward,
            if summary.finished {
                "done"
            } else {
                "step limit"
            }
        );
        Ok(summary)
    }

    pub fn reset(&mut self) -> Result<Vec<f64>, E::Error> {
        self.env.reset()
    }

    pub fn close(&mut self) -> Result<(), E::Error> {
        self.env.close()
    }
}
