use std::path::PathBuf;

use evonet_env::{CartPole, EnvWrapper, StepLimit};
use evonet_training::FitnessStats;

use crate::{model::AgentModel, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Path to the model file (JSON format)
    model_path: PathBuf,
    /// Number of episodes to play
    #[arg(long, default_value_t = 10)]
    episodes: usize,
    /// Step cap of every episode; defaults to the one the model was trained with
    #[arg(long, allow_hyphen_values = true)]
    step_limit: Option<StepLimit>,
    /// Seed of the initial states; a random one is picked and printed when omitted
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        model_path,
        episodes,
        step_limit,
        seed,
    } = arg;

    let model = AgentModel::open(model_path)?;
    let limit = step_limit.unwrap_or(model.params.step_limit);
    let seed = util::resolve_seed(*seed);

    eprintln!("Evaluating {} ({})", model.name, model_path.display());
    eprintln!("  Seed: {seed}");

    let mut agent = model.agent;
    let mut env = EnvWrapper::new(CartPole::new(model.cart_pole, seed));
    let mut rewards = Vec::with_capacity(*episodes);
    for episode in 0..*episodes {
        agent.reset();
        let summary = env.execute(&mut agent, limit)?;
        eprintln!(
            "  Episode #{episode}: {:.1} in {} steps",
            summary.total_reward, summary.steps
        );
        rewards.push(summary.total_reward);
    }
    env.close()?;

    let Some(stats) = FitnessStats::new(rewards) else {
        anyhow::bail!("no episode was played");
    };
    eprintln!("Reward Stats:");
    eprintln!("  Min:    {:.3}", stats.min);
    eprintln!("  Max:    {:.3}", stats.max);
    eprintln!("  Mean:   {:.3}", stats.mean);
    eprintln!("  Stddev: {:.3}", stats.std_dev);

    Ok(())
}
