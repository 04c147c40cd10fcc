use std::{path::PathBuf, time::Duration};

use crossterm::event::{self, KeyCode};
use evonet_env::{
    CartPole, EnvWrapper, Environment as _, EpisodeError, EpisodeSummary, StepLimit,
};
use ratatui::DefaultTerminal;

use crate::{model::AgentModel, util};

use self::terminal::{PlayError, TerminalCartPole};

mod display;
mod terminal;

const FPS: u64 = 50;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Path to the model file (JSON format)
    model_path: PathBuf,
    /// Frames drawn per second
    #[clap(long, default_value_t = FPS)]
    fps: u64,
    /// Step cap of the episode; defaults to the one the model was trained with
    #[clap(long, allow_hyphen_values = true)]
    step_limit: Option<StepLimit>,
    /// Seed of the initial state; a random one is picked when omitted
    #[clap(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        model_path,
        fps,
        step_limit,
        seed,
    } = arg;

    let model = AgentModel::open(model_path)?;
    let seed = util::resolve_seed(*seed);
    let frame_time = Duration::from_millis(1000 / (*fps).max(1));
    let limit = step_limit.unwrap_or(model.params.step_limit);

    let summary =
        ratatui::run(|terminal| play_episode(terminal, &model, limit, seed, frame_time))?;
    match summary {
        Some(summary) => eprintln!(
            "{}: {:.1} in {} steps (seed {seed})",
            model.name, summary.total_reward, summary.steps
        ),
        None => eprintln!("{}: aborted (seed {seed})", model.name),
    }
    Ok(())
}

fn play_episode(
    terminal: &mut DefaultTerminal,
    model: &AgentModel,
    limit: StepLimit,
    seed: u64,
    frame_time: Duration,
) -> anyhow::Result<Option<EpisodeSummary>> {
    let mut agent = model.agent.clone();
    agent.reset();

    let env = TerminalCartPole::new(CartPole::new(model.cart_pole, seed), terminal, frame_time);
    let mut wrapper = EnvWrapper::new(env).render(true);
    let summary = match wrapper.execute(&mut agent, limit) {
        Ok(summary) => Some(summary),
        Err(EpisodeError::Environment(PlayError::Aborted)) => None,
        Err(e) => return Err(e.into()),
    };

    let mut env = wrapper.into_inner();
    if let Some(summary) = &summary {
        env.finish(summary)?;
        wait_for_key()?;
    }
    env.close()?;
    Ok(summary)
}

fn wait_for_key() -> anyhow::Result<()> {
    loop {
        if let Some(key) = event::read()?.as_key_event()
            && matches!(key.code, KeyCode::Char(_) | KeyCode::Esc | KeyCode::Enter)
        {
            return Ok(());
        }
    }
}
