use clap::{Parser, Subcommand};

use self::{evaluate::EvaluateArg, play::PlayArg, train::TrainArg};

mod evaluate;
mod play;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a cart-pole controller with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Measure a trained model over several headless episodes
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Watch a trained model balance the pole in the terminal
    Play(#[clap(flatten)] PlayArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Play(arg) => play::run(&arg)?,
    }
    Ok(())
}
