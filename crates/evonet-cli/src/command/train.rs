use std::path::PathBuf;

use chrono::Utc;
use evonet_env::{CartPole, EnvWrapper, StepLimit};
use evonet_network::NetworkShape;
use evonet_training::{
    Agent, DEFAULT_MUTATION_RATE, DEFAULT_SELECTION_RATIO, Generation, GenerationReport,
    GeneticParams,
};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::{
    model::AgentModel,
    util::{self, Output},
};

const DEFAULT_SHAPE: &str = "4,8:relu,2:sign";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Number of agents in every generation
    #[arg(long, default_value_t = 20)]
    population: usize,
    /// Number of generations to evolve
    #[arg(long, default_value_t = 20)]
    generations: usize,
    /// Network levels as `width[:activation]`, the first one being the input
    #[arg(long, default_value = DEFAULT_SHAPE)]
    shape: NetworkShape,
    /// Standard deviation of the mutation noise
    #[arg(long, default_value_t = DEFAULT_MUTATION_RATE)]
    mutation_rate: f64,
    /// Fraction of every generation kept as elites
    #[arg(long, default_value_t = DEFAULT_SELECTION_RATIO)]
    selection_ratio: f64,
    /// Step cap of every evaluation episode (-1 for no cap)
    #[arg(long, default_value_t = StepLimit::default(), allow_hyphen_values = true)]
    step_limit: StepLimit,
    /// Steps after which the cart-pole itself ends an episode (-1 to run until failure)
    #[arg(long, default_value = "500", allow_hyphen_values = true)]
    episode_limit: StepLimit,
    /// Seed of the run; a random one is picked and printed when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Evaluate the agents of a generation on separate threads
    #[arg(long)]
    parallel: bool,
    /// Name stored in the saved model
    #[arg(long, default_value = "cart-pole")]
    name: String,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        population,
        generations,
        shape,
        mutation_rate,
        selection_ratio,
        step_limit,
        episode_limit,
        seed,
        parallel,
        name,
        output,
    } = arg;

    let seed = util::resolve_seed(*seed);
    let params = GeneticParams {
        population_size: *population,
        generation_count: *generations,
        mutation_rate: *mutation_rate,
        selection_ratio: *selection_ratio,
        step_limit: *step_limit,
    };
    let config = util::cart_pole_config(*episode_limit);

    eprintln!("Training cart-pole controller:");
    eprintln!("  Seed:       {seed}");
    eprintln!("  Shape:      {shape}");
    eprintln!("  Population: {}", params.population_size);
    eprintln!("  Elites:     {}", params.elite_count());
    eprintln!("  Generations: {}", params.generation_count);

    let mut generation = Generation::new(shape.clone(), params, Pcg32::seed_from_u64(seed))?;
    while !generation.is_finished() {
        let index = generation.completed();
        let report = if *parallel {
            generation
                .step_parallel(|i| CartPole::new(config, util::episode_seed(seed, index, i)))?
        } else {
            let mut env =
                EnvWrapper::new(CartPole::new(config, util::episode_seed(seed, index, 0)));
            let report = generation.step(&mut env)?;
            env.close()?;
            report
        };
        print_report(&report);
    }

    let Some(best) = generation.best().map(Agent::snapshot) else {
        anyhow::bail!("no generation was evaluated");
    };
    eprintln!("Cart-pole training completed.");

    let model = AgentModel {
        name: name.clone(),
        trained_at: Utc::now(),
        final_fitness: best.fitness(),
        seed,
        params,
        cart_pole: config,
        agent: best,
    };
    Output::save_json(&model, output.as_deref())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Final fitness: {:.3}", model.final_fitness);
    eprintln!("  Shape: {}", model.agent.shape());

    Ok(())
}

fn print_report(report: &GenerationReport) {
    let GenerationReport {
        generation,
        evaluated,
        best_fitness,
        best_ever,
    } = report;
    eprintln!("Generation #{generation}:");
    eprintln!("  Fitness Stats:");
    eprintln!("    Min:    {:.3}", evaluated.min);
    eprintln!("    Max:    {:.3}", evaluated.max);
    eprintln!("    Mean:   {:.3}", evaluated.mean);
    eprintln!("    Stddev: {:.3}", evaluated.std_dev);
    eprintln!("  Best after selection: {best_fitness:.3}");
    eprintln!("  Best ever:            {best_ever:.3}");
}
