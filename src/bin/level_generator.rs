use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use watersort_solver::engine::State;
use watersort_solver::error::SolveError;
use watersort_solver::solver::{find_solution_with_config, SolverConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Searches random water sort levels for unsolvable and hard ones", long_about = None)]
struct Args {
    /// Number of colors/bottles; does not include the two empty bottles
    #[clap(short, long, default_value_t = 10)]
    num: u8,

    /// Number of slots in each bottle
    #[clap(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    size: u16,

    /// Stop after this many levels; runs until interrupted when omitted
    #[clap(short, long)]
    attempts: Option<u64>,

    /// Seed for reproducible levels
    #[clap(long)]
    seed: Option<u64>,

    /// Skip levels whose search registers this many states
    #[clap(long)]
    max_states: Option<usize>,
}

fn print_level(header: &str, state: &State) -> Result<()> {
    println!("=== {} ===", header);
    println!(
        "{}",
        serde_json::to_string(state).context("failed to encode the level")?
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let config = SolverConfig {
        max_states: args.max_states,
        ..SolverConfig::default()
    };

    let mut max_complexity = 0;
    let mut attempt = 0u64;
    while args.attempts.map_or(true, |limit| attempt < limit) {
        attempt += 1;
        let state = State::new_random(args.num, usize::from(args.size), &mut rng);

        match find_solution_with_config(&state, &config) {
            Ok(solution) => {
                debug!(attempt, complexity = solution.explored_states, "solved level");
                if solution.explored_states > max_complexity {
                    max_complexity = solution.explored_states;
                    print_level(&format!("Complexity {}", max_complexity), &state)?;
                }
            }
            Err(SolveError::NoSolution { .. }) => print_level("Unsolvable", &state)?,
            Err(err @ SolveError::BudgetExhausted { .. }) => {
                warn!(attempt, error = %err, "skipping level");
            }
        }
    }

    Ok(())
}
