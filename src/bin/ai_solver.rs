use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use watersort_solver::codec::load_level;
use watersort_solver::solver::{find_solution_with_config, SolverConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Prints a shortest solution for a water sort level", long_about = None)]
struct Args {
    /// JSON level to read; reads stdin when omitted
    #[clap(short, long)]
    input: Option<PathBuf>,

    /// Print how many states were considered to find the solution
    #[clap(long)]
    report_complexity: bool,

    /// Give up after registering this many states
    #[clap(long)]
    max_states: Option<usize>,

    /// Shuffle the move order with this seed
    #[clap(long)]
    seed: Option<u64>,
}

fn open_input(input: Option<&PathBuf>) -> Result<Box<dyn Read>> {
    Ok(match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let reader = open_input(args.input.as_ref())?;
    let level = load_level(reader).context("failed to load the level")?;

    let config = SolverConfig {
        max_states: args.max_states,
        shuffle_seed: args.seed,
    };
    let solution = find_solution_with_config(&level, &config).context("failed to find a solution")?;

    for (i, step) in solution.steps.iter().enumerate() {
        println!("Step {:2}: {}", i + 1, step);
    }
    if args.report_complexity {
        println!("Complexity: {}", solution.explored_states);
    }

    Ok(())
}
