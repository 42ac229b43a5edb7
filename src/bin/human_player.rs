use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use watersort_solver::codec::load_level;
use watersort_solver::engine::{Game, State};
use watersort_solver::solver::SolverConfig;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play water sort in the terminal", long_about = None)]
struct Args {
    /// JSON level to play; a random level is dealt when omitted
    #[clap(short, long)]
    input: Option<PathBuf>,

    /// Number of colors of a random level
    #[clap(short, long, default_value_t = 10)]
    num: u8,

    /// Number of slots in each bottle of a random level
    #[clap(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    size: u16,

    /// Seed for the random level
    #[clap(long)]
    seed: Option<u64>,
}

fn initial_state(args: &Args) -> Result<State> {
    if let Some(path) = &args.input {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        return load_level(BufReader::new(file))
            .with_context(|| format!("failed to load {}", path.display()));
    }
    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    Ok(State::new_random(args.num, usize::from(args.size), &mut rng))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut game = Game::new(initial_state(&args)?);
    let hint_config = SolverConfig::default();
    let mut highlight = None;

    println!("Welcome to Water Sort!");

    loop {
        println!("---------------------");
        println!("Steps: {}", game.steps().len());
        println!("{}", game.state().to_string_with_highlight(highlight));
        highlight = None;

        if game.is_solved() {
            println!();
            println!("---------------------");
            println!("🎉 SOLVED! 🎉");
            println!("Total Steps: {}", game.steps().len());
            println!("---------------------");
            break;
        }

        print!("Enter your move (from to), 'u' to undo, 'h' for a hint, 'q' to quit: ");
        io::stdout().flush().context("failed to flush stdout")?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input).context("failed to read input")? == 0 {
            println!();
            break;
        }

        match input.trim() {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "u" => {
                if game.undo_last_move() {
                    println!("Move undone.");
                } else {
                    println!("Cannot undo further (no moves made).");
                }
            }
            "h" => match game.hint(&hint_config) {
                Ok(Some(step)) => {
                    println!("Hint: {}", step);
                    highlight = Some(step.from);
                }
                Ok(None) => println!("The puzzle is already solved."),
                Err(err) => println!("No hint available: {}", err),
            },
            command => {
                let parts: Vec<&str> = command.split_whitespace().collect();
                let [from, to] = parts.as_slice() else {
                    println!("Invalid input format. Use 'from to', 'u', 'h' or 'q'.");
                    continue;
                };
                let (Ok(from), Ok(to)) = (from.parse::<usize>(), to.parse::<usize>()) else {
                    println!("Invalid input: Please enter bottle numbers (e.g., '3 11').");
                    continue;
                };
                if from == 0 || to == 0 {
                    println!("Bottles are numbered from 1 to {}.", game.state().len());
                    continue;
                }
                match game.process_move(from - 1, to - 1) {
                    Ok(step) => {
                        println!("Move processed: {}", step);
                        highlight = Some(step.to);
                    }
                    Err(err) => println!("Invalid move: {}", err),
                }
            }
        }
    }

    Ok(())
}
