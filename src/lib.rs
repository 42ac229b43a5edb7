//! # Water Sort Solver Library
//!
//! This library provides the core game logic for the water sort puzzle and an
//! A* solver that finds a shortest sequence of pours sorting every color into
//! its own bottle.
//!
//! It is used by four binaries:
//! - `ai_solver`: Reads a JSON level and prints a shortest solution.
//! - `level_generator`: Generates random levels and reports the unsolvable and the hardest ones.
//! - `human_player`: Allows interactive gameplay via the command line, with undo and hints.
//! - `web_server`: Serves random levels and step-by-step solutions over HTTP.
//!
//! ## Modules
//! - `engine`: Contains the puzzle representation (`Color`, `Bottle`, `State`, `Step`)
//!   and the interactive session (`Game`).
//! - `moves`: Enumerates the legal pours of a state.
//! - `heuristics`: Defines the lower bound on remaining pours that guides the search.
//! - `solver`: Provides `find_solution` and its configurable variant.
//! - `codec`: Converts states to and from compact text, JSON levels and letter rows.
//! - `web`: The axum router behind `web_server`.
//! - `error`: Error types shared by all of the above.

pub mod codec;
pub mod engine;
pub mod error;
pub mod heuristics;
pub mod moves;
pub mod solver;
pub mod web;

pub use engine::{Bottle, Color, Game, State, Step};
pub use error::{ParseError, PourError, SolveError, ValidationError};
pub use solver::{find_solution, find_solution_with_config, Solution, SolverConfig};
