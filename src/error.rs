//! Error types for the water sort engine, solver and codecs.
//!
//! Bottle numbers in messages are 1-based to match what a player sees; the
//! fields themselves hold 0-based indices.

use crate::engine::Color;

/// A structural problem with a puzzle, detected once when a state is loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("the puzzle has no bottles")]
    NoBottles,

    #[error("bottles have no slots")]
    ZeroCapacity,

    #[error("not all bottles have the same size: bottle {} has {actual} slots, want {expected}", .bottle + 1)]
    SizeMismatch {
        bottle: usize,
        actual: usize,
        expected: usize,
    },

    #[error("bottle {}: cannot stack {color} on top of an empty slot (slot {})", .bottle + 1, .slot + 1)]
    FloatingLiquid {
        bottle: usize,
        slot: usize,
        color: Color,
    },

    #[error("got {actual} empty slots, want {expected}")]
    EmptySlotCount { actual: usize, expected: usize },

    #[error("color {color}: got {actual} slots, want {expected}")]
    ColorCount {
        color: Color,
        actual: usize,
        expected: usize,
    },
}

/// A pour that violates the pour preconditions.
///
/// The search only applies moves it generated itself, so inside the solver
/// this indicates a logic error rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PourError {
    #[error("bottle {} is out of range (puzzle has {len} bottles)", .index + 1)]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot pour bottle {} onto itself", .0 + 1)]
    SameBottle(usize),

    #[error("nothing to pour: the source bottle is empty")]
    SourceEmpty,

    #[error("no space available in the destination bottle")]
    DestinationFull,

    #[error("cannot pour {poured} onto {top}")]
    ColorMismatch { poured: Color, top: Color },
}

/// Outcome of a search that did not produce a solution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// The search was exhaustive and no sorted state is reachable.
    #[error("there is no solution (evaluated {explored_states} states)")]
    NoSolution { explored_states: usize },

    /// The caller's state budget ran out before the search finished.
    #[error("search budget exhausted after evaluating {explored_states} states")]
    BudgetExhausted { explored_states: usize },
}

/// Failure to decode a puzzle from its text or JSON form.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{0:?} is not a valid color")]
    InvalidColor(String),

    #[error("bottle {} is empty in the text form", .0 + 1)]
    EmptyBottleText(usize),

    #[error("invalid JSON level: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
