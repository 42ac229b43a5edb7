use crate::engine::{State, Step};
use crate::error::SolveError;
use crate::moves;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, info, warn};

/// Tuning knobs for one search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverConfig {
    /// Never register more than this many distinct states; the search stops
    /// with `SolveError::BudgetExhausted` when it would have to. The initial
    /// state counts, so `Some(0)` fails on any unsolved state. `None` searches
    /// until solved or exhausted.
    pub max_states: Option<usize>,
    /// Shuffle the move order of every expansion with a `SmallRng` seeded
    /// from this value. Only changes which of several equally short
    /// solutions is found.
    pub shuffle_seed: Option<u64>,
}

/// Represents a solution found by the solver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Solution {
    /// Pours to apply, in order, to the state that was solved.
    pub steps: Vec<Step>,
    /// Number of distinct states registered by the search (the "complexity" of the puzzle).
    pub explored_states: usize,
}

/// A partial solution waiting in the frontier.
struct Candidate {
    state: State,
    steps: Vec<Step>,
    /// `steps.len() + heuristic(state)`.
    score: u32,
    fingerprint: u32,
    /// Insertion counter, the final tie-break.
    sequence: u64,
}

impl Ord for Candidate {
    /// `BinaryHeap` pops the greatest element, so "greater" means "expand first":
    /// lower score, then more steps taken, then inserted earlier.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.steps.len().cmp(&other.steps.len()))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Finds a shortest solution for `state` with the default configuration.
pub fn find_solution(state: &State) -> Result<Solution, SolveError> {
    find_solution_with_config(state, &SolverConfig::default())
}

/// Finds a shortest solution for `state` using A* search.
///
/// Candidates are ordered by `steps + heuristic`, preferring deeper
/// candidates on ties, so the search dives along promising paths before
/// backtracking. The heuristic is consistent, which makes the first sorted
/// state generated a shortest solution.
///
/// Visited states are keyed by `State::fingerprint` and remember the fewest
/// steps they were reached with; reaching one again with no fewer steps is
/// skipped. Two distinct states sharing a fingerprint are treated as the
/// same state.
///
/// # Errors
/// * `SolveError::NoSolution` when every reachable state has been explored.
/// * `SolveError::BudgetExhausted` when `config.max_states` is reached first.
pub fn find_solution_with_config(
    initial: &State,
    config: &SolverConfig,
) -> Result<Solution, SolveError> {
    let initial_heuristic = initial.heuristic();
    debug!(
        bottles = initial.len(),
        heuristic = initial_heuristic,
        "starting A* search"
    );

    if initial_heuristic == 0 {
        return Ok(Solution {
            steps: Vec::new(),
            explored_states: 0,
        });
    }

    let budget_exhausted = |registered: usize| {
        let exhausted = config.max_states.is_some_and(|limit| registered >= limit);
        if exhausted {
            info!(explored_states = registered, "search budget exhausted");
        }
        exhausted
    };
    if budget_exhausted(0) {
        return Err(SolveError::BudgetExhausted { explored_states: 0 });
    }

    let mut rng = config.shuffle_seed.map(SmallRng::seed_from_u64);

    // Fewest steps each fingerprint has been reached with.
    let mut best_steps: HashMap<u32, usize> = HashMap::new();
    let mut frontier = BinaryHeap::new();
    let mut sequence = 0u64;

    let fingerprint = initial.fingerprint();
    best_steps.insert(fingerprint, 0);
    frontier.push(Candidate {
        state: initial.clone(),
        steps: Vec::new(),
        score: initial_heuristic,
        fingerprint,
        sequence,
    });

    while let Some(base) = frontier.pop() {
        if best_steps
            .get(&base.fingerprint)
            .is_some_and(|&best| best < base.steps.len())
        {
            // Reached again with fewer steps after this entry was queued.
            continue;
        }

        let next_moves = match rng.as_mut() {
            Some(rng) => moves::legal_moves_shuffled(&base.state, rng),
            None => moves::legal_moves(&base.state),
        };
        let depth = base.steps.len() + 1;

        for step in next_moves {
            let mut next = base.state.clone();
            if let Err(err) = next.apply(&step) {
                warn!(%step, error = %err, "skipping generated move that failed to apply");
                continue;
            }

            let fingerprint = next.fingerprint();
            if best_steps
                .get(&fingerprint)
                .is_some_and(|&best| best <= depth)
            {
                continue;
            }

            let mut steps = base.steps.clone();
            steps.push(step);

            let heuristic = next.heuristic();
            if heuristic == 0 {
                debug!(
                    steps = steps.len(),
                    explored_states = best_steps.len(),
                    "found solution"
                );
                return Ok(Solution {
                    steps,
                    explored_states: best_steps.len(),
                });
            }

            if !best_steps.contains_key(&fingerprint) && budget_exhausted(best_steps.len()) {
                return Err(SolveError::BudgetExhausted {
                    explored_states: best_steps.len(),
                });
            }
            best_steps.insert(fingerprint, depth);

            sequence += 1;
            frontier.push(Candidate {
                state: next,
                steps,
                score: depth as u32 + heuristic,
                fingerprint,
                sequence,
            });
        }
    }

    debug!(
        explored_states = best_steps.len(),
        "search space exhausted without a solution"
    );
    Err(SolveError::NoSolution {
        explored_states: best_steps.len(),
    })
}
