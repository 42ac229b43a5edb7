use crate::engine::State;

/// Sums `Bottle::min_required_moves` over all bottles.
///
/// Counts the color changes between adjacent liquid slots across the whole
/// puzzle. A single pour removes at most one such change (the boundary under
/// the poured run), so this alone never overestimates the remaining moves.
///
/// # Arguments
/// * `state`: The `State` to analyze.
///
/// # Returns
/// The total number of color boundaries.
pub fn bottle_disorder(state: &State) -> u32 {
    state.bottles().iter().map(|b| b.min_required_moves()).sum()
}

/// Counts the extra moves implied by bottles sharing a bottom color.
///
/// Only one bottle can end up holding the finished stack of a color. For every
/// color found at the bottom of `k` non-empty bottles, the other `k - 1` must be
/// fully evacuated, which costs at least one move each beyond what
/// `bottle_disorder` counts.
///
/// Equivalent to `non-empty bottles - distinct bottom colors`.
pub fn shared_bottom_penalty(state: &State) -> u32 {
    let mut seen = [false; 256];
    let mut penalty = 0;
    for bottle in state.bottles() {
        let bottom = bottle.bottom_color();
        if bottom.is_empty() {
            continue;
        }
        let slot = &mut seen[bottom.tag() as usize];
        if *slot {
            penalty += 1;
        } else {
            *slot = true;
        }
    }
    penalty
}

/// Calculates the admissible heuristic used by the A* search.
///
/// The result is `bottle_disorder + shared_bottom_penalty`. One pour lowers
/// it by at most one:
/// - a pour that leaves the source non-empty removes at most one boundary and
///   can only add a bottom color (when the destination was empty);
/// - a pour that empties the source removes no boundary (the source held a
///   single run) and removes at most one shared bottom.
///
/// The heuristic is therefore consistent, and hence admissible.
///
/// For a validated state it is zero exactly when every bottle is empty or
/// full of a single color.
///
/// # Examples
/// ```
/// use watersort_solver::codec::state_from_str_array;
/// use watersort_solver::heuristics::admissible_heuristic;
///
/// let state = state_from_str_array(&["RB", "BR", "..", ".."]).unwrap();
/// assert_eq!(admissible_heuristic(&state), 2);
/// ```
pub fn admissible_heuristic(state: &State) -> u32 {
    bottle_disorder(state) + shared_bottom_penalty(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::state_from_str_array;

    #[test]
    fn test_admissible_heuristic_calculation() {
        let solved = state_from_str_array(&["RRR", "GGG", "...", "..."]).unwrap();
        assert_eq!(bottle_disorder(&solved), 0);
        assert_eq!(shared_bottom_penalty(&solved), 0);
        assert_eq!(admissible_heuristic(&solved), 0, "Solved state");

        let split = state_from_str_array(&["RG.", "RG.", "RG.", "..."]).unwrap();
        assert_eq!(bottle_disorder(&split), 3);
        assert_eq!(shared_bottom_penalty(&split), 2);
        assert_eq!(admissible_heuristic(&split), 5, "Three bottles on a red base");

        let cyclic = state_from_str_array(&["RGB", "GBR", "BRG", "...", "..."]).unwrap();
        assert_eq!(admissible_heuristic(&cyclic), 6, "Distinct bottoms, two changes each");
    }

    #[test]
    fn test_zero_iff_solved() {
        for seed in 0..30 {
            let mut state = crate::engine::State::new_random_with_seed(4, 3, seed);
            for _ in 0..8 {
                let solved_by_definition = state
                    .bottles()
                    .iter()
                    .all(|b| b.is_empty() || b.is_complete());
                assert_eq!(state.is_solved(), solved_by_definition);

                let Some(step) = state.legal_moves().first().copied() else {
                    break;
                };
                state.apply(&step).unwrap();
            }
        }
    }

    #[test]
    fn test_heuristic_is_consistent() {
        for seed in 0..30 {
            let state = crate::engine::State::new_random_with_seed(6, 4, seed);
            let h = admissible_heuristic(&state);
            for step in state.legal_moves() {
                let mut next = state.clone();
                next.apply(&step).unwrap();
                assert!(
                    h <= admissible_heuristic(&next) + 1,
                    "seed {}: {} dropped the heuristic by more than one",
                    seed,
                    step
                );
            }
        }
    }
}
