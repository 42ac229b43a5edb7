//! Legal move generation.
//!
//! Instead of testing every ordered pair of bottles, the generator first
//! indexes the possible destinations by color and then looks up the
//! destinations for each source's top color. Building the index is one pass
//! over the bottles, so enumeration is linear in the number of bottles plus
//! the number of moves produced.

use crate::engine::{Color, State, Step};
use rand::seq::SliceRandom;
use rand::Rng;

/// Destinations by color for one state.
///
/// `by_color[tag]` holds the bottles that are not full and whose top color is
/// `tag`; `empty` holds the fully empty bottles, which accept any color.
#[derive(Debug, Default)]
pub struct ReceiverIndex {
    by_color: Vec<Vec<usize>>,
    empty: Vec<usize>,
}

impl ReceiverIndex {
    /// Builds the index for `state`.
    pub fn new(state: &State) -> Self {
        let mut index = ReceiverIndex::default();
        for (i, bottle) in state.bottles().iter().enumerate() {
            if bottle.is_full() {
                continue;
            }
            let top = bottle.top_color();
            if top.is_empty() {
                index.empty.push(i);
                continue;
            }
            let tag = top.tag() as usize;
            if index.by_color.len() <= tag {
                index.by_color.resize_with(tag + 1, Vec::new);
            }
            index.by_color[tag].push(i);
        }
        index
    }

    /// Returns the bottles that can take `color`: matching tops first, then empty bottles.
    pub fn receivers(&self, color: Color) -> impl Iterator<Item = usize> + '_ {
        self.by_color
            .get(color.tag() as usize)
            .into_iter()
            .flatten()
            .chain(self.empty.iter())
            .copied()
    }
}

/// Returns every legal pour in `state`.
///
/// Sources are visited in bottle order. For each source with liquid, its
/// destinations are the receivers of its top color, excluding itself. Empty
/// bottles are never sources. The order of the result carries no meaning.
///
/// # Examples
/// ```
/// use watersort_solver::codec::state_from_str_array;
/// use watersort_solver::moves::legal_moves;
///
/// let state = state_from_str_array(&["RB", "BR", "..", ".."]).unwrap();
/// // Each filled bottle can pour into either empty bottle.
/// assert_eq!(legal_moves(&state).len(), 4);
/// ```
pub fn legal_moves(state: &State) -> Vec<Step> {
    let index = ReceiverIndex::new(state);
    let mut moves = Vec::new();

    for (from, bottle) in state.bottles().iter().enumerate() {
        let color = bottle.top_color();
        if color.is_empty() {
            continue;
        }
        moves.extend(
            index
                .receivers(color)
                .filter(|&to| to != from)
                .map(|to| Step { from, to, color }),
        );
    }

    moves
}

/// Same as `legal_moves`, in an order shuffled by `rng`.
pub fn legal_moves_shuffled(state: &State, rng: &mut impl Rng) -> Vec<Step> {
    let mut moves = legal_moves(state);
    moves.shuffle(rng);
    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::state_from_str_array;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// Pairwise reference implementation.
    fn legal_moves_pairwise(state: &State) -> Vec<Step> {
        let mut moves = Vec::new();
        for from in 0..state.len() {
            for to in 0..state.len() {
                let mut next = state.clone();
                if let Ok(step) = next.apply_move(from, to) {
                    moves.push(step);
                }
            }
        }
        moves
    }

    fn sorted(mut moves: Vec<Step>) -> Vec<Step> {
        moves.sort_by_key(|s| (s.from, s.to));
        moves
    }

    #[test]
    fn test_legal_moves_simple() {
        let state = state_from_str_array(&["RG.", "RBR", "BGG", "B..", "..."]).unwrap();
        let moves = sorted(legal_moves(&state));
        let pairs: Vec<(usize, usize)> = moves.iter().map(|s| (s.from, s.to)).collect();
        assert_eq!(
            pairs,
            vec![(0, 4), (1, 4), (2, 0), (2, 4), (3, 4)],
        );
        assert_eq!(moves[2].color, Color::GREEN);
    }

    #[test]
    fn test_legal_moves_match_pairwise_scan() {
        for seed in 0..40 {
            let mut state = State::new_random_with_seed(7, 4, seed);
            let mut rng = SmallRng::seed_from_u64(seed);
            for _ in 0..10 {
                assert_eq!(
                    sorted(legal_moves(&state)),
                    sorted(legal_moves_pairwise(&state)),
                    "seed {}:\n{}",
                    seed,
                    state
                );
                let moves = legal_moves_shuffled(&state, &mut rng);
                let Some(step) = moves.first() else {
                    break;
                };
                state.apply(step).unwrap();
            }
        }
    }

    #[test]
    fn test_legal_moves_never_illegal() {
        for seed in 0..40 {
            let state = State::new_random_with_seed(5, 3, seed);
            for step in legal_moves(&state) {
                assert_ne!(step.from, step.to);
                assert!(!state.bottles()[step.from].is_empty());
                assert!(!state.bottles()[step.to].is_full());
            }
        }
    }

    #[test]
    fn test_no_moves_when_stuck() {
        let state = State::from_bottles_unchecked(vec![
            crate::codec::bottle_from_str("RB").unwrap(),
            crate::codec::bottle_from_str("BR").unwrap(),
        ]);
        assert!(legal_moves(&state).is_empty());
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let state = State::new_random_with_seed(10, 4, 3);
        let mut rng = SmallRng::seed_from_u64(11);
        assert_eq!(
            sorted(legal_moves_shuffled(&state, &mut rng)),
            sorted(legal_moves(&state))
        );
    }
}
