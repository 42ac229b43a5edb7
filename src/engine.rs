//! Core puzzle engine for water sort.
//!
//! This module defines the game's fundamental components:
//! - `Color`: the tag of one unit of liquid, with `Color::EMPTY` for a free slot.
//! - `Bottle`: a fixed-capacity stack of colors, read bottom-to-top, and the pour mechanics.
//! - `State`: an ordered collection of bottles, its validation, fingerprint and heuristic.
//! - `Step`: one pour from a source bottle onto a destination bottle.
//! - `Game`: an interactive session on top of a `State`, with undo history.
use crate::error::{ParseError, PourError, SolveError, ValidationError};
use crate::heuristics;
use crate::moves;
use crate::solver::{self, SolverConfig};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The color of one unit of liquid.
///
/// Tag 0 is reserved for "no liquid" (`Color::EMPTY`). Tags 1 to 13 have names;
/// any other tag is still a valid, distinct color and is rendered as `color#N`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Color(u8);

/// Name, single-letter code, ANSI 256-color code and CSS color of every named tag.
const NAMED_COLORS: [(&str, char, u8, &str); 14] = [
    ("Empty", '.', 236, "transparent"),
    ("Blue", 'B', 33, "#3b6fd8"),
    ("Brown", 'N', 94, "#7b4a1e"),
    ("DarkBlue", 'D', 19, "#1a237e"),
    ("DarkGreen", 'F', 22, "#1b5e20"),
    ("Gray", 'A', 245, "#9e9e9e"),
    ("Green", 'G', 34, "#43a047"),
    ("LightBlue", 'C', 117, "#81d4fa"),
    ("LightGreen", 'L', 120, "#aed581"),
    ("Orange", 'O', 208, "#fb8c00"),
    ("Pink", 'K', 213, "#f48fb1"),
    ("Purple", 'P', 93, "#8e24aa"),
    ("Red", 'R', 196, "#e53935"),
    ("Yellow", 'Y', 226, "#fdd835"),
];

const UNNAMED_PREFIX: &str = "color#";

impl Color {
    pub const EMPTY: Color = Color(0);
    pub const BLUE: Color = Color(1);
    pub const BROWN: Color = Color(2);
    pub const DARK_BLUE: Color = Color(3);
    pub const DARK_GREEN: Color = Color(4);
    pub const GRAY: Color = Color(5);
    pub const GREEN: Color = Color(6);
    pub const LIGHT_BLUE: Color = Color(7);
    pub const LIGHT_GREEN: Color = Color(8);
    pub const ORANGE: Color = Color(9);
    pub const PINK: Color = Color(10);
    pub const PURPLE: Color = Color(11);
    pub const RED: Color = Color(12);
    pub const YELLOW: Color = Color(13);

    /// Creates a color from its integer tag.
    pub const fn new(tag: u8) -> Self {
        Color(tag)
    }

    /// Returns the integer tag of this color.
    pub const fn tag(self) -> u8 {
        self.0
    }

    /// Returns `true` for `Color::EMPTY`.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the name of a named color, or `None` for tags above 13.
    ///
    /// # Examples
    ///
    /// ```
    /// use watersort_solver::engine::Color;
    /// assert_eq!(Color::DARK_GREEN.name(), Some("DarkGreen"));
    /// assert_eq!(Color::new(42).name(), None);
    /// ```
    pub fn name(self) -> Option<&'static str> {
        NAMED_COLORS.get(self.0 as usize).map(|entry| entry.0)
    }

    /// Converts the color to its single-letter code.
    ///
    /// Used by the compact row notation of `codec::state_from_str_array` and by
    /// the interactive player. Unnamed colors map to `'?'`.
    ///
    /// # Examples
    ///
    /// ```
    /// use watersort_solver::engine::Color;
    /// assert_eq!(Color::RED.to_char(), 'R');
    /// assert_eq!(Color::EMPTY.to_char(), '.');
    /// ```
    pub fn to_char(self) -> char {
        NAMED_COLORS
            .get(self.0 as usize)
            .map_or('?', |entry| entry.1)
    }

    /// Inverse of `to_char`.
    pub fn from_char(c: char) -> Option<Color> {
        NAMED_COLORS
            .iter()
            .position(|entry| entry.1 == c)
            .map(|tag| Color(tag as u8))
    }

    /// Returns the ANSI 256-color code used for terminal output.
    fn to_ansi_color_code(self) -> u8 {
        NAMED_COLORS.get(self.0 as usize).map_or(255, |entry| entry.2)
    }

    /// Returns the CSS color used by the web front end.
    pub fn css(self) -> &'static str {
        NAMED_COLORS
            .get(self.0 as usize)
            .map_or("#ffffff", |entry| entry.3)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}{}", UNNAMED_PREFIX, self.0),
        }
    }
}

impl FromStr for Color {
    type Err = ParseError;

    /// Parses a color name, `color#N`, or a bare tag `N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(tag) = NAMED_COLORS.iter().position(|entry| entry.0 == s) {
            return Ok(Color(tag as u8));
        }
        s.strip_prefix(UNNAMED_PREFIX)
            .unwrap_or(s)
            .parse::<u8>()
            .map(Color)
            .map_err(|_| ParseError::InvalidColor(s.to_string()))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct ColorVisitor;

impl Visitor<'_> for ColorVisitor {
    type Value = Color;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a color name or an integer color tag")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Color, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Color, E> {
        u8::try_from(v)
            .map(Color)
            .map_err(|_| E::custom(format!("color tag {} is out of range", v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Color, E> {
        u8::try_from(v)
            .map(Color)
            .map_err(|_| E::custom(format!("color tag {} is out of range", v)))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ColorVisitor)
    }
}

/// A bottle: a fixed-length sequence of colors, index 0 being the bottom.
///
/// No liquid ever floats above an empty slot. `pour_onto` is the only
/// mutation and preserves that invariant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bottle {
    colors: Vec<Color>,
}

impl Bottle {
    /// Creates a bottle from its colors, bottom first.
    pub fn new(colors: Vec<Color>) -> Self {
        Bottle { colors }
    }

    /// Creates a bottle with `capacity` empty slots.
    pub fn empty(capacity: usize) -> Self {
        Bottle {
            colors: vec![Color::EMPTY; capacity],
        }
    }

    /// Returns the slots of this bottle, bottom first.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn capacity(&self) -> usize {
        self.colors.len()
    }

    /// Returns the topmost non-empty color, or `Color::EMPTY` if the bottle holds no liquid.
    pub fn top_color(&self) -> Color {
        self.colors
            .iter()
            .rev()
            .find(|c| !c.is_empty())
            .copied()
            .unwrap_or(Color::EMPTY)
    }

    /// Returns how many contiguous units of the top color sit at the top of the bottle.
    ///
    /// This is the amount a single pour moves when the destination has room for all of it.
    pub fn top_run_length(&self) -> usize {
        let top = self.top_color();
        if top.is_empty() {
            return 0;
        }
        self.colors
            .iter()
            .rev()
            .skip_while(|c| c.is_empty())
            .take_while(|&&c| c == top)
            .count()
    }

    /// Returns the number of trailing empty slots.
    pub fn free_slots(&self) -> usize {
        match self.colors.iter().rposition(|c| !c.is_empty()) {
            Some(i) => self.colors.len() - (i + 1),
            None => self.colors.len(),
        }
    }

    /// Returns the number of slots holding liquid.
    pub fn liquid_len(&self) -> usize {
        self.colors.len() - self.free_slots()
    }

    /// Returns the color at the bottom slot (`Color::EMPTY` for an empty or zero-sized bottle).
    pub fn bottom_color(&self) -> Color {
        self.colors.first().copied().unwrap_or(Color::EMPTY)
    }

    pub fn is_empty(&self) -> bool {
        self.top_color().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.free_slots() == 0
    }

    /// Returns `true` if the bottle is full and holds a single color.
    pub fn is_complete(&self) -> bool {
        let bottom = self.bottom_color();
        !bottom.is_empty() && self.colors.iter().all(|&c| c == bottom)
    }

    /// Returns how many slots hold `color`.
    pub fn count(&self, color: Color) -> usize {
        self.colors.iter().filter(|&&c| c == color).count()
    }

    /// Returns the number of color changes between adjacent liquid slots.
    ///
    /// Every change needs at least one pour to resolve, so this lower-bounds the
    /// moves needed to make the bottle monochrome.
    ///
    /// # Examples
    ///
    /// ```
    /// use watersort_solver::engine::{Bottle, Color};
    /// let bottle = Bottle::new(vec![Color::RED, Color::GREEN, Color::GREEN, Color::BLUE]);
    /// assert_eq!(bottle.min_required_moves(), 2);
    /// ```
    pub fn min_required_moves(&self) -> u32 {
        self.colors
            .windows(2)
            .filter(|pair| !pair[1].is_empty() && pair[1] != pair[0])
            .count() as u32
    }

    /// Pours the top run of this bottle onto `other`.
    ///
    /// Moves `min(top_run_length(), other.free_slots())` units, so partial pours
    /// are legal. Neither bottle is modified on failure.
    ///
    /// # Returns
    /// The number of units moved.
    ///
    /// # Errors
    /// * `PourError::SourceEmpty` if this bottle holds no liquid.
    /// * `PourError::DestinationFull` if `other` has no free slot.
    /// * `PourError::ColorMismatch` if `other`'s top color differs from this bottle's.
    pub fn pour_onto(&mut self, other: &mut Bottle) -> Result<usize, PourError> {
        let color = self.top_color();
        if color.is_empty() {
            return Err(PourError::SourceEmpty);
        }

        let free = other.free_slots();
        if free == 0 {
            return Err(PourError::DestinationFull);
        }

        let target_top = other.top_color();
        if !target_top.is_empty() && target_top != color {
            return Err(PourError::ColorMismatch {
                poured: color,
                top: target_top,
            });
        }

        let amount = self.top_run_length().min(free);

        let filled = other.liquid_len();
        other.colors[filled..filled + amount].fill(color);

        let top = self.liquid_len();
        self.colors[top - amount..top].fill(Color::EMPTY);

        Ok(amount)
    }
}

/// One pour: the top run of bottle `from` onto bottle `to`.
///
/// Indices are 0-based positions in the state the step was generated for.
/// `color` is the color being poured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    pub from: usize,
    pub to: usize,
    pub color: Color,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pour {:2} onto {:2} ({})",
            self.from + 1,
            self.to + 1,
            self.color
        )
    }
}

/// A puzzle state: an ordered collection of equally sized bottles.
///
/// States built with `State::new` (or deserialized) are validated:
/// - every bottle has the same number of slots `m`,
/// - no liquid sits above an empty slot,
/// - there are exactly `2m` empty slots,
/// - every color fills exactly `m` slots.
///
/// The solver treats a state as a value and clones it for every expansion.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bottle>", into = "Vec<Bottle>")]
pub struct State {
    bottles: Vec<Bottle>,
}

impl TryFrom<Vec<Bottle>> for State {
    type Error = ValidationError;

    fn try_from(bottles: Vec<Bottle>) -> Result<Self, Self::Error> {
        State::new(bottles)
    }
}

impl From<State> for Vec<Bottle> {
    fn from(state: State) -> Self {
        state.bottles
    }
}

impl State {
    /// Creates a validated state.
    ///
    /// # Errors
    /// Returns the first `ValidationError` found; see `State::validate`.
    pub fn new(bottles: Vec<Bottle>) -> Result<Self, ValidationError> {
        let state = State { bottles };
        state.validate()?;
        Ok(state)
    }

    /// Creates a state without validating it.
    ///
    /// Useful for studying variants the standard rules reject, such as a
    /// puzzle with only one spare bottle. All bottles are still expected to
    /// have the same size.
    pub fn from_bottles_unchecked(bottles: Vec<Bottle>) -> Self {
        State { bottles }
    }

    /// Generates a random level with `colors` filled bottles of `size` slots
    /// plus two empty bottles.
    ///
    /// The colors `1..=colors`, each `size` times, are shuffled with `rng` and
    /// dealt into the bottles in order.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn new_random(colors: u8, size: usize, rng: &mut impl Rng) -> Self {
        assert!(size > 0, "bottle size must be at least 1");

        let mut pool: Vec<Color> = (1..=colors)
            .flat_map(|tag| std::iter::repeat(Color(tag)).take(size))
            .collect();
        pool.shuffle(rng);

        let mut bottles: Vec<Bottle> = pool
            .chunks(size)
            .map(|chunk| Bottle::new(chunk.to_vec()))
            .collect();
        bottles.push(Bottle::empty(size));
        bottles.push(Bottle::empty(size));

        State { bottles }
    }

    /// Same as `new_random`, seeded for reproducible levels.
    ///
    /// # Examples
    /// ```
    /// use watersort_solver::engine::State;
    /// let a = State::new_random_with_seed(10, 4, 7);
    /// let b = State::new_random_with_seed(10, 4, 7);
    /// assert_eq!(a, b);
    /// assert_eq!(a.len(), 12);
    /// assert!(a.validate().is_ok());
    /// ```
    pub fn new_random_with_seed(colors: u8, size: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::new_random(colors, size, &mut rng)
    }

    pub fn bottles(&self) -> &[Bottle] {
        &self.bottles
    }

    /// Returns the number of bottles.
    pub fn len(&self) -> usize {
        self.bottles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bottles.is_empty()
    }

    /// Returns the number of slots per bottle (0 for a state without bottles).
    pub fn bottle_size(&self) -> usize {
        self.bottles.first().map_or(0, Bottle::capacity)
    }

    /// Checks the structural invariants listed on `State`.
    ///
    /// Bottles are checked in order, so the reported error names the first
    /// offending bottle. Color counts are checked in tag order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(first) = self.bottles.first() else {
            return Err(ValidationError::NoBottles);
        };
        let size = first.capacity();
        if size == 0 {
            return Err(ValidationError::ZeroCapacity);
        }

        let mut color_counts: BTreeMap<Color, usize> = BTreeMap::new();
        for (i, bottle) in self.bottles.iter().enumerate() {
            if bottle.capacity() != size {
                return Err(ValidationError::SizeMismatch {
                    bottle: i,
                    actual: bottle.capacity(),
                    expected: size,
                });
            }
            for (slot, pair) in bottle.colors.windows(2).enumerate() {
                if pair[0].is_empty() && !pair[1].is_empty() {
                    return Err(ValidationError::FloatingLiquid {
                        bottle: i,
                        slot: slot + 1,
                        color: pair[1],
                    });
                }
            }
            for &c in &bottle.colors {
                *color_counts.entry(c).or_insert(0) += 1;
            }
        }

        let empty_slots = color_counts.remove(&Color::EMPTY).unwrap_or(0);
        if empty_slots != 2 * size {
            return Err(ValidationError::EmptySlotCount {
                actual: empty_slots,
                expected: 2 * size,
            });
        }

        for (color, count) in color_counts {
            if count != size {
                return Err(ValidationError::ColorCount {
                    color,
                    actual: count,
                    expected: size,
                });
            }
        }

        Ok(())
    }

    /// Pours bottle `from` onto bottle `to`.
    ///
    /// This is the only way a state changes. On failure the state is untouched.
    ///
    /// # Returns
    /// The `Step` that was applied, including the poured color.
    pub fn apply_move(&mut self, from: usize, to: usize) -> Result<Step, PourError> {
        let len = self.bottles.len();
        for index in [from, to] {
            if index >= len {
                return Err(PourError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Err(PourError::SameBottle(from));
        }

        let color = self.bottles[from].top_color();
        let (source, destination) = pair_mut(&mut self.bottles, from, to);
        source.pour_onto(destination)?;

        Ok(Step { from, to, color })
    }

    /// Applies a previously generated step.
    pub fn apply(&mut self, step: &Step) -> Result<(), PourError> {
        self.apply_move(step.from, step.to).map(|_| ())
    }

    /// Enumerates every legal pour; see `moves::legal_moves`.
    pub fn legal_moves(&self) -> Vec<Step> {
        moves::legal_moves(self)
    }

    /// Returns a lower bound on the number of pours left; see `heuristics::admissible_heuristic`.
    pub fn heuristic(&self) -> u32 {
        heuristics::admissible_heuristic(self)
    }

    /// Returns `true` if every bottle is empty or monochrome and no color is split.
    pub fn is_solved(&self) -> bool {
        self.heuristic() == 0
    }

    /// CRC32 (IEEE) over the flattened color tags, bottle by bottle.
    ///
    /// Used only to deduplicate visited states during search.
    pub fn fingerprint(&self) -> u32 {
        let data: Vec<u8> = self
            .bottles
            .iter()
            .flat_map(|b| b.colors.iter().map(|c| c.tag()))
            .collect();
        crc32fast::hash(&data)
    }

    /// Renders the state for a terminal, one column per bottle, top slot first.
    ///
    /// The header row holds 1-based bottle numbers. If `selected` is
    /// `Some(i)`, a marker line is added under bottle `i`.
    pub fn to_string_with_highlight(&self, selected: Option<usize>) -> String {
        let mut output = String::new();

        for i in 0..self.bottles.len() {
            output.push_str(&format!("{:>3} ", i + 1));
        }

        for slot in (0..self.bottle_size()).rev() {
            output.push('\n');
            for bottle in &self.bottles {
                let color = bottle.colors.get(slot).copied().unwrap_or(Color::EMPTY);
                output.push_str(&format!(
                    " \x1b[48;5;{}m  \x1b[m ",
                    color.to_ansi_color_code()
                ));
            }
        }

        if let Some(selected) = selected {
            output.push('\n');
            for i in 0..self.bottles.len() {
                output.push_str(if i == selected { " ^^ " } else { "    " });
            }
        }

        output
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_highlight(None))
    }
}

/// Returns mutable references to two distinct elements of `items`.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Manages an interactive session on one puzzle.
///
/// Keeps the steps played so far and the states before each of them, so
/// moves can be undone back to the initial state.
///
/// # Examples
/// ```
/// use watersort_solver::codec::state_from_str_array;
/// use watersort_solver::engine::Game;
///
/// let state = state_from_str_array(&["RB", "BR", "..", ".."]).unwrap();
/// let mut game = Game::new(state);
/// game.process_move(0, 2).unwrap();
/// assert_eq!(game.steps().len(), 1);
/// assert!(game.undo_last_move());
/// assert!(!game.undo_last_move());
/// ```
#[derive(Clone, Debug)]
pub struct Game {
    state: State,
    steps: Vec<Step>,
    history: Vec<State>,
}

impl Game {
    pub fn new(state: State) -> Self {
        Game {
            state,
            steps: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns the steps played so far, oldest first.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Pours bottle `from` onto bottle `to` and records the move for undo.
    pub fn process_move(&mut self, from: usize, to: usize) -> Result<Step, PourError> {
        let previous = self.state.clone();
        let step = self.state.apply_move(from, to)?;
        self.history.push(previous);
        self.steps.push(step);
        Ok(step)
    }

    /// Reverts the last move.
    ///
    /// # Returns
    /// `false` if no move has been made yet.
    pub fn undo_last_move(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.state = previous;
                self.steps.pop();
                true
            }
            None => false,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.state.is_solved()
    }

    /// Asks the solver for the next step of a shortest solution from the current state.
    ///
    /// Returns `Ok(None)` when the puzzle is already solved.
    pub fn hint(&self, config: &SolverConfig) -> Result<Option<Step>, SolveError> {
        let solution = solver::find_solution_with_config(&self.state, config)?;
        Ok(solution.steps.first().copied())
    }
}
