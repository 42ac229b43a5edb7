//! Conversions between `State` and its external forms.
//!
//! - Compact text: color tags joined by `-` within a bottle, bottles joined by
//!   `_`, e.g. `1-2-0_2-1-0`. This is the form carried in web URLs.
//! - JSON: an array of bottles, each an array of colors (names or integer tags).
//! - Letter rows: one string of single-letter color codes per bottle, used by
//!   tests and the interactive player.

use crate::engine::{Bottle, Color, State};
use crate::error::ParseError;
use std::io::Read;

const SLOT_SEPARATOR: char = '-';
const BOTTLE_SEPARATOR: char = '_';

/// Parses one bottle from its letter codes, bottom slot first.
///
/// # Errors
/// `ParseError::InvalidColor` for a character that is not a color code.
pub fn bottle_from_str(s: &str) -> Result<Bottle, ParseError> {
    s.chars()
        .map(|c| Color::from_char(c).ok_or_else(|| ParseError::InvalidColor(c.to_string())))
        .collect::<Result<Vec<_>, _>>()
        .map(Bottle::new)
}

/// Parses an array of string slices into a validated `State`.
///
/// Each string slice describes one bottle, bottom slot first, with one
/// character per slot. Valid characters are the color codes returned by
/// `Color::to_char`, for example:
/// - 'R': `Color::RED`
/// - 'G': `Color::GREEN`
/// - 'B': `Color::BLUE`
/// - 'Y': `Color::YELLOW`
/// - '.': `Color::EMPTY`
///
/// # Arguments
/// * `rows`: One string slice per bottle.
///
/// # Returns
/// * `Ok(State)` if every character is a color code and the bottles form a valid puzzle.
/// * `Err(ParseError::InvalidColor)` for an unrecognized character.
/// * `Err(ParseError::Validation)` if the bottles break a structural rule.
///
/// # Examples
/// ```
/// use watersort_solver::codec::state_from_str_array;
/// use watersort_solver::engine::Color;
///
/// let state = state_from_str_array(&["RG", "GR", "..", ".."]).unwrap();
/// assert_eq!(state.len(), 4);
/// assert_eq!(state.bottles()[0].top_color(), Color::GREEN);
///
/// assert!(state_from_str_array(&["RX", "XR", "..", ".."]).is_err());
/// assert!(state_from_str_array(&["RG", "GR", ".."]).is_err());
/// ```
pub fn state_from_str_array(rows: &[&str]) -> Result<State, ParseError> {
    let bottles = rows
        .iter()
        .map(|row| bottle_from_str(row))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(State::new(bottles)?)
}

/// Encodes a state in the compact text form.
///
/// # Examples
/// ```
/// use watersort_solver::codec::{state_from_str_array, state_to_text};
///
/// let state = state_from_str_array(&["RB", "BR", "..", ".."]).unwrap();
/// assert_eq!(state_to_text(&state), "12-1_1-12_0-0_0-0");
/// ```
pub fn state_to_text(state: &State) -> String {
    state
        .bottles()
        .iter()
        .map(|bottle| {
            bottle
                .colors()
                .iter()
                .map(|c| c.tag().to_string())
                .collect::<Vec<_>>()
                .join(&SLOT_SEPARATOR.to_string())
        })
        .collect::<Vec<_>>()
        .join(&BOTTLE_SEPARATOR.to_string())
}

/// Decodes and validates the compact text form produced by `state_to_text`.
///
/// # Errors
/// * `ParseError::EmptyBottleText` if a bottle has no slots in the text.
/// * `ParseError::InvalidColor` if a slot is not a tag between 0 and 255.
/// * `ParseError::Validation` if the decoded bottles break a structural rule.
pub fn state_from_text(text: &str) -> Result<State, ParseError> {
    let mut bottles = Vec::new();
    for (i, bottle_text) in text.trim().split(BOTTLE_SEPARATOR).enumerate() {
        if bottle_text.is_empty() {
            return Err(ParseError::EmptyBottleText(i));
        }
        let colors = bottle_text
            .split(SLOT_SEPARATOR)
            .map(|slot| {
                slot.parse::<u8>()
                    .map(Color::new)
                    .map_err(|_| ParseError::InvalidColor(slot.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        bottles.push(Bottle::new(colors));
    }
    Ok(State::new(bottles)?)
}

/// Reads a JSON level and validates it.
///
/// A level is an array of bottles, bottom slot first, where every slot is a
/// color name (`"Red"`, `"Empty"`, `"color#20"`) or an integer tag.
///
/// # Examples
/// ```
/// use watersort_solver::codec::load_level;
///
/// let json = r#"[["Red", "Blue"], ["Blue", "Red"], [0, 0], ["Empty", "Empty"]]"#;
/// let state = load_level(json.as_bytes()).unwrap();
/// assert_eq!(state.len(), 4);
/// ```
pub fn load_level<R: Read>(reader: R) -> Result<State, ParseError> {
    let bottles: Vec<Bottle> = serde_json::from_reader(reader)?;
    Ok(State::new(bottles)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    const THREE_SLOTS_NUMERIC: &str = include_str!("../testdata/three_slots_numeric.json");

    #[test]
    fn test_bottle_from_str() {
        let bottle = bottle_from_str("RGB.").unwrap();
        assert_eq!(
            bottle.colors(),
            &[Color::RED, Color::GREEN, Color::BLUE, Color::EMPTY]
        );

        match bottle_from_str("RZ") {
            Err(ParseError::InvalidColor(s)) => assert_eq!(s, "Z"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_state_from_str_array_validates() {
        match state_from_str_array(&["RG", "GR", ".."]) {
            Err(ParseError::Validation(ValidationError::EmptySlotCount { actual, expected })) => {
                assert_eq!((actual, expected), (2, 4));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_text_round_trip() {
        let state = State::new_random_with_seed(10, 4, 5);
        let text = state_to_text(&state);
        assert_eq!(text.split('_').count(), 12);
        assert_eq!(state_from_text(&text).unwrap(), state);
    }

    #[test]
    fn test_state_from_text() {
        let state = state_from_text("1-2-0_2-1-0_0-0-0_0-0-0").unwrap_err();
        assert!(
            matches!(
                state,
                ParseError::Validation(ValidationError::EmptySlotCount { .. })
            ),
            "{:?}",
            state
        );

        let state = state_from_text("12-1_1-12_0-0_0-0").unwrap();
        assert_eq!(state.bottles()[0].colors(), &[Color::RED, Color::BLUE]);
    }

    #[test]
    fn test_state_from_text_errors() {
        assert!(matches!(
            state_from_text("1-1_0-0__0-0"),
            Err(ParseError::EmptyBottleText(2))
        ));
        assert!(matches!(
            state_from_text("1-x_0-0_0-0"),
            Err(ParseError::InvalidColor(s)) if s == "x"
        ));
        assert!(matches!(
            state_from_text("1-256_0-0_0-0"),
            Err(ParseError::InvalidColor(s)) if s == "256"
        ));
        assert!(matches!(state_from_text(""), Err(ParseError::EmptyBottleText(0))));
    }

    #[test]
    fn test_load_level_numeric() {
        let state = load_level(THREE_SLOTS_NUMERIC.as_bytes()).unwrap();
        assert_eq!(state.len(), 5);
        assert_eq!(state.bottle_size(), 3);
        assert_eq!(
            state.bottles()[0].colors(),
            &[Color::RED, Color::GREEN, Color::BLUE]
        );
        assert_eq!(
            state,
            state_from_str_array(&["RGB", "GBR", "BRG", "...", "..."]).unwrap()
        );
    }

    #[test]
    fn test_load_level_errors() {
        assert!(matches!(
            load_level("[[\"Red\", ".as_bytes()),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            load_level("[[\"Mauve\"]]".as_bytes()),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            load_level("[[\"Red\", \"Red\"], [0, 0]]".as_bytes()),
            Err(ParseError::Validation(ValidationError::EmptySlotCount { .. }))
        ));
    }

    #[test]
    fn test_json_uses_color_names() {
        let state = state_from_str_array(&["RB", "BR", "..", ".."]).unwrap();
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"[["Red","Blue"],["Blue","Red"],["Empty","Empty"],["Empty","Empty"]]"#
        );
        assert_eq!(load_level(json.as_bytes()).unwrap(), state);

        let unnamed = State::new(vec![
            Bottle::new(vec![Color::new(20), Color::new(20)]),
            Bottle::empty(2),
            Bottle::empty(2),
        ])
        .unwrap();
        let json = serde_json::to_string(&unnamed).unwrap();
        assert!(json.starts_with(r#"[["color#20","color#20"]"#));
        assert_eq!(load_level(json.as_bytes()).unwrap(), unnamed);
    }
}
