//! Command parser: one line of terminal input -> `ParsedInput`
//!
//! Grammar:
//! - `help` | `stats` | `clear` | `logout` (case-insensitive, whole line)
//! - with an active offer, a line starting with digits is a selection:
//!   `<index>[, <n> min][, <n>% | all new]`, extra parts in any order
//! - anything else is a new state description
//!
//! Pure: no I/O, no side effects.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::{BareCommand, ParsedInput, PathwayOffer, PathwaySelection};
use crate::{DEFAULT_DISCOVERY_PCT, DEFAULT_DURATION_MIN};

lazy_static! {
    static ref RE_LEADING_INT: Regex = Regex::new(r"^\s*(\d+)").unwrap();
    static ref RE_ANY_INT: Regex = Regex::new(r"(\d+)").unwrap();
    static ref RE_ALL_NEW: Regex = Regex::new(r"(?i)\ball\s+new\b").unwrap();
}

/// Command parser
#[derive(Debug, Default)]
pub struct CommandParser;

impl CommandParser {
    /// Create new parser
    pub fn new() -> Self {
        Self
    }

    /// Interpret `input` against the currently active offer, if any
    ///
    /// Only an out-of-range pathway index is an error; unmatched input
    /// falls through to `ParsedInput::Describe`.
    pub fn parse(&self, input: &str, offer: Option<&PathwayOffer>) -> Result<ParsedInput> {
        let trimmed = input.trim();

        if let Some(cmd) = bare_command(trimmed) {
            return Ok(ParsedInput::Command(cmd));
        }

        if let Some(offer) = offer {
            if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
                return self.parse_selection(trimmed, offer.len()).map(ParsedInput::Select);
            }
        }

        Ok(ParsedInput::Describe(trimmed.to_string()))
    }

    /// Parse a selection expression against an offer of `available` pathways
    pub fn parse_selection(&self, expr: &str, available: usize) -> Result<PathwaySelection> {
        let mut parts = expr.split(',').map(str::trim);
        let first = parts.next().unwrap_or_default();

        // Digits beyond usize are out of range by definition
        let index = leading_int(first).unwrap_or(usize::MAX);
        if index == 0 || index > available {
            return Err(Error::PathwayIndexOutOfRange { index, available });
        }

        let mut duration = DEFAULT_DURATION_MIN;
        let mut discovery = DEFAULT_DISCOVERY_PCT;

        for part in parts {
            let lower = part.to_lowercase();
            if lower.contains("min") {
                if let Some(minutes) = leading_int(&lower).and_then(|n| u32::try_from(n).ok()) {
                    duration = minutes;
                }
            }
            if lower.contains('%') || lower.contains("new") {
                if RE_ALL_NEW.is_match(&lower) {
                    discovery = 100;
                } else if let Some(pct) = first_int(&lower) {
                    discovery = pct.min(100) as u8;
                }
            }
        }

        Ok(PathwaySelection {
            pathway_index: index - 1,
            duration,
            discovery_percentage: discovery,
        })
    }
}

fn bare_command(input: &str) -> Option<BareCommand> {
    BareCommand::ALL
        .into_iter()
        .find(|cmd| cmd.keyword().eq_ignore_ascii_case(input))
}

fn leading_int(s: &str) -> Option<usize> {
    RE_LEADING_INT
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn first_int(s: &str) -> Option<usize> {
    RE_ANY_INT
        .captures(s)
        .and_then(|caps| caps.get(1))
        // Saturate absurdly long digit runs; the caller clamps to 100 anyway
        .map(|m| m.as_str().parse().unwrap_or(usize::MAX))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PathwayOption;

    fn offer(n: usize) -> PathwayOffer {
        PathwayOffer {
            detected_state: "fraymark".into(),
            reasoning: None,
            pathway_options: (0..n)
                .map(|i| PathwayOption {
                    target_state: format!("target{}", i),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_bare_commands_case_insensitive() {
        let parser = CommandParser::new();
        assert_eq!(
            parser.parse("HELP", None).unwrap(),
            ParsedInput::Command(BareCommand::Help)
        );
        assert_eq!(
            parser.parse("  Logout ", Some(&offer(2))).unwrap(),
            ParsedInput::Command(BareCommand::Logout)
        );
    }

    #[test]
    fn test_command_word_inside_sentence_is_description() {
        let parser = CommandParser::new();
        assert_eq!(
            parser.parse("help me calm down", None).unwrap(),
            ParsedInput::Describe("help me calm down".into())
        );
    }

    #[test]
    fn test_digits_without_offer_are_description() {
        let parser = CommandParser::new();
        assert_eq!(
            parser.parse("3 coffees and no sleep", None).unwrap(),
            ParsedInput::Describe("3 coffees and no sleep".into())
        );
    }

    #[test]
    fn test_selection_defaults() {
        let sel = CommandParser::new().parse_selection("2", 3).unwrap();
        assert_eq!(sel.pathway_index, 1);
        assert_eq!(sel.duration, DEFAULT_DURATION_MIN);
        assert_eq!(sel.discovery_percentage, DEFAULT_DISCOVERY_PCT);
    }

    #[test]
    fn test_selection_parts_order_insensitive() {
        let sel = CommandParser::new().parse_selection("3, 80% new, 25 min", 3).unwrap();
        assert_eq!(sel.pathway_index, 2);
        assert_eq!(sel.duration, 25);
        assert_eq!(sel.discovery_percentage, 80);
    }

    #[test]
    fn test_selection_zero_is_out_of_range() {
        let err = CommandParser::new().parse_selection("0", 3).unwrap_err();
        assert!(matches!(err, Error::PathwayIndexOutOfRange { index: 0, available: 3 }));
    }

    #[test]
    fn test_selection_huge_index_is_out_of_range() {
        let err = CommandParser::new()
            .parse_selection("99999999999999999999999", 3)
            .unwrap_err();
        assert!(matches!(err, Error::PathwayIndexOutOfRange { .. }));
    }

    #[test]
    fn test_discovery_clamped_to_100() {
        let sel = CommandParser::new().parse_selection("1, 250%", 1).unwrap();
        assert_eq!(sel.discovery_percentage, 100);
    }

    #[test]
    fn test_min_part_without_number_keeps_default() {
        let sel = CommandParser::new().parse_selection("1, min", 1).unwrap();
        assert_eq!(sel.duration, DEFAULT_DURATION_MIN);
    }

    #[test]
    fn test_all_new_case_insensitive() {
        let sel = CommandParser::new().parse_selection("1, ALL NEW", 1).unwrap();
        assert_eq!(sel.discovery_percentage, 100);
    }
}
