//! Plausible human name heuristic
//!
//! Catches obvious garbage (keyboard mashing, repeated characters, digits,
//! single letters) in fields that by naming convention hold a person's name.
//! It is a cheap filter, not a name parser: it accepts any script that
//! Unicode classifies as alphabetic.

use std::fmt;

/// Field names that opt into the name-content check
pub const NAME_FIELDS: &[&str] = &[
    "name",
    "customer_name",
    "full_name",
    "first_name",
    "last_name",
    "contact_name",
    "person_name",
];

/// Keyboard walks matched case-insensitively anywhere in the value
const KEYBOARD_WALKS: &[&str] = &[
    "qwerty", "wertyu", "asdfgh", "sdfghj", "dfghjk", "zxcvbn", "xcvbnm", "azerty", "qwertz",
    "yxcvbn", "poiuyt", "lkjhgf", "mnbvcx",
];

const MIN_NAME_CHARS: usize = 2;
const MAX_IDENTICAL_RUN: usize = 3;
const MAX_CONSONANT_RUN: usize = 4;

/// Whether a field name is part of the name vocabulary
pub fn is_name_field(field: &str) -> bool {
    NAME_FIELDS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(field))
}

/// Why a value was rejected as a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRejection {
    TooShort,
    InvalidCharacters,
    KeyboardPattern(&'static str),
    RepeatedCharacters,
    RandomConsonants,
}

impl fmt::Display for NameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRejection::TooShort => {
                write!(f, "Name is too short (at least {} characters)", MIN_NAME_CHARS)
            }
            NameRejection::InvalidCharacters => write!(
                f,
                "Name contains invalid characters (only letters, spaces, hyphens and apostrophes are allowed)"
            ),
            NameRejection::KeyboardPattern(walk) => {
                write!(f, "Name contains a keyboard pattern ('{}')", walk)
            }
            NameRejection::RepeatedCharacters => {
                write!(f, "Name contains too many repeated characters")
            }
            NameRejection::RandomConsonants => {
                write!(f, "Name looks like random characters (too many consecutive consonants)")
            }
        }
    }
}

impl std::error::Error for NameRejection {}

/// Validate that a value looks like a plausible human name.
///
/// Returns the trimmed name on success.
pub fn validate_name_content(value: &str) -> Result<&str, NameRejection> {
    let name = value.trim();

    if name.chars().count() < MIN_NAME_CHARS {
        return Err(NameRejection::TooShort);
    }

    if !name.chars().all(is_name_char) {
        return Err(NameRejection::InvalidCharacters);
    }

    let lower = name.to_lowercase();
    if let Some(walk) = KEYBOARD_WALKS.iter().find(|walk| lower.contains(*walk)) {
        return Err(NameRejection::KeyboardPattern(walk));
    }

    if longest_identical_run(&lower) > MAX_IDENTICAL_RUN {
        return Err(NameRejection::RepeatedCharacters);
    }

    if longest_consonant_run(&lower) > MAX_CONSONANT_RUN {
        return Err(NameRejection::RandomConsonants);
    }

    Ok(name)
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || c == ' ' || c == '-' || c == '\'' || c == '\u{2019}'
}

fn longest_identical_run(value: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;
    for c in value.chars() {
        if Some(c) == previous {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}

/// Only ASCII consonants extend a run; vowels, `y`, separators and
/// non-ASCII letters reset it.
fn longest_consonant_run(value: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in value.chars() {
        if c.is_ascii_alphabetic() && !"aeiouy".contains(c) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
