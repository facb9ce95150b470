// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::sync::OnceLock;

use smallvec::SmallVec;

use crate::{character_range::MAX_CODE_POINT, CharacterRange};

/// Answers the Unicode questions the parser can't answer by itself.
pub trait UnicodeOracle {
    /// Resolves `\p{name}` (`value` is `None`) or `\p{name=value}`. Unknown
    /// names and empty sets give `None`.
    fn property_ranges(&self, name: &str, value: Option<&str>) -> Option<Vec<CharacterRange>>;

    /// The number of code points that match `c` case-insensitively,
    /// including `c` itself.
    fn case_closure_size(&self, c: u32) -> usize;
}

/// An oracle backed by the character tables of the standard library. Only
/// the properties those tables expose are known.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdUnicodeOracle;

type Predicate = fn(char) -> bool;

fn general_category(value: &str) -> Option<Predicate> {
    let predicate: Predicate = match value {
        "N" | "Number" => char::is_numeric,
        "Cc" | "Control" => char::is_control,
        _ => return None,
    };
    Some(predicate)
}

fn binary_property(name: &str) -> Option<Predicate> {
    let predicate: Predicate = match name {
        "Alphabetic" | "Alpha" => char::is_alphabetic,
        "White_Space" | "WSpace" | "space" => char::is_whitespace,
        "Lowercase" | "Lower" => char::is_lowercase,
        "Uppercase" | "Upper" => char::is_uppercase,
        "ASCII" => |c: char| c.is_ascii(),
        "ASCII_Hex_Digit" | "AHex" => |c: char| c.is_ascii_hexdigit(),
        _ => return None,
    };
    Some(predicate)
}

fn collect_ranges(predicate: Predicate) -> Vec<CharacterRange> {
    let mut ranges = Vec::new();
    let mut start = None;

    for c in 0..=MAX_CODE_POINT {
        let matches = char::from_u32(c).is_some_and(predicate);
        match (matches, start) {
            (true, None) => start = Some(c),
            (false, Some(from)) => {
                ranges.push(CharacterRange::new(from, c - 1));
                start = None;
            }
            _ => (),
        }
    }

    if let Some(from) = start {
        ranges.push(CharacterRange::new(from, MAX_CODE_POINT));
    }

    ranges
}

fn single_char(mut iter: impl Iterator<Item = char>) -> Option<char> {
    let c = iter.next()?;
    iter.next().is_none().then_some(c)
}

/// Pairs `(partner, c)` where `c` maps to `partner` but `partner` doesn't
/// map back to `c`, like KELVIN SIGN to `k`. Sorted by partner.
fn reverse_case_partners() -> &'static [(char, char)] {
    static PARTNERS: OnceLock<Vec<(char, char)>> = OnceLock::new();

    PARTNERS.get_or_init(|| {
        let mut partners = Vec::new();

        for c in (0..=MAX_CODE_POINT).filter_map(char::from_u32) {
            if let Some(lower) = single_char(c.to_lowercase()).filter(|lower| *lower != c) {
                if single_char(lower.to_uppercase()) != Some(c) {
                    partners.push((lower, c));
                }
            }

            if let Some(upper) = single_char(c.to_uppercase()).filter(|upper| *upper != c) {
                if single_char(upper.to_lowercase()) != Some(c) {
                    partners.push((upper, c));
                }
            }
        }

        partners.sort_unstable();
        partners.dedup();
        partners
    })
}

impl UnicodeOracle for StdUnicodeOracle {
    fn property_ranges(&self, name: &str, value: Option<&str>) -> Option<Vec<CharacterRange>> {
        let predicate = match value {
            Some(value) => match name {
                "General_Category" | "gc" => general_category(value)?,
                _ => return None,
            },

            None if name == "Any" => return Some(vec![CharacterRange::everything()]),
            None => general_category(name).or_else(|| binary_property(name))?,
        };

        let ranges = collect_ranges(predicate);
        (!ranges.is_empty()).then_some(ranges)
    }

    fn case_closure_size(&self, c: u32) -> usize {
        let Some(c) = char::from_u32(c) else {
            return 1;
        };

        let mut closure: SmallVec<[char; 4]> = SmallVec::new();
        closure.push(c);

        let mut index = 0;
        while index < closure.len() {
            let current = closure[index];
            let lower = single_char(current.to_lowercase());
            let upper = single_char(current.to_uppercase());

            let partners = reverse_case_partners();
            let start = partners.partition_point(|(partner, _)| *partner < current);
            let reverse = partners[start..]
                .iter()
                .take_while(|(partner, _)| *partner == current)
                .map(|(_, c)| *c);

            for candidate in [lower, upper].into_iter().flatten().chain(reverse) {
                if !closure.contains(&candidate) {
                    closure.push(candidate);
                }
            }

            index += 1;
        }

        closure.len()
    }
}
