// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::fmt::{self, Display, Write};

use strum::AsRefStr;

use crate::{character_range::write_code_point, CharacterRange};

/// A node of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegExpTree {
    Empty,

    /// A run of literal code units.
    Atom(Vec<u16>),

    /// Consecutive atoms and character classes.
    Text(Vec<RegExpTree>),

    CharacterClass(RegExpCharacterClass),

    /// Concatenation.
    Alternative(Vec<RegExpTree>),

    Disjunction(Vec<RegExpTree>),
    Quantifier(RegExpQuantifier),
    Capture(RegExpCapture),
    BackReference(u32),
    Assertion(AssertionKind),
    Lookaround(RegExpLookaround),
}

impl RegExpTree {
    /// Upper bound used for unbounded repetition and lengths.
    pub const INFINITY: u32 = i32::MAX as u32;

    #[must_use]
    pub fn min_match(&self) -> u32 {
        match self {
            Self::Empty | Self::Assertion(..) | Self::Lookaround(..) | Self::BackReference(..) => 0,
            Self::Atom(data) => data.len() as u32,
            Self::Text(elements) => sum_saturating(elements.iter().map(Self::min_match)),
            Self::CharacterClass(..) => 1,
            Self::Alternative(nodes) => sum_saturating(nodes.iter().map(Self::min_match)),
            Self::Disjunction(alternatives) => alternatives.iter().map(Self::min_match).min().unwrap_or(0),
            Self::Quantifier(quantifier) => multiply_saturating(quantifier.min, quantifier.body.min_match()),
            Self::Capture(capture) => capture.body.min_match(),
        }
    }

    #[must_use]
    pub fn max_match(&self) -> u32 {
        match self {
            Self::Empty | Self::Assertion(..) | Self::Lookaround(..) => 0,
            Self::BackReference(..) => Self::INFINITY,
            Self::Atom(data) => data.len() as u32,
            Self::Text(elements) => sum_saturating(elements.iter().map(Self::max_match)),

            // A surrogate pair in unicode mode.
            Self::CharacterClass(..) => 2,

            Self::Alternative(nodes) => sum_saturating(nodes.iter().map(Self::max_match)),
            Self::Disjunction(alternatives) => alternatives.iter().map(Self::max_match).max().unwrap_or(0),
            Self::Quantifier(quantifier) => multiply_saturating(quantifier.max, quantifier.body.max_match()),
            Self::Capture(capture) => capture.body.max_match(),
        }
    }

    /// Whether the node can be part of a [`RegExpTree::Text`].
    #[must_use]
    pub fn is_text_element(&self) -> bool {
        matches!(self, Self::Atom(..) | Self::Text(..) | Self::CharacterClass(..))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(self, Self::Atom(..))
    }

    #[must_use]
    pub fn is_lookaround(&self) -> bool {
        matches!(self, Self::Lookaround(..))
    }

    /// Appends this text element to `elements`, flattening nested text.
    pub(crate) fn append_to_text(self, elements: &mut Vec<RegExpTree>) {
        match self {
            Self::Text(nested) => elements.extend(nested),
            other => elements.push(other),
        }
    }

    pub(crate) fn collect_captures<'a>(&'a self, captures: &mut Vec<&'a RegExpCapture>) {
        match self {
            Self::Capture(capture) => {
                captures.push(capture);
                capture.body.collect_captures(captures);
            }

            Self::Text(nodes) | Self::Alternative(nodes) | Self::Disjunction(nodes) => {
                for node in nodes {
                    node.collect_captures(captures);
                }
            }

            Self::Quantifier(quantifier) => quantifier.body.collect_captures(captures),
            Self::Lookaround(lookaround) => lookaround.body.collect_captures(captures),

            Self::Empty
                | Self::Atom(..)
                | Self::CharacterClass(..)
                | Self::BackReference(..)
                | Self::Assertion(..) => (),
        }
    }
}

fn sum_saturating(values: impl Iterator<Item = u32>) -> u32 {
    values.fold(0, |acc, value| acc.saturating_add(value).min(RegExpTree::INFINITY))
}

fn multiply_saturating(count: u32, length: u32) -> u32 {
    count.saturating_mul(length).min(RegExpTree::INFINITY)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpCharacterClass {
    ranges: Vec<CharacterRange>,
    negated: bool,
}

impl RegExpCharacterClass {
    #[must_use]
    pub fn new(ranges: Vec<CharacterRange>, negated: bool) -> Self {
        Self { ranges, negated }
    }

    #[must_use]
    pub fn ranges(&self) -> &[CharacterRange] {
        &self.ranges
    }

    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn canonicalize(&mut self) {
        CharacterRange::canonicalize(&mut self.ranges);
    }

    /// The class escape letter this class is exactly equal to, if any.
    #[must_use]
    pub fn standard_type(&self) -> Option<char> {
        if self.negated {
            return None;
        }

        ['s', 'S', 'w', 'W', 'd', 'D', '.']
            .into_iter()
            .find(|&c| CharacterRange::class_escape(c) == self.ranges)
    }

    #[must_use]
    pub fn matches(&self, c: u32) -> bool {
        self.ranges.iter().any(|range| range.contains(c)) != self.negated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum QuantifierKind {
    Greedy,
    NonGreedy,
    Possessive,
}

impl QuantifierKind {
    #[must_use]
    fn letter(&self) -> char {
        match self {
            Self::Greedy => 'g',
            Self::NonGreedy => 'n',
            Self::Possessive => 'p',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpQuantifier {
    pub min: u32,
    pub max: u32,
    pub kind: QuantifierKind,
    pub body: Box<RegExpTree>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpCapture {
    /// One-based.
    pub index: u32,
    pub body: Box<RegExpTree>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum AssertionKind {
    StartOfLine,
    StartOfInput,
    EndOfLine,
    EndOfInput,
    Boundary,
    NonBoundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr)]
pub enum LookaroundDirection {
    #[default]
    Lookahead,
    Lookbehind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpLookaround {
    pub body: Box<RegExpTree>,
    pub positive: bool,
    pub direction: LookaroundDirection,

    /// The body opens captures `capture_from + 1 ..= capture_from + capture_count`.
    pub capture_from: u32,
    pub capture_count: u32,
}

fn write_list(f: &mut fmt::Formatter<'_>, prefix: &str, nodes: &[RegExpTree]) -> fmt::Result {
    f.write_str(prefix)?;
    for node in nodes {
        write!(f, " {node}")?;
    }
    f.write_char(')')
}

impl Display for RegExpTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_char('%'),

            Self::Atom(data) => {
                f.write_char('\'')?;
                for unit in data {
                    write_code_point(f, u32::from(*unit))?;
                }
                f.write_char('\'')
            }

            Self::Text(elements) if elements.len() == 1 => Display::fmt(&elements[0], f),
            Self::Text(elements) => write_list(f, "(!", elements),

            Self::CharacterClass(class) => Display::fmt(class, f),
            Self::Alternative(nodes) => write_list(f, "(:", nodes),
            Self::Disjunction(nodes) => write_list(f, "(|", nodes),

            Self::Quantifier(quantifier) => {
                write!(f, "(# {} ", quantifier.min)?;
                if quantifier.max == Self::INFINITY {
                    f.write_str("- ")?;
                } else {
                    write!(f, "{} ", quantifier.max)?;
                }
                write!(f, "{} {})", quantifier.kind.letter(), quantifier.body)
            }

            Self::Capture(capture) => write!(f, "(^ {})", capture.body),
            Self::BackReference(index) => write!(f, "(<- {index})"),

            Self::Assertion(kind) => f.write_str(match kind {
                AssertionKind::StartOfInput => "@^",
                AssertionKind::EndOfInput => "@$",
                AssertionKind::StartOfLine => "^",
                AssertionKind::EndOfLine => "$",
                AssertionKind::Boundary => "@b",
                AssertionKind::NonBoundary => "@B",
            }),

            Self::Lookaround(lookaround) => {
                let direction = match lookaround.direction {
                    LookaroundDirection::Lookahead => "->",
                    LookaroundDirection::Lookbehind => "<-",
                };
                let sign = if lookaround.positive { '+' } else { '-' };
                write!(f, "({direction} {sign} {})", lookaround.body)
            }
        }
    }
}

impl Display for RegExpCharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_char('^')?;
        }

        f.write_char('[')?;
        for (index, range) in self.ranges.iter().enumerate() {
            if index != 0 {
                f.write_char(' ')?;
            }
            Display::fmt(range, f)?;
        }
        f.write_char(']')
    }
}
