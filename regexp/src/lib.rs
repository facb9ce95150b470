// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

mod builder;
mod captures;
mod character_range;
mod error;
mod features;
mod flags;
mod parser;
mod scanner;
mod tree;
mod unicode;

pub use self::{
    builder::RegExpBuilder,
    captures::{
        CaptureRegistry,
        CaptureSlot,
    },
    character_range::CharacterRange,
    error::RegExpError,
    features::{
        ParserLimits,
        RegExpFeatures,
    },
    flags::RegExpFlags,
    parser::RegExpParser,
    scanner::{
        Scanner,
        END_MARKER,
    },
    tree::{
        AssertionKind,
        LookaroundDirection,
        QuantifierKind,
        RegExpCapture,
        RegExpCharacterClass,
        RegExpLookaround,
        RegExpQuantifier,
        RegExpTree,
    },
    unicode::{
        StdUnicodeOracle,
        UnicodeOracle,
    },
};

/// The result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpCompileData {
    pub tree: RegExpTree,
    pub capture_count: u32,

    /// The whole pattern is one literal atom without captures.
    pub simple: bool,

    /// The pattern contains a `^` outside multiline mode.
    pub contains_anchor: bool,
}

impl RegExpCompileData {
    /// All capture nodes of the tree, ordered by their index.
    #[must_use]
    pub fn captures(&self) -> Vec<&RegExpCapture> {
        let mut captures = Vec::new();
        self.tree.collect_captures(&mut captures);
        captures.sort_by_key(|capture| capture.index);
        captures
    }
}

/// Parses a pattern given as UTF-16 code units.
pub fn parse_regexp(
    input: &[u16],
    flags: RegExpFlags,
    features: &RegExpFeatures,
    oracle: &dyn UnicodeOracle,
) -> Result<RegExpCompileData, RegExpError> {
    RegExpParser::new(input, flags, features, oracle).parse()
}

/// Parses a pattern with the default features and the standard library
/// Unicode tables.
pub fn parse_str(pattern: &str, flags: RegExpFlags) -> Result<RegExpCompileData, RegExpError> {
    let input: Vec<u16> = pattern.encode_utf16().collect();
    parse_regexp(&input, flags, &RegExpFeatures::default(), &StdUnicodeOracle)
}
