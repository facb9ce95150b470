// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use serde::Deserialize;

/// Process-wide switches, read-only while a pattern is being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct RegExpFeatures {
    /// Accept `(?<=` and `(?<!`.
    pub lookbehind: bool,

    /// Accept `\p{..}` and `\P{..}` in unicode mode.
    pub property_escapes: bool,

    /// A `+` after a quantifier makes it possessive.
    pub possessive_quantifiers: bool,

    /// Log every parsed tree.
    pub trace_parser: bool,

    pub max_depth: usize,
    pub max_zone_units: usize,
}

impl Default for RegExpFeatures {
    fn default() -> Self {
        let limits = ParserLimits::default();
        Self {
            lookbehind: true,
            property_escapes: true,
            possessive_quantifiers: false,
            trace_parser: false,
            max_depth: limits.max_depth,
            max_zone_units: limits.max_zone_units,
        }
    }
}

impl RegExpFeatures {
    #[must_use]
    pub fn limits(&self) -> ParserLimits {
        ParserLimits {
            max_depth: self.max_depth,
            max_zone_units: self.max_zone_units,
        }
    }
}

/// Resource bounds for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    /// Maximum group nesting.
    pub max_depth: usize,

    /// Approximate bound on the memory used by the parse, counted in
    /// characters read plus character ranges allocated.
    pub max_zone_units: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_depth: 10_000,
            max_zone_units: 1_000_000,
        }
    }
}
