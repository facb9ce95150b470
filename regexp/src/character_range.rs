// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::fmt::{self, Display, Write};

pub const MAX_CODE_POINT: u32 = 0x10FFFF;

/// An inclusive range of code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterRange {
    from: u32,
    to: u32,
}

const SPACE_RANGES: &[(u32, u32)] = &[
    (0x0009, 0x000D),
    (0x0020, 0x0020),
    (0x00A0, 0x00A0),
    (0x1680, 0x1680),
    (0x2000, 0x200A),
    (0x2028, 0x2029),
    (0x202F, 0x202F),
    (0x205F, 0x205F),
    (0x3000, 0x3000),
    (0xFEFF, 0xFEFF),
];

const WORD_RANGES: &[(u32, u32)] = &[
    (b'0' as u32, b'9' as u32),
    (b'A' as u32, b'Z' as u32),
    (b'_' as u32, b'_' as u32),
    (b'a' as u32, b'z' as u32),
];

const DIGIT_RANGES: &[(u32, u32)] = &[
    (b'0' as u32, b'9' as u32),
];

const LINE_TERMINATOR_RANGES: &[(u32, u32)] = &[
    (0x000A, 0x000A),
    (0x000D, 0x000D),
    (0x2028, 0x2029),
];

impl CharacterRange {
    #[must_use]
    pub const fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub const fn singleton(c: u32) -> Self {
        Self { from: c, to: c }
    }

    #[must_use]
    pub const fn everything() -> Self {
        Self { from: 0, to: MAX_CODE_POINT }
    }

    #[must_use]
    pub const fn from(&self) -> u32 {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> u32 {
        self.to
    }

    #[must_use]
    pub const fn is_singleton(&self) -> bool {
        self.from == self.to
    }

    #[must_use]
    pub const fn contains(&self, c: u32) -> bool {
        self.from <= c && c <= self.to
    }

    /// Appends the ranges of the class escape `\c`, where `.` stands for
    /// everything but line terminators.
    pub fn add_class_escape(c: char, ranges: &mut Vec<Self>) {
        let table = match c {
            's' | 'S' => SPACE_RANGES,
            'w' | 'W' => WORD_RANGES,
            'd' | 'D' => DIGIT_RANGES,
            '.' => LINE_TERMINATOR_RANGES,
            _ => return,
        };

        let iter = table.iter().map(|&(from, to)| Self::new(from, to));
        if c.is_ascii_uppercase() || c == '.' {
            ranges.extend(Self::negate(iter.collect()));
        } else {
            ranges.extend(iter);
        }
    }

    #[must_use]
    pub fn class_escape(c: char) -> Vec<Self> {
        let mut ranges = Vec::new();
        Self::add_class_escape(c, &mut ranges);
        ranges
    }

    /// Sorts the ranges and merges the ones that overlap or touch.
    pub fn canonicalize(ranges: &mut Vec<Self>) {
        if ranges.len() <= 1 {
            return;
        }

        ranges.sort_unstable();

        let mut write = 0;
        for read in 1..ranges.len() {
            let range = ranges[read];
            let last = &mut ranges[write];
            if range.from <= last.to.saturating_add(1) {
                last.to = last.to.max(range.to);
            } else {
                write += 1;
                ranges[write] = range;
            }
        }

        ranges.truncate(write + 1);
    }

    /// The complement of `ranges` within `0..=0x10FFFF`.
    #[must_use]
    pub fn negate(mut ranges: Vec<Self>) -> Vec<Self> {
        Self::canonicalize(&mut ranges);

        let mut result = Vec::with_capacity(ranges.len() + 1);
        let mut from = 0;

        for range in ranges {
            if range.from > from {
                result.push(Self::new(from, range.from - 1));
            }
            from = range.to + 1;
        }

        if from <= MAX_CODE_POINT {
            result.push(Self::new(from, MAX_CODE_POINT));
        }

        result
    }
}

/// Printable ASCII is written as is, everything else as an escape.
pub(crate) fn write_code_point(f: &mut impl Write, c: u32) -> fmt::Result {
    match char::from_u32(c) {
        Some(ch) if (' '..='~').contains(&ch) => f.write_char(ch),
        _ if c <= 0xFFFF => write!(f, "\\u{c:04x}"),
        _ => write!(f, "\\u{{{c:06x}}}"),
    }
}

impl Display for CharacterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_code_point(f, self.from)?;
        if !self.is_singleton() {
            f.write_char('-')?;
            write_code_point(f, self.to)?;
        }
        Ok(())
    }
}
