// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::str::FromStr;

use bitflags::bitflags;

use crate::RegExpError;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegExpFlags: u8 {
        const GLOBAL = 1 << 0;
        const IGNORE_CASE = 1 << 1;
        const MULTILINE = 1 << 2;
        const STICKY = 1 << 3;
        const UNICODE = 1 << 4;
        const DOT_ALL = 1 << 5;
    }
}

impl RegExpFlags {
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'g' => Self::GLOBAL,
            'i' => Self::IGNORE_CASE,
            'm' => Self::MULTILINE,
            's' => Self::DOT_ALL,
            'u' => Self::UNICODE,
            'y' => Self::STICKY,
            _ => return None,
        })
    }
}

impl FromStr for RegExpFlags {
    type Err = RegExpError;

    /// Every flag may appear at most once.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::empty();

        for c in s.chars() {
            match Self::from_char(c) {
                Some(flag) if !flags.contains(flag) => flags |= flag,
                _ => return Err(RegExpError::InvalidFlags { flags: s.to_string() }),
            }
        }

        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", RegExpFlags::empty())]
    #[case("g", RegExpFlags::GLOBAL)]
    #[case("im", RegExpFlags::IGNORE_CASE | RegExpFlags::MULTILINE)]
    #[case("yug", RegExpFlags::STICKY | RegExpFlags::UNICODE | RegExpFlags::GLOBAL)]
    #[case("s", RegExpFlags::DOT_ALL)]
    fn parse_flags(#[case] input: &str, #[case] expected: RegExpFlags) {
        assert_eq!(input.parse::<RegExpFlags>(), Ok(expected));
    }

    #[rstest]
    #[case("gg")]
    #[case("x")]
    #[case("iu ")]
    fn reject_invalid_flags(#[case] input: &str) {
        assert_eq!(
            input.parse::<RegExpFlags>(),
            Err(RegExpError::InvalidFlags { flags: input.to_string() })
        );
    }
}
