// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use thiserror::Error;

/// Syntax and resource errors. The messages are the ones scripts observe
/// in the thrown `SyntaxError`, so they are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegExpError {
    #[error("Unterminated group")]
    UnterminatedGroup,

    #[error("Unmatched ')'")]
    UnmatchedParenthesis,

    #[error("Nothing to repeat")]
    NothingToRepeat,

    #[error("Invalid group")]
    InvalidGroup,

    #[error("Too many captures")]
    TooManyCaptures,

    #[error("\\ at end of pattern")]
    EscapeAtEndOfPattern,

    #[error("Invalid property name")]
    InvalidPropertyName,

    #[error("Invalid property name in character class")]
    InvalidClassPropertyName,

    #[error("Invalid escape")]
    InvalidEscape,

    #[error("Invalid decimal escape")]
    InvalidDecimalEscape,

    #[error("Invalid unicode escape")]
    InvalidUnicodeEscape,

    #[error("Invalid class escape")]
    InvalidClassEscape,

    #[error("Lone quantifier brackets")]
    LoneQuantifierBrackets,

    #[error("numbers out of order in {{}} quantifier")]
    QuantifierOutOfOrder,

    #[error("Incomplete quantifier")]
    IncompleteQuantifier,

    #[error("Invalid quantifier")]
    InvalidQuantifier,

    #[error("Unterminated character class")]
    UnterminatedCharacterClass,

    #[error("Invalid character class")]
    InvalidCharacterClass,

    #[error("Range out of order in character class")]
    RangeOutOfOrder,

    #[error("Maximum call stack size exceeded")]
    StackOverflow,

    #[error("Regular expression too large")]
    TooLarge,

    #[error("Invalid flags supplied to RegExp constructor '{flags}'")]
    InvalidFlags {
        flags: String,
    },
}
