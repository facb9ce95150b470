// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use bitflags::bitflags;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MipsVariant {
    #[default]
    R2,
    R6,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct SelectorOptions {
    pub variant: MipsVariant,

    /// 64-bit floating-point registers (`FR=1`).
    pub fp64: bool,

    /// Upper bound on the number of instructions selected for one
    /// function.
    pub max_instructions: usize,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            variant: MipsVariant::R2,
            fp64: true,
            max_instructions: 1_000_000,
        }
    }
}

bitflags! {
    /// Optional machine operators the selector can lower, reported to the
    /// graph builder so it only produces what can be selected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SupportedOperators: u32 {
        const FLOAT64_ROUND_DOWN = 1 << 0;
        const FLOAT64_ROUND_UP = 1 << 1;
        const FLOAT64_ROUND_TRUNCATE = 1 << 2;
        const FLOAT64_ROUND_TIES_EVEN = 1 << 3;
        const FLOAT32_ROUND_DOWN = 1 << 4;
        const FLOAT32_ROUND_UP = 1 << 5;
        const FLOAT32_ROUND_TRUNCATE = 1 << 6;
        const FLOAT32_ROUND_TIES_EVEN = 1 << 7;
        const WORD32_CTZ = 1 << 8;
        const WORD32_POPCNT = 1 << 9;
        const INT32_DIV_IS_SAFE = 1 << 10;
        const UINT32_DIV_IS_SAFE = 1 << 11;
        const WORD32_SHIFT_IS_SAFE = 1 << 12;
        const FLOAT32_MIN = 1 << 13;
        const FLOAT32_MAX = 1 << 14;
        const FLOAT64_MIN = 1 << 15;
        const FLOAT64_MAX = 1 << 16;
    }
}

impl SelectorOptions {
    #[must_use]
    pub fn supported_operators(&self) -> SupportedOperators {
        let mut operators = SupportedOperators::WORD32_CTZ
            | SupportedOperators::WORD32_POPCNT
            | SupportedOperators::INT32_DIV_IS_SAFE
            | SupportedOperators::UINT32_DIV_IS_SAFE
            | SupportedOperators::WORD32_SHIFT_IS_SAFE
            | SupportedOperators::FLOAT32_MIN
            | SupportedOperators::FLOAT32_MAX
            | SupportedOperators::FLOAT64_MIN
            | SupportedOperators::FLOAT64_MAX
            | SupportedOperators::FLOAT32_ROUND_DOWN
            | SupportedOperators::FLOAT32_ROUND_UP
            | SupportedOperators::FLOAT32_ROUND_TRUNCATE
            | SupportedOperators::FLOAT32_ROUND_TIES_EVEN;

        if self.fp64 {
            operators |= SupportedOperators::FLOAT64_ROUND_DOWN
                | SupportedOperators::FLOAT64_ROUND_UP
                | SupportedOperators::FLOAT64_ROUND_TRUNCATE
                | SupportedOperators::FLOAT64_ROUND_TIES_EVEN;
        }

        operators
    }
}
