// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::fmt::Display;

/// A MIPS32 general purpose register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MipsRegister {
    pub(super) number: u8,
}

impl MipsRegister {
    /// Return value
    pub const V0: Self = Self { number: 2 };

    pub const A0: Self = Self { number: 4 };
    pub const A1: Self = Self { number: 5 };
    pub const A2: Self = Self { number: 6 };
    pub const A3: Self = Self { number: 7 };

    /// The registers carrying the first four arguments of a call.
    pub const ARGUMENTS: [Self; 4] = [Self::A0, Self::A1, Self::A2, Self::A3];

    #[must_use]
    pub const fn number(&self) -> u8 {
        self.number
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        const NAMES: [&str; 32] = [
            "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3",
            "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7",
            "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7",
            "t8", "t9", "k0", "k1", "gp", "sp", "fp", "ra",
        ];
        NAMES[(self.number & 0x1f) as usize]
    }
}

impl Display for MipsRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A floating-point coprocessor register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MipsFpRegister {
    pub(super) number: u8,
}

impl MipsFpRegister {
    pub const F0: Self = Self { number: 0 };
    pub const F12: Self = Self { number: 12 };
    pub const F14: Self = Self { number: 14 };

    #[must_use]
    pub const fn number(&self) -> u8 {
        self.number
    }
}

impl Display for MipsFpRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("f")?;
        self.number.fmt(f)
    }
}
