// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::fmt::Display;

use strum::{AsRefStr, EnumIter, FromRepr};

use super::ArchOpcode;

/// A `SIZE`-bit wide field starting at bit `SHIFT` of a 32-bit word.
#[derive(Debug, Clone, Copy)]
pub struct BitField<const SHIFT: u32, const SIZE: u32>;

impl<const SHIFT: u32, const SIZE: u32> BitField<SHIFT, SIZE> {
    pub const MASK: u32 = ((1 << SIZE) - 1) << SHIFT;

    #[must_use]
    pub const fn is_valid(value: u32) -> bool {
        value < (1 << SIZE)
    }

    #[must_use]
    pub const fn encode(value: u32) -> u32 {
        debug_assert!(Self::is_valid(value));
        (value << SHIFT) & Self::MASK
    }

    #[must_use]
    pub const fn update(word: u32, value: u32) -> u32 {
        (word & !Self::MASK) | Self::encode(value)
    }

    #[must_use]
    pub const fn decode(word: u32) -> u32 {
        (word & Self::MASK) >> SHIFT
    }
}

pub type ArchOpcodeField = BitField<0, 9>;
pub type AddressingModeField = BitField<9, 5>;
pub type FlagsModeField = BitField<14, 3>;
pub type FlagsConditionField = BitField<17, 5>;
pub type MiscField = BitField<22, 10>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, EnumIter, FromRepr)]
#[repr(u8)]
pub enum AddressingMode {
    #[default]
    None,

    /// `[register + immediate]`
    MRI,

    /// `[register + register]`
    MRR,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, EnumIter, FromRepr)]
#[repr(u8)]
pub enum FlagsMode {
    #[default]
    None,
    Branch,
    Deoptimize,
    Set,
    Trap,
}

/// Condition codes, laid out in negation pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, EnumIter, FromRepr)]
#[repr(u8)]
pub enum FlagsCondition {
    #[default]
    Equal,
    NotEqual,
    SignedLessThan,
    SignedGreaterThanOrEqual,
    SignedLessThanOrEqual,
    SignedGreaterThan,
    UnsignedLessThan,
    UnsignedGreaterThanOrEqual,
    UnsignedLessThanOrEqual,
    UnsignedGreaterThan,
    FloatLessThanOrUnordered,
    FloatGreaterThanOrEqual,
    FloatLessThanOrEqual,
    FloatGreaterThanOrUnordered,
    FloatLessThan,
    FloatGreaterThanOrEqualOrUnordered,
    FloatLessThanOrEqualOrUnordered,
    FloatGreaterThan,
    UnorderedEqual,
    UnorderedNotEqual,
    Overflow,
    NotOverflow,
}

impl FlagsCondition {
    /// The condition that holds exactly when this one doesn't.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Equal => Self::NotEqual,
            Self::NotEqual => Self::Equal,
            Self::SignedLessThan => Self::SignedGreaterThanOrEqual,
            Self::SignedGreaterThanOrEqual => Self::SignedLessThan,
            Self::SignedLessThanOrEqual => Self::SignedGreaterThan,
            Self::SignedGreaterThan => Self::SignedLessThanOrEqual,
            Self::UnsignedLessThan => Self::UnsignedGreaterThanOrEqual,
            Self::UnsignedGreaterThanOrEqual => Self::UnsignedLessThan,
            Self::UnsignedLessThanOrEqual => Self::UnsignedGreaterThan,
            Self::UnsignedGreaterThan => Self::UnsignedLessThanOrEqual,
            Self::FloatLessThanOrUnordered => Self::FloatGreaterThanOrEqual,
            Self::FloatGreaterThanOrEqual => Self::FloatLessThanOrUnordered,
            Self::FloatLessThanOrEqual => Self::FloatGreaterThanOrUnordered,
            Self::FloatGreaterThanOrUnordered => Self::FloatLessThanOrEqual,
            Self::FloatLessThan => Self::FloatGreaterThanOrEqualOrUnordered,
            Self::FloatGreaterThanOrEqualOrUnordered => Self::FloatLessThan,
            Self::FloatLessThanOrEqualOrUnordered => Self::FloatGreaterThan,
            Self::FloatGreaterThan => Self::FloatLessThanOrEqualOrUnordered,
            Self::UnorderedEqual => Self::UnorderedNotEqual,
            Self::UnorderedNotEqual => Self::UnorderedEqual,
            Self::Overflow => Self::NotOverflow,
            Self::NotOverflow => Self::Overflow,
        }
    }

    /// The condition to test after swapping the operands of the compare.
    #[must_use]
    pub const fn commute(self) -> Self {
        match self {
            Self::SignedLessThan => Self::SignedGreaterThan,
            Self::SignedGreaterThanOrEqual => Self::SignedLessThanOrEqual,
            Self::SignedLessThanOrEqual => Self::SignedGreaterThanOrEqual,
            Self::SignedGreaterThan => Self::SignedLessThan,
            Self::UnsignedLessThan => Self::UnsignedGreaterThan,
            Self::UnsignedGreaterThanOrEqual => Self::UnsignedLessThanOrEqual,
            Self::UnsignedLessThanOrEqual => Self::UnsignedGreaterThanOrEqual,
            Self::UnsignedGreaterThan => Self::UnsignedLessThan,
            Self::FloatLessThanOrUnordered => Self::FloatGreaterThanOrUnordered,
            Self::FloatGreaterThanOrEqual => Self::FloatLessThanOrEqual,
            Self::FloatLessThanOrEqual => Self::FloatGreaterThanOrEqual,
            Self::FloatGreaterThanOrUnordered => Self::FloatLessThanOrUnordered,
            Self::FloatLessThan => Self::FloatGreaterThan,
            Self::FloatGreaterThanOrEqualOrUnordered => Self::FloatLessThanOrEqualOrUnordered,
            Self::FloatLessThanOrEqualOrUnordered => Self::FloatGreaterThanOrEqualOrUnordered,
            Self::FloatGreaterThan => Self::FloatLessThan,
            Self::Equal | Self::NotEqual
            | Self::UnorderedEqual | Self::UnorderedNotEqual
            | Self::Overflow | Self::NotOverflow => self,
        }
    }
}

impl Display for FlagsCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// The 32-bit opcode word handed to the register allocator and the code
/// generator: opcode, addressing mode, flags mode, flags condition and a
/// free-form payload packed into bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionCode(u32);

impl InstructionCode {
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn arch_opcode(&self) -> ArchOpcode {
        match ArchOpcode::from_repr(ArchOpcodeField::decode(self.0) as u16) {
            Some(opcode) => opcode,
            None => unreachable!("instructiecode {:#x} bevat geen geldige opcode", self.0),
        }
    }

    #[must_use]
    pub fn addressing_mode(&self) -> AddressingMode {
        AddressingMode::from_repr(AddressingModeField::decode(self.0) as u8).unwrap_or_default()
    }

    #[must_use]
    pub fn flags_mode(&self) -> FlagsMode {
        FlagsMode::from_repr(FlagsModeField::decode(self.0) as u8).unwrap_or_default()
    }

    #[must_use]
    pub fn flags_condition(&self) -> FlagsCondition {
        FlagsCondition::from_repr(FlagsConditionField::decode(self.0) as u8).unwrap_or_default()
    }

    #[must_use]
    pub const fn misc(&self) -> u32 {
        MiscField::decode(self.0)
    }

    #[must_use]
    pub const fn with_addressing_mode(self, mode: AddressingMode) -> Self {
        Self(AddressingModeField::update(self.0, mode as u32))
    }

    #[must_use]
    pub const fn with_flags(self, mode: FlagsMode, condition: FlagsCondition) -> Self {
        let word = FlagsModeField::update(self.0, mode as u32);
        Self(FlagsConditionField::update(word, condition as u32))
    }

    #[must_use]
    pub const fn with_misc(self, misc: u32) -> Self {
        Self(MiscField::update(self.0, misc))
    }
}

impl From<ArchOpcode> for InstructionCode {
    fn from(value: ArchOpcode) -> Self {
        Self(ArchOpcodeField::encode(value as u32))
    }
}

impl Display for InstructionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.arch_opcode().fmt(f)?;

        if self.addressing_mode() != AddressingMode::None {
            f.write_fmt(format_args!(" : {}", self.addressing_mode().as_ref()))?;
        }

        if self.flags_mode() != FlagsMode::None {
            f.write_fmt(format_args!(" && {} if {}", self.flags_mode().as_ref().to_lowercase(), self.flags_condition()))?;
        }

        Ok(())
    }
}
