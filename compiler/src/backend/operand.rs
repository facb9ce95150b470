// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::fmt::Display;

use crate::ir::BlockId;

use super::mips::{MipsFpRegister, MipsRegister};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualRegister(u32);

impl VirtualRegister {
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    #[must_use]
    pub const fn number(&self) -> u32 {
        self.0
    }
}

impl Display for VirtualRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("v")?;
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Int32(i32),
    Float32(f32),
    Float64(f64),
}

impl Constant {
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(value) => Some(*value),
            _ => None,
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int32(value) => value.fmt(f),
            Self::Float32(value) => f.write_fmt(format_args!("{value}f")),
            Self::Float64(value) => f.write_fmt(format_args!("{value:?}")),
        }
    }
}

/// How the register allocator may place a virtual register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnallocatedPolicy {
    MustHaveRegister,

    /// Register, stack slot or constant: whatever is cheapest.
    Any,

    /// A register that none of the outputs of the instruction may share.
    UniqueRegister,

    SameAsFirstInput,
    FixedRegister(MipsRegister),
    FixedFpRegister(MipsFpRegister),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstructionOperand {
    /// Placeholder for instructions without a result; never stored in an
    /// [`Instruction`](super::Instruction).
    None,

    Unallocated {
        vreg: VirtualRegister,
        policy: UnallocatedPolicy,
    },

    /// A rematerializable constant, registered with the sequence under its
    /// virtual register.
    Constant(VirtualRegister),

    Immediate(Constant),

    StackSlot {
        vreg: VirtualRegister,
        slot: i32,
    },

    Label(BlockId),
}

impl InstructionOperand {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub const fn virtual_register(&self) -> Option<VirtualRegister> {
        match self {
            Self::Unallocated { vreg, .. } | Self::StackSlot { vreg, .. } | Self::Constant(vreg) => Some(*vreg),
            _ => None,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> Option<UnallocatedPolicy> {
        match self {
            Self::Unallocated { policy, .. } => Some(*policy),
            _ => None,
        }
    }

    #[must_use]
    pub const fn immediate(&self) -> Option<Constant> {
        match self {
            Self::Immediate(constant) => Some(*constant),
            _ => None,
        }
    }

    #[must_use]
    pub const fn immediate_i32(&self) -> Option<i32> {
        match self {
            Self::Immediate(Constant::Int32(value)) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> Option<BlockId> {
        match self {
            Self::Label(block) => Some(*block),
            _ => None,
        }
    }
}

impl Display for InstructionOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("-"),
            Self::Unallocated { vreg, policy } => {
                vreg.fmt(f)?;
                match policy {
                    UnallocatedPolicy::MustHaveRegister => f.write_str("|R"),
                    UnallocatedPolicy::Any => f.write_str("|*"),
                    UnallocatedPolicy::UniqueRegister => f.write_str("|R!"),
                    UnallocatedPolicy::SameAsFirstInput => f.write_str("|1"),
                    UnallocatedPolicy::FixedRegister(register) => f.write_fmt(format_args!("|{register}")),
                    UnallocatedPolicy::FixedFpRegister(register) => f.write_fmt(format_args!("|{register}")),
                }
            }
            Self::Constant(vreg) => f.write_fmt(format_args!("{vreg}|C")),
            Self::Immediate(constant) => f.write_fmt(format_args!("#{constant}")),
            Self::StackSlot { vreg, slot } => f.write_fmt(format_args!("{vreg}|[sp+{slot}]")),
            Self::Label(block) => block.fmt(f),
        }
    }
}
