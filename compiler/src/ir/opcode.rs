// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::fmt::Display;

use serde::Deserialize;
use strum::{AsRefStr, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, AsRefStr)]
pub enum MachineRepresentation {
    None,
    Bit,
    Word8,
    Word16,
    Word32,
    Word64,
    Float32,
    Float64,
    Simd128,
    Tagged,
}

impl Display for MachineRepresentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoadRepresentation {
    pub representation: MachineRepresentation,

    #[serde(default)]
    pub signed: bool,
}

impl LoadRepresentation {
    #[must_use]
    pub const fn signed(representation: MachineRepresentation) -> Self {
        Self { representation, signed: true }
    }

    #[must_use]
    pub const fn unsigned(representation: MachineRepresentation) -> Self {
        Self { representation, signed: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum WriteBarrierKind {
    #[default]
    NoWriteBarrier,
    MapWriteBarrier,
    PointerWriteBarrier,
    FullWriteBarrier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreRepresentation {
    pub representation: MachineRepresentation,

    #[serde(default)]
    pub write_barrier: WriteBarrierKind,
}

impl StoreRepresentation {
    #[must_use]
    pub const fn new(representation: MachineRepresentation, write_barrier: WriteBarrierKind) -> Self {
        Self { representation, write_barrier }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TruncationMode {
    /// Wraps modulo 2^32, like `ToInt32`.
    JavaScript,
    RoundToZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CallKind {
    CodeObject,
    CFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CallDescriptor {
    pub kind: CallKind,

    /// Number of leading arguments passed in `a0..a3`. C calls always use
    /// the four argument registers.
    #[serde(default)]
    pub register_parameters: u32,

    #[serde(default)]
    pub returns_value: bool,
}

impl CallDescriptor {
    pub const ARGUMENT_REGISTER_COUNT: u32 = 4;

    #[must_use]
    pub const fn c_function(returns_value: bool) -> Self {
        Self {
            kind: CallKind::CFunction,
            register_parameters: Self::ARGUMENT_REGISTER_COUNT,
            returns_value,
        }
    }

    #[must_use]
    pub const fn code_object(register_parameters: u32, returns_value: bool) -> Self {
        Self {
            kind: CallKind::CodeObject,
            register_parameters,
            returns_value,
        }
    }

    #[must_use]
    pub const fn is_c_function_call(&self) -> bool {
        matches!(self.kind, CallKind::CFunction)
    }

    #[must_use]
    pub fn register_parameter_count(&self, argument_count: usize) -> usize {
        let limit = self.register_parameters.min(Self::ARGUMENT_REGISTER_COUNT) as usize;
        argument_count.min(limit)
    }
}

/// The operations of the machine-level graph.
///
/// Operations carry their static parameters (constant values, memory
/// representations, projection indices) inline; their value inputs live on
/// the [`Node`](super::Node).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, AsRefStr, IntoStaticStr)]
pub enum IrOpcode {
    Int32Constant(i32),
    Int64Constant(i64),
    Float32Constant(f32),
    Float64Constant(f64),
    Parameter(u32),
    Phi,
    Projection(u32),
    FrameState,

    Word32And,
    Word32Or,
    Word32Xor,
    Word32Shl,
    Word32Shr,
    Word32Sar,
    Word32Ror,
    Word32Clz,
    Word32Ctz,
    Word32Popcnt,
    Word32ReverseBits,
    Word32Equal,

    Word64And,
    Word64Or,
    Word64Xor,
    Word64Shl,
    Word64Shr,
    Word64Sar,
    Word64Equal,

    Int32Add,
    Int32AddWithOverflow,
    Int32Sub,
    Int32SubWithOverflow,
    Int32Mul,
    Int32MulHigh,
    Uint32MulHigh,
    Int32Div,
    Uint32Div,
    Int32Mod,
    Uint32Mod,
    Int32LessThan,
    Int32LessThanOrEqual,
    Uint32LessThan,
    Uint32LessThanOrEqual,

    Int32PairAdd,
    Int32PairSub,
    Int32PairMul,
    Word32PairShl,
    Word32PairShr,
    Word32PairSar,

    ChangeFloat32ToFloat64,
    RoundInt32ToFloat32,
    RoundUint32ToFloat32,
    ChangeInt32ToFloat64,
    ChangeUint32ToFloat64,
    TruncateFloat32ToInt32,
    TruncateFloat32ToUint32,
    ChangeFloat64ToInt32,
    ChangeFloat64ToUint32,
    TruncateFloat64ToUint32,
    TruncateFloat64ToFloat32,
    TruncateFloat64ToInt32(TruncationMode),
    BitcastFloat32ToInt32,
    BitcastInt32ToFloat32,

    Float32Add,
    Float32Sub,
    Float32Mul,
    Float32Div,
    Float32Max,
    Float32Min,
    Float32Abs,
    Float32Sqrt,
    Float32RoundDown,
    Float32RoundUp,
    Float32RoundTruncate,
    Float32RoundTiesEven,
    Float32Equal,
    Float32LessThan,
    Float32LessThanOrEqual,

    Float64Add,
    Float64Sub,
    Float64Mul,
    Float64Div,
    Float64Mod,
    Float64Max,
    Float64Min,
    Float64Abs,
    Float64Sqrt,
    Float64RoundDown,
    Float64RoundUp,
    Float64RoundTruncate,
    Float64RoundTiesEven,
    Float64RoundTiesAway,
    Float64Equal,
    Float64LessThan,
    Float64LessThanOrEqual,
    Float64ExtractLowWord32,
    Float64ExtractHighWord32,
    Float64InsertLowWord32,
    Float64InsertHighWord32,

    Load(LoadRepresentation),
    Store(StoreRepresentation),
    CheckedLoad(LoadRepresentation),
    CheckedStore(MachineRepresentation),

    Call(CallDescriptor),
    DeoptimizeIf,
    DeoptimizeUnless,
    TrapIf(u32),
    TrapUnless(u32),
    Branch,
}

impl IrOpcode {
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Int32Constant(..) | Self::Int64Constant(..) | Self::Float32Constant(..) | Self::Float64Constant(..))
    }

    /// Pure operations have no effect edges and may move freely within
    /// their block.
    #[must_use]
    pub const fn is_pure(&self) -> bool {
        !matches!(self,
            Self::Int32Div | Self::Uint32Div | Self::Int32Mod | Self::Uint32Mod
            | Self::Load(..) | Self::Store(..) | Self::CheckedLoad(..) | Self::CheckedStore(..)
            | Self::Call(..)
            | Self::DeoptimizeIf | Self::DeoptimizeUnless
            | Self::TrapIf(..) | Self::TrapUnless(..)
            | Self::Branch
        )
    }

    /// Operations that must be selected even when nothing consumes their
    /// value.
    #[must_use]
    pub const fn has_side_effects(&self) -> bool {
        matches!(self,
            Self::Store(..) | Self::CheckedStore(..)
            | Self::Call(..)
            | Self::DeoptimizeIf | Self::DeoptimizeUnless
            | Self::TrapIf(..) | Self::TrapUnless(..)
        )
    }

    /// Operations that start a new effect level within their block.
    #[must_use]
    pub const fn writes_memory(&self) -> bool {
        matches!(self, Self::Store(..) | Self::CheckedStore(..) | Self::Call(..))
    }

    #[must_use]
    pub const fn is_commutative(&self) -> bool {
        matches!(self,
            Self::Word32And | Self::Word32Or | Self::Word32Xor | Self::Word32Equal
            | Self::Word64And | Self::Word64Or | Self::Word64Xor | Self::Word64Equal
            | Self::Int32Add | Self::Int32AddWithOverflow | Self::Int32Mul
            | Self::Int32MulHigh | Self::Uint32MulHigh
            | Self::Float32Add | Self::Float32Mul | Self::Float32Equal
            | Self::Float64Add | Self::Float64Mul | Self::Float64Equal
        )
    }

    /// The floating-point representation of the value this operation
    /// produces, if any.
    #[must_use]
    pub const fn float_representation(&self) -> Option<MachineRepresentation> {
        match self {
            Self::Float32Constant(..)
            | Self::RoundInt32ToFloat32 | Self::RoundUint32ToFloat32
            | Self::TruncateFloat64ToFloat32 | Self::BitcastInt32ToFloat32
            | Self::Float32Add | Self::Float32Sub | Self::Float32Mul | Self::Float32Div
            | Self::Float32Max | Self::Float32Min | Self::Float32Abs | Self::Float32Sqrt
            | Self::Float32RoundDown | Self::Float32RoundUp
            | Self::Float32RoundTruncate | Self::Float32RoundTiesEven => Some(MachineRepresentation::Float32),

            Self::Float64Constant(..)
            | Self::ChangeFloat32ToFloat64 | Self::ChangeInt32ToFloat64 | Self::ChangeUint32ToFloat64
            | Self::Float64Add | Self::Float64Sub | Self::Float64Mul | Self::Float64Div
            | Self::Float64Mod | Self::Float64Max | Self::Float64Min | Self::Float64Abs
            | Self::Float64Sqrt | Self::Float64RoundDown | Self::Float64RoundUp
            | Self::Float64RoundTruncate | Self::Float64RoundTiesEven | Self::Float64RoundTiesAway
            | Self::Float64InsertLowWord32 | Self::Float64InsertHighWord32 => Some(MachineRepresentation::Float64),

            Self::Load(rep) | Self::CheckedLoad(rep) => match rep.representation {
                MachineRepresentation::Float32 => Some(MachineRepresentation::Float32),
                MachineRepresentation::Float64 => Some(MachineRepresentation::Float64),
                _ => None,
            },

            _ => None,
        }
    }

    /// The number of value inputs the selector reads from a node with this
    /// operation.
    #[must_use]
    pub const fn min_input_count(&self) -> usize {
        match self {
            Self::Int32Constant(..) | Self::Int64Constant(..)
            | Self::Float32Constant(..) | Self::Float64Constant(..)
            | Self::Parameter(..) | Self::FrameState => 0,

            Self::Phi | Self::Projection(..) | Self::Call(..)
            | Self::TrapIf(..) | Self::TrapUnless(..) | Self::Branch => 1,

            Self::Word32Clz | Self::Word32Ctz | Self::Word32Popcnt | Self::Word32ReverseBits
            | Self::ChangeFloat32ToFloat64 | Self::RoundInt32ToFloat32 | Self::RoundUint32ToFloat32
            | Self::ChangeInt32ToFloat64 | Self::ChangeUint32ToFloat64
            | Self::TruncateFloat32ToInt32 | Self::TruncateFloat32ToUint32
            | Self::ChangeFloat64ToInt32 | Self::ChangeFloat64ToUint32
            | Self::TruncateFloat64ToUint32 | Self::TruncateFloat64ToFloat32
            | Self::TruncateFloat64ToInt32(..)
            | Self::BitcastFloat32ToInt32 | Self::BitcastInt32ToFloat32
            | Self::Float32Abs | Self::Float32Sqrt
            | Self::Float32RoundDown | Self::Float32RoundUp
            | Self::Float32RoundTruncate | Self::Float32RoundTiesEven
            | Self::Float64Abs | Self::Float64Sqrt
            | Self::Float64RoundDown | Self::Float64RoundUp
            | Self::Float64RoundTruncate | Self::Float64RoundTiesEven | Self::Float64RoundTiesAway
            | Self::Float64ExtractLowWord32 | Self::Float64ExtractHighWord32 => 1,

            Self::Word32PairShl | Self::Word32PairShr | Self::Word32PairSar
            | Self::Store(..) | Self::CheckedLoad(..) => 3,

            Self::Int32PairAdd | Self::Int32PairSub | Self::Int32PairMul
            | Self::CheckedStore(..) => 4,

            _ => 2,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

impl Display for IrOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int32Constant(value) => f.write_fmt(format_args!("Int32Constant[{value}]")),
            Self::Int64Constant(value) => f.write_fmt(format_args!("Int64Constant[{value}]")),
            Self::Float32Constant(value) => f.write_fmt(format_args!("Float32Constant[{value}]")),
            Self::Float64Constant(value) => f.write_fmt(format_args!("Float64Constant[{value}]")),
            Self::Parameter(index) => f.write_fmt(format_args!("Parameter[{index}]")),
            Self::Projection(index) => f.write_fmt(format_args!("Projection[{index}]")),
            Self::Load(rep) | Self::CheckedLoad(rep) => f.write_fmt(format_args!("{}[{}]", self.name(), rep.representation)),
            Self::Store(rep) => f.write_fmt(format_args!("Store[{}]", rep.representation)),
            Self::CheckedStore(rep) => f.write_fmt(format_args!("CheckedStore[{rep}]")),
            _ => f.write_str(self.name()),
        }
    }
}
