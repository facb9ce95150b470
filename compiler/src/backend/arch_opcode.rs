// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::fmt::Display;

use strum::{AsRefStr, EnumIter, FromRepr};

/// Machine opcodes: the architecture-independent `Arch*` pseudo
/// instructions followed by the MIPS32 instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter, FromRepr)]
#[repr(u16)]
pub enum ArchOpcode {
    ArchNop,
    ArchJmp,
    ArchRet,
    ArchCallCodeObject,
    ArchCallCFunction,
    ArchPrepareCallCFunction,
    ArchTableSwitch,
    ArchLookupSwitch,
    ArchStoreWithWriteBarrier,
    ArchTruncateDoubleToI,

    CheckedLoadInt8,
    CheckedLoadUint8,
    CheckedLoadInt16,
    CheckedLoadUint16,
    CheckedLoadWord32,
    CheckedLoadFloat32,
    CheckedLoadFloat64,
    CheckedStoreWord8,
    CheckedStoreWord16,
    CheckedStoreWord32,
    CheckedStoreFloat32,
    CheckedStoreFloat64,

    MipsAdd,
    MipsAddOvf,
    MipsSub,
    MipsSubOvf,
    MipsMul,
    MipsMulHigh,
    MipsMulHighU,
    MipsDiv,
    MipsDivU,
    MipsMod,
    MipsModU,
    MipsAnd,
    MipsOr,
    MipsNor,
    MipsXor,
    MipsClz,
    MipsCtz,
    MipsPopcnt,
    MipsLsa,
    MipsShl,
    MipsShr,
    MipsSar,
    MipsExt,
    MipsIns,
    MipsRor,
    MipsMov,
    MipsTst,
    MipsCmp,

    MipsCmpS,
    MipsAddS,
    MipsSubS,
    MipsMulS,
    MipsDivS,
    MipsAbsS,
    MipsSqrtS,
    MipsCmpD,
    MipsAddD,
    MipsSubD,
    MipsMulD,
    MipsDivD,
    MipsModD,
    MipsAbsD,
    MipsSqrtD,
    MipsFloat32Max,
    MipsFloat32Min,
    MipsFloat64Max,
    MipsFloat64Min,

    MipsFloat32RoundDown,
    MipsFloat32RoundUp,
    MipsFloat32RoundTruncate,
    MipsFloat32RoundTiesEven,
    MipsFloat64RoundDown,
    MipsFloat64RoundUp,
    MipsFloat64RoundTruncate,
    MipsFloat64RoundTiesEven,

    MipsCvtSD,
    MipsCvtDS,
    MipsTruncWD,
    MipsRoundWD,
    MipsFloorWD,
    MipsCeilWD,
    MipsTruncWS,
    MipsRoundWS,
    MipsFloorWS,
    MipsCeilWS,
    MipsTruncUwD,
    MipsTruncUwS,
    MipsCvtDW,
    MipsCvtDUw,
    MipsCvtSW,
    MipsCvtSUw,

    MipsLb,
    MipsLbu,
    MipsSb,
    MipsLh,
    MipsLhu,
    MipsSh,
    MipsLw,
    MipsSw,
    MipsLwc1,
    MipsSwc1,
    MipsLdc1,
    MipsSdc1,

    MipsFloat64ExtractLowWord32,
    MipsFloat64ExtractHighWord32,
    MipsFloat64InsertLowWord32,
    MipsFloat64InsertHighWord32,

    MipsStoreToStackSlot,
    MipsStackClaim,

    MipsAddPair,
    MipsSubPair,
    MipsMulPair,
    MipsShlPair,
    MipsShrPair,
    MipsSarPair,
}

impl ArchOpcode {
    #[must_use]
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}

impl Display for ArchOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}
