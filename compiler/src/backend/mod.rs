// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

mod arch_opcode;
mod flags_continuation;
mod instruction;
mod instruction_code;
pub mod mips;
mod operand;
mod operand_generator;
mod selector;

pub use self::{
    arch_opcode::ArchOpcode,
    flags_continuation::{
        ContinuationKind,
        FlagsContinuation,
    },
    instruction::{
        DeoptimizationEntry,
        Instruction,
        InstructionBlock,
        InstructionSequence,
        OperandList,
        PhiInstruction,
    },
    instruction_code::{
        AddressingMode,
        AddressingModeField,
        ArchOpcodeField,
        BitField,
        FlagsCondition,
        FlagsConditionField,
        FlagsMode,
        FlagsModeField,
        InstructionCode,
        MiscField,
    },
    operand::{
        Constant,
        InstructionOperand,
        UnallocatedPolicy,
        VirtualRegister,
    },
    operand_generator::{
        label,
        no_output,
        temp_immediate,
    },
    selector::{
        select_instructions,
        InstructionSelector,
        SwitchInfo,
    },
};
