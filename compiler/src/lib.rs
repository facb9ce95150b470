// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

pub mod backend;
pub mod bits;
mod error;
pub mod ir;
mod options;

pub use self::{
    backend::{
        select_instructions,
        Instruction,
        InstructionSequence,
    },
    error::{
        DescriptionError,
        SelectionError,
    },
    ir::{
        FunctionDescription,
        Graph,
        GraphBuilder,
        Schedule,
        ScheduleBuilder,
        ScheduleCoverOracle,
    },
    options::{
        MipsVariant,
        SelectorOptions,
        SupportedOperators,
    },
};
