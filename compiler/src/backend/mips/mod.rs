// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! MIPS32 lowering rules.

mod arithmetic;
mod bitwise;
mod call;
mod compare;
mod control;
mod float;
mod memory;
mod operand_generator;
mod register;

pub use self::{
    memory::RecordWriteMode,
    operand_generator::can_be_immediate,
    register::{
        MipsFpRegister,
        MipsRegister,
    },
};
