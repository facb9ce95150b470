// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::{collections::BTreeMap, fmt::Display, ops::Range};

use smallvec::SmallVec;

use crate::ir::{BlockId, MachineRepresentation, NodeId};

use super::{ArchOpcode, Constant, InstructionCode, InstructionOperand, VirtualRegister};

pub type OperandList = SmallVec<[InstructionOperand; 4]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    code: InstructionCode,
    outputs: OperandList,
    inputs: OperandList,
    temps: OperandList,
    is_call: bool,
}

impl Instruction {
    /// Builds an instruction; `None` placeholders among the outputs are
    /// dropped.
    #[must_use]
    pub fn new(code: InstructionCode, outputs: &[InstructionOperand], inputs: &[InstructionOperand], temps: &[InstructionOperand]) -> Self {
        Self {
            code,
            outputs: outputs.iter().copied().filter(|x| !x.is_none()).collect(),
            inputs: inputs.iter().copied().collect(),
            temps: temps.iter().copied().collect(),
            is_call: false,
        }
    }

    #[must_use]
    pub const fn code(&self) -> InstructionCode {
        self.code
    }

    #[must_use]
    pub fn arch_opcode(&self) -> ArchOpcode {
        self.code.arch_opcode()
    }

    #[must_use]
    pub fn outputs(&self) -> &[InstructionOperand] {
        &self.outputs
    }

    #[must_use]
    pub fn inputs(&self) -> &[InstructionOperand] {
        &self.inputs
    }

    #[must_use]
    pub fn temps(&self) -> &[InstructionOperand] {
        &self.temps
    }

    #[must_use]
    pub const fn is_call(&self) -> bool {
        self.is_call
    }

    /// Calls clobber every caller-saved register.
    pub fn mark_as_call(&mut self) {
        self.is_call = true;
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.outputs.is_empty() {
            write_operands(f, &self.outputs)?;
            f.write_str(" = ")?;
        }

        self.code.fmt(f)?;

        if !self.inputs.is_empty() {
            f.write_str(" ")?;
            write_operands(f, &self.inputs)?;
        }

        if !self.temps.is_empty() {
            f.write_str(" temps ")?;
            write_operands(f, &self.temps)?;
        }

        if self.is_call {
            f.write_str(" (call)")?;
        }

        Ok(())
    }
}

fn write_operands(f: &mut std::fmt::Formatter<'_>, operands: &[InstructionOperand]) -> std::fmt::Result {
    for (index, operand) in operands.iter().enumerate() {
        if index != 0 {
            f.write_str(", ")?;
        }
        operand.fmt(f)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiInstruction {
    pub output: VirtualRegister,
    pub inputs: Vec<VirtualRegister>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionBlock {
    id: BlockId,
    phis: Vec<PhiInstruction>,
    code: Range<usize>,
}

impl InstructionBlock {
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    #[must_use]
    pub fn phis(&self) -> &[PhiInstruction] {
        &self.phis
    }

    /// The indices of this block's instructions in the sequence.
    #[must_use]
    pub fn code(&self) -> Range<usize> {
        self.code.clone()
    }
}

/// The frame state an eager deoptimization point refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeoptimizationEntry {
    pub frame_state: NodeId,
}

/// The selector's output: linear instructions grouped into blocks, plus the
/// side tables the register allocator needs.
#[derive(Debug, Clone, Default)]
pub struct InstructionSequence {
    instructions: Vec<Instruction>,
    blocks: Vec<InstructionBlock>,
    constants: BTreeMap<VirtualRegister, Constant>,
    representations: BTreeMap<VirtualRegister, MachineRepresentation>,
    deoptimization_entries: Vec<DeoptimizationEntry>,
    next_virtual_register: u32,
}

impl InstructionSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_virtual_register(&mut self) -> VirtualRegister {
        let vreg = VirtualRegister::new(self.next_virtual_register);
        self.next_virtual_register += 1;
        vreg
    }

    #[must_use]
    pub const fn virtual_register_count(&self) -> u32 {
        self.next_virtual_register
    }

    pub fn add_constant(&mut self, vreg: VirtualRegister, constant: Constant) {
        self.constants.insert(vreg, constant);
    }

    #[must_use]
    pub fn constant(&self, vreg: VirtualRegister) -> Option<Constant> {
        self.constants.get(&vreg).copied()
    }

    pub fn mark_representation(&mut self, vreg: VirtualRegister, representation: MachineRepresentation) {
        self.representations.insert(vreg, representation);
    }

    /// Unmarked virtual registers hold 32-bit words.
    #[must_use]
    pub fn representation(&self, vreg: VirtualRegister) -> MachineRepresentation {
        self.representations.get(&vreg).copied().unwrap_or(MachineRepresentation::Word32)
    }

    pub fn add_deoptimization_entry(&mut self, frame_state: NodeId) -> usize {
        self.deoptimization_entries.push(DeoptimizationEntry { frame_state });
        self.deoptimization_entries.len() - 1
    }

    #[must_use]
    pub fn deoptimization_entries(&self) -> &[DeoptimizationEntry] {
        &self.deoptimization_entries
    }

    pub(crate) fn start_block(&mut self, id: BlockId, phis: Vec<PhiInstruction>) {
        let start = self.instructions.len();
        self.blocks.push(InstructionBlock {
            id,
            phis,
            code: start..start,
        });
    }

    pub(crate) fn add_instruction(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
        if let Some(block) = self.blocks.last_mut() {
            block.code.end = self.instructions.len();
        }
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[must_use]
    pub fn blocks(&self) -> &[InstructionBlock] {
        &self.blocks
    }

    #[must_use]
    pub fn block_instructions(&self, block: &InstructionBlock) -> &[Instruction] {
        &self.instructions[block.code()]
    }
}

impl Display for InstructionSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for block in &self.blocks {
            f.write_fmt(format_args!("{}:\n", block.id))?;

            for phi in &block.phis {
                f.write_fmt(format_args!("      {} = phi", phi.output))?;
                for (index, input) in phi.inputs.iter().enumerate() {
                    f.write_str(if index == 0 { " " } else { ", " })?;
                    input.fmt(f)?;
                }
                f.write_str("\n")?;
            }

            for index in block.code() {
                f.write_fmt(format_args!("{index:>5}: {}\n", self.instructions[index]))?;
            }
        }

        for (vreg, constant) in &self.constants {
            f.write_fmt(format_args!("  constant {vreg} = {constant}\n"))?;
        }

        Ok(())
    }
}
