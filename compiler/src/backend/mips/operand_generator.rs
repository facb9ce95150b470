// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::{
    backend::{ArchOpcode, FlagsContinuation, InstructionOperand, InstructionSelector},
    bits::{is_int16, is_uint16, is_uint5},
    ir::{Int32BinopMatcher, Int32Matcher, NodeId},
    SelectionError,
};

/// Whether `value` fits the immediate field of `opcode`.
#[must_use]
pub fn can_be_immediate(value: i32, opcode: ArchOpcode) -> bool {
    match opcode {
        ArchOpcode::MipsShl | ArchOpcode::MipsSar | ArchOpcode::MipsShr => is_uint5(value),

        ArchOpcode::MipsXor => is_uint16(value),

        // The high word of a double lives four bytes further.
        ArchOpcode::MipsLdc1 | ArchOpcode::MipsSdc1
        | ArchOpcode::CheckedLoadFloat64 | ArchOpcode::CheckedStoreFloat64 => {
            let value = value as i64 + 4;
            i16::MIN as i64 <= value && value <= i16::MAX as i64
        }

        _ => is_int16(value),
    }
}

impl InstructionSelector<'_> {
    pub(crate) fn can_be_immediate(&self, node: NodeId, opcode: ArchOpcode) -> bool {
        Int32Matcher::new(self.graph, node)
            .value()
            .is_some_and(|value| can_be_immediate(value, opcode))
    }

    /// An immediate when the constant fits `opcode`, a register otherwise.
    pub(crate) fn use_operand(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<InstructionOperand, SelectionError> {
        if self.can_be_immediate(node, opcode) {
            self.use_immediate(node)
        } else {
            Ok(self.use_register(node))
        }
    }

    pub(crate) fn visit_rrr(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<(), SelectionError> {
        let output = self.define_as_register(node);
        let left = self.use_register(self.input_at(node, 0));
        let right = self.use_register(self.input_at(node, 1));
        self.emit(opcode, &[output], &[left, right], &[])?;
        Ok(())
    }

    pub(crate) fn visit_rr(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<(), SelectionError> {
        let output = self.define_as_register(node);
        let input = self.use_register(self.input_at(node, 0));
        self.emit(opcode, &[output], &[input], &[])?;
        Ok(())
    }

    pub(crate) fn visit_rro(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<(), SelectionError> {
        let output = self.define_as_register(node);
        let left = self.use_register(self.input_at(node, 0));
        let right = self.use_operand(self.input_at(node, 1), opcode)?;
        self.emit(opcode, &[output], &[left, right], &[])?;
        Ok(())
    }

    pub(crate) fn visit_binop(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<(), SelectionError> {
        self.visit_binop_with_continuation(node, opcode, &FlagsContinuation::none())
    }

    pub(crate) fn visit_binop_with_continuation(
        &mut self,
        node: NodeId,
        opcode: ArchOpcode,
        cont: &FlagsContinuation,
    ) -> Result<(), SelectionError> {
        let m = Int32BinopMatcher::new(self.graph, node);

        let left = self.use_register(m.left().node());
        let right = self.use_operand(m.right().node(), opcode)?;
        let output = self.define_as_register(node);

        self.emit_with_continuation(opcode, &[output], &[left, right], cont)
    }
}
