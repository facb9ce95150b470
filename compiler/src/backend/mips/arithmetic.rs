// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::{
    backend::{temp_immediate, ArchOpcode, FlagsCondition, FlagsContinuation, InstructionSelector},
    bits::{is_power_of_two, which_power_of_two},
    ir::{Int32BinopMatcher, IrOpcode, NodeId},
    SelectionError,
};

impl InstructionSelector<'_> {
    pub(crate) fn visit_int32_add(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let m = Int32BinopMatcher::new(self.graph, node);
        let covers_both = self.can_cover(node, m.left().node()) && self.can_cover(node, m.right().node());

        // left + (x << imm)
        if m.right().is_opcode(IrOpcode::Word32Shl) && covers_both {
            let mright = Int32BinopMatcher::new(self.graph, m.right().node());
            if let Some(shift) = mright.right().value().filter(|shift| (1..=31).contains(shift)) {
                return self.emit_lsa(node, m.left().node(), mright.left().node(), shift);
            }
        }

        // (x << imm) + right
        if m.left().is_opcode(IrOpcode::Word32Shl) && covers_both {
            let mleft = Int32BinopMatcher::new(self.graph, m.left().node());
            if let Some(shift) = mleft.right().value().filter(|shift| (1..=31).contains(shift)) {
                return self.emit_lsa(node, m.right().node(), mleft.left().node(), shift);
            }
        }

        self.visit_binop(node, ArchOpcode::MipsAdd)
    }

    /// `node = base + (index << shift)`
    fn emit_lsa(&mut self, node: NodeId, base: NodeId, index: NodeId, shift: i32) -> Result<(), SelectionError> {
        let output = self.define_as_register(node);
        let base = self.use_register(base);
        let index = self.use_register(index);
        self.emit(ArchOpcode::MipsLsa, &[output], &[base, index, temp_immediate(shift)], &[])?;
        Ok(())
    }

    pub(crate) fn visit_int32_mul(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let m = Int32BinopMatcher::new(self.graph, node);

        if let Some(value) = m.right().value().filter(|value| *value > 0) {
            let value = value as u32;
            let left = m.left().node();

            if is_power_of_two(value) {
                let output = self.define_as_register(node);
                let input = self.use_register(left);
                self.emit(ArchOpcode::MipsShl, &[output], &[input, temp_immediate(which_power_of_two(value) as i32)], &[])?;
                return Ok(());
            }

            // x * (2^k + 1) = x + (x << k)
            if is_power_of_two(value - 1) {
                return self.emit_lsa(node, left, left, which_power_of_two(value - 1) as i32);
            }

            // x * (2^k - 1) = (x << k) - x
            if is_power_of_two(value.wrapping_add(1)) {
                let temp = self.temp_register();
                let input = self.use_register(left);
                self.emit(ArchOpcode::MipsShl, &[temp], &[input, temp_immediate(which_power_of_two(value.wrapping_add(1)) as i32)], &[])?;

                let output = self.define_as_register(node);
                let input = self.use_register(left);
                self.emit(ArchOpcode::MipsSub, &[output], &[temp, input], &[])?;
                return Ok(());
            }
        }

        self.visit_rrr(node, ArchOpcode::MipsMul)
    }

    /// The quotient overwrites the dividend.
    pub(crate) fn visit_division(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<(), SelectionError> {
        let output = self.define_same_as_first(node);
        let left = self.use_register(self.input_at(node, 0));
        let right = self.use_register(self.input_at(node, 1));
        self.emit(opcode, &[output], &[left, right], &[])?;
        Ok(())
    }

    pub(crate) fn visit_int32_add_with_overflow(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let cont = self.overflow_continuation(node);
        self.visit_binop_with_continuation(node, ArchOpcode::MipsAddOvf, &cont)
    }

    pub(crate) fn visit_int32_sub_with_overflow(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let cont = self.overflow_continuation(node);
        self.visit_binop_with_continuation(node, ArchOpcode::MipsSubOvf, &cont)
    }

    /// Materializes the overflow bit into the second projection, when
    /// anything reads it.
    fn overflow_continuation(&self, node: NodeId) -> FlagsContinuation {
        match self.graph.find_projection(node, 1) {
            Some(overflow) => FlagsContinuation::for_set(FlagsCondition::Overflow, overflow),
            None => FlagsContinuation::none(),
        }
    }
}
