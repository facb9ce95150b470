// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::{
    backend::{temp_immediate, ArchOpcode, InstructionOperand, InstructionSelector},
    bits::is_low_contiguous_mask,
    ir::{Int32BinopMatcher, Int32Matcher, IrOpcode, NodeId},
    SelectionError,
};

impl InstructionSelector<'_> {
    pub(crate) fn visit_word32_and(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let m = Int32BinopMatcher::new(self.graph, node);

        // And(Shr(x, imm), mask) with the mask in the least-significant bits.
        if m.left().is_opcode(IrOpcode::Word32Shr) && self.can_cover(node, m.left().node()) {
            if let Some(mask) = m.right().value().map(|mask| mask as u32).filter(|mask| is_low_contiguous_mask(*mask)) {
                let mleft = Int32BinopMatcher::new(self.graph, m.left().node());

                if let Some(shift) = mleft.right().value() {
                    // Int32 shifts only look at the low five bits.
                    let lsb = shift as u32 & 0x1f;

                    // Ext cannot read past the top of the register, but the
                    // shift already brought in zeros there.
                    let width = mask.count_ones().min(32 - lsb);

                    let output = self.define_as_register(node);
                    let input = self.use_register(mleft.left().node());
                    self.emit(ArchOpcode::MipsExt, &[output], &[input, temp_immediate(lsb as i32), temp_immediate(width as i32)], &[])?;
                    return Ok(());
                }
            }
        }

        // x & ~(2^k - 1): clear the low bits instead of loading the mask.
        if let Some(mask) = m.right().value() {
            let inverted = !(mask as u32);
            let shift = inverted.count_ones();

            if shift != 0 && shift != 32 && inverted.leading_zeros() + shift == 32 {
                let output = self.define_same_as_first(node);
                let input = self.use_register(m.left().node());
                self.emit(ArchOpcode::MipsIns, &[output], &[input, temp_immediate(0), temp_immediate(shift as i32)], &[])?;
                return Ok(());
            }
        }

        self.visit_binop(node, ArchOpcode::MipsAnd)
    }

    pub(crate) fn visit_word32_xor(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let m = Int32BinopMatcher::new(self.graph, node);

        if m.left().is_opcode(IrOpcode::Word32Or) && self.can_cover(node, m.left().node()) && m.right().is(-1) {
            let mleft = Int32BinopMatcher::new(self.graph, m.left().node());

            if !mleft.right().has_value() {
                let output = self.define_as_register(node);
                let left = self.use_register(mleft.left().node());
                let right = self.use_register(mleft.right().node());
                self.emit(ArchOpcode::MipsNor, &[output], &[left, right], &[])?;
                return Ok(());
            }
        }

        // Bitwise not.
        if m.right().is(-1) {
            let output = self.define_as_register(node);
            let input = self.use_register(m.left().node());
            self.emit(ArchOpcode::MipsNor, &[output], &[input, temp_immediate(0)], &[])?;
            return Ok(());
        }

        self.visit_binop(node, ArchOpcode::MipsXor)
    }

    pub(crate) fn visit_word32_shl(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let m = Int32BinopMatcher::new(self.graph, node);

        // Shl(And(x, mask), imm) where the mask reaches past the top bit once
        // shifted: the And is redundant.
        if m.left().is_opcode(IrOpcode::Word32And) && self.can_cover(node, m.left().node()) && m.right().is_in_range(1, 31) {
            let mleft = Int32BinopMatcher::new(self.graph, m.left().node());

            if let (Some(mask), Some(shift)) = (mleft.right().value(), m.right().value()) {
                let mask = mask as u32;
                if is_low_contiguous_mask(mask) && shift as u32 + mask.count_ones() >= 32 {
                    let output = self.define_as_register(node);
                    let input = self.use_register(mleft.left().node());
                    let shift = self.use_immediate(m.right().node())?;
                    self.emit(ArchOpcode::MipsShl, &[output], &[input, shift], &[])?;
                    return Ok(());
                }
            }
        }

        self.visit_rro(node, ArchOpcode::MipsShl)
    }

    pub(crate) fn visit_word32_shr(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let m = Int32BinopMatcher::new(self.graph, node);

        // Shr(And(x, mask), imm) where the shifted mask lands in the
        // least-significant bits.
        if m.left().is_opcode(IrOpcode::Word32And) {
            if let Some(shift) = m.right().value() {
                let lsb = shift as u32 & 0x1f;
                let mleft = Int32BinopMatcher::new(self.graph, m.left().node());

                if let Some(mask) = mleft.right().value() {
                    let mask = ((mask as u32) >> lsb) << lsb;
                    let width = mask.count_ones();

                    if mask.leading_zeros() + width + lsb == 32 {
                        let output = self.define_as_register(node);
                        let input = self.use_register(mleft.left().node());
                        self.emit(ArchOpcode::MipsExt, &[output], &[input, temp_immediate(lsb as i32), temp_immediate(width as i32)], &[])?;
                        return Ok(());
                    }
                }
            }
        }

        self.visit_rro(node, ArchOpcode::MipsShr)
    }

    /// Outputs of a pair operation: the low word on the node itself, the
    /// high word on its second projection.
    fn pair_outputs(&mut self, node: NodeId) -> [InstructionOperand; 2] {
        let low = self.define_as_register(node);
        let high = match self.graph.find_projection(node, 1) {
            Some(projection) => self.define_as_register(projection),
            None => self.temp_register(),
        };
        [low, high]
    }

    pub(crate) fn visit_int32_pair_binop(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<(), SelectionError> {
        // Unique registers: the outputs may not share with any input.
        let inputs = [
            self.use_unique_register(self.input_at(node, 0)),
            self.use_unique_register(self.input_at(node, 1)),
            self.use_unique_register(self.input_at(node, 2)),
            self.use_unique_register(self.input_at(node, 3)),
        ];

        let outputs = self.pair_outputs(node);
        self.emit(opcode, &outputs, &inputs, &[])?;
        Ok(())
    }

    pub(crate) fn visit_word32_pair_shift(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<(), SelectionError> {
        let shift = self.input_at(node, 2);
        let shift = if Int32Matcher::new(self.graph, shift).has_value() {
            self.use_immediate(shift)?
        } else {
            self.use_unique_register(shift)
        };

        let inputs = [
            self.use_unique_register(self.input_at(node, 0)),
            self.use_unique_register(self.input_at(node, 1)),
            shift,
        ];

        let outputs = self.pair_outputs(node);
        self.emit(opcode, &outputs, &inputs, &[])?;
        Ok(())
    }
}
