// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::{
    backend::{temp_immediate, ArchOpcode, InstructionSelector},
    ir::{Float64BinopMatcher, IrOpcode, NodeId, TruncationMode},
    options::MipsVariant,
    SelectionError,
};

use super::MipsFpRegister;

impl InstructionSelector<'_> {
    pub(crate) fn visit_change_float64_to_int32(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let value = self.input_at(node, 0);

        // Round and convert in one instruction.
        if self.can_cover(node, value) {
            let fused = match self.graph.opcode(value) {
                IrOpcode::Float64RoundDown => Some(ArchOpcode::MipsFloorWD),
                IrOpcode::Float64RoundUp => Some(ArchOpcode::MipsCeilWD),
                IrOpcode::Float64RoundTiesEven => Some(ArchOpcode::MipsRoundWD),
                IrOpcode::Float64RoundTruncate => Some(ArchOpcode::MipsTruncWD),
                _ => None,
            };

            if let Some(opcode) = fused {
                let output = self.define_as_register(node);
                let input = self.use_register(self.input_at(value, 0));
                self.emit(opcode, &[output], &[input], &[])?;
                return Ok(());
            }

            if *self.graph.opcode(value) == IrOpcode::ChangeFloat32ToFloat64 {
                let next = self.input_at(value, 0);

                // The float64 was only widened from a float32: convert the
                // float32 directly, rounding it on the way if possible.
                let (opcode, input) = if self.can_cover(value, next) {
                    match self.graph.opcode(next) {
                        IrOpcode::Float32RoundDown => (ArchOpcode::MipsFloorWS, self.input_at(next, 0)),
                        IrOpcode::Float32RoundUp => (ArchOpcode::MipsCeilWS, self.input_at(next, 0)),
                        IrOpcode::Float32RoundTiesEven => (ArchOpcode::MipsRoundWS, self.input_at(next, 0)),
                        IrOpcode::Float32RoundTruncate => (ArchOpcode::MipsTruncWS, self.input_at(next, 0)),
                        _ => (ArchOpcode::MipsTruncWS, next),
                    }
                } else {
                    (ArchOpcode::MipsTruncWS, next)
                };

                let output = self.define_as_register(node);
                let input = self.use_register(input);
                self.emit(opcode, &[output], &[input], &[])?;
                return Ok(());
            }
        }

        self.visit_rr(node, ArchOpcode::MipsTruncWD)
    }

    pub(crate) fn visit_truncate_float64_to_float32(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let value = self.input_at(node, 0);

        if self.can_cover(node, value) && *self.graph.opcode(value) == IrOpcode::ChangeInt32ToFloat64 {
            let output = self.define_as_register(node);
            let input = self.use_register(self.input_at(value, 0));
            self.emit(ArchOpcode::MipsCvtSW, &[output], &[input], &[])?;
            return Ok(());
        }

        self.visit_rr(node, ArchOpcode::MipsCvtSD)
    }

    pub(crate) fn visit_truncate_float64_to_int32(&mut self, node: NodeId, mode: TruncationMode) -> Result<(), SelectionError> {
        match mode {
            TruncationMode::JavaScript => self.visit_rr(node, ArchOpcode::ArchTruncateDoubleToI),
            TruncationMode::RoundToZero => self.visit_rr(node, ArchOpcode::MipsTruncWD),
        }
    }

    pub(crate) fn visit_bitcast_int32_to_float32(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let output = self.define_as_register(node);
        let input = self.use_register(self.input_at(node, 0));
        self.emit(ArchOpcode::MipsFloat64InsertLowWord32, &[output], &[temp_immediate(0), input], &[])?;
        Ok(())
    }

    pub(crate) fn visit_float64_sub(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let m = Float64BinopMatcher::new(self.graph, node);

        // -0 - RoundDown(-0 - x) is RoundUp(x).
        if m.left().is_minus_zero()
            && m.right().is_opcode(IrOpcode::Float64RoundDown)
            && self.can_cover(node, m.right().node())
        {
            let round = m.right().node();
            let inner = self.input_at(round, 0);

            if *self.graph.opcode(inner) == IrOpcode::Float64Sub && self.can_cover(round, inner) {
                let minner = Float64BinopMatcher::new(self.graph, inner);
                if minner.left().is_minus_zero() {
                    let output = self.define_as_register(node);
                    let input = self.use_register(minner.right().node());
                    self.emit(ArchOpcode::MipsFloat64RoundUp, &[output], &[input], &[])?;
                    return Ok(());
                }
            }
        }

        self.visit_rrr(node, ArchOpcode::MipsSubD)
    }

    /// Calls into the runtime, using the FP argument registers.
    pub(crate) fn visit_float64_mod(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let output = self.define_as_fixed_fp(node, MipsFpRegister::F0);
        let left = self.use_fixed_fp(self.input_at(node, 0), MipsFpRegister::F12);
        let right = self.use_fixed_fp(self.input_at(node, 1), MipsFpRegister::F14);
        self.emit(ArchOpcode::MipsModD, &[output], &[left, right], &[])?.mark_as_call();
        Ok(())
    }

    pub(crate) fn visit_float_min_max(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<(), SelectionError> {
        let left = self.input_at(node, 0);
        let right = self.input_at(node, 1);

        match self.options.variant {
            MipsVariant::R6 => {
                let output = self.define_as_register(node);
                let left = self.use_unique_register(left);
                let right = self.use_unique_register(right);
                self.emit(opcode, &[output], &[left, right], &[])?;
            }

            // Reversed operands; the result shares its register with the
            // right operand.
            MipsVariant::R2 => {
                let output = self.define_same_as_first(node);
                let right = self.use_register(right);
                let left = self.use_register(left);
                self.emit(opcode, &[output], &[right, left], &[])?;
            }
        }

        Ok(())
    }

    pub(crate) fn visit_float64_insert_word32(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<(), SelectionError> {
        let output = self.define_same_as_first(node);
        let left = self.use_register(self.input_at(node, 0));
        let right = self.use_register(self.input_at(node, 1));
        self.emit(opcode, &[output], &[left, right], &[])?;
        Ok(())
    }
}
