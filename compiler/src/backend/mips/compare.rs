// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::{
    backend::{temp_immediate, ArchOpcode, FlagsCondition, FlagsContinuation, InstructionOperand, InstructionSelector},
    ir::{Float32BinopMatcher, Float64BinopMatcher, Int32BinopMatcher, IrOpcode, NodeId},
    SelectionError,
};

impl InstructionSelector<'_> {
    fn visit_compare(
        &mut self,
        opcode: ArchOpcode,
        left: InstructionOperand,
        right: InstructionOperand,
        cont: &FlagsContinuation,
    ) -> Result<(), SelectionError> {
        self.emit_with_continuation(opcode, &[], &[left, right], cont)
    }

    /// A literal zero is compared as an immediate.
    fn float_compare_operand(&mut self, node: NodeId, is_zero: bool) -> Result<InstructionOperand, SelectionError> {
        if is_zero {
            self.use_immediate(node)
        } else {
            Ok(self.use_register(node))
        }
    }

    fn visit_float32_compare(&mut self, node: NodeId, cont: &FlagsContinuation) -> Result<(), SelectionError> {
        let m = Float32BinopMatcher::new(self.graph, node);
        let left = self.float_compare_operand(m.left().node(), m.left().is_zero())?;
        let right = self.float_compare_operand(m.right().node(), m.right().is_zero())?;
        self.visit_compare(ArchOpcode::MipsCmpS, left, right, cont)
    }

    fn visit_float64_compare(&mut self, node: NodeId, cont: &FlagsContinuation) -> Result<(), SelectionError> {
        let m = Float64BinopMatcher::new(self.graph, node);
        let left = self.float_compare_operand(m.left().node(), m.left().is_zero())?;
        let right = self.float_compare_operand(m.right().node(), m.right().is_zero())?;
        self.visit_compare(ArchOpcode::MipsCmpD, left, right, cont)
    }

    /// Compares the two inputs of `node`, taking an immediate on either
    /// side when the condition allows one.
    fn visit_word_compare(
        &mut self,
        node: NodeId,
        opcode: ArchOpcode,
        cont: &mut FlagsContinuation,
        commutative: bool,
    ) -> Result<(), SelectionError> {
        let left = self.input_at(node, 0);
        let right = self.input_at(node, 1);

        let (register, immediate) = if self.can_be_immediate(right, opcode) {
            (left, right)
        } else if self.can_be_immediate(left, opcode) {
            if !commutative {
                cont.commute();
            }
            (right, left)
        } else {
            let left = self.use_register(left);
            let right = self.use_register(right);
            return self.visit_compare(opcode, left, right, cont);
        };

        let use_immediate = match cont.condition() {
            FlagsCondition::Equal | FlagsCondition::NotEqual => cont.is_set(),
            FlagsCondition::SignedLessThan
            | FlagsCondition::SignedGreaterThanOrEqual
            | FlagsCondition::UnsignedLessThan
            | FlagsCondition::UnsignedGreaterThanOrEqual => true,
            _ => false,
        };

        let register = self.use_register(register);
        let immediate = if use_immediate {
            self.use_immediate(immediate)?
        } else {
            self.use_register(immediate)
        };

        self.visit_compare(opcode, register, immediate, cont)
    }

    /// Tests `value` against zero, folding covered compares, negations and
    /// overflow checks into the continuation.
    pub(crate) fn visit_word_compare_zero(
        &mut self,
        mut user: NodeId,
        mut value: NodeId,
        cont: &mut FlagsContinuation,
    ) -> Result<(), SelectionError> {
        while self.can_cover(user, value) {
            match *self.graph.opcode(value) {
                IrOpcode::Word32Equal => {
                    // (x == 0) inverts the test.
                    let m = Int32BinopMatcher::new(self.graph, value);
                    if m.right().is_zero() {
                        user = value;
                        value = m.left().node();
                        cont.negate();
                        continue;
                    }

                    cont.overwrite_and_negate_if_equal(FlagsCondition::Equal);
                    return self.visit_word_compare(value, ArchOpcode::MipsCmp, cont, false);
                }

                IrOpcode::Int32LessThan => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::SignedLessThan);
                    return self.visit_word_compare(value, ArchOpcode::MipsCmp, cont, false);
                }

                IrOpcode::Int32LessThanOrEqual => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::SignedLessThanOrEqual);
                    return self.visit_word_compare(value, ArchOpcode::MipsCmp, cont, false);
                }

                IrOpcode::Uint32LessThan => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::UnsignedLessThan);
                    return self.visit_word_compare(value, ArchOpcode::MipsCmp, cont, false);
                }

                IrOpcode::Uint32LessThanOrEqual => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::UnsignedLessThanOrEqual);
                    return self.visit_word_compare(value, ArchOpcode::MipsCmp, cont, false);
                }

                IrOpcode::Float32Equal => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::Equal);
                    return self.visit_float32_compare(value, cont);
                }

                IrOpcode::Float32LessThan => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::UnsignedLessThan);
                    return self.visit_float32_compare(value, cont);
                }

                IrOpcode::Float32LessThanOrEqual => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::UnsignedLessThanOrEqual);
                    return self.visit_float32_compare(value, cont);
                }

                IrOpcode::Float64Equal => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::Equal);
                    return self.visit_float64_compare(value, cont);
                }

                IrOpcode::Float64LessThan => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::UnsignedLessThan);
                    return self.visit_float64_compare(value, cont);
                }

                IrOpcode::Float64LessThanOrEqual => {
                    cont.overwrite_and_negate_if_equal(FlagsCondition::UnsignedLessThanOrEqual);
                    return self.visit_float64_compare(value, cont);
                }

                IrOpcode::Projection(1) => {
                    // The overflow bit can only feed the test directly when the
                    // value projection is unused or already selected, i.e.
                    // scheduled after this test.
                    let operation = self.input_at(value, 0);
                    let result = self.graph.find_projection(operation, 0);

                    if result.map_or(true, |result| self.is_defined(result)) {
                        let opcode = match self.graph.opcode(operation) {
                            IrOpcode::Int32AddWithOverflow => Some(ArchOpcode::MipsAddOvf),
                            IrOpcode::Int32SubWithOverflow => Some(ArchOpcode::MipsSubOvf),
                            _ => None,
                        };

                        if let Some(opcode) = opcode {
                            cont.overwrite_and_negate_if_equal(FlagsCondition::Overflow);
                            return self.visit_binop_with_continuation(operation, opcode, cont);
                        }
                    }
                }

                IrOpcode::Word32And => {
                    return self.visit_word_compare(value, ArchOpcode::MipsTst, cont, true);
                }

                _ => (),
            }

            break;
        }

        let input = self.use_register(value);
        self.emit_with_continuation(ArchOpcode::MipsCmp, &[], &[input, temp_immediate(0)], cont)
    }

    pub(crate) fn visit_word32_equal(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_set(FlagsCondition::Equal, node);
        let m = Int32BinopMatcher::new(self.graph, node);

        if m.right().is_zero() {
            return self.visit_word_compare_zero(node, m.left().node(), &mut cont);
        }

        self.visit_word_compare(node, ArchOpcode::MipsCmp, &mut cont, false)
    }

    pub(crate) fn visit_int32_less_than(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_set(FlagsCondition::SignedLessThan, node);
        self.visit_word_compare(node, ArchOpcode::MipsCmp, &mut cont, false)
    }

    pub(crate) fn visit_int32_less_than_or_equal(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_set(FlagsCondition::SignedLessThanOrEqual, node);
        self.visit_word_compare(node, ArchOpcode::MipsCmp, &mut cont, false)
    }

    pub(crate) fn visit_uint32_less_than(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_set(FlagsCondition::UnsignedLessThan, node);
        self.visit_word_compare(node, ArchOpcode::MipsCmp, &mut cont, false)
    }

    pub(crate) fn visit_uint32_less_than_or_equal(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_set(FlagsCondition::UnsignedLessThanOrEqual, node);
        self.visit_word_compare(node, ArchOpcode::MipsCmp, &mut cont, false)
    }

    pub(crate) fn visit_float32_equal(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let cont = FlagsContinuation::for_set(FlagsCondition::Equal, node);
        self.visit_float32_compare(node, &cont)
    }

    pub(crate) fn visit_float32_less_than(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let cont = FlagsContinuation::for_set(FlagsCondition::UnsignedLessThan, node);
        self.visit_float32_compare(node, &cont)
    }

    pub(crate) fn visit_float32_less_than_or_equal(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let cont = FlagsContinuation::for_set(FlagsCondition::UnsignedLessThanOrEqual, node);
        self.visit_float32_compare(node, &cont)
    }

    pub(crate) fn visit_float64_equal(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let cont = FlagsContinuation::for_set(FlagsCondition::Equal, node);
        self.visit_float64_compare(node, &cont)
    }

    pub(crate) fn visit_float64_less_than(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let cont = FlagsContinuation::for_set(FlagsCondition::UnsignedLessThan, node);
        self.visit_float64_compare(node, &cont)
    }

    pub(crate) fn visit_float64_less_than_or_equal(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let cont = FlagsContinuation::for_set(FlagsCondition::UnsignedLessThanOrEqual, node);
        self.visit_float64_compare(node, &cont)
    }
}
