// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use smallvec::SmallVec;

use crate::{
    backend::{no_output, temp_immediate, ArchOpcode, InstructionCode, InstructionOperand, InstructionSelector},
    ir::{CallDescriptor, CallKind, IrOpcode, NodeId},
    SelectionError,
};

use super::MipsRegister;

/// Stack slots reserved for the register arguments of a C call.
const C_ARGUMENT_SLOT_COUNT: usize = 4;

const POINTER_SIZE_LOG2: usize = 2;

impl InstructionSelector<'_> {
    /// Input 0 is the callee, the remaining inputs are the arguments.
    pub(crate) fn visit_call(&mut self, node: NodeId, descriptor: &CallDescriptor) -> Result<(), SelectionError> {
        let inputs = self.graph.node(node).inputs();
        let callee = inputs[0];
        let arguments: SmallVec<[NodeId; 8]> = inputs[1..].iter().copied().collect();

        let register_count = descriptor.register_parameter_count(arguments.len());
        let (register_arguments, stack_arguments) = arguments.split_at(register_count);

        self.emit_prepare_arguments(stack_arguments, descriptor, arguments.len())?;

        let mut call_inputs: SmallVec<[InstructionOperand; 8]> = SmallVec::new();
        call_inputs.push(if matches!(self.graph.opcode(callee), IrOpcode::Int32Constant(..)) {
            self.use_immediate(callee)?
        } else {
            self.use_register(callee)
        });

        for (argument, register) in register_arguments.iter().zip(MipsRegister::ARGUMENTS) {
            call_inputs.push(self.use_fixed(*argument, register));
        }

        let output = if descriptor.returns_value {
            self.define_as_fixed(node, MipsRegister::V0)
        } else {
            no_output()
        };

        let code = match descriptor.kind {
            CallKind::CFunction => InstructionCode::from(ArchOpcode::ArchCallCFunction).with_misc(arguments.len() as u32),
            CallKind::CodeObject => InstructionCode::from(ArchOpcode::ArchCallCodeObject),
        };

        self.emit(code, &[output], &call_inputs, &[])?.mark_as_call();
        Ok(())
    }

    /// Stores the arguments that don't fit in registers. C calls skip the
    /// home slots of `a0..a3`; other calls claim their stack area first.
    fn emit_prepare_arguments(
        &mut self,
        stack_arguments: &[NodeId],
        descriptor: &CallDescriptor,
        parameter_count: usize,
    ) -> Result<(), SelectionError> {
        if descriptor.is_c_function_call() {
            let code = InstructionCode::from(ArchOpcode::ArchPrepareCallCFunction).with_misc(parameter_count as u32);
            self.emit(code, &[], &[], &[])?;

            for (index, argument) in stack_arguments.iter().enumerate() {
                let slot = C_ARGUMENT_SLOT_COUNT + index;
                let input = self.use_register(*argument);
                self.emit(ArchOpcode::MipsStoreToStackSlot, &[no_output()], &[input, temp_immediate((slot << POINTER_SIZE_LOG2) as i32)], &[])?;
            }
        } else {
            if !stack_arguments.is_empty() {
                let size = stack_arguments.len() << POINTER_SIZE_LOG2;
                self.emit(ArchOpcode::MipsStackClaim, &[no_output()], &[temp_immediate(size as i32)], &[])?;
            }

            for (index, argument) in stack_arguments.iter().enumerate() {
                let input = self.use_register(*argument);
                self.emit(ArchOpcode::MipsStoreToStackSlot, &[no_output()], &[input, temp_immediate((index << POINTER_SIZE_LOG2) as i32)], &[])?;
            }
        }

        Ok(())
    }
}
