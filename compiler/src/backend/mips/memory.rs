// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::{
    backend::{no_output, temp_immediate, AddressingMode, ArchOpcode, InstructionCode, InstructionOperand, InstructionSelector},
    ir::{LoadRepresentation, MachineRepresentation, NodeId, StoreRepresentation, WriteBarrierKind},
    SelectionError,
};

/// What the write barrier may assume about the stored value, passed in the
/// misc field of `ArchStoreWithWriteBarrier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RecordWriteMode {
    ValueIsMap = 0,
    ValueIsPointer = 1,
    ValueIsAny = 2,
}

const fn unsupported_representation(node: NodeId, representation: MachineRepresentation) -> SelectionError {
    SelectionError::UnsupportedRepresentation { node, representation }
}

impl InstructionSelector<'_> {
    pub(crate) fn visit_load(&mut self, node: NodeId, load: LoadRepresentation) -> Result<(), SelectionError> {
        let opcode = match load.representation {
            MachineRepresentation::Float32 => ArchOpcode::MipsLwc1,
            MachineRepresentation::Float64 => ArchOpcode::MipsLdc1,
            MachineRepresentation::Bit | MachineRepresentation::Word8 => {
                if load.signed { ArchOpcode::MipsLb } else { ArchOpcode::MipsLbu }
            }
            MachineRepresentation::Word16 => {
                if load.signed { ArchOpcode::MipsLh } else { ArchOpcode::MipsLhu }
            }
            MachineRepresentation::Tagged | MachineRepresentation::Word32 => ArchOpcode::MipsLw,
            representation @ (MachineRepresentation::Word64 | MachineRepresentation::Simd128 | MachineRepresentation::None) => {
                return Err(unsupported_representation(node, representation));
            }
        };

        let base = self.input_at(node, 0);
        let index = self.input_at(node, 1);
        let code = InstructionCode::from(opcode).with_addressing_mode(AddressingMode::MRI);

        if self.can_be_immediate(index, opcode) {
            let output = self.define_as_register(node);
            let base = self.use_register(base);
            let index = self.use_immediate(index)?;
            self.emit(code, &[output], &[base, index], &[])?;
        } else {
            let address = self.emit_address(base, index)?;
            let output = self.define_as_register(node);
            self.emit(code, &[output], &[address, temp_immediate(0)], &[])?;
        }

        Ok(())
    }

    pub(crate) fn visit_store(&mut self, node: NodeId, store: StoreRepresentation) -> Result<(), SelectionError> {
        let base = self.input_at(node, 0);
        let index = self.input_at(node, 1);
        let value = self.input_at(node, 2);

        let mode = match store.write_barrier {
            WriteBarrierKind::NoWriteBarrier => None,
            WriteBarrierKind::MapWriteBarrier => Some(RecordWriteMode::ValueIsMap),
            WriteBarrierKind::PointerWriteBarrier => Some(RecordWriteMode::ValueIsPointer),
            WriteBarrierKind::FullWriteBarrier => Some(RecordWriteMode::ValueIsAny),
        };

        if let Some(mode) = mode {
            if store.representation != MachineRepresentation::Tagged {
                return Err(SelectionError::MalformedGraph {
                    node,
                    reason: "schrijfbarrière op een niet-tagged waarde",
                });
            }

            let inputs = [
                self.use_unique_register(base),
                self.use_unique_register(index),
                self.use_unique_register(value),
            ];
            let temps = [self.temp_register(), self.temp_register()];
            let code = InstructionCode::from(ArchOpcode::ArchStoreWithWriteBarrier).with_misc(mode as u32);
            self.emit(code, &[], &inputs, &temps)?;
            return Ok(());
        }

        let opcode = match store.representation {
            MachineRepresentation::Float32 => ArchOpcode::MipsSwc1,
            MachineRepresentation::Float64 => ArchOpcode::MipsSdc1,
            MachineRepresentation::Bit | MachineRepresentation::Word8 => ArchOpcode::MipsSb,
            MachineRepresentation::Word16 => ArchOpcode::MipsSh,
            MachineRepresentation::Tagged | MachineRepresentation::Word32 => ArchOpcode::MipsSw,
            representation @ (MachineRepresentation::Word64 | MachineRepresentation::Simd128 | MachineRepresentation::None) => {
                return Err(unsupported_representation(node, representation));
            }
        };

        let code = InstructionCode::from(opcode).with_addressing_mode(AddressingMode::MRI);

        if self.can_be_immediate(index, opcode) {
            let base = self.use_register(base);
            let index = self.use_immediate(index)?;
            let value = self.use_register(value);
            self.emit(code, &[no_output()], &[base, index, value], &[])?;
        } else {
            let address = self.emit_address(base, index)?;
            let value = self.use_register(value);
            self.emit(code, &[no_output()], &[address, temp_immediate(0), value], &[])?;
        }

        Ok(())
    }

    /// `temp = index + base`, for offsets that don't fit the instruction.
    fn emit_address(&mut self, base: NodeId, index: NodeId) -> Result<InstructionOperand, SelectionError> {
        let address = self.temp_register();
        let index = self.use_register(index);
        let base = self.use_register(base);
        self.emit(ArchOpcode::MipsAdd, &[address], &[index, base], &[])?;
        Ok(address)
    }

    pub(crate) fn visit_checked_load(&mut self, node: NodeId, load: LoadRepresentation) -> Result<(), SelectionError> {
        let opcode = match load.representation {
            MachineRepresentation::Word8 => {
                if load.signed { ArchOpcode::CheckedLoadInt8 } else { ArchOpcode::CheckedLoadUint8 }
            }
            MachineRepresentation::Word16 => {
                if load.signed { ArchOpcode::CheckedLoadInt16 } else { ArchOpcode::CheckedLoadUint16 }
            }
            MachineRepresentation::Word32 => ArchOpcode::CheckedLoadWord32,
            MachineRepresentation::Float32 => ArchOpcode::CheckedLoadFloat32,
            MachineRepresentation::Float64 => ArchOpcode::CheckedLoadFloat64,
            representation => return Err(unsupported_representation(node, representation)),
        };

        let buffer = self.input_at(node, 0);
        let [offset, length] = self.checked_bounds(node, opcode)?;
        let output = self.define_as_register(node);
        let buffer = self.use_register(buffer);

        let code = InstructionCode::from(opcode).with_addressing_mode(AddressingMode::MRI);
        self.emit(code, &[output], &[offset, length, buffer], &[])?;
        Ok(())
    }

    pub(crate) fn visit_checked_store(&mut self, node: NodeId, representation: MachineRepresentation) -> Result<(), SelectionError> {
        let opcode = match representation {
            MachineRepresentation::Word8 => ArchOpcode::CheckedStoreWord8,
            MachineRepresentation::Word16 => ArchOpcode::CheckedStoreWord16,
            MachineRepresentation::Word32 => ArchOpcode::CheckedStoreWord32,
            MachineRepresentation::Float32 => ArchOpcode::CheckedStoreFloat32,
            MachineRepresentation::Float64 => ArchOpcode::CheckedStoreFloat64,
            representation => return Err(unsupported_representation(node, representation)),
        };

        let buffer = self.input_at(node, 0);
        let value = self.input_at(node, 3);
        let [offset, length] = self.checked_bounds(node, opcode)?;
        let value = self.use_register(value);
        let buffer = self.use_register(buffer);

        let code = InstructionCode::from(opcode).with_addressing_mode(AddressingMode::MRI);
        self.emit(code, &[no_output()], &[offset, length, value, buffer], &[])?;
        Ok(())
    }

    /// Offset and length operands of a bounds-checked access. At most one of
    /// them is an immediate, the offset taking precedence.
    fn checked_bounds(&mut self, node: NodeId, opcode: ArchOpcode) -> Result<[InstructionOperand; 2], SelectionError> {
        let offset = self.input_at(node, 1);
        let length = self.input_at(node, 2);

        if self.can_be_immediate(offset, opcode) {
            let offset = self.use_immediate(offset)?;
            let length = self.use_register(length);
            Ok([offset, length])
        } else {
            let offset = self.use_register(offset);
            let length = self.use_operand(length, opcode)?;
            Ok([offset, length])
        }
    }
}
