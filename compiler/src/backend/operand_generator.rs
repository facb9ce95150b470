// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::{
    ir::{BlockId, IrOpcode, NodeId},
    SelectionError,
};

use super::{
    mips::{MipsFpRegister, MipsRegister},
    Constant, InstructionOperand, InstructionSelector, UnallocatedPolicy, VirtualRegister,
};

#[must_use]
pub const fn temp_immediate(value: i32) -> InstructionOperand {
    InstructionOperand::Immediate(Constant::Int32(value))
}

#[must_use]
pub const fn label(block: BlockId) -> InstructionOperand {
    InstructionOperand::Label(block)
}

#[must_use]
pub const fn no_output() -> InstructionOperand {
    InstructionOperand::None
}

impl InstructionSelector<'_> {
    /// The virtual register of a node, allocated on first request.
    pub(super) fn virtual_register(&mut self, node: NodeId) -> VirtualRegister {
        if let Some(vreg) = self.virtual_registers[node.index()] {
            return vreg;
        }

        let vreg = self.sequence.next_virtual_register();
        self.virtual_registers[node.index()] = Some(vreg);
        vreg
    }

    /// Nodes with side effects are always used.
    #[must_use]
    pub(super) fn is_used(&self, node: NodeId) -> bool {
        self.graph.opcode(node).has_side_effects() || self.used[node.index()]
    }

    #[must_use]
    pub(super) fn is_defined(&self, node: NodeId) -> bool {
        self.defined[node.index()]
    }

    pub(super) fn mark_as_used(&mut self, node: NodeId) {
        self.used[node.index()] = true;
    }

    pub(super) fn mark_as_defined(&mut self, node: NodeId) {
        self.defined[node.index()] = true;
    }

    fn unallocated_use(&mut self, node: NodeId, policy: UnallocatedPolicy) -> InstructionOperand {
        self.mark_as_used(node);
        let vreg = self.virtual_register(node);
        InstructionOperand::Unallocated { vreg, policy }
    }

    fn unallocated_define(&mut self, node: NodeId, policy: UnallocatedPolicy) -> InstructionOperand {
        self.mark_as_defined(node);
        let vreg = self.virtual_register(node);
        InstructionOperand::Unallocated { vreg, policy }
    }

    pub(super) fn use_register(&mut self, node: NodeId) -> InstructionOperand {
        self.unallocated_use(node, UnallocatedPolicy::MustHaveRegister)
    }

    /// A register that is guaranteed not to be reused for an output of the
    /// same instruction.
    pub(super) fn use_unique_register(&mut self, node: NodeId) -> InstructionOperand {
        self.unallocated_use(node, UnallocatedPolicy::UniqueRegister)
    }

    pub(super) fn use_any(&mut self, node: NodeId) -> InstructionOperand {
        self.unallocated_use(node, UnallocatedPolicy::Any)
    }

    pub(super) fn use_fixed(&mut self, node: NodeId, register: MipsRegister) -> InstructionOperand {
        self.unallocated_use(node, UnallocatedPolicy::FixedRegister(register))
    }

    pub(super) fn use_fixed_fp(&mut self, node: NodeId, register: MipsFpRegister) -> InstructionOperand {
        self.unallocated_use(node, UnallocatedPolicy::FixedFpRegister(register))
    }

    /// The constant value of the node, inlined into the instruction. The
    /// node itself is not marked as used.
    pub(super) fn use_immediate(&self, node: NodeId) -> Result<InstructionOperand, SelectionError> {
        Ok(InstructionOperand::Immediate(self.to_constant(node)?))
    }

    pub(super) fn define_as_register(&mut self, node: NodeId) -> InstructionOperand {
        self.unallocated_define(node, UnallocatedPolicy::MustHaveRegister)
    }

    pub(super) fn define_same_as_first(&mut self, node: NodeId) -> InstructionOperand {
        self.unallocated_define(node, UnallocatedPolicy::SameAsFirstInput)
    }

    pub(super) fn define_as_fixed(&mut self, node: NodeId, register: MipsRegister) -> InstructionOperand {
        self.unallocated_define(node, UnallocatedPolicy::FixedRegister(register))
    }

    pub(super) fn define_as_fixed_fp(&mut self, node: NodeId, register: MipsFpRegister) -> InstructionOperand {
        self.unallocated_define(node, UnallocatedPolicy::FixedFpRegister(register))
    }

    pub(super) fn define_as_constant(&mut self, node: NodeId) -> Result<InstructionOperand, SelectionError> {
        let constant = self.to_constant(node)?;
        self.mark_as_defined(node);

        let vreg = self.virtual_register(node);
        self.sequence.add_constant(vreg, constant);
        Ok(InstructionOperand::Constant(vreg))
    }

    pub(super) fn define_as_stack_slot(&mut self, node: NodeId, slot: i32) -> InstructionOperand {
        self.mark_as_defined(node);
        let vreg = self.virtual_register(node);
        InstructionOperand::StackSlot { vreg, slot }
    }

    pub(super) fn temp_register(&mut self) -> InstructionOperand {
        InstructionOperand::Unallocated {
            vreg: self.sequence.next_virtual_register(),
            policy: UnallocatedPolicy::MustHaveRegister,
        }
    }

    pub(super) fn to_constant(&self, node: NodeId) -> Result<Constant, SelectionError> {
        match self.graph.opcode(node) {
            IrOpcode::Int32Constant(value) => Ok(Constant::Int32(*value)),
            IrOpcode::Float32Constant(value) => Ok(Constant::Float32(*value)),
            IrOpcode::Float64Constant(value) => Ok(Constant::Float64(*value)),
            IrOpcode::Int64Constant(..) => Err(SelectionError::UnsupportedOperation {
                node,
                opcode: "Int64Constant",
            }),
            _ => Err(SelectionError::MalformedGraph {
                node,
                reason: "verwachtte een constante",
            }),
        }
    }
}
