// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::mem::take;

use log::{debug, trace};
use smallvec::SmallVec;

use crate::{
    ir::{BlockControl, BlockId, CoverOracle, Graph, IrOpcode, NodeId, Schedule},
    SelectionError,
    SelectorOptions,
};

use super::{
    label,
    mips::{MipsFpRegister, MipsRegister},
    temp_immediate, ArchOpcode, ContinuationKind, FlagsCondition, FlagsContinuation, Instruction, InstructionCode,
    InstructionOperand, InstructionSequence, OperandList, PhiInstruction, VirtualRegister,
};

/// Lowers a scheduled graph to MIPS32 instructions.
///
/// Blocks are visited last to first and the nodes within a block bottom-up,
/// so that a consumer is always seen before its producers and may cover
/// them. Instructions are generated top-down for each node and reversed
/// afterwards; the final sequence is in program order.
pub fn select_instructions(
    graph: &Graph,
    schedule: &Schedule,
    cover: &impl CoverOracle,
    options: &SelectorOptions,
) -> Result<InstructionSequence, SelectionError> {
    let mut selector = InstructionSelector::new(graph, schedule, cover, options);
    selector.select()?;
    selector.dump_instructions();
    Ok(selector.sequence)
}

pub struct InstructionSelector<'a> {
    pub(super) graph: &'a Graph,
    pub(super) schedule: &'a Schedule,
    pub(super) cover: &'a dyn CoverOracle,
    pub(super) options: &'a SelectorOptions,
    pub(super) sequence: InstructionSequence,

    instructions: Vec<Instruction>,
    pub(super) defined: Vec<bool>,
    pub(super) used: Vec<bool>,
    pub(super) virtual_registers: Vec<Option<VirtualRegister>>,
    phis: Vec<Vec<PhiInstruction>>,
    current_block: BlockId,
}

impl<'a> InstructionSelector<'a> {
    #[must_use]
    fn new(graph: &'a Graph, schedule: &'a Schedule, cover: &'a dyn CoverOracle, options: &'a SelectorOptions) -> Self {
        Self {
            graph,
            schedule,
            cover,
            options,
            sequence: InstructionSequence::new(),
            instructions: Vec::new(),
            defined: vec![false; graph.len()],
            used: vec![false; graph.len()],
            virtual_registers: vec![None; graph.len()],
            phis: vec![Vec::new(); schedule.blocks().len()],
            current_block: BlockId::new(0),
        }
    }

    fn select(&mut self) -> Result<(), SelectionError> {
        debug!("Instructies selecteren voor {} blokken met {} knopen...", self.schedule.blocks().len(), self.graph.len());

        self.validate()?;

        for block in self.schedule.blocks() {
            for node in block.nodes() {
                if *self.graph.opcode(*node) == IrOpcode::Phi {
                    for input in self.graph.node(*node).inputs() {
                        self.mark_as_used(*input);
                    }
                }
            }
        }

        let mut ranges = vec![(0, 0); self.schedule.blocks().len()];
        for block in self.schedule.block_ids().rev() {
            ranges[block.index()] = self.visit_block(block)?;
        }

        let mut instructions: Vec<Option<Instruction>> = take(&mut self.instructions).into_iter().map(Some).collect();
        for block in self.schedule.block_ids() {
            self.sequence.start_block(block, take(&mut self.phis[block.index()]));

            let (start, end) = ranges[block.index()];
            for index in (end..start).rev() {
                if let Some(instruction) = instructions[index].take() {
                    self.sequence.add_instruction(instruction);
                }
            }
        }

        Ok(())
    }

    /// Checks every scheduled node and, transitively, every node the
    /// matchers may look at through their inputs.
    fn validate(&self) -> Result<(), SelectionError> {
        let mut visited = vec![false; self.graph.len()];
        let mut worklist: Vec<NodeId> = Vec::new();

        for block in self.schedule.blocks() {
            worklist.extend(block.nodes().iter().copied().chain(block.control_node()));

            if let BlockControl::Switch { value, .. } | BlockControl::Return(value) = block.control() {
                worklist.push(*value);
            }
        }

        while let Some(node) = worklist.pop() {
            let Some(data) = self.graph.get(node) else {
                return Err(SelectionError::MalformedGraph { node, reason: "knoop bestaat niet in de graaf" });
            };

            if std::mem::replace(&mut visited[node.index()], true) {
                continue;
            }

            if data.input_count() < data.opcode().min_input_count() {
                return Err(SelectionError::MalformedGraph { node, reason: "te weinig invoerwaarden" });
            }

            if data.inputs().iter().any(|input| input.index() >= self.graph.len()) {
                return Err(SelectionError::MalformedGraph { node, reason: "invoerwaarde bestaat niet" });
            }

            worklist.extend(data.inputs().iter().copied());
        }

        Ok(())
    }

    /// Returns the range of `instructions` holding this block, as
    /// `(start, end)` with `start >= end`: the block's code is stored
    /// backwards.
    fn visit_block(&mut self, block: BlockId) -> Result<(usize, usize), SelectionError> {
        self.current_block = block;
        let current_block_end = self.instructions.len();

        self.visit_control(block)?;
        self.instructions[current_block_end..].reverse();

        for node in self.schedule.block(block).nodes().iter().rev().copied() {
            if !self.is_used(node) || self.is_defined(node) {
                continue;
            }

            let current_node_end = self.instructions.len();
            self.visit_node(node)?;
            self.instructions[current_node_end..].reverse();
        }

        Ok((self.instructions.len(), current_block_end))
    }

    fn visit_control(&mut self, block: BlockId) -> Result<(), SelectionError> {
        match self.schedule.block(block).control() {
            BlockControl::None => Ok(()),

            BlockControl::Goto(target) => self.visit_goto(*target),

            BlockControl::Branch { branch, if_true, if_false } => {
                if if_true == if_false {
                    self.visit_goto(*if_true)
                } else {
                    self.visit_branch(*branch, *if_true, *if_false)
                }
            }

            BlockControl::Switch { value, cases, default } => {
                let info = SwitchInfo::new(cases.clone(), *default);
                self.visit_switch(*value, &info)
            }

            BlockControl::Return(value) => self.visit_return(*value),
        }
    }

    fn visit_node(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let opcode = *self.graph.opcode(node);

        if let Some(representation) = opcode.float_representation() {
            let vreg = self.virtual_register(node);
            self.sequence.mark_representation(vreg, representation);
        }

        match opcode {
            IrOpcode::Int32Constant(..) | IrOpcode::Float32Constant(..) | IrOpcode::Float64Constant(..) => self.visit_constant(node),
            IrOpcode::Parameter(index) => self.visit_parameter(node, index),
            IrOpcode::Phi => {
                self.visit_phi(node);
                Ok(())
            }
            IrOpcode::Projection(index) => self.visit_projection(node, index),
            IrOpcode::Call(descriptor) => self.visit_call(node, &descriptor),
            IrOpcode::DeoptimizeIf => self.visit_deoptimize_if(node),
            IrOpcode::DeoptimizeUnless => self.visit_deoptimize_unless(node),
            IrOpcode::TrapIf(trap_id) => self.visit_trap_if(node, trap_id),
            IrOpcode::TrapUnless(trap_id) => self.visit_trap_unless(node, trap_id),

            IrOpcode::Word32And => self.visit_word32_and(node),
            IrOpcode::Word32Or => self.visit_binop(node, ArchOpcode::MipsOr),
            IrOpcode::Word32Xor => self.visit_word32_xor(node),
            IrOpcode::Word32Shl => self.visit_word32_shl(node),
            IrOpcode::Word32Shr => self.visit_word32_shr(node),
            IrOpcode::Word32Sar => self.visit_rro(node, ArchOpcode::MipsSar),
            IrOpcode::Word32Ror => self.visit_rro(node, ArchOpcode::MipsRor),
            IrOpcode::Word32Clz => self.visit_rr(node, ArchOpcode::MipsClz),
            IrOpcode::Word32Ctz => self.visit_rr(node, ArchOpcode::MipsCtz),
            IrOpcode::Word32Popcnt => self.visit_rr(node, ArchOpcode::MipsPopcnt),
            IrOpcode::Word32Equal => self.visit_word32_equal(node),

            IrOpcode::Int32Add => self.visit_int32_add(node),
            IrOpcode::Int32AddWithOverflow => self.visit_int32_add_with_overflow(node),
            IrOpcode::Int32Sub => self.visit_binop(node, ArchOpcode::MipsSub),
            IrOpcode::Int32SubWithOverflow => self.visit_int32_sub_with_overflow(node),
            IrOpcode::Int32Mul => self.visit_int32_mul(node),
            IrOpcode::Int32MulHigh => self.visit_rrr(node, ArchOpcode::MipsMulHigh),
            IrOpcode::Uint32MulHigh => self.visit_rrr(node, ArchOpcode::MipsMulHighU),
            IrOpcode::Int32Div => self.visit_division(node, ArchOpcode::MipsDiv),
            IrOpcode::Uint32Div => self.visit_division(node, ArchOpcode::MipsDivU),
            IrOpcode::Int32Mod => self.visit_rrr(node, ArchOpcode::MipsMod),
            IrOpcode::Uint32Mod => self.visit_rrr(node, ArchOpcode::MipsModU),
            IrOpcode::Int32LessThan => self.visit_int32_less_than(node),
            IrOpcode::Int32LessThanOrEqual => self.visit_int32_less_than_or_equal(node),
            IrOpcode::Uint32LessThan => self.visit_uint32_less_than(node),
            IrOpcode::Uint32LessThanOrEqual => self.visit_uint32_less_than_or_equal(node),

            IrOpcode::Int32PairAdd => self.visit_int32_pair_binop(node, ArchOpcode::MipsAddPair),
            IrOpcode::Int32PairSub => self.visit_int32_pair_binop(node, ArchOpcode::MipsSubPair),
            IrOpcode::Int32PairMul => self.visit_int32_pair_binop(node, ArchOpcode::MipsMulPair),
            IrOpcode::Word32PairShl => self.visit_word32_pair_shift(node, ArchOpcode::MipsShlPair),
            IrOpcode::Word32PairShr => self.visit_word32_pair_shift(node, ArchOpcode::MipsShrPair),
            IrOpcode::Word32PairSar => self.visit_word32_pair_shift(node, ArchOpcode::MipsSarPair),

            IrOpcode::ChangeFloat32ToFloat64 => self.visit_rr(node, ArchOpcode::MipsCvtDS),
            IrOpcode::RoundInt32ToFloat32 => self.visit_rr(node, ArchOpcode::MipsCvtSW),
            IrOpcode::RoundUint32ToFloat32 => self.visit_rr(node, ArchOpcode::MipsCvtSUw),
            IrOpcode::ChangeInt32ToFloat64 => self.visit_rr(node, ArchOpcode::MipsCvtDW),
            IrOpcode::ChangeUint32ToFloat64 => self.visit_rr(node, ArchOpcode::MipsCvtDUw),
            IrOpcode::TruncateFloat32ToInt32 => self.visit_rr(node, ArchOpcode::MipsTruncWS),
            IrOpcode::TruncateFloat32ToUint32 => self.visit_rr(node, ArchOpcode::MipsTruncUwS),
            IrOpcode::ChangeFloat64ToInt32 => self.visit_change_float64_to_int32(node),
            IrOpcode::ChangeFloat64ToUint32 | IrOpcode::TruncateFloat64ToUint32 => self.visit_rr(node, ArchOpcode::MipsTruncUwD),
            IrOpcode::TruncateFloat64ToFloat32 => self.visit_truncate_float64_to_float32(node),
            IrOpcode::TruncateFloat64ToInt32(mode) => self.visit_truncate_float64_to_int32(node, mode),
            IrOpcode::BitcastFloat32ToInt32 => self.visit_rr(node, ArchOpcode::MipsFloat64ExtractLowWord32),
            IrOpcode::BitcastInt32ToFloat32 => self.visit_bitcast_int32_to_float32(node),

            IrOpcode::Float32Add => self.visit_rrr(node, ArchOpcode::MipsAddS),
            IrOpcode::Float32Sub => self.visit_rrr(node, ArchOpcode::MipsSubS),
            IrOpcode::Float32Mul => self.visit_rrr(node, ArchOpcode::MipsMulS),
            IrOpcode::Float32Div => self.visit_rrr(node, ArchOpcode::MipsDivS),
            IrOpcode::Float32Max => self.visit_float_min_max(node, ArchOpcode::MipsFloat32Max),
            IrOpcode::Float32Min => self.visit_float_min_max(node, ArchOpcode::MipsFloat32Min),
            IrOpcode::Float32Abs => self.visit_rr(node, ArchOpcode::MipsAbsS),
            IrOpcode::Float32Sqrt => self.visit_rr(node, ArchOpcode::MipsSqrtS),
            IrOpcode::Float32RoundDown => self.visit_rr(node, ArchOpcode::MipsFloat32RoundDown),
            IrOpcode::Float32RoundUp => self.visit_rr(node, ArchOpcode::MipsFloat32RoundUp),
            IrOpcode::Float32RoundTruncate => self.visit_rr(node, ArchOpcode::MipsFloat32RoundTruncate),
            IrOpcode::Float32RoundTiesEven => self.visit_rr(node, ArchOpcode::MipsFloat32RoundTiesEven),
            IrOpcode::Float32Equal => self.visit_float32_equal(node),
            IrOpcode::Float32LessThan => self.visit_float32_less_than(node),
            IrOpcode::Float32LessThanOrEqual => self.visit_float32_less_than_or_equal(node),

            IrOpcode::Float64Add => self.visit_rrr(node, ArchOpcode::MipsAddD),
            IrOpcode::Float64Sub => self.visit_float64_sub(node),
            IrOpcode::Float64Mul => self.visit_rrr(node, ArchOpcode::MipsMulD),
            IrOpcode::Float64Div => self.visit_rrr(node, ArchOpcode::MipsDivD),
            IrOpcode::Float64Mod => self.visit_float64_mod(node),
            IrOpcode::Float64Max => self.visit_float_min_max(node, ArchOpcode::MipsFloat64Max),
            IrOpcode::Float64Min => self.visit_float_min_max(node, ArchOpcode::MipsFloat64Min),
            IrOpcode::Float64Abs => self.visit_rr(node, ArchOpcode::MipsAbsD),
            IrOpcode::Float64Sqrt => self.visit_rr(node, ArchOpcode::MipsSqrtD),
            IrOpcode::Float64RoundDown => self.visit_rr(node, ArchOpcode::MipsFloat64RoundDown),
            IrOpcode::Float64RoundUp => self.visit_rr(node, ArchOpcode::MipsFloat64RoundUp),
            IrOpcode::Float64RoundTruncate => self.visit_rr(node, ArchOpcode::MipsFloat64RoundTruncate),
            IrOpcode::Float64RoundTiesEven => self.visit_rr(node, ArchOpcode::MipsFloat64RoundTiesEven),
            IrOpcode::Float64Equal => self.visit_float64_equal(node),
            IrOpcode::Float64LessThan => self.visit_float64_less_than(node),
            IrOpcode::Float64LessThanOrEqual => self.visit_float64_less_than_or_equal(node),
            IrOpcode::Float64ExtractLowWord32 => self.visit_rr(node, ArchOpcode::MipsFloat64ExtractLowWord32),
            IrOpcode::Float64ExtractHighWord32 => self.visit_rr(node, ArchOpcode::MipsFloat64ExtractHighWord32),
            IrOpcode::Float64InsertLowWord32 => self.visit_float64_insert_word32(node, ArchOpcode::MipsFloat64InsertLowWord32),
            IrOpcode::Float64InsertHighWord32 => self.visit_float64_insert_word32(node, ArchOpcode::MipsFloat64InsertHighWord32),

            IrOpcode::Load(representation) => self.visit_load(node, representation),
            IrOpcode::Store(representation) => self.visit_store(node, representation),
            IrOpcode::CheckedLoad(representation) => self.visit_checked_load(node, representation),
            IrOpcode::CheckedStore(representation) => self.visit_checked_store(node, representation),

            IrOpcode::FrameState => Ok(()),

            IrOpcode::Int64Constant(..)
            | IrOpcode::Word32ReverseBits
            | IrOpcode::Word64And | IrOpcode::Word64Or | IrOpcode::Word64Xor
            | IrOpcode::Word64Shl | IrOpcode::Word64Shr | IrOpcode::Word64Sar | IrOpcode::Word64Equal
            | IrOpcode::Float64RoundTiesAway
            | IrOpcode::Branch => self.unsupported(node),
        }
    }

    pub(super) fn unsupported(&self, node: NodeId) -> Result<(), SelectionError> {
        Err(SelectionError::UnsupportedOperation {
            node,
            opcode: self.graph.opcode(node).name(),
        })
    }

    pub(super) fn can_cover(&self, user: NodeId, node: NodeId) -> bool {
        self.cover.can_cover(user, node)
    }

    /// The `index`th input of a node; validated to exist before selection
    /// starts.
    pub(super) fn input_at(&self, node: NodeId, index: usize) -> NodeId {
        self.graph.node(node).inputs()[index]
    }

    pub(super) fn emit(
        &mut self,
        code: impl Into<InstructionCode>,
        outputs: &[InstructionOperand],
        inputs: &[InstructionOperand],
        temps: &[InstructionOperand],
    ) -> Result<&mut Instruction, SelectionError> {
        let limit = self.options.max_instructions;
        if self.instructions.len() >= limit {
            return Err(SelectionError::ZoneExhausted { limit });
        }

        let index = self.instructions.len();
        self.instructions.push(Instruction::new(code.into(), outputs, inputs, temps));
        Ok(&mut self.instructions[index])
    }

    /// Emits an instruction that bails out to the frame state when its
    /// condition holds. The frame-state values are appended as inputs.
    pub(super) fn emit_deoptimize(
        &mut self,
        code: InstructionCode,
        outputs: &[InstructionOperand],
        inputs: &[InstructionOperand],
        frame_state: NodeId,
    ) -> Result<(), SelectionError> {
        if *self.graph.opcode(frame_state) != IrOpcode::FrameState {
            return Err(SelectionError::MalformedGraph {
                node: frame_state,
                reason: "deoptimalisatie verwacht een FrameState",
            });
        }

        let code = code.with_misc(inputs.len() as u32);
        let state_id = self.sequence.add_deoptimization_entry(frame_state);

        let mut args: SmallVec<[InstructionOperand; 8]> = inputs.iter().copied().collect();
        args.push(temp_immediate(state_id as i32));

        for input in self.graph.node(frame_state).inputs().iter().copied() {
            let operand = if self.graph.opcode(input).is_constant() {
                self.use_immediate(input)?
            } else {
                self.use_any(input)
            };
            args.push(operand);
        }

        self.emit(code, outputs, &args, &[])?;
        Ok(())
    }

    /// Emits `code` with the continuation folded in: labels for a branch,
    /// the boolean result for a set, the frame state for a deoptimization
    /// or the trap id for a trap.
    pub(super) fn emit_with_continuation(
        &mut self,
        code: impl Into<InstructionCode>,
        outputs: &[InstructionOperand],
        inputs: &[InstructionOperand],
        cont: &FlagsContinuation,
    ) -> Result<(), SelectionError> {
        let code = cont.encode(code);
        let mut outputs: OperandList = outputs.iter().copied().collect();
        let mut inputs: OperandList = inputs.iter().copied().collect();

        match cont.kind() {
            ContinuationKind::None => (),

            ContinuationKind::Branch { if_true, if_false } => {
                inputs.push(label(if_true));
                inputs.push(label(if_false));
            }

            ContinuationKind::Deoptimize { frame_state } => {
                return self.emit_deoptimize(code, &outputs, &inputs, frame_state);
            }

            ContinuationKind::Set { result } => {
                outputs.push(self.define_as_register(result));
            }

            ContinuationKind::Trap { trap_id } => {
                inputs.push(temp_immediate(trap_id as i32));
            }
        }

        self.emit(code, &outputs, &inputs, &[])?;
        Ok(())
    }

    fn visit_constant(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let output = self.define_as_constant(node)?;
        self.emit(ArchOpcode::ArchNop, &[output], &[], &[])?;
        Ok(())
    }

    fn visit_parameter(&mut self, node: NodeId, index: u32) -> Result<(), SelectionError> {
        let output = match MipsRegister::ARGUMENTS.get(index as usize) {
            Some(register) => self.define_as_fixed(node, *register),
            None => self.define_as_stack_slot(node, (index as usize - MipsRegister::ARGUMENTS.len()) as i32),
        };

        self.emit(ArchOpcode::ArchNop, &[output], &[], &[])?;
        Ok(())
    }

    fn visit_phi(&mut self, node: NodeId) {
        let output = self.virtual_register(node);
        self.mark_as_defined(node);

        let mut inputs = Vec::with_capacity(self.graph.node(node).input_count());
        for input in self.graph.node(node).inputs().iter().copied() {
            self.mark_as_used(input);
            inputs.push(self.virtual_register(input));
        }

        self.phis[self.current_block.index()].insert(0, PhiInstruction { output, inputs });
    }

    fn visit_projection(&mut self, node: NodeId, index: u32) -> Result<(), SelectionError> {
        let value = self.input_at(node, 0);

        match self.graph.opcode(value) {
            IrOpcode::Int32AddWithOverflow | IrOpcode::Int32SubWithOverflow
            | IrOpcode::Int32PairAdd | IrOpcode::Int32PairSub | IrOpcode::Int32PairMul
            | IrOpcode::Word32PairShl | IrOpcode::Word32PairShr | IrOpcode::Word32PairSar => {
                if index == 0 {
                    let output = self.define_same_as_first(node);
                    let input = self.use_any(value);
                    self.emit(ArchOpcode::ArchNop, &[output], &[input], &[])?;
                } else {
                    self.mark_as_used(value);
                }
                Ok(())
            }

            _ => Ok(()),
        }
    }

    fn visit_goto(&mut self, target: BlockId) -> Result<(), SelectionError> {
        self.emit(ArchOpcode::ArchJmp, &[], &[label(target)], &[])?;
        Ok(())
    }

    fn visit_return(&mut self, value: NodeId) -> Result<(), SelectionError> {
        let input = if self.graph.opcode(value).float_representation().is_some() {
            self.use_fixed_fp(value, MipsFpRegister::F0)
        } else {
            self.use_fixed(value, MipsRegister::V0)
        };

        self.emit(ArchOpcode::ArchRet, &[], &[input], &[])?;
        Ok(())
    }

    fn visit_deoptimize_if(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_deoptimize(FlagsCondition::NotEqual, self.input_at(node, 1));
        self.visit_word_compare_zero(node, self.input_at(node, 0), &mut cont)
    }

    fn visit_deoptimize_unless(&mut self, node: NodeId) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_deoptimize(FlagsCondition::Equal, self.input_at(node, 1));
        self.visit_word_compare_zero(node, self.input_at(node, 0), &mut cont)
    }

    fn visit_trap_if(&mut self, node: NodeId, trap_id: u32) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_trap(FlagsCondition::NotEqual, trap_id);
        self.visit_word_compare_zero(node, self.input_at(node, 0), &mut cont)
    }

    fn visit_trap_unless(&mut self, node: NodeId, trap_id: u32) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_trap(FlagsCondition::Equal, trap_id);
        self.visit_word_compare_zero(node, self.input_at(node, 0), &mut cont)
    }

    pub(super) fn emit_table_switch(&mut self, info: &SwitchInfo, index: InstructionOperand) -> Result<(), SelectionError> {
        let mut inputs = vec![label(info.default); 2 + info.value_range as usize];
        inputs[0] = index;

        for (value, target) in &info.cases {
            let slot = (*value as i64 - info.min_value as i64) as usize;
            inputs[slot + 2] = label(*target);
        }

        self.emit(ArchOpcode::ArchTableSwitch, &[], &inputs, &[])?;
        Ok(())
    }

    pub(super) fn emit_lookup_switch(&mut self, info: &SwitchInfo, value: InstructionOperand) -> Result<(), SelectionError> {
        let mut inputs = Vec::with_capacity(2 + 2 * info.cases.len());
        inputs.push(value);
        inputs.push(label(info.default));

        for (value, target) in &info.cases {
            inputs.push(temp_immediate(*value));
            inputs.push(label(*target));
        }

        self.emit(ArchOpcode::ArchLookupSwitch, &[], &inputs, &[])?;
        Ok(())
    }

    fn dump_instructions(&self) {
        trace!("Geselecteerde instructies:\n{}", self.sequence);
        debug!("{} instructies geselecteerd", self.sequence.instructions().len());
    }
}

/// The cases of a switch, with the bounds the lowering heuristics need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchInfo {
    pub cases: Vec<(i32, BlockId)>,
    pub default: BlockId,
    pub min_value: i32,
    pub max_value: i32,

    /// `max_value - min_value + 1`, or zero without cases.
    pub value_range: u64,
}

impl SwitchInfo {
    #[must_use]
    pub fn new(cases: Vec<(i32, BlockId)>, default: BlockId) -> Self {
        let min_value = cases.iter().map(|(value, _)| *value).min().unwrap_or(i32::MAX);
        let max_value = cases.iter().map(|(value, _)| *value).max().unwrap_or(i32::MIN);
        let value_range = if cases.is_empty() {
            0
        } else {
            (max_value as i64 - min_value as i64 + 1) as u64
        };

        Self {
            cases,
            default,
            min_value,
            max_value,
            value_range,
        }
    }

    #[must_use]
    pub fn case_count(&self) -> u64 {
        self.cases.len() as u64
    }
}
