// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::collections::HashMap;

use kiezel_compiler::{
    backend::{
        mips::{MipsFpRegister, MipsRegister, RecordWriteMode},
        AddressingMode, ArchOpcode, Constant, FlagsCondition, FlagsMode, InstructionOperand, UnallocatedPolicy,
    },
    ir::{
        BlockControl, BlockId, CallDescriptor, IrOpcode, LoadRepresentation, MachineRepresentation, NodeId,
        StoreRepresentation, WriteBarrierKind,
    },
    select_instructions, Graph, GraphBuilder, Instruction, InstructionSequence, MipsVariant, Schedule, ScheduleBuilder,
    ScheduleCoverOracle, SelectionError, SelectorOptions,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const SAMPLES: [i32; 8] = [0, 1, -1, 7, 0x1234_5678, -0x0f0f_0f10, i32::MIN, i32::MAX];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn schedule(graph: &Graph, blocks: Vec<(Vec<NodeId>, BlockControl)>) -> Schedule {
    let mut builder = ScheduleBuilder::new();
    let ids: Vec<BlockId> = blocks.iter().map(|_| builder.new_block()).collect();

    for (id, (nodes, control)) in ids.into_iter().zip(blocks) {
        for node in nodes {
            builder.add_node(id, node);
        }
        builder.set_control(id, control);
    }

    builder.finish(graph).unwrap()
}

fn select(graph: &Graph, schedule: &Schedule, options: &SelectorOptions) -> Result<InstructionSequence, SelectionError> {
    init_logging();
    let oracle = ScheduleCoverOracle::new(graph, schedule);
    select_instructions(graph, schedule, &oracle, options)
}

/// A function of a single block, with every node scheduled in creation
/// order, returning the node produced by `build`.
fn try_select_returning(
    options: &SelectorOptions,
    build: impl FnOnce(&mut GraphBuilder) -> NodeId,
) -> Result<InstructionSequence, SelectionError> {
    let mut builder = GraphBuilder::new();
    let result = build(&mut builder);
    let graph = builder.finish();

    let schedule = schedule(&graph, vec![(graph.node_ids().collect(), BlockControl::Return(result))]);
    select(&graph, &schedule, options)
}

fn select_returning(build: impl FnOnce(&mut GraphBuilder) -> NodeId) -> InstructionSequence {
    try_select_returning(&SelectorOptions::default(), build).unwrap()
}

/// A single block ending without control, for functions that only have
/// side effects.
fn select_effects(build: impl FnOnce(&mut GraphBuilder)) -> Result<InstructionSequence, SelectionError> {
    let mut builder = GraphBuilder::new();
    build(&mut builder);
    let graph = builder.finish();

    let schedule = schedule(&graph, vec![(graph.node_ids().collect(), BlockControl::None)]);
    select(&graph, &schedule, &SelectorOptions::default())
}

/// The opcodes that do actual work: no constants, parameters or returns.
fn working_opcodes(sequence: &InstructionSequence) -> Vec<ArchOpcode> {
    sequence.instructions()
        .iter()
        .map(Instruction::arch_opcode)
        .filter(|opcode| !matches!(opcode, ArchOpcode::ArchNop | ArchOpcode::ArchRet))
        .collect()
}

fn find(sequence: &InstructionSequence, opcode: ArchOpcode) -> &Instruction {
    sequence.instructions()
        .iter()
        .find(|instruction| instruction.arch_opcode() == opcode)
        .unwrap_or_else(|| panic!("geen {opcode} in:\n{sequence}"))
}

fn vreg_of(operand: &InstructionOperand) -> u32 {
    operand.virtual_register().expect("operand heeft geen virtueel register").number()
}

/// Runs the integer subset of the selected code, enough to check that the
/// fused instructions compute the same values as the graph.
fn evaluate(sequence: &InstructionSequence, arguments: &[i32]) -> i32 {
    let mut registers: HashMap<u32, i32> = HashMap::new();

    for instruction in sequence.instructions() {
        let value = {
            let input = |index: usize| -> i32 {
                match instruction.inputs()[index] {
                    InstructionOperand::Immediate(Constant::Int32(value)) => value,
                    ref operand => registers[&vreg_of(operand)],
                }
            };

            match instruction.arch_opcode() {
                ArchOpcode::ArchRet => return input(0),

                ArchOpcode::ArchNop => match instruction.outputs()[0] {
                    InstructionOperand::Constant(vreg) => sequence.constant(vreg).and_then(|c| c.as_i32()).unwrap(),
                    InstructionOperand::Unallocated { policy: UnallocatedPolicy::FixedRegister(register), .. } => {
                        let index = MipsRegister::ARGUMENTS.iter().position(|r| *r == register).unwrap();
                        arguments[index]
                    }
                    InstructionOperand::StackSlot { slot, .. } => arguments[4 + slot as usize],
                    ref other => panic!("onverwachte definitie {other}"),
                },

                ArchOpcode::MipsAdd => input(0).wrapping_add(input(1)),
                ArchOpcode::MipsSub => input(0).wrapping_sub(input(1)),
                ArchOpcode::MipsMul => input(0).wrapping_mul(input(1)),
                ArchOpcode::MipsAnd => input(0) & input(1),
                ArchOpcode::MipsOr => input(0) | input(1),
                ArchOpcode::MipsXor => input(0) ^ input(1),
                ArchOpcode::MipsNor => !(input(0) | input(1)),
                ArchOpcode::MipsShl => ((input(0) as u32) << (input(1) & 31)) as i32,
                ArchOpcode::MipsShr => ((input(0) as u32) >> (input(1) & 31)) as i32,
                ArchOpcode::MipsSar => input(0) >> (input(1) & 31),
                ArchOpcode::MipsLsa => input(0).wrapping_add(((input(1) as u32) << input(2)) as i32),
                ArchOpcode::MipsExt => (((input(0) as u32) >> input(1)) & low_mask(input(2))) as i32,
                ArchOpcode::MipsIns => input(0) & !((low_mask(input(2)) << input(1)) as i32),

                opcode => panic!("{opcode} wordt niet ondersteund door de evaluator"),
            }
        };

        let output = instruction.outputs().first().expect("instructie zonder uitvoer");
        registers.insert(vreg_of(output), value);
    }

    panic!("functie keert niet terug");
}

fn low_mask(width: i32) -> u32 {
    if width >= 32 { u32::MAX } else { (1u32 << width) - 1 }
}

fn assert_evaluates(sequence: &InstructionSequence, arity: usize, reference: impl Fn(&[i32]) -> i32) {
    let mut arguments = vec![0; arity];
    for a in SAMPLES {
        for b in SAMPLES {
            arguments[0] = a;
            if arity > 1 {
                arguments[1] = b;
            }

            assert_eq!(evaluate(sequence, &arguments), reference(&arguments), "argumenten {arguments:?}\n{sequence}");
        }
    }
}

#[test]
fn and_of_shift_right_becomes_ext() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let eight = b.int32_constant(8);
        let shr = b.add(IrOpcode::Word32Shr, &[x, eight]);
        let mask = b.int32_constant(0xff);
        b.add(IrOpcode::Word32And, &[shr, mask])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsExt]);
    let ext = find(&sequence, ArchOpcode::MipsExt);
    assert_eq!(ext.inputs()[1].immediate_i32(), Some(8));
    assert_eq!(ext.inputs()[2].immediate_i32(), Some(8));

    assert_evaluates(&sequence, 1, |args| ((args[0] as u32 >> 8) & 0xff) as i32);
}

#[rstest]
#[case(28, 0xff, 4)]
#[case(40, 0xff, 8)]
#[case(0, 0xffff_ffff_u32 as i32, 32)]
fn ext_width_stays_inside_the_register(#[case] shift: i32, #[case] mask: i32, #[case] width: i32) {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let shift = b.int32_constant(shift);
        let shr = b.add(IrOpcode::Word32Shr, &[x, shift]);
        let mask = b.int32_constant(mask);
        b.add(IrOpcode::Word32And, &[shr, mask])
    });

    let ext = find(&sequence, ArchOpcode::MipsExt);
    assert_eq!(ext.inputs()[1].immediate_i32(), Some(shift & 0x1f));
    assert_eq!(ext.inputs()[2].immediate_i32(), Some(width));

    assert_evaluates(&sequence, 1, |args| ((args[0] as u32 >> (shift & 0x1f)) & mask as u32) as i32);
}

#[test]
fn shift_right_of_and_becomes_ext() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let mask = b.int32_constant(0xff00);
        let and = b.add(IrOpcode::Word32And, &[x, mask]);
        let eight = b.int32_constant(8);
        b.add(IrOpcode::Word32Shr, &[and, eight])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsExt]);
    assert_evaluates(&sequence, 1, |args| ((args[0] & 0xff00) as u32 >> 8) as i32);
}

#[test]
fn and_with_inverted_low_mask_becomes_ins() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let mask = b.int32_constant(!0xf);
        b.add(IrOpcode::Word32And, &[x, mask])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsIns]);
    let ins = find(&sequence, ArchOpcode::MipsIns);
    assert_eq!(ins.outputs()[0].policy(), Some(UnallocatedPolicy::SameAsFirstInput));

    assert_evaluates(&sequence, 1, |args| args[0] & !0xf);
}

#[test]
fn and_with_small_mask_uses_an_immediate() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let mask = b.int32_constant(0xff);
        b.add(IrOpcode::Word32And, &[mask, x])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsAnd]);
    assert_eq!(find(&sequence, ArchOpcode::MipsAnd).inputs()[1].immediate_i32(), Some(0xff));
    assert_evaluates(&sequence, 1, |args| args[0] & 0xff);
}

#[test]
fn shift_left_drops_redundant_and() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let mask = b.int32_constant(0xffff);
        let and = b.add(IrOpcode::Word32And, &[x, mask]);
        let sixteen = b.int32_constant(16);
        b.add(IrOpcode::Word32Shl, &[and, sixteen])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsShl]);
    assert_evaluates(&sequence, 1, |args| ((args[0] & 0xffff) as u32).wrapping_shl(16) as i32);
}

#[test]
fn inverted_or_becomes_nor() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let y = b.parameter(1);
        let or = b.add(IrOpcode::Word32Or, &[x, y]);
        let minus_one = b.int32_constant(-1);
        b.add(IrOpcode::Word32Xor, &[or, minus_one])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsNor]);
    assert_evaluates(&sequence, 2, |args| !(args[0] | args[1]));
}

#[test]
fn bitwise_not_becomes_nor_with_zero() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let minus_one = b.int32_constant(-1);
        b.add(IrOpcode::Word32Xor, &[minus_one, x])
    });

    let nor = find(&sequence, ArchOpcode::MipsNor);
    assert_eq!(nor.inputs()[1].immediate_i32(), Some(0));
    assert_evaluates(&sequence, 1, |args| !args[0]);
}

#[rstest]
#[case(true)]
#[case(false)]
fn add_of_shift_becomes_lsa(#[case] shift_on_the_right: bool) {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let y = b.parameter(1);
        let three = b.int32_constant(3);
        let shl = b.add(IrOpcode::Word32Shl, &[y, three]);
        if shift_on_the_right {
            b.add(IrOpcode::Int32Add, &[x, shl])
        } else {
            b.add(IrOpcode::Int32Add, &[shl, x])
        }
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsLsa]);
    assert_evaluates(&sequence, 2, |args| args[0].wrapping_add(((args[1] as u32) << 3) as i32));
}

#[test]
fn add_of_shift_by_zero_is_not_fused() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let y = b.parameter(1);
        let zero = b.int32_constant(0);
        let shl = b.add(IrOpcode::Word32Shl, &[y, zero]);
        b.add(IrOpcode::Int32Add, &[x, shl])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsShl, ArchOpcode::MipsAdd]);
    assert_evaluates(&sequence, 2, |args| args[0].wrapping_add(args[1]));
}

#[test]
fn shift_used_twice_is_not_fused() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let y = b.parameter(1);
        let two = b.int32_constant(2);
        let shl = b.add(IrOpcode::Word32Shl, &[y, two]);
        let add = b.add(IrOpcode::Int32Add, &[x, shl]);
        b.add(IrOpcode::Int32Sub, &[add, shl])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsShl, ArchOpcode::MipsAdd, ArchOpcode::MipsSub]);
    assert_evaluates(&sequence, 2, |args| args[0]);
}

#[rstest]
#[case(1, vec![ArchOpcode::MipsShl])]
#[case(8, vec![ArchOpcode::MipsShl])]
#[case(3, vec![ArchOpcode::MipsLsa])]
#[case(9, vec![ArchOpcode::MipsLsa])]
#[case(7, vec![ArchOpcode::MipsShl, ArchOpcode::MipsSub])]
#[case(i32::MAX, vec![ArchOpcode::MipsShl, ArchOpcode::MipsSub])]
#[case(10, vec![ArchOpcode::MipsMul])]
#[case(-3, vec![ArchOpcode::MipsMul])]
#[case(0, vec![ArchOpcode::MipsMul])]
fn multiplication_by_constant(#[case] factor: i32, #[case] expected: Vec<ArchOpcode>) {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let factor = b.int32_constant(factor);
        b.add(IrOpcode::Int32Mul, &[x, factor])
    });

    assert_eq!(working_opcodes(&sequence), expected);
    assert_evaluates(&sequence, 1, |args| args[0].wrapping_mul(factor));
}

#[test]
fn dead_code_is_not_selected() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let y = b.parameter(1);
        b.add(IrOpcode::Int32Add, &[x, y]);
        b.int32_constant(4)
    });

    assert_eq!(working_opcodes(&sequence), Vec::<ArchOpcode>::new());
    assert_evaluates(&sequence, 2, |_| 4);
}

#[test]
fn unsupported_operation_stops_selection() {
    let result = try_select_returning(&SelectorOptions::default(), |b| {
        let x = b.parameter(0);
        b.add(IrOpcode::Word32ReverseBits, &[x])
    });

    assert_eq!(result.unwrap_err(), SelectionError::UnsupportedOperation {
        node: NodeId::new(1),
        opcode: "Word32ReverseBits",
    });
}

#[test]
fn word64_load_is_rejected() {
    let result = try_select_returning(&SelectorOptions::default(), |b| {
        let base = b.parameter(0);
        let index = b.int32_constant(0);
        b.add(IrOpcode::Load(LoadRepresentation::unsigned(MachineRepresentation::Word64)), &[base, index])
    });

    assert_eq!(result.unwrap_err(), SelectionError::UnsupportedRepresentation {
        node: NodeId::new(2),
        representation: MachineRepresentation::Word64,
    });
}

#[test]
fn instruction_limit_is_enforced() {
    let options = SelectorOptions { max_instructions: 2, ..Default::default() };
    let result = try_select_returning(&options, |b| {
        let x = b.parameter(0);
        let seven = b.int32_constant(7);
        b.add(IrOpcode::Int32Mul, &[x, seven])
    });

    assert_eq!(result.unwrap_err(), SelectionError::ZoneExhausted { limit: 2 });
}

#[test]
fn too_few_inputs_is_malformed() {
    let result = try_select_returning(&SelectorOptions::default(), |b| {
        let x = b.parameter(0);
        b.add(IrOpcode::Int32Add, &[x])
    });

    assert!(matches!(result, Err(SelectionError::MalformedGraph { .. })));
}

#[test]
fn unscheduled_producer_with_too_few_inputs_is_malformed() {
    let mut builder = GraphBuilder::new();
    let x = builder.parameter(0);
    let and = builder.add(IrOpcode::Word32And, &[x]);
    let eight = builder.int32_constant(8);
    let shr = builder.add(IrOpcode::Word32Shr, &[and, eight]);
    let graph = builder.finish();

    // `and` is only reachable through the shift's inputs.
    let schedule = schedule(&graph, vec![(vec![x, eight, shr], BlockControl::Return(shr))]);
    let result = select(&graph, &schedule, &SelectorOptions::default());

    assert!(matches!(result, Err(SelectionError::MalformedGraph { node, .. }) if node == and));
}

#[test]
fn unscheduled_overflow_producer_with_too_few_inputs_is_malformed() {
    let mut builder = GraphBuilder::new();
    let x = builder.parameter(0);
    let add = builder.add(IrOpcode::Int32AddWithOverflow, &[x]);
    let overflow = builder.add(IrOpcode::Projection(1), &[add]);
    let graph = builder.finish();

    let schedule = schedule(&graph, vec![(vec![x, overflow], BlockControl::Return(overflow))]);
    let result = select(&graph, &schedule, &SelectorOptions::default());

    assert!(matches!(result, Err(SelectionError::MalformedGraph { node, .. }) if node == add));
}

#[test]
fn stack_parameters_start_after_the_argument_registers() {
    let sequence = select_returning(|b| b.parameter(5));

    assert_eq!(sequence.instructions()[0].outputs()[0], InstructionOperand::StackSlot {
        vreg: sequence.instructions()[0].outputs()[0].virtual_register().unwrap(),
        slot: 1,
    });
    assert_eq!(evaluate(&sequence, &[0, 0, 0, 0, 0, 42]), 42);
}

/// `B0` branches on the node produced by `build` to `B1` (returning 1) or
/// `B2` (returning 0).
fn select_branch(build: impl FnOnce(&mut GraphBuilder) -> NodeId) -> InstructionSequence {
    let mut builder = GraphBuilder::new();
    let condition = build(&mut builder);
    let first_free = builder.len() as u32;
    let branch = builder.add(IrOpcode::Branch, &[condition]);
    let one = builder.int32_constant(1);
    let zero = builder.int32_constant(0);
    let graph = builder.finish();

    let entry = (0..first_free).map(NodeId::new).collect();
    let schedule = schedule(&graph, vec![
        (entry, BlockControl::Branch { branch, if_true: BlockId::new(1), if_false: BlockId::new(2) }),
        (vec![one], BlockControl::Return(one)),
        (vec![zero], BlockControl::Return(zero)),
    ]);

    select(&graph, &schedule, &SelectorOptions::default()).unwrap()
}

fn branch_instruction(sequence: &InstructionSequence) -> &Instruction {
    let block = &sequence.blocks()[0];
    let instruction = sequence.block_instructions(block).last().unwrap();
    assert_eq!(instruction.code().flags_mode(), FlagsMode::Branch, "{sequence}");
    instruction
}

#[test]
fn branch_on_value_compares_with_zero() {
    let sequence = select_branch(|b| b.parameter(0));

    let branch = branch_instruction(&sequence);
    assert_eq!(branch.arch_opcode(), ArchOpcode::MipsCmp);
    assert_eq!(branch.code().flags_condition(), FlagsCondition::NotEqual);
    assert_eq!(branch.inputs()[1].immediate_i32(), Some(0));
    assert_eq!(branch.inputs()[2].label(), Some(BlockId::new(1)));
    assert_eq!(branch.inputs()[3].label(), Some(BlockId::new(2)));
}

#[rstest]
#[case(1, FlagsCondition::Equal)]
#[case(2, FlagsCondition::NotEqual)]
#[case(3, FlagsCondition::Equal)]
fn negations_fold_into_the_branch(#[case] negations: usize, #[case] expected: FlagsCondition) {
    let sequence = select_branch(|b| {
        let x = b.parameter(0);
        let zero = b.int32_constant(0);
        let mut value = x;
        for _ in 0..negations {
            value = b.add(IrOpcode::Word32Equal, &[value, zero]);
        }
        value
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsCmp]);
    let branch = branch_instruction(&sequence);
    assert_eq!(branch.code().flags_condition(), expected);
    assert_eq!(vreg_of(&branch.inputs()[0]), vreg_of(&sequence.instructions()[0].outputs()[0]));
}

#[test]
fn branch_on_less_than_uses_an_immediate() {
    let sequence = select_branch(|b| {
        let x = b.parameter(0);
        let five = b.int32_constant(5);
        b.add(IrOpcode::Int32LessThan, &[x, five])
    });

    let branch = branch_instruction(&sequence);
    assert_eq!(branch.code().flags_condition(), FlagsCondition::SignedLessThan);
    assert_eq!(branch.inputs()[1].immediate_i32(), Some(5));
}

#[rstest]
#[case(IrOpcode::Int32LessThanOrEqual, FlagsCondition::SignedGreaterThanOrEqual, Some(5))]
#[case(IrOpcode::Int32LessThan, FlagsCondition::SignedGreaterThan, None)]
#[case(IrOpcode::Uint32LessThanOrEqual, FlagsCondition::UnsignedGreaterThanOrEqual, Some(5))]
fn immediate_on_the_left_commutes_the_condition(
    #[case] opcode: IrOpcode,
    #[case] condition: FlagsCondition,
    #[case] immediate: Option<i32>,
) {
    let sequence = select_branch(|b| {
        let x = b.parameter(0);
        let five = b.int32_constant(5);
        b.add(opcode, &[five, x])
    });

    let branch = branch_instruction(&sequence);
    assert_eq!(branch.code().flags_condition(), condition);
    assert_eq!(vreg_of(&branch.inputs()[0]), vreg_of(&sequence.instructions()[0].outputs()[0]));
    assert_eq!(branch.inputs()[1].immediate_i32(), immediate);
}

#[test]
fn equality_branch_keeps_constant_in_a_register() {
    let sequence = select_branch(|b| {
        let x = b.parameter(0);
        let five = b.int32_constant(5);
        b.add(IrOpcode::Word32Equal, &[x, five])
    });

    let branch = branch_instruction(&sequence);
    assert_eq!(branch.code().flags_condition(), FlagsCondition::Equal);
    assert_eq!(branch.inputs()[1].policy(), Some(UnallocatedPolicy::MustHaveRegister));
}

#[test]
fn branch_on_and_becomes_tst() {
    let sequence = select_branch(|b| {
        let x = b.parameter(0);
        let bit = b.int32_constant(4);
        b.add(IrOpcode::Word32And, &[x, bit])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsTst]);
    assert_eq!(branch_instruction(&sequence).code().flags_condition(), FlagsCondition::NotEqual);
}

#[test]
fn float_compare_against_zero_uses_an_immediate() {
    let sequence = select_branch(|b| {
        let x = b.parameter(0);
        let double = b.add(IrOpcode::ChangeInt32ToFloat64, &[x]);
        let zero = b.float64_constant(0.0);
        b.add(IrOpcode::Float64LessThan, &[double, zero])
    });

    let branch = branch_instruction(&sequence);
    assert_eq!(branch.arch_opcode(), ArchOpcode::MipsCmpD);
    assert_eq!(branch.code().flags_condition(), FlagsCondition::UnsignedLessThan);
    assert_eq!(branch.inputs()[1], InstructionOperand::Immediate(Constant::Float64(0.0)));
}

#[test]
fn compare_result_is_materialized() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let five = b.int32_constant(5);
        b.add(IrOpcode::Word32Equal, &[x, five])
    });

    let compare = find(&sequence, ArchOpcode::MipsCmp);
    assert_eq!(compare.code().flags_mode(), FlagsMode::Set);
    assert_eq!(compare.code().flags_condition(), FlagsCondition::Equal);
    assert_eq!(compare.inputs()[1].immediate_i32(), Some(5));
    assert_eq!(compare.outputs().len(), 1);
}

#[test]
fn branch_with_identical_targets_is_a_jump() {
    let mut builder = GraphBuilder::new();
    let x = builder.parameter(0);
    let branch = builder.add(IrOpcode::Branch, &[x]);
    let graph = builder.finish();

    let schedule = schedule(&graph, vec![
        (vec![x], BlockControl::Branch { branch, if_true: BlockId::new(1), if_false: BlockId::new(1) }),
        (vec![], BlockControl::Return(x)),
    ]);
    let sequence = select(&graph, &schedule, &SelectorOptions::default()).unwrap();

    let block = &sequence.blocks()[0];
    let jump = sequence.block_instructions(block).last().unwrap();
    assert_eq!(jump.arch_opcode(), ArchOpcode::ArchJmp);
    assert_eq!(jump.inputs()[0].label(), Some(BlockId::new(1)));
}

/// Branches on the overflow bit of `a + b`; `B1` returns the sum when
/// `keep_sum` is set.
fn select_overflow_branch(keep_sum: bool) -> InstructionSequence {
    let mut builder = GraphBuilder::new();
    let a = builder.parameter(0);
    let b = builder.parameter(1);
    let add = builder.add(IrOpcode::Int32AddWithOverflow, &[a, b]);
    let sum = keep_sum.then(|| builder.projection(0, add));
    let overflow = builder.projection(1, add);
    let branch = builder.add(IrOpcode::Branch, &[overflow]);
    let zero = builder.int32_constant(0);
    let graph = builder.finish();

    let mut entry = vec![a, b, add];
    entry.extend(sum);
    entry.push(overflow);

    let schedule = schedule(&graph, vec![
        (entry, BlockControl::Branch { branch, if_true: BlockId::new(1), if_false: BlockId::new(2) }),
        (vec![], BlockControl::Return(sum.unwrap_or(a))),
        (vec![zero], BlockControl::Return(zero)),
    ]);

    select(&graph, &schedule, &SelectorOptions::default()).unwrap()
}

#[test]
fn overflow_check_fuses_into_the_branch() {
    let sequence = select_overflow_branch(false);

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsAddOvf]);

    let branch = branch_instruction(&sequence);
    assert_eq!(branch.arch_opcode(), ArchOpcode::MipsAddOvf);
    assert_eq!(branch.code().flags_condition(), FlagsCondition::Overflow);
    assert_eq!(branch.inputs().len(), 4);
}

#[test]
fn overflow_check_with_live_sum_is_materialized() {
    let sequence = select_overflow_branch(true);

    let add = find(&sequence, ArchOpcode::MipsAddOvf);
    assert_eq!(add.code().flags_mode(), FlagsMode::Set);
    assert_eq!(add.code().flags_condition(), FlagsCondition::Overflow);
    assert_eq!(add.outputs().len(), 2);

    let branch = branch_instruction(&sequence);
    assert_eq!(branch.arch_opcode(), ArchOpcode::MipsCmp);
    assert_eq!(vreg_of(&branch.inputs()[0]), vreg_of(&add.outputs()[1]));
}

/// `B0` switches on the first parameter; every case jumps to `B1`, the
/// default is `B2`.
fn select_switch(cases: &[i32]) -> InstructionSequence {
    let mut builder = GraphBuilder::new();
    let x = builder.parameter(0);
    let graph = builder.finish();

    let schedule = schedule(&graph, vec![
        (vec![x], BlockControl::Switch {
            value: x,
            cases: cases.iter().map(|value| (*value, BlockId::new(1))).collect(),
            default: BlockId::new(2),
        }),
        (vec![], BlockControl::Return(x)),
        (vec![], BlockControl::Return(x)),
    ]);

    select(&graph, &schedule, &SelectorOptions::default()).unwrap()
}

#[test]
fn dense_switch_becomes_a_table() {
    let sequence = select_switch(&[0, 1, 2, 3, 4]);

    let table = find(&sequence, ArchOpcode::ArchTableSwitch);
    assert_eq!(table.inputs().len(), 2 + 5);
    assert_eq!(table.inputs()[1].label(), Some(BlockId::new(2)));
    assert!(table.inputs()[2..].iter().all(|input| input.label() == Some(BlockId::new(1))));
}

#[test]
fn table_switch_rebases_its_index() {
    let sequence = select_switch(&[10, 11, 12, 14, 15]);

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsSub, ArchOpcode::ArchTableSwitch]);

    let sub = find(&sequence, ArchOpcode::MipsSub);
    assert_eq!(sub.inputs()[1].immediate_i32(), Some(10));

    let table = find(&sequence, ArchOpcode::ArchTableSwitch);
    assert_eq!(vreg_of(&table.inputs()[0]), vreg_of(&sub.outputs()[0]));
    assert_eq!(table.inputs().len(), 2 + 6);

    // The hole at 13 goes to the default.
    assert_eq!(table.inputs()[2 + 3].label(), Some(BlockId::new(2)));
    assert_eq!(table.inputs()[2 + 4].label(), Some(BlockId::new(1)));
}

#[test]
fn sparse_switch_becomes_a_lookup() {
    let sequence = select_switch(&[0, 1000]);

    let lookup = find(&sequence, ArchOpcode::ArchLookupSwitch);
    let inputs = lookup.inputs();
    assert_eq!(inputs.len(), 2 + 2 * 2);
    assert_eq!(inputs[1].label(), Some(BlockId::new(2)));
    assert_eq!(inputs[2].immediate_i32(), Some(0));
    assert_eq!(inputs[3].label(), Some(BlockId::new(1)));
    assert_eq!(inputs[4].immediate_i32(), Some(1000));
}

#[test]
fn switch_down_to_the_minimum_integer_is_a_lookup() {
    let sequence = select_switch(&[i32::MIN, i32::MIN + 1, i32::MIN + 2, i32::MIN + 3, i32::MIN + 4]);
    find(&sequence, ArchOpcode::ArchLookupSwitch);
}

#[test]
fn phis_are_attached_to_their_block() {
    let mut builder = GraphBuilder::new();
    let x = builder.parameter(0);
    let branch = builder.add(IrOpcode::Branch, &[x]);
    let one = builder.int32_constant(1);
    let two = builder.int32_constant(2);
    let phi = builder.add(IrOpcode::Phi, &[one, two]);
    let graph = builder.finish();

    let schedule = schedule(&graph, vec![
        (vec![x], BlockControl::Branch { branch, if_true: BlockId::new(1), if_false: BlockId::new(2) }),
        (vec![one], BlockControl::Goto(BlockId::new(3))),
        (vec![two], BlockControl::Goto(BlockId::new(3))),
        (vec![phi], BlockControl::Return(phi)),
    ]);
    let sequence = select(&graph, &schedule, &SelectorOptions::default()).unwrap();

    let phis = sequence.blocks()[3].phis();
    assert_eq!(phis.len(), 1);
    assert_eq!(phis[0].inputs.len(), 2);
    assert_eq!(sequence.constant(phis[0].inputs[0]), Some(Constant::Int32(1)));
    assert_eq!(sequence.constant(phis[0].inputs[1]), Some(Constant::Int32(2)));

    for block in [1, 2] {
        let instructions = sequence.block_instructions(&sequence.blocks()[block]);
        assert_eq!(instructions.last().unwrap().arch_opcode(), ArchOpcode::ArchJmp);
    }
}

#[test]
fn load_with_small_offset_uses_mri() {
    let sequence = select_returning(|b| {
        let base = b.parameter(0);
        let offset = b.int32_constant(16);
        b.add(IrOpcode::Load(LoadRepresentation::signed(MachineRepresentation::Word32)), &[base, offset])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsLw]);
    let load = find(&sequence, ArchOpcode::MipsLw);
    assert_eq!(load.code().addressing_mode(), AddressingMode::MRI);
    assert_eq!(load.inputs()[1].immediate_i32(), Some(16));
}

#[rstest]
#[case(MachineRepresentation::Word32, 0x1_0000, ArchOpcode::MipsLw)]
#[case(MachineRepresentation::Float64, 32764, ArchOpcode::MipsLdc1)]
fn load_with_large_offset_computes_the_address(
    #[case] representation: MachineRepresentation,
    #[case] offset: i32,
    #[case] opcode: ArchOpcode,
) {
    let sequence = select_returning(|b| {
        let base = b.parameter(0);
        let offset = b.int32_constant(offset);
        b.add(IrOpcode::Load(LoadRepresentation::signed(representation)), &[base, offset])
    });

    assert_eq!(working_opcodes(&sequence), vec![ArchOpcode::MipsAdd, opcode]);

    let add = find(&sequence, ArchOpcode::MipsAdd);
    let load = find(&sequence, opcode);
    assert_eq!(vreg_of(&load.inputs()[0]), vreg_of(&add.outputs()[0]));
    assert_eq!(load.inputs()[1].immediate_i32(), Some(0));
}

#[test]
fn float_load_is_marked_and_returned_in_f0() {
    let sequence = select_returning(|b| {
        let base = b.parameter(0);
        let offset = b.int32_constant(8);
        b.add(IrOpcode::Load(LoadRepresentation::signed(MachineRepresentation::Float64)), &[base, offset])
    });

    let load = find(&sequence, ArchOpcode::MipsLdc1);
    let vreg = load.outputs()[0].virtual_register().unwrap();
    assert_eq!(sequence.representation(vreg), MachineRepresentation::Float64);

    let ret = find(&sequence, ArchOpcode::ArchRet);
    assert_eq!(ret.inputs()[0].policy(), Some(UnallocatedPolicy::FixedFpRegister(MipsFpRegister::F0)));
}

#[rstest]
#[case(WriteBarrierKind::MapWriteBarrier, RecordWriteMode::ValueIsMap)]
#[case(WriteBarrierKind::PointerWriteBarrier, RecordWriteMode::ValueIsPointer)]
#[case(WriteBarrierKind::FullWriteBarrier, RecordWriteMode::ValueIsAny)]
fn store_with_write_barrier(#[case] barrier: WriteBarrierKind, #[case] mode: RecordWriteMode) {
    let sequence = select_effects(|b| {
        let base = b.parameter(0);
        let offset = b.int32_constant(12);
        let value = b.parameter(1);
        b.add(IrOpcode::Store(StoreRepresentation::new(MachineRepresentation::Tagged, barrier)), &[base, offset, value]);
    }).unwrap();

    let store = find(&sequence, ArchOpcode::ArchStoreWithWriteBarrier);
    assert_eq!(store.code().misc(), mode as u32);
    assert_eq!(store.inputs().len(), 3);
    assert!(store.inputs().iter().all(|input| input.policy() == Some(UnallocatedPolicy::UniqueRegister)));
    assert_eq!(store.temps().len(), 2);
}

#[test]
fn write_barrier_needs_a_tagged_value() {
    let result = select_effects(|b| {
        let base = b.parameter(0);
        let offset = b.int32_constant(12);
        let value = b.parameter(1);
        b.add(
            IrOpcode::Store(StoreRepresentation::new(MachineRepresentation::Word32, WriteBarrierKind::FullWriteBarrier)),
            &[base, offset, value],
        );
    });

    assert!(matches!(result, Err(SelectionError::MalformedGraph { node, .. }) if node == NodeId::new(3)));
}

#[test]
fn plain_store_uses_mri() {
    let sequence = select_effects(|b| {
        let base = b.parameter(0);
        let offset = b.int32_constant(-4);
        let value = b.parameter(1);
        b.add(
            IrOpcode::Store(StoreRepresentation::new(MachineRepresentation::Word8, WriteBarrierKind::NoWriteBarrier)),
            &[base, offset, value],
        );
    }).unwrap();

    let store = find(&sequence, ArchOpcode::MipsSb);
    assert_eq!(store.outputs().len(), 0);
    assert_eq!(store.inputs()[1].immediate_i32(), Some(-4));
}

#[test]
fn checked_load_with_immediate_offset() {
    let sequence = select_returning(|b| {
        let buffer = b.parameter(0);
        let offset = b.int32_constant(8);
        let length = b.parameter(1);
        b.add(IrOpcode::CheckedLoad(LoadRepresentation::unsigned(MachineRepresentation::Word8)), &[buffer, offset, length])
    });

    let load = find(&sequence, ArchOpcode::CheckedLoadUint8);
    assert_eq!(load.inputs()[0].immediate_i32(), Some(8));
    assert_eq!(load.inputs()[1].policy(), Some(UnallocatedPolicy::MustHaveRegister));
}

#[test]
fn c_call_stores_extra_arguments_above_the_home_slots() {
    let sequence = select_returning(|b| {
        let callee = b.int32_constant(0x1000);
        let arguments: Vec<NodeId> = (0..6).map(|index| b.parameter(index)).collect();
        let mut inputs = vec![callee];
        inputs.extend(arguments);
        b.add(IrOpcode::Call(CallDescriptor::c_function(true)), &inputs)
    });

    assert_eq!(working_opcodes(&sequence), vec![
        ArchOpcode::ArchPrepareCallCFunction,
        ArchOpcode::MipsStoreToStackSlot,
        ArchOpcode::MipsStoreToStackSlot,
        ArchOpcode::ArchCallCFunction,
    ]);

    assert_eq!(find(&sequence, ArchOpcode::ArchPrepareCallCFunction).code().misc(), 6);

    let slots: Vec<Option<i32>> = sequence.instructions()
        .iter()
        .filter(|instruction| instruction.arch_opcode() == ArchOpcode::MipsStoreToStackSlot)
        .map(|instruction| instruction.inputs()[1].immediate_i32())
        .collect();
    assert_eq!(slots, vec![Some(16), Some(20)]);

    let call = find(&sequence, ArchOpcode::ArchCallCFunction);
    assert!(call.is_call());
    assert_eq!(call.inputs()[0].immediate_i32(), Some(0x1000));
    assert_eq!(call.inputs().len(), 5);
    for (input, register) in call.inputs()[1..].iter().zip(MipsRegister::ARGUMENTS) {
        assert_eq!(input.policy(), Some(UnallocatedPolicy::FixedRegister(register)));
    }
    assert_eq!(call.outputs()[0].policy(), Some(UnallocatedPolicy::FixedRegister(MipsRegister::V0)));
}

#[test]
fn code_object_call_claims_its_stack_area() {
    let sequence = select_effects(|b| {
        let callee = b.parameter(0);
        let first = b.parameter(1);
        let second = b.parameter(2);
        let third = b.parameter(3);
        b.add(IrOpcode::Call(CallDescriptor::code_object(2, false)), &[callee, first, second, third]);
    }).unwrap();

    assert_eq!(working_opcodes(&sequence), vec![
        ArchOpcode::MipsStackClaim,
        ArchOpcode::MipsStoreToStackSlot,
        ArchOpcode::ArchCallCodeObject,
    ]);

    assert_eq!(find(&sequence, ArchOpcode::MipsStackClaim).inputs()[0].immediate_i32(), Some(4));
    assert_eq!(find(&sequence, ArchOpcode::MipsStoreToStackSlot).inputs()[1].immediate_i32(), Some(0));

    let call = find(&sequence, ArchOpcode::ArchCallCodeObject);
    assert_eq!(call.outputs().len(), 0);
    assert_eq!(call.inputs().len(), 3);
    assert_eq!(call.inputs()[0].policy(), Some(UnallocatedPolicy::MustHaveRegister));
}

#[test]
fn float64_mod_is_a_call_with_fixed_registers() {
    let sequence = select_returning(|b| {
        let left = b.float64_constant(5.5);
        let right = b.float64_constant(2.0);
        b.add(IrOpcode::Float64Mod, &[left, right])
    });

    let modulo = find(&sequence, ArchOpcode::MipsModD);
    assert!(modulo.is_call());
    assert_eq!(modulo.outputs()[0].policy(), Some(UnallocatedPolicy::FixedFpRegister(MipsFpRegister::F0)));
    assert_eq!(modulo.inputs()[0].policy(), Some(UnallocatedPolicy::FixedFpRegister(MipsFpRegister::F12)));
    assert_eq!(modulo.inputs()[1].policy(), Some(UnallocatedPolicy::FixedFpRegister(MipsFpRegister::F14)));
}

#[rstest]
#[case(MipsVariant::R6)]
#[case(MipsVariant::R2)]
fn float_max_operands_depend_on_the_variant(#[case] variant: MipsVariant) {
    let options = SelectorOptions { variant, ..Default::default() };
    let sequence = try_select_returning(&options, |b| {
        let left = b.float64_constant(1.0);
        let right = b.float64_constant(2.0);
        b.add(IrOpcode::Float64Max, &[left, right])
    }).unwrap();

    let left = vreg_of(&sequence.instructions()[0].outputs()[0]);
    let right = vreg_of(&sequence.instructions()[1].outputs()[0]);
    let max = find(&sequence, ArchOpcode::MipsFloat64Max);

    match variant {
        MipsVariant::R6 => {
            assert_eq!(max.outputs()[0].policy(), Some(UnallocatedPolicy::MustHaveRegister));
            assert_eq!(max.inputs()[0].policy(), Some(UnallocatedPolicy::UniqueRegister));
            assert_eq!((vreg_of(&max.inputs()[0]), vreg_of(&max.inputs()[1])), (left, right));
        }
        MipsVariant::R2 => {
            assert_eq!(max.outputs()[0].policy(), Some(UnallocatedPolicy::SameAsFirstInput));
            assert_eq!((vreg_of(&max.inputs()[0]), vreg_of(&max.inputs()[1])), (right, left));
        }
    }
}

#[test]
fn deoptimization_carries_the_frame_state() {
    let mut frame_state = None;
    let sequence = select_effects(|b| {
        let condition = b.parameter(0);
        let local = b.parameter(1);
        let seven = b.int32_constant(7);
        let state = b.add(IrOpcode::FrameState, &[seven, local]);
        frame_state = Some(state);
        b.add(IrOpcode::DeoptimizeIf, &[condition, state]);
    }).unwrap();

    let deopt = find(&sequence, ArchOpcode::MipsCmp);
    assert_eq!(deopt.code().flags_mode(), FlagsMode::Deoptimize);
    assert_eq!(deopt.code().flags_condition(), FlagsCondition::NotEqual);
    assert_eq!(deopt.code().misc(), 2);

    let inputs = deopt.inputs();
    assert_eq!(inputs.len(), 5);
    assert_eq!(inputs[1].immediate_i32(), Some(0));
    assert_eq!(inputs[2].immediate_i32(), Some(0));
    assert_eq!(inputs[3].immediate_i32(), Some(7));
    assert_eq!(inputs[4].policy(), Some(UnallocatedPolicy::Any));

    assert_eq!(sequence.deoptimization_entries().len(), 1);
    assert_eq!(Some(sequence.deoptimization_entries()[0].frame_state), frame_state);
}

#[test]
fn deoptimization_without_frame_state_is_malformed() {
    let result = select_effects(|b| {
        let condition = b.parameter(0);
        let other = b.parameter(1);
        b.add(IrOpcode::DeoptimizeUnless, &[condition, other]);
    });

    assert!(matches!(result, Err(SelectionError::MalformedGraph { .. })));
}

#[rstest]
#[case(IrOpcode::TrapIf(7), FlagsCondition::NotEqual)]
#[case(IrOpcode::TrapUnless(7), FlagsCondition::Equal)]
fn trap_carries_its_id(#[case] opcode: IrOpcode, #[case] condition: FlagsCondition) {
    let sequence = select_effects(|b| {
        let x = b.parameter(0);
        b.add(opcode, &[x]);
    }).unwrap();

    let trap = find(&sequence, ArchOpcode::MipsCmp);
    assert_eq!(trap.code().flags_mode(), FlagsMode::Trap);
    assert_eq!(trap.code().flags_condition(), condition);
    assert_eq!(trap.inputs()[2].immediate_i32(), Some(7));
}

#[test]
fn pair_add_defines_both_halves() {
    let sequence = select_returning(|b| {
        let inputs: Vec<NodeId> = (0..4).map(|index| b.parameter(index)).collect();
        let pair = b.add(IrOpcode::Int32PairAdd, &inputs);
        let low = b.projection(0, pair);
        b.projection(1, pair);
        low
    });

    let add = find(&sequence, ArchOpcode::MipsAddPair);
    assert_eq!(add.outputs().len(), 2);
    assert!(add.inputs().iter().all(|input| input.policy() == Some(UnallocatedPolicy::UniqueRegister)));
}

#[test]
fn sequence_prints_one_instruction_per_line() {
    let sequence = select_returning(|b| {
        let x = b.parameter(0);
        let nine = b.int32_constant(9);
        b.add(IrOpcode::Int32Mul, &[x, nine])
    });

    let printed = sequence.to_string();
    assert!(printed.starts_with("B0:\n"), "{printed}");
    assert!(printed.contains("MipsLsa"), "{printed}");
    assert_eq!(printed.lines().filter(|line| line.contains(':') && !line.starts_with('B')).count(), sequence.instructions().len());
}
