// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

mod description;
mod graph;
mod matchers;
mod opcode;
mod schedule;

pub use self::{
    description::{
        BlockDescription,
        ControlDescription,
        FunctionDescription,
        NodeDescription,
    },
    graph::{
        Graph,
        GraphBuilder,
        Node,
        NodeId,
    },
    matchers::{
        BinopMatcher,
        Float32BinopMatcher,
        Float32Matcher,
        Float64BinopMatcher,
        Float64Matcher,
        Int32BinopMatcher,
        Int32Matcher,
        MatchedValue,
        ValueMatcher,
    },
    opcode::{
        CallDescriptor,
        CallKind,
        IrOpcode,
        LoadRepresentation,
        MachineRepresentation,
        StoreRepresentation,
        TruncationMode,
        WriteBarrierKind,
    },
    schedule::{
        BasicBlock,
        BlockControl,
        BlockId,
        CoverOracle,
        Schedule,
        ScheduleBuilder,
        ScheduleCoverOracle,
    },
};
