// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::fmt::Display;

use crate::SelectionError;

use super::{Graph, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("B")?;
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum BlockControl {
    /// Exit block, or a block ending in a deoptimization.
    #[default]
    None,
    Goto(BlockId),
    Branch {
        branch: NodeId,
        if_true: BlockId,
        if_false: BlockId,
    },
    Switch {
        value: NodeId,
        cases: Vec<(i32, BlockId)>,
        default: BlockId,
    },
    Return(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    nodes: Vec<NodeId>,
    control: BlockControl,
}

impl BasicBlock {
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[must_use]
    pub const fn control(&self) -> &BlockControl {
        &self.control
    }

    /// The node that terminates this block and is selected with it.
    #[must_use]
    pub fn control_node(&self) -> Option<NodeId> {
        match &self.control {
            BlockControl::Branch { branch, .. } => Some(*branch),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    blocks: Vec<BasicBlock>,
}

impl ScheduleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::default());
        id
    }

    pub fn add_node(&mut self, block: BlockId, node: NodeId) {
        self.blocks[block.index()].nodes.push(node);
    }

    pub fn set_control(&mut self, block: BlockId, control: BlockControl) {
        self.blocks[block.index()].control = control;
    }

    /// Freezes the schedule: blocks are taken to be in reverse post-order.
    pub fn finish(self, graph: &Graph) -> Result<Schedule, SelectionError> {
        let mut block_of = vec![None; graph.len()];
        let mut effect_levels = vec![0; graph.len()];

        for (index, block) in self.blocks.iter().enumerate() {
            let id = BlockId(index as u32);
            let mut effect_level = 0;

            for node in block.nodes.iter().copied().chain(block.control_node()) {
                let Some(slot) = block_of.get_mut(node.index()) else {
                    return Err(SelectionError::MalformedGraph {
                        node,
                        reason: "knoop bestaat niet in de graaf",
                    });
                };

                if slot.is_some() {
                    return Err(SelectionError::MalformedGraph {
                        node,
                        reason: "knoop is meerdere keren ingepland",
                    });
                }

                *slot = Some(id);

                if graph.opcode(node).writes_memory() {
                    effect_level += 1;
                }
                effect_levels[node.index()] = effect_level;
            }
        }

        Ok(Schedule {
            blocks: self.blocks,
            block_of,
            effect_levels,
        })
    }
}

/// Basic blocks in reverse post-order, together with the block and effect
/// level of every scheduled node.
#[derive(Debug, Clone)]
pub struct Schedule {
    blocks: Vec<BasicBlock>,
    block_of: Vec<Option<BlockId>>,
    effect_levels: Vec<u32>,
}

impl Schedule {
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    #[must_use]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_ids(&self) -> impl DoubleEndedIterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    #[must_use]
    pub fn block_of(&self, node: NodeId) -> Option<BlockId> {
        self.block_of.get(node.index()).copied().flatten()
    }

    /// The number of memory-writing operations scheduled at or before this
    /// node in its block.
    #[must_use]
    pub fn effect_level(&self, node: NodeId) -> u32 {
        self.effect_levels.get(node.index()).copied().unwrap_or_default()
    }
}

/// Answers whether a producer may be folded into one of its consumers.
pub trait CoverOracle {
    /// True iff `node` has `user` as its only consumer, lives in the same
    /// block and no observable effect happens between the two.
    #[must_use]
    fn can_cover(&self, user: NodeId, node: NodeId) -> bool;
}

/// The covering relation as implied by a [`Schedule`].
#[derive(Debug, Clone, Copy)]
pub struct ScheduleCoverOracle<'a> {
    graph: &'a Graph,
    schedule: &'a Schedule,
}

impl<'a> ScheduleCoverOracle<'a> {
    #[must_use]
    pub const fn new(graph: &'a Graph, schedule: &'a Schedule) -> Self {
        Self { graph, schedule }
    }
}

impl CoverOracle for ScheduleCoverOracle<'_> {
    fn can_cover(&self, user: NodeId, node: NodeId) -> bool {
        let Some(block) = self.schedule.block_of(node) else {
            return false;
        };

        self.graph.owned_by(node, user)
            && self.schedule.block_of(user) == Some(block)
            && (self.graph.opcode(node).is_pure()
                || self.schedule.effect_level(node) == self.schedule.effect_level(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{GraphBuilder, IrOpcode, LoadRepresentation, MachineRepresentation, StoreRepresentation, WriteBarrierKind};

    #[test]
    fn store_between_load_and_user_prevents_covering() {
        let mut builder = GraphBuilder::new();
        let base = builder.parameter(0);
        let index = builder.int32_constant(0);
        let load = builder.add(IrOpcode::Load(LoadRepresentation::signed(MachineRepresentation::Word32)), &[base, index]);
        let store = builder.add(IrOpcode::Store(StoreRepresentation::new(MachineRepresentation::Word32, WriteBarrierKind::NoWriteBarrier)), &[base, index, base]);
        let one = builder.int32_constant(1);
        let add = builder.add(IrOpcode::Int32Add, &[load, one]);
        let graph = builder.finish();

        let mut schedule = ScheduleBuilder::new();
        let block = schedule.new_block();
        for node in [base, index, load, store, one, add] {
            schedule.add_node(block, node);
        }
        schedule.set_control(block, BlockControl::Return(add));
        let schedule = schedule.finish(&graph).unwrap();

        let oracle = ScheduleCoverOracle::new(&graph, &schedule);
        assert_eq!(schedule.effect_level(load), 0);
        assert_eq!(schedule.effect_level(add), 1);
        assert!(!oracle.can_cover(add, load));
        assert!(oracle.can_cover(add, one));
    }

    #[test]
    fn nodes_cannot_be_scheduled_twice() {
        let mut builder = GraphBuilder::new();
        let p0 = builder.parameter(0);
        let graph = builder.finish();

        let mut schedule = ScheduleBuilder::new();
        let block = schedule.new_block();
        schedule.add_node(block, p0);
        schedule.add_node(block, p0);

        assert!(schedule.finish(&graph).is_err());
    }
}
