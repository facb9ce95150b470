// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::fmt::Display;

use smallvec::SmallVec;

use super::IrOpcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("n")?;
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    opcode: IrOpcode,
    inputs: SmallVec<[NodeId; 4]>,
}

impl Node {
    #[must_use]
    pub const fn opcode(&self) -> &IrOpcode {
        &self.opcode
    }

    #[must_use]
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }
}

/// Appends nodes to a graph under construction.
///
/// Inputs may still be rewired with [`GraphBuilder::set_input`] (loop phis
/// need an input that is created after them); once [`GraphBuilder::finish`]
/// has been called the graph is frozen.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, opcode: IrOpcode, inputs: &[NodeId]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            opcode,
            inputs: inputs.into(),
        });
        id
    }

    pub fn int32_constant(&mut self, value: i32) -> NodeId {
        self.add(IrOpcode::Int32Constant(value), &[])
    }

    pub fn float32_constant(&mut self, value: f32) -> NodeId {
        self.add(IrOpcode::Float32Constant(value), &[])
    }

    pub fn float64_constant(&mut self, value: f64) -> NodeId {
        self.add(IrOpcode::Float64Constant(value), &[])
    }

    pub fn parameter(&mut self, index: u32) -> NodeId {
        self.add(IrOpcode::Parameter(index), &[])
    }

    pub fn projection(&mut self, index: u32, node: NodeId) -> NodeId {
        self.add(IrOpcode::Projection(index), &[node])
    }

    /// Replaces one input of a node that was already added.
    ///
    /// # Panics
    /// Panics when `node` or `index` is out of range.
    pub fn set_input(&mut self, node: NodeId, index: usize, input: NodeId) {
        self.nodes[node.index()].inputs[index] = input;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn finish(self) -> Graph {
        let mut uses = vec![Vec::new(); self.nodes.len()];

        for (index, node) in self.nodes.iter().enumerate() {
            for input in &node.inputs {
                if let Some(list) = uses.get_mut(input.index()) {
                    list.push(NodeId(index as u32));
                }
            }
        }

        Graph {
            nodes: self.nodes,
            uses,
        }
    }
}

/// A frozen graph with use lists.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    uses: Vec<Vec<NodeId>>,
}

impl Graph {
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    #[must_use]
    pub fn opcode(&self, id: NodeId) -> &IrOpcode {
        &self.nodes[id.index()].opcode
    }

    #[must_use]
    pub fn input_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.index()].inputs.get(index).copied()
    }

    /// Every user of a node, once per input edge.
    #[must_use]
    pub fn uses(&self, id: NodeId) -> &[NodeId] {
        &self.uses[id.index()]
    }

    /// Whether `user` is the only consumer of `node`.
    #[must_use]
    pub fn owned_by(&self, node: NodeId, user: NodeId) -> bool {
        let uses = self.uses(node);
        !uses.is_empty() && uses.iter().all(|x| *x == user)
    }

    #[must_use]
    pub fn find_projection(&self, node: NodeId, index: u32) -> Option<NodeId> {
        self.uses(node)
            .iter()
            .copied()
            .find(|user| self.nodes[user.index()].opcode == IrOpcode::Projection(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_are_collected_per_edge() {
        let mut builder = GraphBuilder::new();
        let p0 = builder.parameter(0);
        let add = builder.add(IrOpcode::Int32Add, &[p0, p0]);
        let graph = builder.finish();

        assert_eq!(graph.uses(p0), &[add, add]);
        assert!(graph.owned_by(p0, add));
        assert!(!graph.owned_by(add, p0));
    }

    #[test]
    fn loop_phi_can_be_backpatched() {
        let mut builder = GraphBuilder::new();
        let start = builder.int32_constant(0);
        let phi = builder.add(IrOpcode::Phi, &[start, start]);
        let one = builder.int32_constant(1);
        let next = builder.add(IrOpcode::Int32Add, &[phi, one]);
        builder.set_input(phi, 1, next);

        let graph = builder.finish();
        assert_eq!(graph.node(phi).inputs(), &[start, next]);
        assert_eq!(graph.uses(next), &[phi]);
    }

    #[test]
    fn find_projection_by_index() {
        let mut builder = GraphBuilder::new();
        let p0 = builder.parameter(0);
        let p1 = builder.parameter(1);
        let add = builder.add(IrOpcode::Int32AddWithOverflow, &[p0, p1]);
        let ovf = builder.projection(1, add);
        let graph = builder.finish();

        assert_eq!(graph.find_projection(add, 1), Some(ovf));
        assert_eq!(graph.find_projection(add, 0), None);
    }
}
