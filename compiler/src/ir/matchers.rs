// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use super::{Graph, IrOpcode, NodeId};

/// A constant type a [`ValueMatcher`] can recognize.
pub trait MatchedValue: Copy + PartialEq + PartialOrd {
    #[must_use]
    fn from_opcode(opcode: &IrOpcode) -> Option<Self>;
}

impl MatchedValue for i32 {
    fn from_opcode(opcode: &IrOpcode) -> Option<Self> {
        match opcode {
            IrOpcode::Int32Constant(value) => Some(*value),
            _ => None,
        }
    }
}

impl MatchedValue for f32 {
    fn from_opcode(opcode: &IrOpcode) -> Option<Self> {
        match opcode {
            IrOpcode::Float32Constant(value) => Some(*value),
            _ => None,
        }
    }
}

impl MatchedValue for f64 {
    fn from_opcode(opcode: &IrOpcode) -> Option<Self> {
        match opcode {
            IrOpcode::Float64Constant(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValueMatcher<'g, T: MatchedValue> {
    graph: &'g Graph,
    node: NodeId,
    value: Option<T>,
}

pub type Int32Matcher<'g> = ValueMatcher<'g, i32>;
pub type Float32Matcher<'g> = ValueMatcher<'g, f32>;
pub type Float64Matcher<'g> = ValueMatcher<'g, f64>;

impl<'g, T: MatchedValue> ValueMatcher<'g, T> {
    #[must_use]
    pub fn new(graph: &'g Graph, node: NodeId) -> Self {
        Self {
            graph,
            node,
            value: T::from_opcode(graph.opcode(node)),
        }
    }

    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn opcode(&self) -> &'g IrOpcode {
        self.graph.opcode(self.node)
    }

    #[must_use]
    pub fn is_opcode(&self, opcode: IrOpcode) -> bool {
        *self.opcode() == opcode
    }

    #[must_use]
    pub fn input_at(&self, index: usize) -> Option<NodeId> {
        self.graph.input_at(self.node, index)
    }

    #[must_use]
    pub const fn has_value(&self) -> bool {
        self.value.is_some()
    }

    #[must_use]
    pub const fn value(&self) -> Option<T> {
        self.value
    }

    #[must_use]
    pub fn is(&self, value: T) -> bool {
        self.value == Some(value)
    }

    #[must_use]
    pub fn is_in_range(&self, low: T, high: T) -> bool {
        self.value.is_some_and(|value| low <= value && value <= high)
    }
}

impl ValueMatcher<'_, i32> {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.is(0)
    }
}

impl ValueMatcher<'_, f32> {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.is(0.0)
    }

    #[must_use]
    pub fn is_minus_zero(&self) -> bool {
        self.value.is_some_and(|value| value == 0.0 && value.is_sign_negative())
    }
}

impl ValueMatcher<'_, f64> {
    /// Positive and negative zero both count.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.is(0.0)
    }

    #[must_use]
    pub fn is_minus_zero(&self) -> bool {
        self.value.is_some_and(|value| value == 0.0 && value.is_sign_negative())
    }
}

/// Matches a binary operation.
///
/// For commutative operations a constant operand is always reported on the
/// right. Non-commutative operations keep their source order.
#[derive(Debug, Clone, Copy)]
pub struct BinopMatcher<'g, T: MatchedValue> {
    node: NodeId,
    left: ValueMatcher<'g, T>,
    right: ValueMatcher<'g, T>,
}

pub type Int32BinopMatcher<'g> = BinopMatcher<'g, i32>;
pub type Float32BinopMatcher<'g> = BinopMatcher<'g, f32>;
pub type Float64BinopMatcher<'g> = BinopMatcher<'g, f64>;

impl<'g, T: MatchedValue> BinopMatcher<'g, T> {
    /// # Panics
    /// Panics when the node has fewer than two inputs.
    #[must_use]
    pub fn new(graph: &'g Graph, node: NodeId) -> Self {
        let inputs = graph.node(node).inputs();
        assert!(inputs.len() >= 2, "binaire operatie {node} heeft twee invoerwaarden nodig");

        let mut left = ValueMatcher::new(graph, inputs[0]);
        let mut right = ValueMatcher::new(graph, inputs[1]);

        if graph.opcode(node).is_commutative() && left.has_value() && !right.has_value() {
            std::mem::swap(&mut left, &mut right);
        }

        Self { node, left, right }
    }

    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub const fn left(&self) -> &ValueMatcher<'g, T> {
        &self.left
    }

    #[must_use]
    pub const fn right(&self) -> &ValueMatcher<'g, T> {
        &self.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::GraphBuilder;

    #[test]
    fn commutative_binop_puts_constant_on_the_right() {
        let mut builder = GraphBuilder::new();
        let constant = builder.int32_constant(7);
        let p0 = builder.parameter(0);
        let and = builder.add(IrOpcode::Word32And, &[constant, p0]);
        let sub = builder.add(IrOpcode::Int32Sub, &[constant, p0]);
        let graph = builder.finish();

        let m = Int32BinopMatcher::new(&graph, and);
        assert_eq!(m.left().node(), p0);
        assert!(m.right().is(7));

        let m = Int32BinopMatcher::new(&graph, sub);
        assert_eq!(m.left().node(), constant);
        assert_eq!(m.right().node(), p0);
    }

    #[test]
    fn minus_zero_is_distinguished() {
        let mut builder = GraphBuilder::new();
        let minus_zero = builder.float64_constant(-0.0);
        let zero = builder.float64_constant(0.0);
        let graph = builder.finish();

        assert!(Float64Matcher::new(&graph, minus_zero).is_minus_zero());
        assert!(Float64Matcher::new(&graph, minus_zero).is_zero());
        assert!(!Float64Matcher::new(&graph, zero).is_minus_zero());
    }

    #[test]
    fn range_check() {
        let mut builder = GraphBuilder::new();
        let c = builder.int32_constant(31);
        let p = builder.parameter(0);
        let graph = builder.finish();

        assert!(Int32Matcher::new(&graph, c).is_in_range(1, 31));
        assert!(!Int32Matcher::new(&graph, c).is_in_range(1, 30));
        assert!(!Int32Matcher::new(&graph, p).is_in_range(i32::MIN, i32::MAX));
    }
}
