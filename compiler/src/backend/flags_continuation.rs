// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::ir::{BlockId, NodeId};

use super::{FlagsCondition, FlagsMode, InstructionCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationKind {
    None,
    Branch {
        if_true: BlockId,
        if_false: BlockId,
    },
    Deoptimize {
        frame_state: NodeId,
    },
    Set {
        result: NodeId,
    },
    Trap {
        trap_id: u32,
    },
}

/// What happens with the condition computed by a compare: branch on it,
/// materialize it as a boolean, deoptimize or trap when it holds, or
/// nothing at all.
///
/// A continuation is created for one compare and consumed by the routine
/// that lowers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagsContinuation {
    kind: ContinuationKind,
    condition: FlagsCondition,
    negated: bool,
}

impl FlagsContinuation {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: ContinuationKind::None,
            condition: FlagsCondition::Equal,
            negated: false,
        }
    }

    #[must_use]
    pub const fn for_branch(condition: FlagsCondition, if_true: BlockId, if_false: BlockId) -> Self {
        Self::new(ContinuationKind::Branch { if_true, if_false }, condition)
    }

    #[must_use]
    pub const fn for_deoptimize(condition: FlagsCondition, frame_state: NodeId) -> Self {
        Self::new(ContinuationKind::Deoptimize { frame_state }, condition)
    }

    #[must_use]
    pub const fn for_set(condition: FlagsCondition, result: NodeId) -> Self {
        Self::new(ContinuationKind::Set { result }, condition)
    }

    #[must_use]
    pub const fn for_trap(condition: FlagsCondition, trap_id: u32) -> Self {
        Self::new(ContinuationKind::Trap { trap_id }, condition)
    }

    const fn new(kind: ContinuationKind, condition: FlagsCondition) -> Self {
        Self {
            kind,
            condition,
            negated: false,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ContinuationKind {
        self.kind
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self.kind, ContinuationKind::None)
    }

    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self.kind, ContinuationKind::Branch { .. })
    }

    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self.kind, ContinuationKind::Set { .. })
    }

    #[must_use]
    pub const fn is_deoptimize(&self) -> bool {
        matches!(self.kind, ContinuationKind::Deoptimize { .. })
    }

    #[must_use]
    pub const fn mode(&self) -> FlagsMode {
        match self.kind {
            ContinuationKind::None => FlagsMode::None,
            ContinuationKind::Branch { .. } => FlagsMode::Branch,
            ContinuationKind::Deoptimize { .. } => FlagsMode::Deoptimize,
            ContinuationKind::Set { .. } => FlagsMode::Set,
            ContinuationKind::Trap { .. } => FlagsMode::Trap,
        }
    }

    /// The condition to test, with any pending negation applied.
    #[must_use]
    pub const fn condition(&self) -> FlagsCondition {
        if self.negated {
            self.condition.negate()
        } else {
            self.condition
        }
    }

    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn negate(&mut self) {
        debug_assert!(!self.is_none());
        self.negated = !self.negated;
    }

    /// Adjusts the condition after the operands of the compare were
    /// swapped.
    pub fn commute(&mut self) {
        debug_assert!(!self.is_none());
        self.condition = self.condition.commute();
    }

    /// Replaces the condition, negating the continuation when it tested for
    /// equality. Used when a test against zero is folded into the compare
    /// that produced the tested value.
    pub fn overwrite_and_negate_if_equal(&mut self, condition: FlagsCondition) {
        let negate = self.condition == FlagsCondition::Equal;
        self.condition = condition;
        if negate {
            self.negated = !self.negated;
        }
    }

    /// Folds the flags mode and, unless there is nothing to continue with,
    /// the condition into the opcode word.
    #[must_use]
    pub fn encode(&self, code: impl Into<InstructionCode>) -> InstructionCode {
        let code = code.into();

        if self.is_none() {
            return code;
        }

        code.with_flags(self.mode(), self.condition())
    }
}

impl Default for FlagsContinuation {
    fn default() -> Self {
        Self::none()
    }
}
