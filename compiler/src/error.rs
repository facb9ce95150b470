// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use thiserror::Error;

use crate::ir::{MachineRepresentation, NodeId};

/// Conditions under which a function cannot be lowered.
///
/// None of these are recoverable for the function being compiled; a failed
/// selection never yields a partial sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Operatie `{opcode}` van knoop {node} wordt niet ondersteund op MIPS32")]
    UnsupportedOperation {
        node: NodeId,
        opcode: &'static str,
    },

    #[error("Geheugenrepresentatie `{representation}` van knoop {node} wordt niet ondersteund")]
    UnsupportedRepresentation {
        node: NodeId,
        representation: MachineRepresentation,
    },

    #[error("Knoop {node} is ongeldig: {reason}")]
    MalformedGraph {
        node: NodeId,
        reason: &'static str,
    },

    #[error("Maximaal aantal instructies ({limit}) overschreden")]
    ZoneExhausted {
        limit: usize,
    },
}

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("Kon functiebeschrijving niet lezen: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Knoop {node} verwijst naar onbekende knoop {input}")]
    UnknownInput {
        node: u32,
        input: u32,
    },

    #[error("Blok {block} verwijst naar onbekende knoop {node}")]
    UnknownNode {
        block: u32,
        node: u32,
    },

    #[error("Blok {block} springt naar onbekend blok {target}")]
    UnknownBlock {
        block: u32,
        target: u32,
    },

    #[error(transparent)]
    Selection(#[from] SelectionError),
}
