// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use serde::Deserialize;

use crate::DescriptionError;

use super::{BlockControl, BlockId, Graph, GraphBuilder, IrOpcode, NodeId, Schedule, ScheduleBuilder};

/// A function written down as TOML: a list of nodes (referring to each
/// other by position) and a list of blocks in reverse post-order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FunctionDescription {
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,

    #[serde(default)]
    pub blocks: Vec<BlockDescription>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeDescription {
    pub op: IrOpcode,

    #[serde(default)]
    pub inputs: Vec<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BlockDescription {
    #[serde(default)]
    pub nodes: Vec<u32>,

    #[serde(default)]
    pub control: ControlDescription,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlDescription {
    #[default]
    None,
    Goto(u32),
    Branch {
        branch: u32,
        if_true: u32,
        if_false: u32,
    },
    Switch {
        value: u32,
        #[serde(default)]
        cases: Vec<(i32, u32)>,
        default: u32,
    },
    Return(u32),
}

impl FunctionDescription {
    pub fn from_toml(source: &str) -> Result<Self, DescriptionError> {
        Ok(toml::from_str(source)?)
    }

    pub fn build(&self) -> Result<(Graph, Schedule), DescriptionError> {
        let node_count = self.nodes.len() as u32;

        let mut graph = GraphBuilder::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(input) = node.inputs.iter().find(|input| **input >= node_count) {
                return Err(DescriptionError::UnknownInput { node: index as u32, input: *input });
            }

            let inputs: Vec<NodeId> = node.inputs.iter().copied().map(NodeId::new).collect();
            graph.add(node.op, &inputs);
        }
        let graph = graph.finish();

        let block_count = self.blocks.len() as u32;
        let block_id = |block: u32, target: u32| {
            if target < block_count {
                Ok(BlockId::new(target))
            } else {
                Err(DescriptionError::UnknownBlock { block, target })
            }
        };
        let node_id = |block: u32, node: u32| {
            if node < node_count {
                Ok(NodeId::new(node))
            } else {
                Err(DescriptionError::UnknownNode { block, node })
            }
        };

        let mut schedule = ScheduleBuilder::new();
        for _ in &self.blocks {
            schedule.new_block();
        }

        for (index, description) in self.blocks.iter().enumerate() {
            let index = index as u32;
            let block = BlockId::new(index);

            for node in &description.nodes {
                schedule.add_node(block, node_id(index, *node)?);
            }

            let control = match &description.control {
                ControlDescription::None => BlockControl::None,
                ControlDescription::Goto(target) => BlockControl::Goto(block_id(index, *target)?),
                ControlDescription::Branch { branch, if_true, if_false } => BlockControl::Branch {
                    branch: node_id(index, *branch)?,
                    if_true: block_id(index, *if_true)?,
                    if_false: block_id(index, *if_false)?,
                },
                ControlDescription::Switch { value, cases, default } => BlockControl::Switch {
                    value: node_id(index, *value)?,
                    cases: cases.iter()
                        .map(|(value, target)| block_id(index, *target).map(|target| (*value, target)))
                        .collect::<Result<_, _>>()?,
                    default: block_id(index, *default)?,
                },
                ControlDescription::Return(value) => BlockControl::Return(node_id(index, *value)?),
            };
            schedule.set_control(block, control);
        }

        let schedule = schedule.finish(&graph)?;
        Ok((graph, schedule))
    }
}
