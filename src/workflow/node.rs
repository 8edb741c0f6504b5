// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Node definitions
//!
//! A node is a process, fan-out, parameter generator or sink together with
//! its declared in- and out-ports. Port order is fixed at declaration time
//! and port handles index into these lists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::port::{PortKind, PortRef, PortSpec};
use crate::path_strategy::PathStrategy;
use crate::process::CommandTemplate;

/// Handle to a node inside a [`Workflow`](super::Workflow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in its workflow
    pub fn index(self) -> usize {
        self.0
    }

    /// Address an out-port of this node by name
    pub fn out(self, name: impl Into<String>) -> PortRef {
        PortRef::output(self, name)
    }

    /// Address an in-port of this node by name
    pub fn input(self, name: impl Into<String>) -> PortRef {
        PortRef::input(self, name)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Values produced by a parameter generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSource {
    /// Same value on every pull, for as long as consumers pull
    Constant(String),
    /// Each value once, then end of stream
    Sequence(Vec<String>),
}

impl ParamSource {
    pub fn constant(value: impl Into<String>) -> Self {
        Self::Constant(value.into())
    }

    pub fn sequence<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }

    /// Whether the stream never ends on its own
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Constant(_))
    }
}

/// Process definition: a command template plus output path strategies
#[derive(Debug, Clone)]
pub struct ProcessDef {
    pub template: CommandTemplate,
    /// Path strategy per file out-port
    pub paths: BTreeMap<String, PathStrategy>,
    /// Parameter in-ports whose consumed values are re-emitted downstream
    pub passthrough: Vec<String>,
}

impl ProcessDef {
    pub fn new(template: CommandTemplate) -> Self {
        Self {
            template,
            paths: BTreeMap::new(),
            passthrough: Vec::new(),
        }
    }
}

/// What a node does
#[derive(Debug, Clone)]
pub enum NodeKind {
    Process(ProcessDef),
    FanOut,
    ParamGenerator(ParamSource),
    Sink,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Process(_) => "process",
            Self::FanOut => "fan-out",
            Self::ParamGenerator(_) => "param generator",
            Self::Sink => "sink",
        }
    }
}

/// A node with its ports
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
}

impl Node {
    /// Build a process node; ports come from the template placeholders
    pub fn process(name: impl Into<String>, template: CommandTemplate) -> Self {
        let inputs = template
            .inputs()
            .into_iter()
            .map(PortSpec::file)
            .chain(template.params().into_iter().map(PortSpec::param))
            .collect();
        let outputs = template.outputs().into_iter().map(PortSpec::file).collect();

        Self {
            name: name.into(),
            kind: NodeKind::Process(ProcessDef::new(template)),
            inputs,
            outputs,
        }
    }

    pub fn fan_out(name: impl Into<String>, kind: PortKind, outputs: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::FanOut,
            inputs: vec![PortSpec {
                name: "in".into(),
                kind,
            }],
            outputs: outputs.into_iter().map(|name| PortSpec { name, kind }).collect(),
        }
    }

    pub fn param_generator(name: impl Into<String>, source: ParamSource, outputs: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::ParamGenerator(source),
            inputs: Vec::new(),
            outputs: outputs.into_iter().map(PortSpec::param).collect(),
        }
    }

    pub fn sink(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Sink,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|p| p.name == name)
    }

    /// `node.port` label for an in-port
    pub fn input_label(&self, index: usize) -> String {
        port_label(&self.name, self.inputs.get(index))
    }

    /// `node.port` label for an out-port
    pub fn output_label(&self, index: usize) -> String {
        port_label(&self.name, self.outputs.get(index))
    }

    pub fn as_process(&self) -> Option<&ProcessDef> {
        match &self.kind {
            NodeKind::Process(def) => Some(def),
            _ => None,
        }
    }
}

fn port_label(node: &str, port: Option<&PortSpec>) -> String {
    match port {
        Some(p) => format!("{}.{}", node, p.name),
        None => format!("{}.?", node),
    }
}
