// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Workflow validation
//!
//! Checks a built workflow before execution and produces an immutable
//! [`ValidatedWorkflow`]. All structural errors surface here, before any
//! command runs.

use std::collections::{BTreeMap, HashMap};

use super::builder::Workflow;
use super::node::{Node, NodeId, NodeKind};
use super::port::PortHandle;
use crate::errors::{FlowError, FlowResult};
use crate::path_strategy::PathStrategy;

/// A workflow that passed validation; consumed by the runner
#[derive(Debug)]
pub struct ValidatedWorkflow {
    workflow: Workflow,
    order: Vec<NodeId>,
    unbounded: Vec<bool>,
}

impl ValidatedWorkflow {
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn name(&self) -> &str {
        self.workflow.name()
    }

    /// Node names, producers before consumers
    pub fn execution_order(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter_map(|&id| self.workflow.node(id).map(|n| n.name.as_str()))
            .collect()
    }

    /// Whether connection `index` carries a stream that never ends on its own
    pub fn is_unbounded(&self, index: usize) -> bool {
        self.unbounded.get(index).copied().unwrap_or(false)
    }

    /// Whether a process fires a single task: it has no in-ports, or all of
    /// them are fed by unbounded constant streams
    pub fn fires_once(&self, node: NodeId) -> bool {
        self.workflow
            .connections()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.to.node == node)
            .all(|(i, _)| self.is_unbounded(i))
    }

    pub(crate) fn into_parts(self) -> (Workflow, Vec<bool>) {
        (self.workflow, self.unbounded)
    }
}

impl Workflow {
    /// Validate the workflow
    pub fn validate(self) -> FlowResult<ValidatedWorkflow> {
        check_multicast(&self)?;

        let order = self.graph().topological_order()?;

        for (idx, node) in self.nodes().iter().enumerate() {
            check_ports_connected(&self, NodeId(idx), node)?;
            check_path_strategies(node)?;
        }

        check_static_collisions(&self)?;

        let unbounded = unbounded_connections(&self, &order);

        tracing::debug!(
            workflow = self.name(),
            nodes = self.nodes().len(),
            connections = self.connections().len(),
            "Workflow validated"
        );

        Ok(ValidatedWorkflow {
            workflow: self,
            order,
            unbounded,
        })
    }
}

fn check_multicast(workflow: &Workflow) -> FlowResult<()> {
    let mut consumers: BTreeMap<PortHandle, usize> = BTreeMap::new();
    for conn in workflow.connections() {
        *consumers.entry(conn.from).or_default() += 1;
    }

    match consumers.into_iter().find(|(_, count)| *count > 1) {
        Some((port, count)) => Err(FlowError::MulticastWithoutFanOut {
            port: workflow.output_label(port),
            consumers: count,
        }),
        None => Ok(()),
    }
}

fn check_ports_connected(workflow: &Workflow, id: NodeId, node: &Node) -> FlowResult<()> {
    let connections = workflow.connections();

    for index in 0..node.inputs.len() {
        let handle = PortHandle { node: id, index };
        if !connections.iter().any(|c| c.to == handle) {
            return Err(FlowError::UnconnectedPort {
                port: node.input_label(index),
            });
        }
    }

    for index in 0..node.outputs.len() {
        let handle = PortHandle { node: id, index };
        if !connections.iter().any(|c| c.from == handle) {
            let port = node.output_label(index);
            return Err(match node.kind {
                NodeKind::FanOut => FlowError::UnconnectedFanOutTarget { port },
                _ => FlowError::UnconnectedPort { port },
            });
        }
    }

    Ok(())
}

fn check_path_strategies(node: &Node) -> FlowResult<()> {
    let Some(def) = node.as_process() else {
        return Ok(());
    };

    for output in def.template.outputs() {
        if !def.paths.contains_key(&output) {
            return Err(FlowError::MissingPathStrategy {
                port: format!("{}.{}", node.name, output),
            });
        }
    }

    Ok(())
}

/// Two out-ports writing the same fixed path would race on it
fn check_static_collisions(workflow: &Workflow) -> FlowResult<()> {
    let mut writers: HashMap<&str, String> = HashMap::new();

    for node in workflow.nodes() {
        let Some(def) = node.as_process() else {
            continue;
        };
        for (port, strategy) in &def.paths {
            let PathStrategy::Static(path) = strategy else {
                continue;
            };
            let writer = format!("{}.{}", node.name, port);
            if let Some(first) = writers.insert(path.as_str(), writer.clone()) {
                return Err(FlowError::OutputPathCollision {
                    path: path.clone(),
                    first,
                    second: writer,
                });
            }
        }
    }

    Ok(())
}

/// Mark connections whose stream never ends on its own: the outputs of
/// constant parameter generators and of fan-outs fed by such streams.
fn unbounded_connections(workflow: &Workflow, order: &[NodeId]) -> Vec<bool> {
    let connections = workflow.connections();
    let mut unbounded = vec![false; connections.len()];

    for &id in order {
        let Some(node) = workflow.node(id) else {
            continue;
        };
        let source_unbounded = match &node.kind {
            NodeKind::ParamGenerator(source) => source.is_unbounded(),
            NodeKind::FanOut => connections
                .iter()
                .enumerate()
                .any(|(i, c)| c.to.node == id && unbounded[i]),
            NodeKind::Process(_) | NodeKind::Sink => false,
        };

        if source_unbounded {
            for (i, conn) in connections.iter().enumerate() {
                if conn.from.node == id {
                    unbounded[i] = true;
                }
            }
        }
    }

    unbounded
}
