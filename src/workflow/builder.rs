// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Workflow graph builder
//!
//! A [`Workflow`] is an owned builder value. Nodes are added by name, ports
//! are addressed by name through [`NodeId::out`] / [`NodeId::input`] and
//! resolved into stable handles when connected. Nothing is shared or
//! global: validation consumes the builder and hands back an immutable
//! [`ValidatedWorkflow`](super::ValidatedWorkflow).

use std::collections::{BTreeSet, HashMap};

use super::dag::WorkflowGraph;
use super::node::{Node, NodeId, NodeKind, ParamSource};
use super::port::{Connection, Direction, PortHandle, PortKind, PortRef, PortSpec};
use crate::errors::{FlowError, FlowResult};
use crate::path_strategy::PathStrategy;
use crate::process::CommandTemplate;

/// A workflow under construction
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
    connections: Vec<Connection>,
}

impl Workflow {
    /// Create an empty workflow
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            by_name: HashMap::new(),
            connections: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Look up a node by name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    fn add_node(&mut self, node: Node) -> FlowResult<NodeId> {
        if self.by_name.contains_key(&node.name) {
            return Err(FlowError::DuplicateNode { node: node.name });
        }

        let mut seen = BTreeSet::new();
        for port in node.outputs.iter() {
            if !seen.insert(port.name.as_str()) {
                return Err(FlowError::DuplicatePort {
                    node: node.name.clone(),
                    port: port.name.clone(),
                });
            }
        }

        let id = NodeId(self.nodes.len());
        tracing::debug!(node = %node.name, kind = node.kind.label(), "Adding node");
        self.by_name.insert(node.name.clone(), id);
        self.nodes.push(node);
        Ok(id)
    }

    fn node_mut(&mut self, id: NodeId) -> FlowResult<&mut Node> {
        self.nodes.get_mut(id.0).ok_or_else(|| FlowError::UnknownNode {
            node: id.to_string(),
        })
    }

    fn node_ref(&self, id: NodeId) -> FlowResult<&Node> {
        self.nodes.get(id.0).ok_or_else(|| FlowError::UnknownNode {
            node: id.to_string(),
        })
    }

    /// Declare a process from a command template; ports come from its placeholders
    pub fn process(&mut self, name: impl Into<String>, command: &str) -> FlowResult<NodeId> {
        let name = name.into();
        let template = CommandTemplate::parse(&name, command)?;
        self.add_node(Node::process(name, template))
    }

    /// Assign the path strategy for a process out-port
    pub fn set_path(&mut self, process: NodeId, port: &str, strategy: PathStrategy) -> FlowResult<()> {
        let node = self.node_mut(process)?;
        let node_name = node.name.clone();

        let is_file_output = node
            .outputs
            .iter()
            .any(|p| p.name == port && p.kind == PortKind::File);
        if !is_file_output {
            return Err(FlowError::UnknownPort {
                node: node_name,
                port: port.to_string(),
            });
        }

        if let Some(source) = strategy.source_port() {
            let is_file_input = node
                .inputs
                .iter()
                .any(|p| p.name == source && p.kind == PortKind::File);
            if !is_file_input {
                return Err(FlowError::UnknownPort {
                    node: node_name,
                    port: source.to_string(),
                });
            }
        }

        match &mut node.kind {
            NodeKind::Process(def) => {
                def.paths.insert(port.to_string(), strategy);
                Ok(())
            }
            _ => Err(FlowError::WrongNodeKind {
                node: node_name,
                expected: "process".into(),
            }),
        }
    }

    /// Shorthand for [`PathStrategy::Static`]
    pub fn set_path_static(&mut self, process: NodeId, port: &str, path: &str) -> FlowResult<()> {
        self.set_path(process, port, PathStrategy::fixed(path))
    }

    /// Shorthand for [`PathStrategy::SuffixReplace`]
    pub fn set_path_replace(
        &mut self,
        process: NodeId,
        source: &str,
        port: &str,
        from: &str,
        to: &str,
    ) -> FlowResult<()> {
        self.set_path(process, port, PathStrategy::replace(source, from, to))
    }

    /// Shorthand for [`PathStrategy::SuffixExtend`]
    pub fn set_path_extend(
        &mut self,
        process: NodeId,
        source: &str,
        port: &str,
        suffix: &str,
    ) -> FlowResult<()> {
        self.set_path(process, port, PathStrategy::extend(source, suffix))
    }

    /// Declare a pass-through parameter out-port re-emitting a consumed parameter
    pub fn param_out(&mut self, process: NodeId, param: &str) -> FlowResult<()> {
        let node = self.node_mut(process)?;
        let node_name = node.name.clone();

        let has_param = node
            .inputs
            .iter()
            .any(|p| p.name == param && p.kind == PortKind::Param);
        if !has_param {
            return Err(FlowError::UnknownPort {
                node: node_name,
                port: param.to_string(),
            });
        }
        if node.output_index(param).is_some() {
            return Err(FlowError::DuplicatePort {
                node: node_name,
                port: param.to_string(),
            });
        }

        match &mut node.kind {
            NodeKind::Process(def) => {
                def.passthrough.push(param.to_string());
                node.outputs.push(PortSpec::param(param));
                Ok(())
            }
            _ => Err(FlowError::WrongNodeKind {
                node: node_name,
                expected: "process".into(),
            }),
        }
    }

    /// Declare a fan-out with one named out-port per intended consumer
    pub fn fan_out<I, S>(&mut self, name: impl Into<String>, kind: PortKind, outputs: I) -> FlowResult<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let outputs = outputs.into_iter().map(Into::into).collect();
        self.add_node(Node::fan_out(name, kind, outputs))
    }

    /// Declare a parameter generator with the given out-ports
    pub fn param_generator<I, S>(
        &mut self,
        name: impl Into<String>,
        source: ParamSource,
        outputs: I,
    ) -> FlowResult<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let outputs = outputs.into_iter().map(Into::into).collect();
        self.add_node(Node::param_generator(name, source, outputs))
    }

    /// Declare a sink; in-ports are added by [`Workflow::drain`]
    pub fn sink(&mut self, name: impl Into<String>) -> FlowResult<NodeId> {
        self.add_node(Node::sink(name))
    }

    /// Add an in-port to a sink and connect `from` to it
    pub fn drain(&mut self, sink: NodeId, from: PortRef) -> FlowResult<()> {
        let (_, kind) = self.resolve(&from)?;
        let node = self.node_mut(sink)?;
        if !matches!(node.kind, NodeKind::Sink) {
            return Err(FlowError::WrongNodeKind {
                node: node.name.clone(),
                expected: "sink".into(),
            });
        }

        let port = format!("in{}", node.inputs.len());
        node.inputs.push(PortSpec {
            name: port.clone(),
            kind,
        });
        self.connect(from, sink.input(port))
    }

    /// Address an out-port by node and port name
    pub fn out_port(&self, node: &str, port: &str) -> FlowResult<PortRef> {
        self.port_by_name(node, port, Direction::Out)
    }

    /// Address an in-port by node and port name
    pub fn in_port(&self, node: &str, port: &str) -> FlowResult<PortRef> {
        self.port_by_name(node, port, Direction::In)
    }

    fn port_by_name(&self, node: &str, port: &str, direction: Direction) -> FlowResult<PortRef> {
        let id = self.find(node).ok_or_else(|| FlowError::UnknownNode {
            node: node.to_string(),
        })?;
        let port = match direction {
            Direction::Out => PortRef::output(id, port),
            Direction::In => PortRef::input(id, port),
        };
        self.resolve(&port)?;
        Ok(port)
    }

    /// Resolve a port address into a handle and its kind
    pub fn resolve(&self, port: &PortRef) -> FlowResult<(PortHandle, PortKind)> {
        let node = self.node_ref(port.node)?;
        let (index, list) = match port.direction {
            Direction::Out => (node.output_index(&port.name), &node.outputs),
            Direction::In => (node.input_index(&port.name), &node.inputs),
        };

        match index {
            Some(index) => Ok((
                PortHandle {
                    node: port.node,
                    index,
                },
                list[index].kind,
            )),
            None => Err(FlowError::UnknownPort {
                node: node.name.clone(),
                port: port.name.clone(),
            }),
        }
    }

    /// Connect an out-port to an in-port
    pub fn connect(&mut self, from: PortRef, to: PortRef) -> FlowResult<()> {
        let (from_handle, from_kind) = self.resolve(&from)?;
        let (to_handle, to_kind) = self.resolve(&to)?;

        // a port addressed with the wrong direction does not exist on that side
        if from.direction != Direction::Out {
            return Err(self.unknown_port(&from));
        }
        if to.direction != Direction::In {
            return Err(self.unknown_port(&to));
        }

        if from_kind != to_kind {
            return Err(FlowError::PortKindMismatch {
                from: self.output_label(from_handle),
                from_kind,
                to: self.input_label(to_handle),
                to_kind,
            });
        }

        if let Some(existing) = self.connections.iter().find(|c| c.to == to_handle) {
            return Err(FlowError::PortAlreadyConnected {
                port: self.input_label(to_handle),
                existing: self.output_label(existing.from),
            });
        }

        tracing::debug!(
            from = %self.output_label(from_handle),
            to = %self.input_label(to_handle),
            "Connecting"
        );
        self.connections.push(Connection {
            from: from_handle,
            to: to_handle,
        });
        Ok(())
    }

    fn unknown_port(&self, port: &PortRef) -> FlowError {
        FlowError::UnknownPort {
            node: self
                .node(port.node)
                .map_or_else(|| port.node.to_string(), |n| n.name.clone()),
            port: port.name.clone(),
        }
    }

    pub(crate) fn output_label(&self, handle: PortHandle) -> String {
        self.nodes
            .get(handle.node.0)
            .map_or_else(|| handle.node.to_string(), |n| n.output_label(handle.index))
    }

    pub(crate) fn input_label(&self, handle: PortHandle) -> String {
        self.nodes
            .get(handle.node.0)
            .map_or_else(|| handle.node.to_string(), |n| n.input_label(handle.index))
    }

    /// Dependency graph over nodes
    pub fn graph(&self) -> WorkflowGraph {
        WorkflowGraph::build(self)
    }

    /// Keep only `target` and everything upstream of it.
    ///
    /// Out-ports of kept nodes whose consumers are dropped get drained by an
    /// added sink, so the pruned workflow validates and completes.
    pub fn upstream_of(self, target: &str) -> FlowResult<Workflow> {
        let target_id = self.find(target).ok_or_else(|| FlowError::UnknownNode {
            node: target.to_string(),
        })?;
        let keep = self.graph().upstream_closure(target_id);

        let mut pruned = Workflow::new(self.name.clone());
        let mut remap = HashMap::new();
        let mut dangling = Vec::new();

        for (idx, node) in self.nodes.iter().enumerate() {
            if keep.contains(&NodeId(idx)) {
                let id = pruned.add_node(node.clone())?;
                remap.insert(NodeId(idx), id);
            }
        }

        for conn in &self.connections {
            match (remap.get(&conn.from.node), remap.get(&conn.to.node)) {
                (Some(&from), Some(&to)) => pruned.connections.push(Connection {
                    from: PortHandle {
                        node: from,
                        index: conn.from.index,
                    },
                    to: PortHandle {
                        node: to,
                        index: conn.to.index,
                    },
                }),
                (Some(&from), None) => dangling.push(PortHandle {
                    node: from,
                    index: conn.from.index,
                }),
                _ => {}
            }
        }

        if !dangling.is_empty() {
            let mut sink_name = format!("{}.drain", target);
            while pruned.by_name.contains_key(&sink_name) {
                sink_name.push('_');
            }
            let sink = pruned.sink(sink_name)?;
            dangling.sort();
            dangling.dedup();
            for handle in dangling {
                let name = pruned.nodes[handle.node.0].outputs[handle.index].name.clone();
                pruned.drain(sink, handle.node.out(name))?;
            }
        }

        tracing::info!(
            target = target,
            kept = pruned.nodes.len(),
            dropped = self.nodes.len() - keep.len(),
            "Restricted workflow to upstream closure"
        );

        Ok(pruned)
    }
}
