// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Dependency graph over workflow nodes
//!
//! Builds a petgraph view of a workflow's connections for cycle detection,
//! execution ordering, upstream closure (run-to) and graph rendering.

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use std::collections::{HashMap, HashSet};

use super::builder::Workflow;
use super::node::{NodeId, NodeKind};
use crate::errors::FlowError;

/// Node-level view of a workflow; one edge per connection
pub struct WorkflowGraph {
    graph: DiGraph<NodeId, usize>,
    id_to_index: HashMap<NodeId, NodeIndex>,
    names: Vec<String>,
    shapes: Vec<&'static str>,
    edge_labels: Vec<String>,
}

impl WorkflowGraph {
    /// Build the graph for a workflow
    pub fn build(workflow: &Workflow) -> Self {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();

        for idx in 0..workflow.nodes().len() {
            let id = NodeId(idx);
            id_to_index.insert(id, graph.add_node(id));
        }

        let mut edge_labels = Vec::with_capacity(workflow.connections().len());
        for (i, conn) in workflow.connections().iter().enumerate() {
            let from = id_to_index[&conn.from.node];
            let to = id_to_index[&conn.to.node];
            graph.add_edge(from, to, i);

            let from_port = workflow.nodes()[conn.from.node.0].outputs[conn.from.index].name.as_str();
            let to_port = workflow.nodes()[conn.to.node.0].inputs[conn.to.index].name.as_str();
            edge_labels.push(format!("{} → {}", from_port, to_port));
        }

        let names = workflow.nodes().iter().map(|n| n.name.clone()).collect();
        let shapes = workflow
            .nodes()
            .iter()
            .map(|n| match n.kind {
                NodeKind::Process(_) => "box",
                NodeKind::FanOut => "triangle",
                NodeKind::ParamGenerator(_) => "ellipse",
                NodeKind::Sink => "doublecircle",
            })
            .collect();

        Self {
            graph,
            id_to_index,
            names,
            shapes,
            edge_labels,
        }
    }

    fn name(&self, index: NodeIndex) -> &str {
        &self.names[self.graph[index].0]
    }

    /// Names of nodes on some cycle, if there is one
    fn find_cycle_members(&self) -> Vec<String> {
        for component in kosaraju_scc(&self.graph) {
            let is_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| self.graph.contains_edge(n, n));
            if is_cycle {
                let mut names: Vec<String> = component.iter().map(|&n| self.name(n).to_string()).collect();
                names.sort();
                return names;
            }
        }
        Vec::new()
    }

    /// Nodes in an order where every producer precedes its consumers
    pub fn topological_order(&self) -> Result<Vec<NodeId>, FlowError> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n]).collect())
            .map_err(|_| FlowError::CyclicGraph {
                nodes: self.find_cycle_members(),
            })
    }

    /// `node` plus everything reachable by following connections backward
    pub fn upstream_closure(&self, node: NodeId) -> HashSet<NodeId> {
        let mut closure = HashSet::new();
        let Some(&start) = self.id_to_index.get(&node) else {
            return closure;
        };

        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, start);
        while let Some(n) = dfs.next(reversed) {
            closure.insert(self.graph[n]);
        }
        closure
    }

    /// Generate Mermaid diagram of the workflow
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for index in self.graph.node_indices() {
            let id = self.graph[index].0;
            out.push_str(&format!("    n{}[\"{}\"]\n", id, self.names[id]));
        }

        for edge in self.graph.edge_indices() {
            let Some((from, to)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let label = &self.edge_labels[self.graph[edge]];
            out.push_str(&format!(
                "    n{} -->|{}| n{}\n",
                self.graph[from].0,
                label,
                self.graph[to].0
            ));
        }

        out
    }

    /// Generate DOT diagram of the workflow
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph workflow {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [style=rounded];\n\n");

        for index in self.graph.node_indices() {
            let id = self.graph[index].0;
            out.push_str(&format!(
                "    \"{}\" [shape={}];\n",
                self.names[id], self.shapes[id]
            ));
        }

        for edge in self.graph.edge_indices() {
            let Some((from, to)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            out.push_str(&format!(
                "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
                self.name(from),
                self.name(to),
                self.edge_labels[self.graph[edge]]
            ));
        }

        out.push_str("}\n");
        out
    }
}

impl Workflow {
    /// Render the workflow as a DOT graph
    pub fn to_dot(&self) -> String {
        self.graph().to_dot()
    }

    /// Render the workflow as a Mermaid flowchart
    pub fn to_mermaid(&self) -> String {
        self.graph().to_mermaid()
    }
}
