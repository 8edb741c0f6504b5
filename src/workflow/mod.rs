// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Workflow graph model
//!
//! Nodes, typed ports and connections, the builder that assembles them, and
//! the validation step that turns a [`Workflow`] into a [`ValidatedWorkflow`].

mod builder;
mod dag;
mod node;
mod port;
mod validation;

pub use builder::Workflow;
pub use dag::WorkflowGraph;
pub use node::{Node, NodeId, NodeKind, ParamSource, ProcessDef};
pub use port::{Connection, Direction, PortHandle, PortKind, PortRef, PortSpec, Token};
pub use validation::ValidatedWorkflow;
