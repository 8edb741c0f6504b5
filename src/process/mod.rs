// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Processes
//!
//! Command templates, tasks, and the driver that turns a stream of input
//! tuples into task firings.

mod task;
mod template;

pub use task::{Task, TaskRecord, TMP_SUFFIX};
pub use template::{CommandTemplate, Placeholder, PlaceholderKind, Substitutions};

use std::collections::BTreeMap;

use crate::errors::FlowResult;
use crate::runner::{NodePorts, NodeReport, RunContext};
use crate::workflow::{Node, PortKind, ProcessDef, Token};

/// Drive one process node until an input ends or the run is cancelled.
///
/// Tokens are aligned positionally: the n-th task gets the n-th token of
/// every in-port. Tasks run one after another.
pub async fn run_process(
    node: Node,
    def: ProcessDef,
    mut ports: NodePorts,
    fires_once: bool,
    ctx: RunContext,
) -> FlowResult<NodeReport> {
    let mut records = Vec::new();

    loop {
        if ctx.is_cancelled() {
            break;
        }

        let mut inputs = BTreeMap::new();
        let mut params = BTreeMap::new();
        let mut complete = true;
        for (spec, rx) in node.inputs.iter().zip(ports.inputs.iter_mut()) {
            let Some(token) = ctx.recv(rx).await else {
                complete = false;
                break;
            };
            match spec.kind {
                PortKind::File => inputs.insert(spec.name.clone(), token),
                PortKind::Param => params.insert(spec.name.clone(), token),
            };
        }
        if !complete {
            break;
        }

        let Some(record) = Task::new(&node.name, &def, inputs, params).execute(&ctx).await? else {
            break;
        };

        for (spec, tx) in node.outputs.iter().zip(ports.outputs.iter()) {
            let token = match spec.kind {
                PortKind::File => record.outputs.get(&spec.name).cloned().map(Token::from),
                PortKind::Param => record.params.get(&spec.name).cloned(),
            };
            let Some(token) = token else {
                continue;
            };
            if !ctx.send(tx, token).await {
                tracing::debug!(process = %node.name, port = %spec.name, "Consumer gone, token dropped");
            }
        }

        records.push(record);
        if fires_once {
            break;
        }
    }

    tracing::debug!(process = %node.name, tasks = records.len(), "Process finished");
    Ok(NodeReport::Process(records))
}
