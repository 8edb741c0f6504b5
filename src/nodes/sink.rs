// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Sink: drain every connected out-port

use std::collections::BTreeMap;

use tokio::task::JoinSet;

use crate::errors::{FlowError, FlowResult};
use crate::runner::{NodePorts, NodeReport, RunContext};
use crate::workflow::Node;

/// Drain all in-ports concurrently and count what arrived on each.
/// In-ports fed by never-ending streams are closed right away.
pub async fn run_sink(node: Node, ports: NodePorts, ctx: RunContext) -> FlowResult<NodeReport> {
    let mut drains = JoinSet::new();

    for ((spec, rx), unbounded) in node
        .inputs
        .iter()
        .zip(ports.inputs)
        .zip(ports.unbounded.iter().copied())
    {
        if unbounded {
            drop(rx);
            continue;
        }
        let port = spec.name.clone();
        let ctx = ctx.clone();
        let mut rx = rx;
        drains.spawn(async move {
            let mut count = 0;
            while let Some(token) = ctx.recv(&mut rx).await {
                tracing::trace!(port = %port, token = %token, "Drained");
                count += 1;
            }
            (port, count)
        });
    }

    let mut drained = BTreeMap::new();
    while let Some(joined) = drains.join_next().await {
        let (port, count) = joined.map_err(|e| FlowError::NodeAborted {
            node: node.name.clone(),
            message: e.to_string(),
        })?;
        drained.insert(port, count);
    }

    tracing::debug!(sink = %node.name, ports = drained.len(), "Sink finished");
    Ok(NodeReport::Drained(drained))
}
