// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Fan-out: republish every upstream token on each out-port

use crate::errors::{FlowError, FlowResult};
use crate::runner::{NodePorts, NodeReport, RunContext};

/// Copy each token to every out-port, in arrival order, before reading the
/// next one. Out-ports whose consumer has finished are dropped; the fan-out
/// stops once its input ends or no consumer is left.
pub async fn run_fan_out(name: String, ports: NodePorts, ctx: RunContext) -> FlowResult<NodeReport> {
    let NodePorts {
        inputs, outputs, ..
    } = ports;
    let Some(mut rx) = inputs.into_iter().next() else {
        return Err(FlowError::NodeAborted {
            node: name,
            message: "fan-out has no in-port channel".into(),
        });
    };

    let mut outputs: Vec<_> = outputs.into_iter().map(Some).collect();
    let mut forwarded = 0;

    while let Some(token) = ctx.recv(&mut rx).await {
        for slot in outputs.iter_mut() {
            let Some(tx) = slot else {
                continue;
            };
            if !ctx.send(tx, token.clone()).await {
                *slot = None;
            }
        }
        forwarded += 1;

        if outputs.iter().all(Option::is_none) {
            tracing::debug!(fan_out = %name, "All consumers finished");
            break;
        }
    }

    tracing::debug!(fan_out = %name, forwarded, "Fan-out finished");
    Ok(NodeReport::Forwarded(forwarded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::executors::ShellExecutor;
    use crate::workflow::Token;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn context() -> RunContext {
        RunContext::new(
            Arc::new(RunnerConfig::default()),
            Arc::new(ShellExecutor::default()),
        )
    }

    #[tokio::test]
    async fn test_every_output_sees_every_token_in_order() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let mut receivers = Vec::new();
        let mut senders = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::channel(8);
            senders.push(tx);
            receivers.push(rx);
        }

        for t in ["t1", "t2", "t3"] {
            in_tx.send(Token::from(t)).await.unwrap();
        }
        drop(in_tx);

        let ports = NodePorts {
            inputs: vec![in_rx],
            unbounded: vec![false],
            outputs: senders,
        };
        let report = run_fan_out("fan".into(), ports, context()).await.unwrap();
        assert!(matches!(report, NodeReport::Forwarded(3)));

        for rx in receivers.iter_mut() {
            let mut seen = Vec::new();
            while let Some(t) = rx.recv().await {
                seen.push(t.into_string());
            }
            assert_eq!(seen, vec!["t1", "t2", "t3"]);
        }
    }

    #[tokio::test]
    async fn test_stops_when_all_consumers_gone() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (a_tx, a_rx) = mpsc::channel(8);
        let (b_tx, b_rx) = mpsc::channel(8);
        drop(a_rx);
        drop(b_rx);
        in_tx.send(Token::from("x")).await.unwrap();

        let ports = NodePorts {
            inputs: vec![in_rx],
            unbounded: vec![true],
            outputs: vec![a_tx, b_tx],
        };
        // the input never ends; termination comes from the closed consumers
        let report = run_fan_out("fan".into(), ports, context()).await.unwrap();
        assert!(matches!(report, NodeReport::Forwarded(1)));
        drop(in_tx);
    }
}
