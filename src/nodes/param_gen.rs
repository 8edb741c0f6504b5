// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Parameter generators

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::errors::{FlowError, FlowResult};
use crate::runner::{NodePorts, NodeReport, RunContext};
use crate::workflow::{ParamSource, Token};

/// Feed every out-port independently. A constant repeats until its consumer
/// stops pulling; a sequence is emitted once and the stream then closes.
pub async fn run_param_generator(
    name: String,
    source: ParamSource,
    ports: NodePorts,
    ctx: RunContext,
) -> FlowResult<NodeReport> {
    let mut feeders = JoinSet::new();
    for tx in ports.outputs {
        feeders.spawn(feed(source.clone(), tx, ctx.clone()));
    }

    let mut generated = 0;
    while let Some(joined) = feeders.join_next().await {
        generated += joined.map_err(|e| FlowError::NodeAborted {
            node: name.clone(),
            message: e.to_string(),
        })?;
    }

    tracing::debug!(generator = %name, generated, "Parameter generator finished");
    Ok(NodeReport::Generated(generated))
}

async fn feed(source: ParamSource, tx: mpsc::Sender<Token>, ctx: RunContext) -> usize {
    let mut sent = 0;
    match source {
        ParamSource::Constant(value) => {
            while ctx.send(&tx, Token::new(value.clone())).await {
                sent += 1;
            }
        }
        ParamSource::Sequence(values) => {
            for value in values {
                if !ctx.send(&tx, Token::new(value)).await {
                    break;
                }
                sent += 1;
            }
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::executors::ShellExecutor;
    use std::sync::Arc;

    fn context() -> RunContext {
        RunContext::new(
            Arc::new(RunnerConfig::default()),
            Arc::new(ShellExecutor::default()),
        )
    }

    fn ports(outputs: Vec<mpsc::Sender<Token>>) -> NodePorts {
        NodePorts {
            inputs: Vec::new(),
            unbounded: Vec::new(),
            outputs,
        }
    }

    #[tokio::test]
    async fn test_sequence_emits_each_value_then_closes() {
        let (a_tx, mut a_rx) = mpsc::channel(8);
        let (b_tx, mut b_rx) = mpsc::channel(8);

        let report = run_param_generator(
            "indv".into(),
            ParamSource::sequence(["NA06984", "NA12489"]),
            ports(vec![a_tx, b_tx]),
            context(),
        )
        .await
        .unwrap();
        assert!(matches!(report, NodeReport::Generated(4)));

        for rx in [&mut a_rx, &mut b_rx] {
            assert_eq!(rx.recv().await.unwrap().as_str(), "NA06984");
            assert_eq!(rx.recv().await.unwrap().as_str(), "NA12489");
            assert!(rx.recv().await.is_none());
        }
    }

    #[tokio::test]
    async fn test_constant_repeats_until_consumer_leaves() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(run_param_generator(
            "ref".into(),
            ParamSource::constant("hg19"),
            ports(vec![tx]),
            context(),
        ));

        for _ in 0..5 {
            assert_eq!(rx.recv().await.unwrap().as_str(), "hg19");
        }
        drop(rx);

        let report = handle.await.unwrap().unwrap();
        let NodeReport::Generated(n) = report else {
            panic!("expected a generator report");
        };
        assert!(n >= 5);
    }
}
