// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Shared state handed to every node task of a run

use std::sync::Arc;

use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::config::RunnerConfig;
use crate::executors::Executor;
use crate::workflow::Token;

/// Run-wide handles: configuration, executor, command permits and the
/// cancellation signal raised on the first fatal error
#[derive(Clone)]
pub struct RunContext {
    pub config: Arc<RunnerConfig>,
    pub executor: Arc<dyn Executor>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl RunContext {
    pub fn new(config: Arc<RunnerConfig>, executor: Arc<dyn Executor>) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_tasks.max(1)));
        Self {
            config,
            executor,
            permits,
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Next token on `rx`; `None` at end of stream or once the run is cancelled
    pub async fn recv(&self, rx: &mut mpsc::Receiver<Token>) -> Option<Token> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            token = rx.recv() => token,
        }
    }

    /// Permit to run one external command; `None` once the run is cancelled
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = self.permits.clone().acquire_owned() => permit.ok(),
        }
    }

    /// Send on a channel, giving up when the consumer is gone or the run is
    /// cancelled. Returns whether the token was delivered.
    pub async fn send(&self, tx: &mpsc::Sender<Token>, token: Token) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = tx.send(token) => sent.is_ok(),
        }
    }
}

/// Channel ends owned by one node, indexed by port position
#[derive(Debug)]
pub struct NodePorts {
    pub inputs: Vec<mpsc::Receiver<Token>>,
    /// Per in-port: fed by a stream that never ends on its own
    pub unbounded: Vec<bool>,
    pub outputs: Vec<mpsc::Sender<Token>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::ShellExecutor;

    fn context() -> RunContext {
        RunContext::new(
            Arc::new(RunnerConfig::default()),
            Arc::new(ShellExecutor::default()),
        )
    }

    #[tokio::test]
    async fn test_recv_stops_on_cancel() {
        let ctx = context();
        let (_tx, mut rx) = mpsc::channel(1);
        ctx.cancel();
        assert!(ctx.recv(&mut rx).await.is_none());
        assert!(ctx.acquire().await.is_none());
    }

    #[tokio::test]
    async fn test_send_reports_closed_consumer() {
        let ctx = context();
        let (tx, rx) = mpsc::channel(1);
        assert!(ctx.send(&tx, Token::from("a")).await);
        drop(rx);
        assert!(!ctx.send(&tx, Token::from("b")).await);
    }
}
