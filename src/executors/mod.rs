// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Command executors
//!
//! The [`Executor`] trait is the seam between the scheduler and the
//! operating system: it receives a fully substituted command line and
//! reports how it exited.

mod shell;

pub use shell::ShellExecutor;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::errors::FlowResult;

/// Result of running one command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the command exited successfully
    pub success: bool,

    /// Exit code; `None` when terminated by a signal
    pub exit_code: Option<i32>,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Wall-clock duration
    pub duration: Duration,
}

impl CommandOutput {
    /// Create a successful result
    pub fn success(stdout: String, duration: Duration) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout,
            stderr: String::new(),
            duration,
        }
    }

    /// Create a failed result
    pub fn failure(stderr: String, exit_code: Option<i32>, duration: Duration) -> Self {
        Self {
            success: false,
            exit_code,
            stdout: String::new(),
            stderr,
            duration,
        }
    }

    /// Human-readable exit status, e.g. `exit code 2`
    pub fn status(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

/// Trait for command executors
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a command to completion
    ///
    /// # Arguments
    /// * `command` - Fully substituted command line
    /// * `working_dir` - Directory the command runs in
    /// * `env` - Extra environment variables
    async fn execute(
        &self,
        command: &str,
        working_dir: &Path,
        env: &HashMap<String, String>,
    ) -> FlowResult<CommandOutput>;

    /// Check if the executor can run commands on this machine
    async fn check_available(&self) -> FlowResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let ok = CommandOutput::success(String::new(), Duration::ZERO);
        assert_eq!(ok.status(), "exit code 0");

        let failed = CommandOutput::failure("boom".into(), Some(3), Duration::ZERO);
        assert!(!failed.success);
        assert_eq!(failed.status(), "exit code 3");

        let killed = CommandOutput::failure(String::new(), None, Duration::ZERO);
        assert_eq!(killed.status(), "termination by signal");
    }
}
