// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Shell executor
//!
//! Runs commands as `<shell> -c <command>`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;

use super::{CommandOutput, Executor};
use crate::errors::{FlowError, FlowResult};

/// Shell executor
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    /// Create a shell executor for the given shell binary
    pub fn new(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn execute(
        &self,
        command: &str,
        working_dir: &Path,
        env: &HashMap<String, String>,
    ) -> FlowResult<CommandOutput> {
        let start = Instant::now();

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command);
        cmd.current_dir(working_dir);
        cmd.envs(env);

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FlowError::ShellNotFound {
                    shell: self.shell.clone(),
                }
            } else {
                FlowError::io(working_dir, e)
            }
        })?;

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout,
            stderr,
            duration,
        })
    }

    async fn check_available(&self) -> FlowResult<bool> {
        Ok(which::which(&self.shell).is_ok())
    }
}
