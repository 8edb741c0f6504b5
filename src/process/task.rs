// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Task execution
//!
//! A [`Task`] is one firing of a process for one aligned input tuple. It
//! resolves output paths, skips work whose outputs already exist, runs the
//! command against temporary output paths and promotes them on success.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::template::Substitutions;
use crate::audit::AuditRecord;
use crate::errors::{FlowError, FlowResult};
use crate::path_strategy::{PathContext, PathError};
use crate::runner::RunContext;
use crate::workflow::{ProcessDef, Token};

/// Suffix of the path a command writes before its output is promoted
pub const TMP_SUFFIX: &str = ".tmp";

/// What happened to one task
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub process: String,
    /// Command as executed, or as it would have run for skipped tasks
    pub command: String,
    pub inputs: BTreeMap<String, Token>,
    pub params: BTreeMap<String, Token>,
    /// Final output path per out-port
    pub outputs: BTreeMap<String, String>,
    /// Outputs existed already; nothing ran
    pub skipped: bool,
    pub duration: Duration,
}

/// One pending execution of a process
#[derive(Debug)]
pub struct Task<'a> {
    process: &'a str,
    def: &'a ProcessDef,
    inputs: BTreeMap<String, Token>,
    params: BTreeMap<String, Token>,
}

impl<'a> Task<'a> {
    pub fn new(
        process: &'a str,
        def: &'a ProcessDef,
        inputs: BTreeMap<String, Token>,
        params: BTreeMap<String, Token>,
    ) -> Self {
        Self {
            process,
            def,
            inputs,
            params,
        }
    }

    /// Output path per out-port, relative to the working directory
    pub fn resolve_outputs(&self) -> FlowResult<BTreeMap<String, String>> {
        let ctx = PathContext::new(&self.inputs, &self.params);
        let mut outputs = BTreeMap::new();

        for port in self.def.template.outputs() {
            let strategy = self
                .def
                .paths
                .get(&port)
                .ok_or_else(|| FlowError::MissingPathStrategy {
                    port: format!("{}.{}", self.process, port),
                })?;

            let path = strategy.resolve(&ctx).map_err(|e| match e {
                PathError::SuffixNotFound { path, suffix } => FlowError::SuffixNotFound {
                    process: self.process.to_string(),
                    port: port.clone(),
                    path,
                    suffix,
                },
                PathError::MissingInput { port } => FlowError::UnknownPort {
                    node: self.process.to_string(),
                    port,
                },
            })?;
            outputs.insert(port, path);
        }

        Ok(outputs)
    }

    fn render(&self, outputs: &BTreeMap<String, String>) -> FlowResult<String> {
        self.def.template.render(&Substitutions {
            inputs: Some(&self.inputs),
            outputs: Some(outputs),
            params: Some(&self.params),
        })
    }

    /// Run the task. Returns `None` if the run was cancelled before the
    /// command could start.
    pub async fn execute(self, ctx: &RunContext) -> FlowResult<Option<TaskRecord>> {
        let start = Instant::now();
        let work_dir = ctx.config.work_dir.as_path();
        let outputs = self.resolve_outputs()?;

        if ctx.config.skip_existing && !outputs.is_empty() && all_exist(work_dir, &outputs).await {
            tracing::info!(process = self.process, "Outputs exist, skipping task");
            let command = self.render(&outputs)?;
            return Ok(Some(self.into_record(command, outputs, true, start.elapsed())));
        }

        for path in outputs.values() {
            if let Some(parent) = work_dir.join(path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| FlowError::io(parent, e))?;
            }
        }

        let tmp_outputs: BTreeMap<String, String> = outputs
            .iter()
            .map(|(port, path)| (port.clone(), format!("{}{}", path, TMP_SUFFIX)))
            .collect();
        let command = self.render(&tmp_outputs)?;

        let Some(_permit) = ctx.acquire().await else {
            tracing::debug!(process = self.process, "Run cancelled before task start");
            return Ok(None);
        };

        tracing::info!(process = self.process, command = %command, "Running task");
        let started_at = Utc::now();
        let result = ctx
            .executor
            .execute(&command, work_dir, &ctx.config.env)
            .await?;
        let finished_at = Utc::now();

        if !result.success {
            let stderr = result.stderr.trim();
            return Err(FlowError::TaskExecutionFailed {
                process: self.process.to_string(),
                command,
                status: result.status(),
                stderr: (!stderr.is_empty()).then(|| stderr.to_string()),
            });
        }

        for (port, path) in &outputs {
            let tmp = work_dir.join(&tmp_outputs[port]);
            let target = work_dir.join(path);
            if !tokio::fs::try_exists(&tmp).await.unwrap_or(false) {
                return Err(FlowError::MissingOutput {
                    process: self.process.to_string(),
                    port: port.clone(),
                    path: tmp,
                });
            }
            tokio::fs::rename(&tmp, &target)
                .await
                .map_err(|e| FlowError::io(&target, e))?;
        }

        if ctx.config.write_audit {
            let record = AuditRecord {
                process: self.process.to_string(),
                command: command.clone(),
                inputs: self.inputs.clone(),
                params: self.params.clone(),
                outputs: outputs.clone(),
                exit_code: result.exit_code,
                started_at,
                finished_at,
                duration_ms: u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            };
            for path in outputs.values() {
                record.write(&work_dir.join(path)).await?;
            }
        }

        tracing::debug!(
            process = self.process,
            duration_ms = u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            "Task finished"
        );

        Ok(Some(self.into_record(command, outputs, false, start.elapsed())))
    }

    fn into_record(
        self,
        command: String,
        outputs: BTreeMap<String, String>,
        skipped: bool,
        duration: Duration,
    ) -> TaskRecord {
        TaskRecord {
            process: self.process.to_string(),
            command,
            inputs: self.inputs,
            params: self.params,
            outputs,
            skipped,
            duration,
        }
    }
}

async fn all_exist(work_dir: &Path, outputs: &BTreeMap<String, String>) -> bool {
    for path in outputs.values() {
        let full: PathBuf = work_dir.join(path);
        if !tokio::fs::try_exists(&full).await.unwrap_or(false) {
            return false;
        }
    }
    true
}
