// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Runner configuration
//!
//! Loaded from TOML or YAML; every field has a default so an empty file is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::{FlowError, FlowResult};

/// Runtime settings for a [`Runner`](crate::Runner)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Directory commands run in; relative task paths resolve against it
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Shell used as `<shell> -c <command>`
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Upper bound on external commands running at once
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Tokens buffered per connection before the producer waits
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Skip tasks whose outputs all exist already
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    /// Write a `<output>.audit.json` record next to each produced file
    #[serde(default = "default_true")]
    pub write_audit: bool,

    /// Extra environment variables for every command
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_shell() -> String {
    "sh".to_string()
}

fn default_max_concurrent_tasks() -> usize {
    std::thread::available_parallelism().map_or(4, |n| n.get())
}

fn default_channel_capacity() -> usize {
    16
}

fn default_true() -> bool {
    true
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            shell: default_shell(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            channel_capacity: default_channel_capacity(),
            skip_existing: true,
            write_audit: true,
            env: HashMap::new(),
        }
    }
}

impl RunnerConfig {
    /// Default configuration rooted at `work_dir`
    pub fn in_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    pub fn from_file(path: &Path) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(FlowError::Config {
                message: format!(
                    "unsupported config format '{}' for {}",
                    other.unwrap_or(""),
                    path.display()
                ),
            }),
        }
    }

    pub fn from_toml_str(content: &str) -> FlowResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> FlowResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runner cannot work with
    pub fn validate(&self) -> FlowResult<()> {
        if self.max_concurrent_tasks == 0 {
            return Err(FlowError::Config {
                message: "max_concurrent_tasks must be at least 1".into(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(FlowError::Config {
                message: "channel_capacity must be at least 1".into(),
            });
        }
        if self.shell.trim().is_empty() {
            return Err(FlowError::Config {
                message: "shell must not be empty".into(),
            });
        }
        Ok(())
    }
}
