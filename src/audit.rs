// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Audit sidecars
//!
//! Each file produced by a task gets a `<output>.audit.json` record of how it
//! was made: process, executed command, inputs, parameters and timing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::{FlowError, FlowResult};
use crate::workflow::Token;

/// Provenance of one produced file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub process: String,
    pub command: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, Token>,
    #[serde(default)]
    pub params: BTreeMap<String, Token>,
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl AuditRecord {
    /// Sidecar location for an output file
    pub fn sidecar_path(output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_os_string();
        name.push(".audit.json");
        PathBuf::from(name)
    }

    /// Write the record next to `output`
    pub async fn write(&self, output: &Path) -> FlowResult<PathBuf> {
        let path = Self::sidecar_path(output);
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| FlowError::io(&path, e))?;
        tracing::trace!(path = %path.display(), "Wrote audit record");
        Ok(path)
    }

    /// Read the record stored next to `output`
    pub async fn read(output: &Path) -> FlowResult<Self> {
        let path = Self::sidecar_path(output);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FlowError::io(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}
