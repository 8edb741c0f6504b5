// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Error types
//!
//! Structural errors are raised while a workflow is built or validated, before
//! any command runs. Runtime errors carry enough context (process, port,
//! command, exit status) to debug or resume a failed run by hand.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::workflow::PortKind;

/// Result type for fileflow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Main error type for fileflow
#[derive(Error, Debug, Diagnostic)]
pub enum FlowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Construction Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Node '{node}' not found in workflow")]
    #[diagnostic(code(fileflow::unknown_node))]
    UnknownNode { node: String },

    #[error("Node name '{node}' is already used")]
    #[diagnostic(
        code(fileflow::duplicate_node),
        help("Node names must be unique within a workflow")
    )]
    DuplicateNode { node: String },

    #[error("Node '{node}' has no port named '{port}'")]
    #[diagnostic(
        code(fileflow::unknown_port),
        help("Ports are declared by {{i:..}}, {{o:..}} and {{p:..}} placeholders in the command")
    )]
    UnknownPort { node: String, port: String },

    #[error("Node '{node}' declares port '{port}' twice")]
    #[diagnostic(code(fileflow::duplicate_port))]
    DuplicatePort { node: String, port: String },

    #[error("Node '{node}' is not a {expected}")]
    #[diagnostic(code(fileflow::wrong_node_kind))]
    WrongNodeKind { node: String, expected: String },

    #[error("Cannot connect {from} ({from_kind}) to {to} ({to_kind})")]
    #[diagnostic(
        code(fileflow::port_kind_mismatch),
        help("File ports only connect to file ports, parameter ports only to parameter ports")
    )]
    PortKindMismatch {
        from: String,
        from_kind: PortKind,
        to: String,
        to_kind: PortKind,
    },

    #[error("In-port {port} is already connected to {existing}")]
    #[diagnostic(code(fileflow::port_already_connected))]
    PortAlreadyConnected { port: String, existing: String },

    #[error("Invalid command template for '{process}': {reason}")]
    #[diagnostic(code(fileflow::invalid_template))]
    InvalidTemplate { process: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Validation Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Out-port {port} feeds {consumers} consumers directly")]
    #[diagnostic(
        code(fileflow::multicast_without_fan_out),
        help("Insert a fan-out node and connect each consumer to one of its out-ports")
    )]
    MulticastWithoutFanOut { port: String, consumers: usize },

    #[error("Fan-out target {port} has no downstream connection")]
    #[diagnostic(code(fileflow::unconnected_fan_out_target))]
    UnconnectedFanOutTarget { port: String },

    #[error("Port {port} is not connected")]
    #[diagnostic(
        code(fileflow::unconnected_port),
        help("Connect unused outputs to a sink")
    )]
    UnconnectedPort { port: String },

    #[error("Out-port {port} has no path strategy")]
    #[diagnostic(
        code(fileflow::missing_path_strategy),
        help("Assign one with Workflow::set_path before running")
    )]
    MissingPathStrategy { port: String },

    #[error("Out-ports '{first}' and '{second}' both write '{path}'")]
    #[diagnostic(code(fileflow::output_path_collision))]
    OutputPathCollision {
        path: String,
        first: String,
        second: String,
    },

    #[error("Workflow graph contains a cycle through: {}", .nodes.join(" → "))]
    #[diagnostic(
        code(fileflow::cyclic_graph),
        help("Connections must form a directed acyclic graph")
    )]
    CyclicGraph { nodes: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Process '{process}', port '{port}': path '{path}' does not end with '{suffix}'")]
    #[diagnostic(code(fileflow::suffix_not_found))]
    SuffixNotFound {
        process: String,
        port: String,
        path: String,
        suffix: String,
    },

    #[error("Process '{process}' failed with {status}: {command}")]
    #[diagnostic(code(fileflow::task_execution_failed))]
    TaskExecutionFailed {
        process: String,
        command: String,
        status: String,
        #[help]
        stderr: Option<String>,
    },

    #[error("Process '{process}' did not produce '{path}' for out-port '{port}'")]
    #[diagnostic(
        code(fileflow::missing_output),
        help("The command must write to the path substituted for {{o:{port}}}")
    )]
    MissingOutput {
        process: String,
        port: String,
        path: PathBuf,
    },

    #[error("Shell '{shell}' not found")]
    #[diagnostic(
        code(fileflow::shell_not_found),
        help("Install it or set `shell` in the runner configuration")
    )]
    ShellNotFound { shell: String },

    #[error("Node task '{node}' aborted: {message}")]
    #[diagnostic(code(fileflow::node_aborted))]
    NodeAborted { node: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/Config Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(code(fileflow::config_error))]
    Config { message: String },

    #[error("IO error on '{path}': {message}")]
    #[diagnostic(code(fileflow::io_error))]
    Io { path: PathBuf, message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(fileflow::json_error))]
    Json { message: String },
}

impl From<serde_json::Error> for FlowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for FlowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config { message: e.to_string() }
    }
}

impl From<toml::de::Error> for FlowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config { message: e.to_string() }
    }
}

impl FlowError {
    /// Wrap an IO error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }

    /// Whether this error is detected before any command runs
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnknownNode { .. }
                | Self::DuplicateNode { .. }
                | Self::DuplicatePort { .. }
                | Self::WrongNodeKind { .. }
                | Self::UnknownPort { .. }
                | Self::PortKindMismatch { .. }
                | Self::PortAlreadyConnected { .. }
                | Self::InvalidTemplate { .. }
                | Self::MulticastWithoutFanOut { .. }
                | Self::UnconnectedFanOutTarget { .. }
                | Self::UnconnectedPort { .. }
                | Self::MissingPathStrategy { .. }
                | Self::OutputPathCollision { .. }
                | Self::CyclicGraph { .. }
        )
    }
}
