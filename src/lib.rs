// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! # fileflow - File-oriented dataflow engine
//!
//! `fileflow` composes command-line tools into a directed acyclic graph whose
//! edges carry file paths and parameter values instead of in-memory data.
//!
//! ## Features
//!
//! - **Typed ports** - `{i:..}`, `{o:..}` and `{p:..}` placeholders declare file and parameter ports
//! - **Path strategies** - Output paths derived from inputs: static, suffix replace/extend, custom
//! - **Explicit fan-out** - Every connection is single-producer/single-consumer
//! - **Concurrent scheduling** - One task per node, bounded channels, global command limit
//! - **Resumable** - Tasks whose outputs exist are skipped; outputs appear atomically
//!
//! ## Quick Start
//!
//! ```no_run
//! use fileflow::{Runner, RunnerConfig, Workflow};
//!
//! # async fn demo() -> fileflow::FlowResult<()> {
//! let mut wf = Workflow::new("unzip");
//! let dl = wf.process("download", "wget -O {o:gz} https://example.org/ref.fa.gz")?;
//! wf.set_path_static(dl, "gz", "ref.fa.gz")?;
//! let unzip = wf.process("unzip", "gunzip -c {i:gz} > {o:fa}")?;
//! wf.set_path_replace(unzip, "gz", "fa", ".gz", "")?;
//! let sink = wf.sink("sink")?;
//!
//! wf.connect(dl.out("gz"), unzip.input("gz"))?;
//! wf.drain(sink, unzip.out("fa"))?;
//!
//! Runner::new(RunnerConfig::in_dir("data")).run(wf).await?;
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod errors;
pub mod executors;
pub mod nodes;
pub mod path_strategy;
pub mod process;
pub mod runner;
pub mod workflow;

// Re-export commonly used types
pub use audit::AuditRecord;
pub use config::RunnerConfig;
pub use errors::{FlowError, FlowResult};
pub use executors::{CommandOutput, Executor, ShellExecutor};
pub use path_strategy::{PathContext, PathStrategy};
pub use process::TaskRecord;
pub use runner::{RunReport, RunState, Runner};
pub use workflow::{NodeId, ParamSource, PortKind, Token, ValidatedWorkflow, Workflow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
