// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Run only part of a workflow: `hej_writer` and what it depends on.
//! `copyer` is declared downstream but never runs.

use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fileflow::{Runner, RunnerConfig, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fileflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut wf = Workflow::new("configurable_final_proc");

    let first = wf.process("hej_writer", "echo hej > {o:hej}")?;
    wf.set_path_static(first, "hej", "hej.txt")?;

    let copyer = wf.process("copyer", "cat {i:in} > {o:out}")?;
    wf.set_path_replace(copyer, "in", "out", ".txt", ".copy.txt")?;
    wf.connect(first.out("hej"), copyer.input("in"))?;

    let config = RunnerConfig {
        max_concurrent_tasks: 4,
        ..RunnerConfig::default()
    };

    let report = Runner::new(config).run_to(wf, "hej_writer").await?;
    println!("ran: {}", report.executed_processes().join(", "));

    Ok(())
}
