// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Workflow runner
//!
//! Validates a workflow, wires one bounded channel per connection, spawns one
//! task per node and waits for all of them. The first fatal error cancels the
//! run: nodes stop starting new tasks, commands already running finish.

mod context;

pub use context::{NodePorts, RunContext};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::RunnerConfig;
use crate::errors::{FlowError, FlowResult};
use crate::executors::{Executor, ShellExecutor};
use crate::nodes::{run_fan_out, run_param_generator, run_sink};
use crate::process::{run_process, TaskRecord};
use crate::workflow::{NodeId, NodeKind, Token, ValidatedWorkflow, Workflow};

/// What one node did during a run
#[derive(Debug)]
pub enum NodeReport {
    /// Tasks of a process, in firing order
    Process(Vec<TaskRecord>),
    /// Tokens copied by a fan-out
    Forwarded(usize),
    /// Tokens emitted by a parameter generator, summed over out-ports
    Generated(usize),
    /// Tokens drained per sink in-port
    Drained(BTreeMap<String, usize>),
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Built,
    Validated,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Built => write!(f, "built"),
            Self::Validated => write!(f, "validated"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of a completed run
#[derive(Debug)]
pub struct RunReport {
    pub workflow: String,
    /// Every task of every process
    pub tasks: Vec<TaskRecord>,
    /// Tokens drained per `sink.port`
    pub drained: BTreeMap<String, usize>,
    pub duration: Duration,
}

impl RunReport {
    /// Tasks of one process
    pub fn tasks_for(&self, process: &str) -> Vec<&TaskRecord> {
        self.tasks.iter().filter(|t| t.process == process).collect()
    }

    /// Names of processes that ran at least one command
    pub fn executed_processes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .tasks
            .iter()
            .filter(|t| !t.skipped)
            .map(|t| t.process.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Workflow runner
pub struct Runner {
    config: Arc<RunnerConfig>,
    executor: Arc<dyn Executor>,
}

impl Runner {
    /// Create a runner using the configured shell
    pub fn new(config: RunnerConfig) -> Self {
        let executor = Arc::new(ShellExecutor::new(config.shell.clone()));
        Self {
            config: Arc::new(config),
            executor,
        }
    }

    /// Replace the executor
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Validate and run the whole workflow
    pub async fn run(&self, workflow: Workflow) -> FlowResult<RunReport> {
        log_state(workflow.name(), RunState::Built);
        let validated = workflow.validate()?;
        self.execute(validated).await
    }

    /// Run only `target` and everything it depends on
    pub async fn run_to(&self, workflow: Workflow, target: &str) -> FlowResult<RunReport> {
        log_state(workflow.name(), RunState::Built);
        let validated = workflow.upstream_of(target)?.validate()?;
        self.execute(validated).await
    }

    /// Run a validated workflow to completion
    pub async fn execute(&self, validated: ValidatedWorkflow) -> FlowResult<RunReport> {
        let start = Instant::now();
        let name = validated.name().to_string();
        log_state(&name, RunState::Validated);
        tracing::debug!(workflow = %name, order = ?validated.execution_order(), "Execution order");

        self.config.validate()?;
        if !self.executor.check_available().await? {
            return Err(FlowError::ShellNotFound {
                shell: self.config.shell.clone(),
            });
        }
        tokio::fs::create_dir_all(&self.config.work_dir)
            .await
            .map_err(|e| FlowError::io(&self.config.work_dir, e))?;

        let fires_once: Vec<bool> = (0..validated.workflow().nodes().len())
            .map(|idx| validated.fires_once(NodeId(idx)))
            .collect();
        let (workflow, unbounded) = validated.into_parts();
        let mut ports = wire(&workflow, &unbounded, self.config.channel_capacity);

        let ctx = RunContext::new(self.config.clone(), self.executor.clone());
        let mut nodes = JoinSet::new();

        log_state(&name, RunState::Running);
        for (idx, node) in workflow.nodes().iter().enumerate() {
            let node_ports = std::mem::replace(
                &mut ports[idx],
                NodePorts {
                    inputs: Vec::new(),
                    unbounded: Vec::new(),
                    outputs: Vec::new(),
                },
            );
            let node_name = node.name.clone();
            let ctx = ctx.clone();

            match &node.kind {
                NodeKind::Process(def) => {
                    let fut = run_process(node.clone(), def.clone(), node_ports, fires_once[idx], ctx);
                    nodes.spawn(async move { (node_name, fut.await) });
                }
                NodeKind::FanOut => {
                    let fut = run_fan_out(node_name.clone(), node_ports, ctx);
                    nodes.spawn(async move { (node_name, fut.await) });
                }
                NodeKind::ParamGenerator(source) => {
                    let fut = run_param_generator(node_name.clone(), source.clone(), node_ports, ctx);
                    nodes.spawn(async move { (node_name, fut.await) });
                }
                NodeKind::Sink => {
                    let fut = run_sink(node.clone(), node_ports, ctx);
                    nodes.spawn(async move { (node_name, fut.await) });
                }
            }
        }

        let mut first_error: Option<FlowError> = None;
        let mut tasks = Vec::new();
        let mut drained = BTreeMap::new();

        while let Some(joined) = nodes.join_next().await {
            let (node, result) = joined.unwrap_or_else(|e| {
                let node = "<panicked>".to_string();
                let err = FlowError::NodeAborted {
                    node: node.clone(),
                    message: e.to_string(),
                };
                (node, Err(err))
            });

            match result {
                Ok(NodeReport::Process(records)) => tasks.extend(records),
                Ok(NodeReport::Drained(counts)) => {
                    for (port, count) in counts {
                        drained.insert(format!("{}.{}", node, port), count);
                    }
                }
                Ok(NodeReport::Forwarded(_)) | Ok(NodeReport::Generated(_)) => {}
                Err(e) => {
                    tracing::error!(workflow = %name, node = %node, error = %e, "Node failed");
                    if first_error.is_none() {
                        ctx.cancel();
                        first_error = Some(e);
                    }
                }
            }
        }

        let duration = start.elapsed();
        if let Some(e) = first_error {
            log_state(&name, RunState::Failed);
            return Err(e);
        }

        log_state(&name, RunState::Completed);
        tracing::info!(
            workflow = %name,
            tasks = tasks.len(),
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "Workflow completed"
        );

        Ok(RunReport {
            workflow: name,
            tasks,
            drained,
            duration,
        })
    }
}

fn log_state(workflow: &str, state: RunState) {
    tracing::info!(workflow = %workflow, state = %state, "Workflow state");
}

/// One bounded channel per connection, distributed to the node ends
fn wire(workflow: &Workflow, unbounded: &[bool], capacity: usize) -> Vec<NodePorts> {
    let mut inputs: Vec<Vec<Option<mpsc::Receiver<Token>>>> = Vec::new();
    let mut input_unbounded: Vec<Vec<bool>> = Vec::new();
    let mut outputs: Vec<Vec<Option<mpsc::Sender<Token>>>> = Vec::new();

    for node in workflow.nodes() {
        inputs.push((0..node.inputs.len()).map(|_| None).collect());
        input_unbounded.push(vec![false; node.inputs.len()]);
        outputs.push((0..node.outputs.len()).map(|_| None).collect());
    }

    for (i, conn) in workflow.connections().iter().enumerate() {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        outputs[conn.from.node.index()][conn.from.index] = Some(tx);
        inputs[conn.to.node.index()][conn.to.index] = Some(rx);
        input_unbounded[conn.to.node.index()][conn.to.index] = unbounded.get(i).copied().unwrap_or(false);
    }

    // validation guarantees every port has exactly one channel end
    inputs
        .into_iter()
        .zip(input_unbounded)
        .zip(outputs)
        .map(|((ins, unbounded), outs)| NodePorts {
            inputs: ins.into_iter().flatten().collect(),
            unbounded,
            outputs: outs.into_iter().flatten().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_strategy::PathStrategy;
    use crate::workflow::{ParamSource, PortKind};
    use std::path::Path;
    use tempfile::TempDir;

    fn runner(dir: &Path) -> Runner {
        Runner::new(RunnerConfig::in_dir(dir))
    }

    fn read(dir: &Path, name: &str) -> String {
        std::fs::read_to_string(dir.join(name)).unwrap().trim().to_string()
    }

    #[tokio::test]
    async fn test_static_then_suffix_replace() {
        let dir = TempDir::new().unwrap();
        let mut wf = Workflow::new("unzip");
        let a = wf.process("download", "echo genome > {o:gz}").unwrap();
        wf.set_path_static(a, "gz", "ref.fa.gz").unwrap();
        let b = wf.process("unzip", "cp {i:gz} {o:fa}").unwrap();
        wf.set_path_replace(b, "gz", "fa", ".gz", "").unwrap();
        let sink = wf.sink("sink").unwrap();

        wf.connect(a.out("gz"), b.input("gz")).unwrap();
        wf.drain(sink, b.out("fa")).unwrap();

        let report = runner(dir.path()).run(wf).await.unwrap();

        assert_eq!(read(dir.path(), "ref.fa"), "genome");
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.tasks_for("unzip")[0].outputs["fa"], "ref.fa");
        assert_eq!(report.drained.get("sink.in0"), Some(&1));
    }

    #[tokio::test]
    async fn test_fan_out_feeds_two_consumers() {
        let dir = TempDir::new().unwrap();
        let mut wf = Workflow::new("fan");
        let a = wf.process("make", "echo data > {o:out}").unwrap();
        wf.set_path_static(a, "out", "data.txt").unwrap();
        let fan = wf.fan_out("data_fan", PortKind::File, ["left", "right"]).unwrap();
        let b = wf.process("left", "cp {i:in} {o:out}").unwrap();
        wf.set_path_extend(b, "in", "out", ".left").unwrap();
        let c = wf.process("right", "cp {i:in} {o:out}").unwrap();
        wf.set_path_extend(c, "in", "out", ".right").unwrap();
        let sink = wf.sink("sink").unwrap();

        wf.connect(a.out("out"), fan.input("in")).unwrap();
        wf.connect(fan.out("left"), b.input("in")).unwrap();
        wf.connect(fan.out("right"), c.input("in")).unwrap();
        wf.drain(sink, b.out("out")).unwrap();
        wf.drain(sink, c.out("out")).unwrap();

        let report = runner(dir.path()).run(wf).await.unwrap();

        assert_eq!(read(dir.path(), "data.txt.left"), "data");
        assert_eq!(read(dir.path(), "data.txt.right"), "data");
        assert_eq!(report.executed_processes(), vec!["left", "make", "right"]);
    }

    #[tokio::test]
    async fn test_failure_stops_dependents() {
        let dir = TempDir::new().unwrap();
        let mut wf = Workflow::new("broken");
        let a = wf.process("fail", "echo x > {o:out}; exit 1").unwrap();
        wf.set_path_static(a, "out", "x.txt").unwrap();
        let b = wf.process("after", "cp {i:in} {o:out}").unwrap();
        wf.set_path_extend(b, "in", "out", ".after").unwrap();
        let sink = wf.sink("sink").unwrap();

        wf.connect(a.out("out"), b.input("in")).unwrap();
        wf.drain(sink, b.out("out")).unwrap();

        let err = runner(dir.path()).run(wf).await.unwrap_err();

        match err {
            FlowError::TaskExecutionFailed { process, command, .. } => {
                assert_eq!(process, "fail");
                assert_eq!(command, "echo x > x.txt.tmp; exit 1");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.path().join("x.txt.tmp").exists());
        assert!(!dir.path().join("x.txt").exists());
        assert!(!dir.path().join("x.txt.after").exists());
    }

    fn branching() -> Workflow {
        let mut wf = Workflow::new("branching");
        let a = wf.process("a", "echo a > {o:out}").unwrap();
        wf.set_path_static(a, "out", "a.txt").unwrap();
        let fan = wf.fan_out("a_fan", PortKind::File, ["to_b", "to_d"]).unwrap();
        let b = wf.process("b", "cp {i:in} {o:out}").unwrap();
        wf.set_path_extend(b, "in", "out", ".b").unwrap();
        let c = wf.process("c", "cp {i:in} {o:out}").unwrap();
        wf.set_path_extend(c, "in", "out", ".c").unwrap();
        let d = wf.process("d", "cp {i:in} {o:out}").unwrap();
        wf.set_path_extend(d, "in", "out", ".d").unwrap();
        let sink = wf.sink("sink").unwrap();

        wf.connect(a.out("out"), fan.input("in")).unwrap();
        wf.connect(fan.out("to_b"), b.input("in")).unwrap();
        wf.connect(fan.out("to_d"), d.input("in")).unwrap();
        wf.connect(b.out("out"), c.input("in")).unwrap();
        wf.drain(sink, c.out("out")).unwrap();
        wf.drain(sink, d.out("out")).unwrap();
        wf
    }

    #[tokio::test]
    async fn test_run_to_executes_only_upstream_closure() {
        let dir = TempDir::new().unwrap();
        let report = runner(dir.path()).run_to(branching(), "b").await.unwrap();

        assert_eq!(report.executed_processes(), vec!["a", "b"]);
        assert!(dir.path().join("a.txt.b").exists());
        assert!(!dir.path().join("a.txt.b.c").exists());
        assert!(!dir.path().join("a.txt.d").exists());
    }

    #[tokio::test]
    async fn test_parameter_keyed_custom_paths() {
        let dir = TempDir::new().unwrap();
        let mut wf = Workflow::new("individuals");
        let gen = wf
            .param_generator("indv", ParamSource::sequence(["NA06984", "NA12489"]), ["out"])
            .unwrap();
        let p = wf.process("fetch", "echo {p:indv} > {o:bam}").unwrap();
        wf.set_path(
            p,
            "bam",
            PathStrategy::custom(|ctx| format!("{}.bam", ctx.param("indv").unwrap_or("unknown"))),
        )
        .unwrap();
        let sink = wf.sink("sink").unwrap();

        wf.connect(gen.out("out"), p.input("indv")).unwrap();
        wf.drain(sink, p.out("bam")).unwrap();

        let report = runner(dir.path()).run(wf).await.unwrap();

        assert_eq!(read(dir.path(), "NA06984.bam"), "NA06984");
        assert_eq!(read(dir.path(), "NA12489.bam"), "NA12489");
        assert_eq!(report.tasks_for("fetch").len(), 2);
        assert_eq!(report.drained.get("sink.in0"), Some(&2));
    }

    #[tokio::test]
    async fn test_per_individual_subgraphs_do_not_interfere() {
        let dir = TempDir::new().unwrap();
        let mut wf = Workflow::new("resequencing");
        let sink = wf.sink("sink").unwrap();

        for indv in ["NA06984", "NA12489"] {
            let gen = wf
                .param_generator(format!("indv_{indv}"), ParamSource::constant(indv), ["reads", "merge"])
                .unwrap();
            let reads = wf
                .process(format!("reads_{indv}"), "echo {p:indv} > {o:reads}")
                .unwrap();
            wf.set_path(
                reads,
                "reads",
                PathStrategy::custom(|ctx| format!("{}.reads.txt", ctx.param("indv").unwrap_or("unknown"))),
            )
            .unwrap();
            let merge = wf
                .process(format!("merge_{indv}"), "cat {i:in} > {o:merged} # {p:indv}")
                .unwrap();
            wf.set_path(
                merge,
                "merged",
                PathStrategy::custom(|ctx| format!("{}.merged.sam", ctx.param("indv").unwrap_or("unknown"))),
            )
            .unwrap();

            wf.connect(gen.out("reads"), reads.input("indv")).unwrap();
            wf.connect(gen.out("merge"), merge.input("indv")).unwrap();
            wf.connect(reads.out("reads"), merge.input("in")).unwrap();
            wf.drain(sink, merge.out("merged")).unwrap();
        }

        let report = runner(dir.path()).run(wf).await.unwrap();

        assert_eq!(read(dir.path(), "NA06984.merged.sam"), "NA06984");
        assert_eq!(read(dir.path(), "NA12489.merged.sam"), "NA12489");
        for indv in ["NA06984", "NA12489"] {
            let tasks = report.tasks_for(&format!("merge_{indv}"));
            assert_eq!(tasks.len(), 1);
            assert_eq!(tasks[0].outputs["merged"], format!("{indv}.merged.sam"));
        }
        assert_eq!(report.drained.get("sink.in0"), Some(&1));
        assert_eq!(report.drained.get("sink.in1"), Some(&1));
    }

    #[tokio::test]
    async fn test_failure_stops_independent_nodes_after_in_flight_command() {
        let dir = TempDir::new().unwrap();
        let config = RunnerConfig {
            max_concurrent_tasks: 4,
            ..RunnerConfig::in_dir(dir.path())
        };

        let mut wf = Workflow::new("partial");
        let fail = wf.process("fail", "sleep 0.2; echo x > {o:out}; exit 1").unwrap();
        wf.set_path_static(fail, "out", "fail.txt").unwrap();
        let gen = wf
            .param_generator("n", ParamSource::sequence(["1", "2", "3", "4", "5", "6"]), ["out"])
            .unwrap();
        let slow = wf.process("slow", "sleep 0.3; echo {p:n} > {o:out}").unwrap();
        wf.set_path(
            slow,
            "out",
            PathStrategy::custom(|ctx| format!("slow_{}.txt", ctx.param("n").unwrap_or("x"))),
        )
        .unwrap();
        let sink = wf.sink("sink").unwrap();

        wf.connect(gen.out("out"), slow.input("n")).unwrap();
        wf.drain(sink, fail.out("out")).unwrap();
        wf.drain(sink, slow.out("out")).unwrap();

        let err = Runner::new(config).run(wf).await.unwrap_err();
        assert!(matches!(err, FlowError::TaskExecutionFailed { ref process, .. } if process == "fail"));

        let finished = (1..=6)
            .filter(|n| dir.path().join(format!("slow_{n}.txt")).exists())
            .count();
        assert!(finished >= 1, "in-flight command should finish");
        assert!(finished < 6, "no new tasks after cancellation");
    }

    #[tokio::test]
    async fn test_second_run_skips_existing_outputs() {
        let dir = TempDir::new().unwrap();
        let first = runner(dir.path()).run(branching()).await.unwrap();
        assert_eq!(first.executed_processes(), vec!["a", "b", "c", "d"]);

        let second = runner(dir.path()).run(branching()).await.unwrap();
        assert!(second.executed_processes().is_empty());
        assert!(second.tasks.iter().all(|t| t.skipped));
        assert_eq!(second.tasks.len(), 4);
    }

    #[tokio::test]
    async fn test_comment_dependency_orders_tasks() {
        let dir = TempDir::new().unwrap();
        let mut wf = Workflow::new("gating");
        let idx = wf.process("index", "echo indexed > ref.idx; echo done > {o:done}").unwrap();
        wf.set_path_static(idx, "done", "ref.idx.done").unwrap();
        let aln = wf.process("align", "cat ref.idx > {o:out} # {i:idxdone}").unwrap();
        wf.set_path_static(aln, "out", "aligned.txt").unwrap();
        let sink = wf.sink("sink").unwrap();

        wf.connect(idx.out("done"), aln.input("idxdone")).unwrap();
        wf.drain(sink, aln.out("out")).unwrap();

        let report = runner(dir.path()).run(wf).await.unwrap();

        assert_eq!(read(dir.path(), "aligned.txt"), "indexed");
        assert_eq!(report.tasks_for("align")[0].command, "cat ref.idx > aligned.txt.tmp");
    }

    #[tokio::test]
    async fn test_multicast_rejected_before_any_command() {
        let dir = TempDir::new().unwrap();
        let mut wf = Workflow::new("multicast");
        let a = wf.process("a", "echo a > {o:out}").unwrap();
        wf.set_path_static(a, "out", "a.txt").unwrap();
        let b = wf.process("b", "cp {i:in} {o:out}").unwrap();
        wf.set_path_extend(b, "in", "out", ".b").unwrap();
        let c = wf.process("c", "cp {i:in} {o:out}").unwrap();
        wf.set_path_extend(c, "in", "out", ".c").unwrap();

        wf.connect(a.out("out"), b.input("in")).unwrap();
        wf.connect(a.out("out"), c.input("in")).unwrap();

        let err = runner(dir.path()).run(wf).await.unwrap_err();
        assert!(matches!(err, FlowError::MulticastWithoutFanOut { .. }));
        assert!(err.is_structural());
        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_constant_parameter_through_fan_out_terminates() {
        let dir = TempDir::new().unwrap();
        let mut wf = Workflow::new("constant");
        let gen = wf
            .param_generator("genome", ParamSource::constant("hg19"), ["out"])
            .unwrap();
        let fan = wf.fan_out("genome_fan", PortKind::Param, ["x", "y"]).unwrap();
        let x = wf.process("x", "echo {p:genome} > {o:out}").unwrap();
        wf.set_path_static(x, "out", "x.txt").unwrap();
        let y = wf.process("y", "echo {p:genome} > {o:out}").unwrap();
        wf.set_path_static(y, "out", "y.txt").unwrap();
        wf.param_out(y, "genome").unwrap();
        let sink = wf.sink("sink").unwrap();

        wf.connect(gen.out("out"), fan.input("in")).unwrap();
        wf.connect(fan.out("x"), x.input("genome")).unwrap();
        wf.connect(fan.out("y"), y.input("genome")).unwrap();
        wf.drain(sink, x.out("out")).unwrap();
        wf.drain(sink, y.out("out")).unwrap();
        wf.drain(sink, y.out("genome")).unwrap();

        let report = runner(dir.path()).run(wf).await.unwrap();

        assert_eq!(read(dir.path(), "x.txt"), "hg19");
        assert_eq!(read(dir.path(), "y.txt"), "hg19");
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.drained.get("sink.in2"), Some(&1));
    }

    #[tokio::test]
    async fn test_constant_parameter_alongside_file_stream() {
        let dir = TempDir::new().unwrap();
        let mut wf = Workflow::new("mixed");
        let a = wf.process("make", "echo data > {o:out}").unwrap();
        wf.set_path_static(a, "out", "data.txt").unwrap();
        let gen = wf
            .param_generator("tag", ParamSource::constant("v1"), ["out"])
            .unwrap();
        let b = wf.process("tag", "cp {i:in} {o:out} # {p:tag}").unwrap();
        wf.set_path(
            b,
            "out",
            PathStrategy::custom(|ctx| {
                format!(
                    "{}.{}",
                    ctx.input("in").unwrap_or("none"),
                    ctx.param("tag").unwrap_or("none")
                )
            }),
        )
        .unwrap();
        let sink = wf.sink("sink").unwrap();

        wf.connect(a.out("out"), b.input("in")).unwrap();
        wf.connect(gen.out("out"), b.input("tag")).unwrap();
        wf.drain(sink, b.out("out")).unwrap();

        runner(dir.path()).run(wf).await.unwrap();
        assert_eq!(read(dir.path(), "data.txt.v1"), "data");
    }

    #[tokio::test]
    async fn test_missing_shell_fails_before_running() {
        let dir = TempDir::new().unwrap();
        let mut config = RunnerConfig::in_dir(dir.path());
        config.shell = "fileflow-no-such-shell".into();

        let mut wf = Workflow::new("noshell");
        let a = wf.process("a", "echo a > {o:out}").unwrap();
        wf.set_path_static(a, "out", "a.txt").unwrap();
        let sink = wf.sink("sink").unwrap();
        wf.drain(sink, a.out("out")).unwrap();

        let err = Runner::new(config).run(wf).await.unwrap_err();
        assert!(matches!(err, FlowError::ShellNotFound { .. }));
    }
}
