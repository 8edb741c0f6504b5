// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Resequencing analysis: download a reference and paired reads for two
//! individuals, index, align and merge per individual.
//!
//! Needs `wget`, `gunzip` and `bwa` on the PATH.

use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fileflow::{ParamSource, PathStrategy, PortKind, Runner, RunnerConfig, Workflow};

const FASTQ_BASE_URL: &str = "http://bioinfo.perdanauniversity.edu.my/tein4ngs/ngspractice/";
const REF_BASE_URL: &str = "http://ftp.ensembl.org/pub/release-75/fasta/homo_sapiens/dna/";
const REF_FILE_GZ: &str = "Homo_sapiens.GRCh37.75.dna.chromosome.17.fa.gz";

const INDIVIDUALS: [&str; 2] = ["NA06984", "NA12489"];
const SAMPLES: [&str; 2] = ["1", "2"];

fn fastq_file(indv: &str, smpl: &str) -> String {
    format!("{}.ILLUMINA.low_coverage.4p_{}.fq", indv, smpl)
}

fn build() -> fileflow::FlowResult<Workflow> {
    let mut wf = Workflow::new("resequencing");
    let sink = wf.sink("sink")?;

    // Every consumer of the reference gets its own fan-out port
    let mut ref_targets = vec!["index_ref".to_string()];
    let mut done_targets = Vec::new();
    for indv in INDIVIDUALS {
        for smpl in SAMPLES {
            ref_targets.push(format!("bwa_aln_{}_{}", indv, smpl));
            done_targets.push(format!("bwa_aln_{}_{}", indv, smpl));
        }
        ref_targets.push(format!("merge_{}", indv));
        done_targets.push(format!("merge_{}", indv));
    }

    let download_ref = wf.process(
        "download_ref",
        &format!("wget -O {{o:outfile}} {}{}", REF_BASE_URL, REF_FILE_GZ),
    )?;
    wf.set_path_static(download_ref, "outfile", REF_FILE_GZ)?;

    let ungzip_ref = wf.process("ungzip_ref", "gunzip -c {i:in} > {o:out}")?;
    wf.set_path_replace(ungzip_ref, "in", "out", ".gz", "")?;
    wf.connect(download_ref.out("outfile"), ungzip_ref.input("in"))?;

    let ref_fan = wf.fan_out("ref_fan", PortKind::File, ref_targets)?;
    wf.connect(ungzip_ref.out("out"), ref_fan.input("in"))?;

    let index_ref = wf.process("index_ref", "bwa index -a bwtsw {i:index}; echo done > {o:done}")?;
    wf.set_path_extend(index_ref, "index", "done", ".indexed")?;
    wf.connect(ref_fan.out("index_ref"), index_ref.input("index"))?;

    let done_fan = wf.fan_out("index_done_fan", PortKind::File, done_targets)?;
    wf.connect(index_ref.out("done"), done_fan.input("in"))?;

    for indv in INDIVIDUALS {
        let merge_name = format!("merge_{}", indv);
        let merge = wf.process(
            &merge_name,
            "bwa sampe {i:ref} {i:sai1} {i:sai2} {i:fq1} {i:fq2} > {o:merged} # {i:refdone} {p:indv}",
        )?;
        wf.set_path(
            merge,
            "merged",
            PathStrategy::custom(|ctx| format!("{}.merged.sam", ctx.param("indv").unwrap_or("unknown"))),
        )?;
        wf.connect(ref_fan.out(&merge_name), merge.input("ref"))?;
        wf.connect(done_fan.out(&merge_name), merge.input("refdone"))?;

        for smpl in SAMPLES {
            let file_name = fastq_file(indv, smpl);
            let download = wf.process(
                format!("download_fastq_{}_{}", indv, smpl),
                &format!("wget -O {{o:fastq}} {}{}", FASTQ_BASE_URL, file_name),
            )?;
            wf.set_path_static(download, "fastq", &file_name)?;

            let fastq_fan = wf.fan_out(
                format!("fastq_fan_{}_{}", indv, smpl),
                PortKind::File,
                ["bwa_aln", "merge"],
            )?;
            wf.connect(download.out("fastq"), fastq_fan.input("in"))?;

            let aln_name = format!("bwa_aln_{}_{}", indv, smpl);
            let align = wf.process(&aln_name, "bwa aln {i:ref} {i:fastq} > {o:sai} # {i:idxdone}")?;
            wf.set_path_extend(align, "fastq", "sai", ".sai")?;
            wf.connect(ref_fan.out(&aln_name), align.input("ref"))?;
            wf.connect(done_fan.out(&aln_name), align.input("idxdone"))?;
            wf.connect(fastq_fan.out("bwa_aln"), align.input("fastq"))?;

            wf.connect(align.out("sai"), merge.input(format!("sai{}", smpl)))?;
            wf.connect(fastq_fan.out("merge"), merge.input(format!("fq{}", smpl)))?;
        }

        // Parameter needed by the merge step's output path
        let indv_gen = wf.param_generator(format!("indv_{}", indv), ParamSource::constant(indv), ["out"])?;
        wf.connect(indv_gen.out("out"), merge.input("indv"))?;

        wf.drain(sink, merge.out("merged"))?;
    }

    Ok(wf)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fileflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let wf = build()?;
    println!("{}", wf.to_mermaid());

    let report = Runner::new(RunnerConfig::in_dir("resequencing_data")).run(wf).await?;
    for task in &report.tasks {
        println!(
            "{:<28} {:>8.2}s {}",
            task.process,
            task.duration.as_secs_f64(),
            if task.skipped { "(skipped)" } else { "" }
        );
    }

    Ok(())
}
