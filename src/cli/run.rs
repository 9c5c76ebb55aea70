use crate::cli::args::{Cli, Commands, CountArgs};
use crate::core::config::PipelineConfig;
use crate::core::engine;
use crate::report;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;
use std::fs;
use std::time::{Duration, Instant};

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Count(args) => count(args),
    }
}

fn count(args: CountArgs) -> Result<()> {
    let stats = stats_enabled();
    let t0 = Instant::now();

    stage(stats, "preflight", || {
        for input in &args.inputs {
            if input.as_os_str() == "-" {
                bail!("stdin is not supported; provide FASTA file paths");
            }
            if !input.is_file() {
                bail!("input file not found: {}", input.display());
            }
        }
        Ok(())
    })?;

    let config = PipelineConfig {
        inputs: args.inputs.clone(),
        kmer_len: args.kmer_len,
        minimizer_len: args.minimizer_len,
        block_size: args.block_size,
        producer_threads: args.producer_threads,
        consumer_threads: args.consumer_threads,
        shard_capacity: args.shard_capacity,
        max_probe_steps: args.max_probe_steps,
        queue_capacity: args
            .queue_capacity
            .unwrap_or(args.consumer_threads.max(1) * 8),
    };
    config.validate()?;

    let t_engine = Instant::now();
    let output = engine::run(&config)?;
    stage_done(stats, "engine", t_engine);

    let t_write = Instant::now();
    report::counts_txt::write(&args.out, &output)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    stage_done(stats, "write", t_write);

    if stats {
        let out_size = fs::metadata(&args.out).map(|m| m.len()).unwrap_or(0);
        eprintln!(
            "KOUNT_STATS bundles={} bundle_bytes={} super_mers={} kmers={} unique={} overflowed={}",
            output.stats.bundles,
            output.stats.bundle_bytes,
            output.stats.super_mers,
            output.stats.total_kmers,
            output.stats.unique_kmers,
            output.stats.overflowed
        );
        eprintln!(
            "KOUNT_STATS output={} bytes={}",
            args.out.display(),
            out_size
        );
        eprintln!("KOUNT_STATS total={}", fmt_dur(t0.elapsed()));
    }

    Ok(())
}

fn stats_enabled() -> bool {
    matches!(env::var("KOUNT_STATS").as_deref(), Ok("1"))
}

fn stage<F>(stats: bool, name: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let t = Instant::now();
    let res = f();
    if stats {
        eprintln!("KOUNT_STATS stage={} time={}", name, fmt_dur(t.elapsed()));
    }
    res
}

fn stage_done(stats: bool, name: &str, t: Instant) {
    if stats {
        eprintln!("KOUNT_STATS stage={} time={}", name, fmt_dur(t.elapsed()));
    }
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
