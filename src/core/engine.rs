use crate::core::config::PipelineConfig;
use crate::core::io::{Bundle, Bundler};
use crate::core::queue::{self, KmerBatch};
use crate::core::segment;
use crate::core::shard::{InsertOutcome, ShardTable};
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub struct RunOutput {
    pub counts: HashMap<Vec<u8>, u64>,
    pub stats: RunStats,
}

#[derive(Clone, Debug, Default)]
pub struct RunStats {
    pub bundles: u64,
    pub bundle_bytes: u64,
    pub super_mers: u64,
    pub total_kmers: u64,
    pub unique_kmers: u64,
    pub overflowed: u64,
}

#[derive(Clone, Debug, Default)]
struct ProducerStats {
    bundles: u64,
    super_mers: u64,
    kmers: u64,
}

#[derive(Clone, Debug, Default)]
struct WorkerStats {
    batches: u64,
    kmers: u64,
    rejected: u64,
}

pub fn run(cfg: &PipelineConfig) -> Result<RunOutput> {
    let stats = stats_enabled();
    let t_total = Instant::now();

    let t_bundle = Instant::now();
    let mut bundles: Vec<Bundle> = Vec::new();
    for path in &cfg.inputs {
        let mut bundler = Bundler::open(path, cfg.block_size, cfg.kmer_len)?;
        while let Some(bundle) = bundler.next_bundle() {
            bundles.push(bundle);
        }
    }
    let bundle_bytes: u64 = bundles.iter().map(|b| b.len() as u64).sum();
    if stats {
        eprintln!(
            "KOUNT_STATS stage=bundle time={} bundles={} bytes={}",
            fmt_dur(t_bundle.elapsed()),
            bundles.len(),
            bundle_bytes
        );
    }

    let mut run_stats = RunStats {
        bundles: bundles.len() as u64,
        bundle_bytes,
        ..RunStats::default()
    };

    let bundles = Arc::new(bundles);
    let next_bundle = Arc::new(AtomicUsize::new(0));
    let overflow = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));
    let (batch_tx, batch_rx) = queue::batch_queue(cfg.queue_capacity);

    let t_pipeline = Instant::now();
    let mut producers = Vec::with_capacity(cfg.producer_threads);
    for _ in 0..cfg.producer_threads {
        let bundles = Arc::clone(&bundles);
        let next = Arc::clone(&next_bundle);
        let tx = batch_tx.clone();
        let k = cfg.kmer_len;
        let m = cfg.minimizer_len;
        producers.push(thread::spawn(move || {
            let mut pstats = ProducerStats::default();
            loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                if i >= bundles.len() {
                    break;
                }
                pstats.bundles += 1;
                for super_mer in segment::super_mers(&bundles[i].data, k, m) {
                    let batch = KmerBatch::from_super_mer(&super_mer, k);
                    pstats.super_mers += 1;
                    pstats.kmers += batch.len() as u64;
                    if tx.push(batch).is_err() {
                        // No consumer left; the pipeline is tearing down.
                        return pstats;
                    }
                }
            }
            pstats
        }));
    }
    // Producers hold the only senders: the queue closes when the last
    // producer finishes.
    drop(batch_tx);

    let mut consumers = Vec::with_capacity(cfg.consumer_threads);
    for _ in 0..cfg.consumer_threads {
        let rx = batch_rx.clone();
        let overflow = Arc::clone(&overflow);
        let mut table = ShardTable::new(cfg.shard_capacity, cfg.max_probe_steps);
        consumers.push(thread::spawn(move || {
            let mut wstats = WorkerStats::default();
            let mut rejects: Vec<Vec<u8>> = Vec::new();
            while let Some(batch) = rx.pop() {
                wstats.batches += 1;
                wstats.kmers += batch.len() as u64;
                for kmer in batch.kmers {
                    if let InsertOutcome::Rejected(key) = table.insert(kmer) {
                        rejects.push(key);
                    }
                }
                if !rejects.is_empty() {
                    wstats.rejected += rejects.len() as u64;
                    overflow.lock().unwrap().append(&mut rejects);
                }
            }
            (table, wstats)
        }));
    }
    drop(batch_rx);

    let mut pstats = ProducerStats::default();
    for p in producers {
        let s = p.join().map_err(|_| anyhow!("producer thread panicked"))?;
        pstats.bundles += s.bundles;
        pstats.super_mers += s.super_mers;
        pstats.kmers += s.kmers;
    }

    let mut tables = Vec::with_capacity(cfg.consumer_threads);
    let mut wstats = WorkerStats::default();
    for c in consumers {
        let (table, s) = c.join().map_err(|_| anyhow!("worker thread panicked"))?;
        wstats.batches += s.batches;
        wstats.kmers += s.kmers;
        wstats.rejected += s.rejected;
        tables.push(table);
    }
    if stats {
        eprintln!(
            "KOUNT_STATS stage=count time={} super_mers={} kmers={} rejected={}",
            fmt_dur(t_pipeline.elapsed()),
            pstats.super_mers,
            wstats.kmers,
            wstats.rejected
        );
    }

    let t_merge = Instant::now();
    let mut counts: HashMap<Vec<u8>, u64> = HashMap::new();
    for table in &tables {
        for (key, count) in table.entries() {
            *counts.entry(key.to_vec()).or_insert(0) += count;
        }
    }

    let overflow = Arc::try_unwrap(overflow)
        .map_err(|_| anyhow!("overflow log still shared after join"))?
        .into_inner()
        .map_err(|_| anyhow!("overflow log lock poisoned"))?;
    let mut overflow_counts: HashMap<Vec<u8>, u64> = HashMap::new();
    for key in overflow {
        *overflow_counts.entry(key).or_insert(0) += 1;
    }
    for (key, count) in overflow_counts {
        *counts.entry(key).or_insert(0) += count;
    }

    run_stats.super_mers = pstats.super_mers;
    run_stats.total_kmers = wstats.kmers;
    run_stats.unique_kmers = counts.len() as u64;
    run_stats.overflowed = wstats.rejected;

    if stats {
        eprintln!(
            "KOUNT_STATS stage=merge time={} unique={}",
            fmt_dur(t_merge.elapsed()),
            counts.len()
        );
        if let Some((kmer, count)) = counts.iter().max_by_key(|(_, c)| **c) {
            eprintln!(
                "KOUNT_STATS top_kmer={} top_count={}",
                String::from_utf8_lossy(kmer),
                count
            );
        }
        eprintln!("KOUNT_STATS stage=engine time={}", fmt_dur(t_total.elapsed()));
    }

    Ok(RunOutput {
        counts,
        stats: run_stats,
    })
}

fn stats_enabled() -> bool {
    matches!(env::var("KOUNT_STATS").as_deref(), Ok("1"))
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
