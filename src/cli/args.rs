use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kount", version, about = "Minimizer-based parallel k-mer counter for FASTA")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Count(CountArgs),
}

#[derive(Parser)]
pub struct CountArgs {
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(short = 'k', long, default_value_t = 31)]
    pub kmer_len: usize,

    #[arg(short = 'm', long, default_value_t = 15)]
    pub minimizer_len: usize,

    #[arg(long, default_value_t = 1 << 20)]
    pub block_size: usize,

    #[arg(long, default_value_t = num_cpus::get())]
    pub producer_threads: usize,

    #[arg(long, default_value_t = num_cpus::get())]
    pub consumer_threads: usize,

    #[arg(long, default_value_t = 1_000_003)]
    pub shard_capacity: usize,

    #[arg(long, default_value_t = 100)]
    pub max_probe_steps: usize,

    #[arg(long)]
    pub queue_capacity: Option<usize>,
}
