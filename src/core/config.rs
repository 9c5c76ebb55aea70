use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("k-mer length must be >= 1 (got {0})")]
    KmerLen(usize),

    #[error("minimizer length must be in 1..={k} (got {m})")]
    MinimizerLen { m: usize, k: usize },

    #[error("block size must be >= k-mer length (got {block_size} with k = {k})")]
    BlockSize { block_size: usize, k: usize },

    #[error("{0} must be >= 1")]
    Zero(&'static str),
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub inputs: Vec<PathBuf>,
    pub kmer_len: usize,
    pub minimizer_len: usize,
    pub block_size: usize,
    pub producer_threads: usize,
    pub consumer_threads: usize,
    pub shard_capacity: usize,
    pub max_probe_steps: usize,
    pub queue_capacity: usize,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kmer_len == 0 {
            return Err(ConfigError::KmerLen(self.kmer_len));
        }
        if self.minimizer_len == 0 || self.minimizer_len > self.kmer_len {
            return Err(ConfigError::MinimizerLen {
                m: self.minimizer_len,
                k: self.kmer_len,
            });
        }
        // The bundler retains k-1 bytes of every emitted bundle; a smaller
        // block would never make forward progress.
        if self.block_size < self.kmer_len {
            return Err(ConfigError::BlockSize {
                block_size: self.block_size,
                k: self.kmer_len,
            });
        }
        for (name, value) in [
            ("--producer-threads", self.producer_threads),
            ("--consumer-threads", self.consumer_threads),
            ("--shard-capacity", self.shard_capacity),
            ("--queue-capacity", self.queue_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        Ok(())
    }
}
