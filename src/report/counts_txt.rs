use crate::core::engine::RunOutput;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One record per line, `<kmer>\t<count>`. Line order is unspecified.
pub fn write(path: &Path, output: &RunOutput) -> Result<()> {
    let mut w = BufWriter::new(
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
    );
    for (kmer, count) in &output.counts {
        w.write_all(kmer)?;
        writeln!(w, "\t{}", count)?;
    }
    w.flush().with_context(|| "flush of counts output failed")?;
    Ok(())
}
