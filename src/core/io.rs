use anyhow::{Context, Result};
use memmap2::Mmap;
use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;

pub struct MmapSource {
    mmap: Option<Mmap>,
}

impl MmapSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        // A zero-length file cannot be mapped; treat it as an empty source.
        let mmap = if size == 0 {
            None
        } else {
            // SAFETY: read-only file mapping.
            Some(unsafe { Mmap::map(&file) }.with_context(|| "mmap failed")?)
        };
        Ok(Self { mmap })
    }

    pub fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }
}

#[derive(Clone, Debug)]
pub struct Bundle {
    pub data: Vec<u8>,
}

impl Bundle {
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// Streams a FASTA file into fixed-size nucleotide bundles.
///
/// Header lines reset the working sequence, as does any byte outside
/// {A,C,G,T} after case folding, so no emitted window ever spans two
/// records or covers an ambiguity code. Consecutive bundles of one
/// clean run share a k-1 byte overlap so window coverage is exact
/// across bundle boundaries.
pub struct Bundler {
    source: MmapSource,
    pos: usize,
    at_line_start: bool,
    block_size: usize,
    overlap: usize,
    buf: Vec<u8>,
    carried: usize,
    ready: VecDeque<Bundle>,
    flushed_eof: bool,
}

impl Bundler {
    pub fn open(path: &Path, block_size: usize, kmer_len: usize) -> Result<Self> {
        let source = MmapSource::open(path)?;
        Ok(Self {
            source,
            pos: 0,
            at_line_start: true,
            block_size,
            overlap: kmer_len - 1,
            buf: Vec::with_capacity(block_size),
            carried: 0,
            ready: VecDeque::new(),
            flushed_eof: false,
        })
    }

    pub fn next_bundle(&mut self) -> Option<Bundle> {
        while self.ready.is_empty() && self.pos < self.source.len() {
            self.scan();
        }
        if self.ready.is_empty() && !self.flushed_eof {
            self.flushed_eof = true;
            self.flush();
        }
        self.ready.pop_front()
    }

    fn scan(&mut self) {
        while self.pos < self.source.len() && self.ready.is_empty() {
            let b = self.source.bytes()[self.pos];
            if self.at_line_start && b == b'>' {
                self.flush();
                self.skip_line();
                continue;
            }
            self.pos += 1;
            match b {
                b'\n' => self.at_line_start = true,
                b'\r' => {}
                _ => {
                    self.at_line_start = false;
                    match b & 0xDF {
                        base @ (b'A' | b'C' | b'G' | b'T') => self.push_base(base),
                        _ => self.flush(),
                    }
                }
            }
        }
    }

    fn skip_line(&mut self) {
        while self.pos < self.source.len() {
            let b = self.source.bytes()[self.pos];
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
        self.at_line_start = true;
    }

    fn push_base(&mut self, base: u8) {
        self.buf.push(base);
        if self.buf.len() >= self.block_size {
            let data = std::mem::take(&mut self.buf);
            if self.overlap > 0 {
                self.buf.extend_from_slice(&data[data.len() - self.overlap..]);
            }
            self.carried = self.overlap;
            self.ready.push_back(Bundle { data });
        }
    }

    // Emits the pending buffer only if it holds at least one byte that has
    // not already been emitted as part of a previous bundle.
    fn flush(&mut self) {
        if self.buf.len() > self.carried {
            let data = std::mem::take(&mut self.buf);
            self.ready.push_back(Bundle { data });
        } else {
            self.buf.clear();
        }
        self.carried = 0;
    }
}
