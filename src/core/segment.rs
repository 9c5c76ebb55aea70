use std::collections::VecDeque;

/// All length-k windows of `seq`, left to right. Empty when `seq` is
/// shorter than k.
pub fn kmers(seq: &[u8], k: usize) -> std::slice::Windows<'_, u8> {
    seq.windows(k)
}

/// Lexicographically smallest length-m substring of `kmer`, leftmost on
/// ties.
pub fn minimizer(kmer: &[u8], m: usize) -> &[u8] {
    debug_assert!(m >= 1 && m <= kmer.len());
    kmers(kmer, m).min().unwrap()
}

/// Splits a bundle into super-mers: maximal runs of consecutive k-mer
/// windows sharing the same minimizer value.
///
/// Expanding the returned super-mers back into length-k windows
/// reproduces the k-mer sequence of `seq` exactly and in order. Uses a
/// monotone deque over m-mer start positions so each window's minimum is
/// found without rescanning; the output matches the per-window scan in
/// `minimizer` byte for byte.
pub fn super_mers(seq: &[u8], k: usize, m: usize) -> Vec<Vec<u8>> {
    debug_assert!(k >= 1 && m >= 1 && m <= k);
    let n = seq.len();
    if n < k {
        return Vec::new();
    }
    let windows = n - k + 1;
    let span = k - m + 1;
    let mmer = |p: usize| &seq[p..p + m];

    // Front of the deque is the leftmost minimal m-mer start of the
    // current window; candidates behind it are non-decreasing.
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(span);
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut prev_min = 0usize;

    for w in 0..windows {
        if w == 0 {
            for p in 0..span {
                push_candidate(&mut deque, seq, m, p);
            }
        } else {
            push_candidate(&mut deque, seq, m, w + span - 1);
        }
        while *deque.front().unwrap() < w {
            deque.pop_front();
        }
        let min = *deque.front().unwrap();

        if w > 0 && mmer(min) != mmer(prev_min) {
            out.push(seq[start..w - 1 + k].to_vec());
            start = w;
        }
        prev_min = min;
    }
    out.push(seq[start..n].to_vec());
    out
}

fn push_candidate(deque: &mut VecDeque<usize>, seq: &[u8], m: usize, pos: usize) {
    // Strict comparison keeps the earlier of two equal m-mers in front.
    while let Some(&back) = deque.back() {
        if seq[back..back + m] > seq[pos..pos + m] {
            deque.pop_back();
        } else {
            break;
        }
    }
    deque.push_back(pos);
}
