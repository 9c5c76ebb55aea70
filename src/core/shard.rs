#[derive(Clone, Debug)]
struct Slot {
    key: Vec<u8>,
    count: u64,
}

#[derive(Debug)]
pub enum InsertOutcome {
    Counted,
    /// Probing exceeded the bound; the key comes back untouched for the
    /// overflow path. The table is not mutated.
    Rejected(Vec<u8>),
}

/// Fixed-capacity open-addressing count table owned by one worker.
///
/// Probes `(h + i*i) mod capacity` for `i = 0..=max_probe_steps`; keys
/// that exhaust the probe budget are rejected and belong on the overflow
/// path.
pub struct ShardTable {
    slots: Vec<Option<Slot>>,
    max_probe_steps: usize,
    len: usize,
}

impl ShardTable {
    pub fn new(capacity: usize, max_probe_steps: usize) -> Self {
        assert!(capacity > 0);
        Self {
            slots: vec![None; capacity],
            max_probe_steps,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn insert(&mut self, kmer: Vec<u8>) -> InsertOutcome {
        let cap = self.slots.len() as u64;
        let base = hash_kmer(&kmer) % cap;
        for i in 0..=self.max_probe_steps as u64 {
            let idx = ((base + i * i) % cap) as usize;
            let slot = &mut self.slots[idx];
            match slot {
                Some(s) if s.key == kmer => {
                    s.count += 1;
                    return InsertOutcome::Counted;
                }
                Some(_) => {}
                None => {
                    *slot = Some(Slot { key: kmer, count: 1 });
                    self.len += 1;
                    return InsertOutcome::Counted;
                }
            }
        }
        InsertOutcome::Rejected(kmer)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&[u8], u64)> + '_ {
        self.slots
            .iter()
            .flatten()
            .map(|s| (s.key.as_slice(), s.count))
    }
}

pub fn hash_kmer(seq: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut h = FNV_OFFSET;
    for &b in seq {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn counted(t: &mut ShardTable, kmer: &[u8]) -> bool {
        matches!(t.insert(kmer.to_vec()), InsertOutcome::Counted)
    }

    #[test]
    fn repeated_inserts_accumulate_in_one_slot() {
        let mut t = ShardTable::new(1009, 10);
        let kmer = vec![b'A'; 31];
        for _ in 0..5 {
            assert!(counted(&mut t, &kmer));
        }
        assert_eq!(t.len(), 1);
        let entries: Vec<_> = t.entries().collect();
        assert_eq!(entries, vec![(kmer.as_slice(), 5)]);
    }

    #[test]
    fn distinct_keys_occupy_distinct_slots() {
        let mut t = ShardTable::new(1009, 10);
        let a = vec![b'A'; 31];
        let tt = vec![b'T'; 31];
        for _ in 0..3 {
            assert!(counted(&mut t, &a));
        }
        for _ in 0..2 {
            assert!(counted(&mut t, &tt));
        }
        assert_eq!(t.len(), 2);
        let mut got: Vec<_> = t.entries().map(|(k, c)| (k.to_vec(), c)).collect();
        got.sort();
        assert_eq!(got, vec![(a, 3), (tt, 2)]);
    }

    #[test]
    fn rejects_when_probe_bound_exhausted() {
        // Capacity 1 and zero extra probe steps: the single slot is taken
        // by the first key, everything else must bounce.
        let mut t = ShardTable::new(1, 0);
        assert!(counted(&mut t, b"AAA"));
        match t.insert(b"TTT".to_vec()) {
            InsertOutcome::Rejected(key) => assert_eq!(key, b"TTT"),
            InsertOutcome::Counted => panic!("expected rejection"),
        }
        // Rejection leaves the table untouched.
        assert_eq!(t.len(), 1);
        assert_eq!(t.entries().collect::<Vec<_>>(), vec![(&b"AAA"[..], 1)]);
        // The resident key still counts fine.
        assert!(counted(&mut t, b"AAA"));
        assert_eq!(t.entries().collect::<Vec<_>>(), vec![(&b"AAA"[..], 2)]);
    }

    #[test]
    fn no_duplicate_keys_under_pressure() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut t = ShardTable::new(31, 3);
        for _ in 0..500 {
            let kmer: Vec<u8> = (0..5).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            t.insert(kmer);
        }
        let keys: Vec<_> = t.entries().map(|(k, _)| k.to_vec()).collect();
        let unique: HashSet<_> = keys.iter().cloned().collect();
        assert_eq!(keys.len(), unique.len());
        assert!(t.len() <= t.capacity());
        assert_eq!(t.len(), keys.len());
    }

    #[test]
    fn occupied_slots_have_positive_counts() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut t = ShardTable::new(101, 5);
        for _ in 0..300 {
            let kmer: Vec<u8> = (0..4).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            t.insert(kmer);
        }
        for (_, count) in t.entries() {
            assert!(count > 0);
        }
    }

    #[test]
    fn hash_is_stable_and_byte_sensitive() {
        assert_eq!(hash_kmer(b"ACGT"), hash_kmer(b"ACGT"));
        assert_ne!(hash_kmer(b"ACGT"), hash_kmer(b"ACGA"));
        assert_ne!(hash_kmer(b"ACGT"), hash_kmer(b"TGCA"));
    }
}
