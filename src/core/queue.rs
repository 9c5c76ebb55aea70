use crate::core::segment;
use crossbeam_channel::{Receiver, Sender, bounded};

/// The k-mers of one super-mer, in order. Single-owner: the producer
/// owns it until the push completes, then the queue, then exactly one
/// consumer.
#[derive(Clone, Debug)]
pub struct KmerBatch {
    pub kmers: Vec<Vec<u8>>,
}

impl KmerBatch {
    pub fn from_super_mer(super_mer: &[u8], k: usize) -> Self {
        Self {
            kmers: segment::kmers(super_mer, k).map(|w| w.to_vec()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }
}

/// Bounded FIFO of batches. Closing is implicit: once every sender is
/// dropped and the queue drains, `pop` reports the end of the stream.
pub fn batch_queue(capacity: usize) -> (BatchSender, BatchReceiver) {
    let (tx, rx) = bounded(capacity);
    (BatchSender(tx), BatchReceiver(rx))
}

#[derive(Clone)]
pub struct BatchSender(Sender<KmerBatch>);

impl BatchSender {
    /// Blocks while the queue is at capacity. Returns the batch when no
    /// receiver is left to take it.
    pub fn push(&self, batch: KmerBatch) -> Result<(), KmerBatch> {
        self.0.send(batch).map_err(|e| e.0)
    }
}

#[derive(Clone)]
pub struct BatchReceiver(Receiver<KmerBatch>);

impl BatchReceiver {
    /// Blocks until a batch arrives; `None` means the queue is empty and
    /// every sender is gone.
    pub fn pop(&self) -> Option<KmerBatch> {
        self.0.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn batch(kmer: &[u8]) -> KmerBatch {
        KmerBatch {
            kmers: vec![kmer.to_vec()],
        }
    }

    #[test]
    fn expands_super_mer_in_order() {
        let b = KmerBatch::from_super_mer(b"AAGAA", 3);
        assert_eq!(b.kmers, vec![b"AAG".to_vec(), b"AGA".to_vec(), b"GAA".to_vec()]);
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn too_short_super_mer_expands_to_nothing() {
        assert!(KmerBatch::from_super_mer(b"AG", 3).is_empty());
    }

    #[test]
    fn single_producer_fifo_order() {
        let (tx, rx) = batch_queue(16);
        tx.push(batch(b"AAA")).unwrap();
        tx.push(batch(b"CCC")).unwrap();
        tx.push(batch(b"GGG")).unwrap();
        drop(tx);
        assert_eq!(rx.pop().unwrap().kmers[0], b"AAA");
        assert_eq!(rx.pop().unwrap().kmers[0], b"CCC");
        assert_eq!(rx.pop().unwrap().kmers[0], b"GGG");
        assert!(rx.pop().is_none());
    }

    #[test]
    fn pop_reports_closed_after_last_sender_drops() {
        let (tx, rx) = batch_queue(4);
        let tx2 = tx.clone();
        drop(tx);
        tx2.push(batch(b"TTT")).unwrap();
        drop(tx2);
        assert!(rx.pop().is_some());
        assert!(rx.pop().is_none());
        assert!(rx.pop().is_none());
    }

    #[test]
    fn push_fails_once_receivers_are_gone() {
        let (tx, rx) = batch_queue(4);
        drop(rx);
        let returned = tx.push(batch(b"AAA")).unwrap_err();
        assert_eq!(returned.kmers[0], b"AAA");
    }

    #[test]
    fn bounded_push_resumes_after_pop() {
        let (tx, rx) = batch_queue(1);
        tx.push(batch(b"AAA")).unwrap();
        let t = thread::spawn(move || {
            // Second push blocks until the consumer below makes room.
            tx.push(batch(b"CCC")).unwrap();
        });
        assert_eq!(rx.pop().unwrap().kmers[0], b"AAA");
        assert_eq!(rx.pop().unwrap().kmers[0], b"CCC");
        t.join().unwrap();
        assert!(rx.pop().is_none());
    }

    #[test]
    fn many_batches_through_threads() {
        let (tx, rx) = batch_queue(8);
        let producer = thread::spawn(move || {
            for i in 0..1000u32 {
                let kmer = format!("A{i:04}").into_bytes();
                tx.push(batch(&kmer)).unwrap();
            }
        });
        let mut seen = 0u32;
        while let Some(b) = rx.pop() {
            let s = String::from_utf8(b.kmers[0].clone()).unwrap();
            assert_eq!(s, format!("A{seen:04}"));
            seen += 1;
        }
        assert_eq!(seen, 1000);
        producer.join().unwrap();
    }
}
