//! Lock-free Single-Producer/Single-Consumer Fifo
//!
//! Moves fixed-size records between exactly one producer and one consumer
//! without locks and without allocating after construction.
//!
//! # Architecture
//!
//! ```text
//!                 data ring (filled slots)
//!   FifoProducer ──────────rtrb──────────▶ FifoConsumer
//!        ▲                                      │
//!        └──────────────rtrb────────────────────┘
//!                 free ring (empty slots)
//! ```
//!
//! Every slot is allocated once, up front, when the fifo is created.
//! `push` takes an empty slot from the free ring and overwrites it in place
//! with `Clone::clone_from`, so a `Vec<f32>` of unchanged length is copied
//! without touching the allocator. `pull` copies the slot out the same way and
//! hands the slot back. `rtrb` supplies the atomic read/write cursors.

use rtrb::{Consumer, Producer, RingBuffer};

/// Default number of slots, enough to absorb one callback's worth of jitter
pub const DEFAULT_FIFO_CAPACITY: usize = 30;

/// Create a fifo with `capacity` slots, each initialized from `prototype`
///
/// Allocates. Call during setup, never from the audio callback.
pub fn fifo<T: Clone>(capacity: usize, prototype: T) -> (FifoProducer<T>, FifoConsumer<T>) {
    fifo_with(capacity, || prototype.clone())
}

/// Create a fifo whose slots are built by `make_slot`
///
/// Lets callers reserve per-slot capacity (e.g. `Vec::with_capacity`), which a
/// plain `clone` of a prototype would not preserve.
pub fn fifo_with<T: Clone>(
    capacity: usize,
    mut make_slot: impl FnMut() -> T,
) -> (FifoProducer<T>, FifoConsumer<T>) {
    let capacity = capacity.max(1);
    let (filled_tx, filled_rx) = RingBuffer::<T>::new(capacity);
    let (mut free_tx, free_rx) = RingBuffer::<T>::new(capacity);

    for _ in 0..capacity {
        // Cannot fail: the free ring was sized for exactly `capacity` slots
        let _ = free_tx.push(make_slot());
    }

    (
        FifoProducer {
            filled: filled_tx,
            free: free_rx,
            capacity,
        },
        FifoConsumer {
            filled: filled_rx,
            free: free_tx,
        },
    )
}

/// Writing half of a fifo. Owned by exactly one thread.
pub struct FifoProducer<T> {
    filled: Producer<T>,
    free: Consumer<T>,
    capacity: usize,
}

impl<T: Clone> FifoProducer<T> {
    /// Copy `item` into the next free slot
    ///
    /// Returns `false` and drops the item when every slot is in use.
    ///
    /// # Real-time Safety
    /// No locks, no blocking. No allocation as long as the slot already has
    /// room for `item` (always true for equally-sized blocks).
    #[inline]
    pub fn push(&mut self, item: &T) -> bool {
        let Ok(mut slot) = self.free.pop() else {
            return false;
        };
        slot.clone_from(item);
        // A slot popped from the free ring always has a matching space in the
        // data ring: both rings have the same capacity and slots are conserved.
        self.filled.push(slot).is_ok()
    }

    /// Number of filled slots waiting for the consumer
    pub fn available_for_read(&self) -> usize {
        self.capacity - self.filled.slots()
    }

    /// Number of slots currently free for writing
    pub fn available_for_write(&self) -> usize {
        self.free.slots()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Reading half of a fifo. Owned by exactly one thread.
pub struct FifoConsumer<T> {
    filled: Consumer<T>,
    free: Producer<T>,
}

impl<T: Clone> FifoConsumer<T> {
    /// Copy the oldest unread item into `out`
    ///
    /// Returns `false` (leaving `out` untouched) when nothing is queued.
    #[inline]
    pub fn pull(&mut self, out: &mut T) -> bool {
        let Ok(slot) = self.filled.pop() else {
            return false;
        };
        out.clone_from(&slot);
        // Hand the slot back for reuse; the free ring always has room for it
        let _ = self.free.push(slot);
        true
    }

    /// Drain every queued item, leaving only the newest in `out`
    pub fn pull_latest(&mut self, out: &mut T) -> bool {
        let mut pulled = false;
        while self.pull(out) {
            pulled = true;
        }
        pulled
    }

    /// Number of filled slots waiting to be pulled
    pub fn available_for_read(&self) -> usize {
        self.filled.slots()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_round_trip_preserves_fifo_order() {
        let (mut tx, mut rx) = fifo(8, vec![0.0_f32; 4]);

        for i in 0..8 {
            assert!(tx.push(&vec![i as f32; 4]));
        }
        assert_eq!(rx.available_for_read(), 8);

        let mut out = vec![0.0; 4];
        for i in 0..8 {
            assert!(rx.pull(&mut out));
            assert_eq!(out, vec![i as f32; 4]);
        }
        assert_eq!(rx.available_for_read(), 0);
    }

    #[test]
    fn test_pull_from_empty_leaves_output_untouched() {
        let (_tx, mut rx) = fifo(4, 0_u32);
        let mut out = 42;
        assert!(!rx.pull(&mut out));
        assert_eq!(out, 42);
    }

    #[test]
    fn test_overflow_drops_newest() {
        let (mut tx, mut rx) = fifo(3, 0_u32);

        assert!(tx.push(&1));
        assert!(tx.push(&2));
        assert!(tx.push(&3));
        assert!(!tx.push(&4), "Push into a full fifo must fail");
        assert!(!tx.push(&5));
        assert_eq!(tx.available_for_write(), 0);

        let mut out = 0;
        let mut pulled = Vec::new();
        while rx.pull(&mut out) {
            pulled.push(out);
        }
        assert_eq!(pulled, vec![1, 2, 3]);
    }

    #[test]
    fn test_slots_are_recycled() {
        let (mut tx, mut rx) = fifo(2, 0_u32);
        let mut out = 0;

        for i in 0..100 {
            assert!(tx.push(&i));
            assert!(rx.pull(&mut out));
            assert_eq!(out, i);
        }
        assert_eq!(tx.available_for_write(), 2);
    }

    #[test]
    fn test_pull_latest_discards_stale_items() {
        let (mut tx, mut rx) = fifo(5, 0_u32);
        for i in 1..=4 {
            tx.push(&i);
        }

        let mut out = 0;
        assert!(rx.pull_latest(&mut out));
        assert_eq!(out, 4);
        assert_eq!(rx.available_for_read(), 0);
        assert!(!rx.pull_latest(&mut out));
    }

    #[test]
    fn test_producer_sees_pending_count() {
        let (mut tx, _rx) = fifo(4, 0_u8);
        tx.push(&1);
        tx.push(&2);
        assert_eq!(tx.available_for_read(), 2);
        assert_eq!(tx.capacity(), 4);
    }

    #[test]
    fn test_reserved_slots_keep_capacity() {
        let (mut tx, mut rx) = fifo_with(2, || Vec::<f32>::with_capacity(256));
        let block = vec![1.0_f32; 200];
        assert!(tx.push(&block));

        let mut out = Vec::new();
        assert!(rx.pull(&mut out));
        assert_eq!(out.len(), 200);
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        const COUNT: u32 = 10_000;
        let (mut tx, mut rx) = fifo(DEFAULT_FIFO_CAPACITY, 0_u32);

        let producer = thread::spawn(move || {
            let mut pushed = Vec::new();
            for i in 0..COUNT {
                if tx.push(&i) {
                    pushed.push(i);
                }
            }
            pushed
        });

        let mut received = Vec::new();
        let mut out = 0;
        loop {
            if rx.pull(&mut out) {
                received.push(out);
            } else if producer.is_finished() && rx.available_for_read() == 0 {
                break;
            } else {
                thread::yield_now();
            }
        }

        let pushed = producer.join().unwrap();
        while rx.pull(&mut out) {
            received.push(out);
        }
        assert_eq!(received, pushed, "Consumer must see exactly the accepted pushes, in order");
    }
}
