//! SPSC command ring - the handoff between the I/O thread and the
//! matching thread.
//!
//! A power-of-two array of pre-allocated slots with two monotonically
//! increasing cursors. The producer writes a slot, then publishes it
//! with a release-store of its cursor; the consumer pairs that with an
//! acquire-load, so the slot contents are visible before the slot is
//! observed. No locks, no condition variables, no kernel involvement.
//!
//! The cursors live on separate cache lines ([`CachePadded`]) so the
//! producer and consumer cores never false-share. When the consumer
//! falls a full lap behind, [`Producer::push`] spins until a slot frees:
//! back-pressure, never a drop.
//!
//! A multi-producer variant would claim sequence numbers with a
//! fetch-add before writing; with a single logical producer upstream,
//! the plain store is enough.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

struct Shared<T> {
    /// Pre-allocated slot storage
    slots: Box<[UnsafeCell<T>]>,
    /// Capacity - 1; capacity is a power of two
    mask: usize,
    /// Next sequence the producer will publish
    tail: CachePadded<AtomicUsize>,
    /// Next sequence the consumer will read
    head: CachePadded<AtomicUsize>,
}

// Slots are only touched under the cursor protocol: a slot is written
// exclusively by the producer before publication and read exclusively
// by the consumer after it.
unsafe impl<T: Send> Sync for Shared<T> {}

/// Create a ring with `capacity` pre-allocated slots.
///
/// # Panics
/// Panics unless `capacity` is a power of two and at least 2.
pub fn ring<T: Copy + Default>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(
        capacity.is_power_of_two() && capacity >= 2,
        "ring capacity must be a power of two >= 2"
    );

    let slots: Box<[UnsafeCell<T>]> = (0..capacity).map(|_| UnsafeCell::new(T::default())).collect();
    let shared = Arc::new(Shared {
        slots,
        mask: capacity - 1,
        tail: CachePadded::new(AtomicUsize::new(0)),
        head: CachePadded::new(AtomicUsize::new(0)),
    });

    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

/// Write half of the ring. Owned by the I/O thread.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Copy> Producer<T> {
    /// Attempt to publish one value; hands it back if the ring is full.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let head = self.shared.head.load(Ordering::Acquire);

        if tail.wrapping_sub(head) > self.shared.mask {
            return Err(value);
        }

        unsafe {
            self.shared.slots[tail & self.shared.mask].get().write(value);
        }
        self.shared.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Publish one value, spinning while the consumer is a lap behind.
    #[inline]
    pub fn push(&mut self, value: T) {
        let mut value = value;
        loop {
            match self.try_push(value) {
                Ok(()) => return,
                Err(v) => {
                    value = v;
                    std::hint::spin_loop();
                }
            }
        }
    }

    /// Slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.mask + 1
    }
}

/// Read half of the ring. Owned by the matching thread.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Copy> Consumer<T> {
    /// Take the next published value, if any.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        let value = unsafe { *self.shared.slots[head & self.shared.mask].get() };
        self.shared.head.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    /// True if no published slot is waiting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.head.load(Ordering::Relaxed) == self.shared.tail.load(Ordering::Acquire)
    }

    /// Slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.mask + 1
    }
}
