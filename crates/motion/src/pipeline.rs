//! Bounded single-producer/single-consumer pipeline of motion blocks.
//!
//! A fixed-capacity ring with monotonically increasing head/tail indices
//! (slot = index % N). The planner appends at the tail and may look back
//! over queued blocks to re-flow speeds; the actuator peeks and removes at
//! the head. No allocation, ever.
//!
//! ## Publication order
//!
//! The producer fills a block's fields, release-publishes `can_execute`
//! where appropriate, then release-advances the tail. The consumer
//! acquire-loads the tail, acquire-loads `can_execute`, and only then reads
//! the remaining fields.
//!
//! ## Contract
//!
//! Exactly one producer context and one consumer context. Lookback mutation
//! (`peek_head_n_mut`) and `clear` must additionally run inside the planner
//! critical section (see crate docs) so they cannot interleave with a tick
//! that is reading the same slot.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::block::MotionBlock;

/// Ring buffer of planned motion blocks.
pub struct MotionPipeline<const N: usize> {
    slots: [UnsafeCell<MotionBlock>; N],
    /// Consumer index: next block to execute.
    head: AtomicUsize,
    /// Producer index: next free slot.
    tail: AtomicUsize,
}

// Safety: producer and consumer touch disjoint slots, synchronized through
// the head/tail indices and the per-block atomic flags; overlapping lookback
// mutation is excluded by the planner critical section (module docs).
unsafe impl<const N: usize> Sync for MotionPipeline<N> {}

impl<const N: usize> MotionPipeline<N> {
    pub const fn new() -> Self {
        Self {
            slots: [const { UnsafeCell::new(MotionBlock::new()) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Number of blocks currently queued (including an executing head).
    pub fn count(&self) -> usize {
        self.tail
            .load(Ordering::Acquire)
            .wrapping_sub(self.head.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Free slots available to the producer.
    pub fn free_slots(&self) -> usize {
        N - self.count()
    }

    pub fn can_accept(&self) -> bool {
        self.count() < N
    }

    /// Appends a block at the tail. Producer context only.
    pub fn append(&self, block: MotionBlock) -> Result<(), MotionBlock> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= N {
            return Err(block);
        }
        // Safety: the slot at `tail` is outside [head, tail) so neither
        // context holds a reference into it; we are the only producer.
        unsafe {
            *self.slots[tail % N].get() = block;
        }
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// The block at the head, if any. Consumer context only. The returned
    /// reference must be dropped before `remove_head` is called.
    pub fn peek_head(&self) -> Option<&MotionBlock> {
        let head = self.head.load(Ordering::Relaxed);
        if head == self.tail.load(Ordering::Acquire) {
            return None;
        }
        // Safety: the slot is inside [head, tail); the producer only mutates
        // it through the lookback API, which the critical section serializes
        // against the tick.
        Some(unsafe { &*self.slots[head % N].get() })
    }

    /// Lookback from the producer side: `i = 0` is the newest appended
    /// block. Producer context only.
    pub fn peek_head_n(&self, i: usize) -> Option<&MotionBlock> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let count = tail.wrapping_sub(head);
        if i >= count {
            return None;
        }
        let idx = tail.wrapping_sub(1).wrapping_sub(i);
        Some(unsafe { &*self.slots[idx % N].get() })
    }

    /// Mutable lookback for speed re-planning: `i = 0` is the newest
    /// appended block. Producer context only, inside the planner critical
    /// section, and the caller must not mutate blocks whose `is_executing`
    /// flag is set.
    #[allow(clippy::mut_from_ref)]
    pub fn peek_head_n_mut(&self, i: usize) -> Option<&mut MotionBlock> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let count = tail.wrapping_sub(head);
        if i >= count {
            return None;
        }
        let idx = tail.wrapping_sub(1).wrapping_sub(i);
        // Safety: see module contract; the critical section excludes the
        // consumer while this reference is alive.
        Some(unsafe { &mut *self.slots[idx % N].get() })
    }

    /// Removes the head block. Consumer context only.
    pub fn remove_head(&self) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        if head == self.tail.load(Ordering::Acquire) {
            return false;
        }
        self.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Drops all blocks that have not started executing. Producer context
    /// only, inside the planner critical section. An executing head block is
    /// left to finish.
    pub fn clear(&self) {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Relaxed);
        if head == tail {
            return;
        }
        let head_executing = unsafe { &*self.slots[head % N].get() }.is_executing();
        let new_tail = if head_executing {
            head.wrapping_add(1)
        } else {
            head
        };
        self.tail.store(new_tail, Ordering::Release);
    }
}

impl<const N: usize> Default for MotionPipeline<N> {
    fn default() -> Self {
        Self::new()
    }
}
