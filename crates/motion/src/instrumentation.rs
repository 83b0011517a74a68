//! Optional ring-buffered trace of actuator activity.
//!
//! The actuator records compact events from the tick (cheap stores, no
//! allocation); the planner context snapshots them for offline analysis.
//! The whole module is behind the `instrumentation` cargo feature and costs
//! nothing when disabled.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Capacity of the trace ring, in events.
pub const TRACE_CAPACITY: usize = 256;

/// What happened on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceKind {
    #[default]
    None,
    /// A new block was set up.
    BlockStart,
    /// A step pulse started on `axis`.
    StepStart,
    /// The head block completed all steps.
    BlockDone,
    /// An end-stop sample terminated the head block.
    EndstopHit,
}

/// One recorded actuator event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceEvent {
    /// Tick counter at the time of the event.
    pub tick: u32,
    pub kind: TraceKind,
    /// Axis for per-axis events, 0 otherwise.
    pub axis: u8,
    /// Step rate at the time of the event.
    pub rate_tticks: u32,
}

/// Wrap-around event buffer: single writer (the actuator), best-effort
/// reader (the planner context). The write counter never wraps below the
/// capacity, so readers can tell how much was ever recorded.
pub struct TickTrace {
    events: [UnsafeCell<TraceEvent>; TRACE_CAPACITY],
    write_count: AtomicUsize,
}

// Safety: one writer; readers get a best-effort snapshot (an in-flight event
// may be skipped, never a torn index).
unsafe impl Sync for TickTrace {}

impl TickTrace {
    pub const fn new() -> Self {
        Self {
            events: [const { UnsafeCell::new(TraceEvent {
                tick: 0,
                kind: TraceKind::None,
                axis: 0,
                rate_tticks: 0,
            }) }; TRACE_CAPACITY],
            write_count: AtomicUsize::new(0),
        }
    }

    /// Records one event. Writer context only.
    #[inline]
    pub fn record(&self, event: TraceEvent) {
        let count = self.write_count.load(Ordering::Relaxed);
        unsafe {
            *self.events[count % TRACE_CAPACITY].get() = event;
        }
        self.write_count.store(count.wrapping_add(1), Ordering::Release);
    }

    /// Total events ever recorded.
    pub fn total_recorded(&self) -> usize {
        self.write_count.load(Ordering::Acquire)
    }

    /// Copies the most recent events (oldest first) into `out`, returning
    /// how many were written. Reader context.
    pub fn snapshot(&self, out: &mut [TraceEvent]) -> usize {
        let count = self.write_count.load(Ordering::Acquire);
        let available = count.min(TRACE_CAPACITY).min(out.len());
        let start = count - available;
        for (i, slot) in out.iter_mut().take(available).enumerate() {
            *slot = unsafe { *self.events[(start + i) % TRACE_CAPACITY].get() };
        }
        available
    }
}

impl Default for TickTrace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_snapshots_in_order() {
        let trace = TickTrace::new();
        for i in 0..5u32 {
            trace.record(TraceEvent {
                tick: i,
                kind: TraceKind::StepStart,
                axis: 0,
                rate_tticks: i * 100,
            });
        }
        let mut out = [TraceEvent::default(); 8];
        let n = trace.snapshot(&mut out);
        assert_eq!(n, 5);
        assert_eq!(out[0].tick, 0);
        assert_eq!(out[4].tick, 4);
    }

    #[test]
    fn wraps_keeping_newest() {
        let trace = TickTrace::new();
        for i in 0..(TRACE_CAPACITY as u32 + 10) {
            trace.record(TraceEvent {
                tick: i,
                kind: TraceKind::StepStart,
                axis: 0,
                rate_tticks: 0,
            });
        }
        assert_eq!(trace.total_recorded(), TRACE_CAPACITY + 10);
        let mut out = [TraceEvent::default(); TRACE_CAPACITY];
        let n = trace.snapshot(&mut out);
        assert_eq!(n, TRACE_CAPACITY);
        assert_eq!(out[0].tick, 10);
        assert_eq!(out[TRACE_CAPACITY - 1].tick, TRACE_CAPACITY as u32 + 9);
    }
}
