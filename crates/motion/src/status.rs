//! Shared planner/actuator status flags.
//!
//! These are the only values both contexts write: the pause flag (written by
//! the planner side, read every tick), the sticky end-stop latch and the
//! last-completed numbered command register (written by the actuator, polled
//! by the planner side).

use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Sentinel for "this block/command is not tracked by number".
pub const NUMBERED_COMMAND_NONE: i32 = -1;

/// Atomic flags shared between the planner context and the tick context.
#[derive(Debug)]
pub struct MotionStatus {
    is_paused: AtomicBool,
    end_stop_reached: AtomicBool,
    last_completed_numbered_command: AtomicI32,
}

impl MotionStatus {
    pub const fn new() -> Self {
        Self {
            is_paused: AtomicBool::new(false),
            end_stop_reached: AtomicBool::new(false),
            last_completed_numbered_command: AtomicI32::new(NUMBERED_COMMAND_NONE),
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.is_paused.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_paused(&self, paused: bool) {
        self.is_paused.store(paused, Ordering::Release);
    }

    /// Whether an end-stop test terminated a block since the last
    /// acknowledgement.
    #[inline]
    pub fn end_stop_reached(&self) -> bool {
        self.end_stop_reached.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_end_stop_reached(&self) {
        self.end_stop_reached.store(true, Ordering::Release);
    }

    /// Clears the sticky end-stop latch, re-enabling unbounded moves.
    #[inline]
    pub fn acknowledge_end_stop(&self) {
        self.end_stop_reached.store(false, Ordering::Release);
    }

    /// Index of the most recently completed numbered command, or
    /// [`NUMBERED_COMMAND_NONE`].
    #[inline]
    pub fn last_completed_numbered_command(&self) -> i32 {
        self.last_completed_numbered_command.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_last_completed_numbered_command(&self, idx: i32) {
        self.last_completed_numbered_command
            .store(idx, Ordering::Release);
    }
}

impl Default for MotionStatus {
    fn default() -> Self {
        Self::new()
    }
}
