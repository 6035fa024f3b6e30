//! # Scheduler Metrics
//!
//! Counters for scheduler activity and per-thread completion reports.

use crate::context::SwitchReason;
use crate::{SimTime, ThreadHandle, ThreadId};
use core::sync::atomic::{AtomicU64, Ordering};

/// Scheduler metrics
#[derive(Debug)]
pub struct SchedulerMetrics {
    /// Total control transfers
    context_switches: AtomicU64,
    /// Transfers into pooled threads
    dispatches: AtomicU64,
    /// Total voluntary yields
    voluntary_yields: AtomicU64,
    /// Threads that terminated
    exits: AtomicU64,
    /// Times the scheduler found nothing runnable
    halts: AtomicU64,
    /// Threads created
    creations: AtomicU64,
    /// Creations refused (pool full or policy admission)
    rejected: AtomicU64,
}

impl SchedulerMetrics {
    /// Create new metrics
    pub const fn new() -> Self {
        Self {
            context_switches: AtomicU64::new(0),
            dispatches: AtomicU64::new(0),
            voluntary_yields: AtomicU64::new(0),
            exits: AtomicU64::new(0),
            halts: AtomicU64::new(0),
            creations: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Record a control transfer
    pub fn record_switch(&self, reason: SwitchReason) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
        if reason != SwitchReason::Halt {
            self.dispatches.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a voluntary yield
    pub fn record_yield(&self) {
        self.voluntary_yields.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a thread termination
    pub fn record_exit(&self) {
        self.exits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a halt
    pub fn record_halt(&self) {
        self.halts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a creation
    pub fn record_creation(&self) {
        self.creations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a refused creation
    pub fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total control transfers
    pub fn context_switches(&self) -> u64 {
        self.context_switches.load(Ordering::Relaxed)
    }

    /// Get transfers into pooled threads
    pub fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    /// Get voluntary yields
    pub fn voluntary_yields(&self) -> u64 {
        self.voluntary_yields.load(Ordering::Relaxed)
    }

    /// Get terminations
    pub fn exits(&self) -> u64 {
        self.exits.load(Ordering::Relaxed)
    }

    /// Get halts
    pub fn halts(&self) -> u64 {
        self.halts.load(Ordering::Relaxed)
    }

    /// Get creations
    pub fn creations(&self) -> u64 {
        self.creations.load(Ordering::Relaxed)
    }

    /// Get refused creations
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.context_switches.store(0, Ordering::Relaxed);
        self.dispatches.store(0, Ordering::Relaxed);
        self.voluntary_yields.store(0, Ordering::Relaxed);
        self.exits.store(0, Ordering::Relaxed);
        self.halts.store(0, Ordering::Relaxed);
        self.creations.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Completion record of a terminated thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadReport {
    /// Caller-assigned identifier
    pub id: ThreadId,
    /// Slot it ran in
    pub handle: ThreadHandle,
    /// Arrival time
    pub enter_time: SimTime,
    /// Declared run time
    pub run_time: SimTime,
    /// Clock at the first dispatch
    pub first_dispatch: SimTime,
    /// Clock when the thread terminated
    pub completed_at: SimTime,
}

impl ThreadReport {
    /// Time spent eligible before the first dispatch
    pub fn waiting_time(&self) -> SimTime {
        self.first_dispatch.saturating_sub(self.enter_time)
    }

    /// Time from arrival to termination
    pub fn turnaround_time(&self) -> SimTime {
        self.completed_at.saturating_sub(self.enter_time)
    }
}
