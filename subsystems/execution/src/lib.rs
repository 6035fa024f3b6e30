//! # Helix User-Level Threads
//!
//! The uthread subsystem manages:
//! - A fixed pool of thread control blocks, each with its own stack
//! - Control transfer between threads (real register switching or recorded)
//! - A cooperative scheduler driven by a pluggable selection policy
//! - A simulated clock advanced by the threads themselves
//!
//! ## Key Principle
//!
//! This crate provides the MECHANISM, not the policy.
//! Selection policies (FCFS, HRRN, ...) live in their own scheduler modules
//! and are injected into a [`scheduler::Scheduler`] at construction.
//!
//! ## Execution Model
//!
//! Exactly one logical flow of control exists at any time. A thread runs
//! until it calls back into the scheduler; the only suspension point is
//! [`context::ControlTransfer::transfer`].

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod scheduler;
pub mod thread;

use core::fmt;

pub use config::SchedulerConfig;
pub use context::{Context, ControlTransfer, RecordingTransfer, Switch, SwitchReason, SwitchRecord};
#[cfg(all(
    feature = "native",
    any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "riscv64")
))]
pub use context::NativeTransfer;
pub use scheduler::{Scheduler, SchedulerMetrics, SchedulingPolicy, ThreadReport};
pub use thread::{ThreadEntry, ThreadInfo, ThreadPool, ThreadSpec, ThreadState, Tcb, TcbFlags};

/// Simulated clock value, in ticks
pub type SimTime = u64;

/// Caller-assigned thread identifier
///
/// Not unique and not tied to creation order. FCFS reads it as the
/// arrival sequence, so two threads that arrived together share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ThreadId(u32);

impl ThreadId {
    /// Create a thread ID
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw ID value
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slot index of a thread control block inside the pool
///
/// Unlike [`ThreadId`], a handle is unique among live threads. It is reused
/// once the slot goes back to [`ThreadState::Free`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadHandle(usize);

impl ThreadHandle {
    /// The slot owned by the thread that constructed the scheduler
    pub const HOST: Self = Self(0);

    /// Create a handle from a slot index
    pub const fn new(slot: usize) -> Self {
        Self(slot)
    }

    /// Get the slot index
    pub const fn index(self) -> usize {
        self.0
    }

    /// Check if this is the host slot
    pub const fn is_host(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Execution result type
pub type ExecResult<T> = Result<T, ExecError>;

/// Execution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExecError {
    /// No FREE slot left in the pool
    PoolFull {
        /// Number of slots available to created threads
        capacity: usize,
    },
    /// Nothing is RUNNABLE with its arrival time reached
    NoRunnableThread,
    /// A zero run time makes the response ratio undefined
    ZeroRunTime {
        /// Offending thread
        id: ThreadId,
    },
    /// Lifecycle transition not allowed by the state machine
    InvalidState {
        /// State the thread was in
        from: ThreadState,
        /// State that was requested
        to: ThreadState,
    },
    /// Handle does not name a slot of this pool
    InvalidHandle(ThreadHandle),
    /// Configuration rejected by validation
    InvalidConfig(&'static str),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolFull { capacity } => {
                write!(f, "thread pool full: all {} slots are in use", capacity)
            }
            Self::NoRunnableThread => write!(f, "no runnable threads"),
            Self::ZeroRunTime { id } => {
                write!(f, "thread {} declares a zero run time", id)
            }
            Self::InvalidState { from, to } => {
                write!(f, "invalid thread state transition {:?} -> {:?}", from, to)
            }
            Self::InvalidHandle(handle) => write!(f, "no thread slot {}", handle),
            Self::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
        }
    }
}

impl std::error::Error for ExecError {}
