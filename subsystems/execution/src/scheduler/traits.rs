//! # Scheduler Traits
//!
//! Defines the trait that selection policies must implement.

use crate::thread::{ThreadPool, ThreadSpec};
use crate::{ExecResult, SimTime, ThreadHandle};

/// The core selection policy trait
///
/// All policy implementations must implement this trait.
pub trait SchedulingPolicy: Send + Sync {
    /// Get the policy name
    fn name(&self) -> &'static str;

    /// Get the policy version
    fn version(&self) -> &'static str {
        "1.0.0"
    }

    /// Check a thread before it is created
    ///
    /// A policy rejects parameters it cannot schedule here, so that they
    /// never reach [`SchedulingPolicy::select`].
    fn admit(&self, _spec: &ThreadSpec) -> ExecResult<()> {
        Ok(())
    }

    /// Pick the next thread to run
    ///
    /// Must only return a handle whose TCB is RUNNABLE with
    /// `enter_time <= now`, and must give the same answer for the same
    /// pool snapshot. `None` means nothing is eligible.
    fn select(&self, pool: &ThreadPool, now: SimTime) -> Option<ThreadHandle>;
}
