//! # HRRN Scheduler Module
//!
//! Highest-response-ratio-next selection for Helix uthreads.
//!
//! ## Features
//! - Response ratio `(waited + run_time) / run_time`, compared exactly
//! - First thread in pool order wins equal ratios
//! - Zero run times refused when the thread is created
//!
//! ## Usage
//!
//! The policy is handed to [`helix_uthread::Scheduler::new`]. Long waits and
//! short jobs both raise the ratio, so late short arrivals are not starved.

#![deny(unsafe_op_in_unsafe_fn)]

mod ratio;
mod scheduler;

pub use ratio::ResponseRatio;
pub use scheduler::HrrnScheduler;

// =============================================================================
// Module Entry Point
// =============================================================================

/// Create the policy
pub fn create_policy() -> HrrnScheduler {
    HrrnScheduler::new()
}
