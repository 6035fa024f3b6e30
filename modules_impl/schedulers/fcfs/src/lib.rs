//! # FCFS Scheduler Module
//!
//! First-come-first-served selection for Helix uthreads.
//!
//! ## Features
//! - Smallest thread id first (the id is the arrival sequence)
//! - Shortest declared run time among threads that share an id
//! - Lowest slot on exact ties, so the choice depends only on the pool
//!
//! ## Usage
//!
//! The policy is handed to [`helix_uthread::Scheduler::new`], which consults
//! it every time the CPU is given up.

#![deny(unsafe_op_in_unsafe_fn)]

mod config;
mod scheduler;

pub use config::FcfsConfig;
pub use scheduler::FcfsScheduler;

// =============================================================================
// Module Entry Point
// =============================================================================

/// Create the policy with its default configuration
pub fn create_policy() -> FcfsScheduler {
    FcfsScheduler::new(FcfsConfig::default())
}

/// Create the policy with a custom configuration
pub fn create_policy_with_config(config: FcfsConfig) -> FcfsScheduler {
    FcfsScheduler::new(config)
}
