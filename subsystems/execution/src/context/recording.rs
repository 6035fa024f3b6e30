//! # Recording Transfer
//!
//! A control transfer that only writes down what it was asked to do.
//! Lets the scheduler's decisions be driven step by step from a single
//! stack: after each `run()` the caller plays the part of the thread that
//! was just selected.

use super::{ControlTransfer, Switch, SwitchReason};
use crate::ThreadHandle;
use spin::Mutex;
use std::sync::Arc;

/// A recorded switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchRecord {
    /// Thread that gave up the CPU
    pub from: ThreadHandle,
    /// Thread that received it
    pub to: ThreadHandle,
    /// Why
    pub reason: SwitchReason,
    /// First run of `to`
    pub first_run: bool,
}

/// Recording transfer
///
/// Clones share the same log, so a test can keep one clone and hand the
/// other to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransfer {
    log: Arc<Mutex<Vec<SwitchRecord>>>,
}

impl RecordingTransfer {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All switches so far, oldest first
    pub fn records(&self) -> Vec<SwitchRecord> {
        self.log.lock().clone()
    }

    /// Number of switches so far
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Transfers into pooled threads (everything but the halt)
    pub fn dispatches(&self) -> usize {
        self.log.lock()
            .iter()
            .filter(|r| r.reason != SwitchReason::Halt)
            .count()
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl ControlTransfer for RecordingTransfer {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn entry_point(&self) -> usize {
        0
    }

    unsafe fn transfer(&self, switch: &Switch) {
        log::trace!("recorded switch {} -> {} ({:?})", switch.from, switch.to, switch.reason);
        self.log.lock().push(SwitchRecord {
            from: switch.from,
            to: switch.to,
            reason: switch.reason,
            first_run: switch.first_run,
        });
    }
}
