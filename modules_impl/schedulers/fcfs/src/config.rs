//! # FCFS Scheduler Configuration

/// Configuration for the FCFS policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FcfsConfig {
    /// Among threads sharing the smallest id, prefer the shorter run time
    pub shortest_run_tie_break: bool,
}

impl FcfsConfig {
    /// Create default configuration (tie-break enabled)
    pub const fn new() -> Self {
        Self {
            shortest_run_tie_break: true,
        }
    }

    /// Pure arrival order: equal ids resolve to the lowest slot
    pub const fn arrival_only() -> Self {
        Self {
            shortest_run_tie_break: false,
        }
    }
}

impl Default for FcfsConfig {
    fn default() -> Self {
        Self::new()
    }
}
