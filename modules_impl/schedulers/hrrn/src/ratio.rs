//! # Response Ratio
//!
//! `(waited + run_time) / run_time` is `1 + waited / run_time`, so two ratios
//! order the same way as their `waited / run_time` fractions. Those are
//! compared by cross-multiplying in `u128`, which cannot overflow for `u64`
//! operands.

use core::cmp::Ordering;
use core::fmt;
use helix_uthread::{SimTime, Tcb};

/// Exact response ratio of a thread
#[derive(Debug, Clone, Copy)]
pub struct ResponseRatio {
    /// Time spent eligible without running
    waited: SimTime,
    /// Declared run time, never zero
    run_time: SimTime,
}

impl ResponseRatio {
    /// Ratio for a thread that waited `waited` ticks; `None` for a zero run time
    pub fn new(waited: SimTime, run_time: SimTime) -> Option<Self> {
        if run_time == 0 {
            return None;
        }
        Some(Self { waited, run_time })
    }

    /// Ratio of a pooled thread at time `now`
    pub fn of(tcb: &Tcb, now: SimTime) -> Option<Self> {
        Self::new(now.saturating_sub(tcb.enter_time()), tcb.run_time())
    }

    /// Waiting time the ratio was computed from
    pub fn waited(&self) -> SimTime {
        self.waited
    }

    /// Approximate value, for display
    pub fn as_f64(&self) -> f64 {
        (self.waited as f64 + self.run_time as f64) / self.run_time as f64
    }
}

impl PartialEq for ResponseRatio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ResponseRatio {}

impl PartialOrd for ResponseRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResponseRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.waited) * u128::from(other.run_time);
        let rhs = u128::from(other.waited) * u128::from(self.run_time);
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for ResponseRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}
