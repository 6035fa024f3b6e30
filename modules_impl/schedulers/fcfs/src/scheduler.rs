//! # FCFS Scheduler Implementation

use crate::FcfsConfig;
use core::cmp::Ordering;
use helix_uthread::{SchedulingPolicy, SimTime, Tcb, ThreadHandle, ThreadPool};

/// First-come-first-served scheduler
#[derive(Debug, Clone)]
pub struct FcfsScheduler {
    /// Configuration
    config: FcfsConfig,
}

impl FcfsScheduler {
    /// Create a new scheduler
    pub fn new(config: FcfsConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &FcfsConfig {
        &self.config
    }

    /// Check if `candidate` must replace the best thread seen so far
    ///
    /// Only a strictly better candidate wins, so exact ties stay with the
    /// lower slot. Enter time is not compared: with equal id and run time the
    /// lower slot wins even when a higher slot arrived earlier. A scan that
    /// let equal candidates replace the best would pick the highest slot.
    fn beats(&self, candidate: &Tcb, best: &Tcb) -> bool {
        match candidate.id().cmp(&best.id()) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal if self.config.shortest_run_tie_break => {
                let shorter = candidate.run_time() < best.run_time();
                if shorter {
                    log::debug!(
                        "[fcfs] thread {}: slot {} (run {}) is shorter than slot {} (run {}), selected",
                        candidate.id(),
                        candidate.handle(),
                        candidate.run_time(),
                        best.handle(),
                        best.run_time(),
                    );
                }
                shorter
            }
            Ordering::Equal => false,
        }
    }
}

impl Default for FcfsScheduler {
    fn default() -> Self {
        Self::new(FcfsConfig::default())
    }
}

impl SchedulingPolicy for FcfsScheduler {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn select(&self, pool: &ThreadPool, now: SimTime) -> Option<ThreadHandle> {
        let mut best: Option<&Tcb> = None;

        for candidate in pool.eligible(now) {
            best = match best {
                Some(current) if !self.beats(candidate, current) => Some(current),
                _ => Some(candidate),
            };
        }

        if let Some(tcb) = best {
            log::debug!(
                "[fcfs] t={}: thread {} in slot {} selected",
                now,
                tcb.id(),
                tcb.handle()
            );
        }
        best.map(Tcb::handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_policy;
    use helix_uthread::{
        ExecError, RecordingTransfer, Scheduler, SchedulerConfig, ThreadSpec,
    };
    use proptest::prelude::*;

    fn pool(specs: &[(u32, SimTime, SimTime)]) -> ThreadPool {
        let config = SchedulerConfig::testing().with_max_threads((specs.len() + 1).max(2));
        let mut pool = ThreadPool::new(&config).unwrap();
        for &(id, enter, run) in specs {
            pool.create(ThreadSpec::new(id, enter, run), |_: &Scheduler| {}, 0)
                .unwrap();
        }
        pool
    }

    /// Run every thread to completion; returns (id, run_time) in completion order
    fn drain(policy: FcfsScheduler, specs: &[(u32, SimTime, SimTime)]) -> (Vec<(u32, SimTime)>, SimTime) {
        let sched = Scheduler::new(SchedulerConfig::testing(), policy, RecordingTransfer::new()).unwrap();
        for &(id, enter, run) in specs {
            sched.spawn(ThreadSpec::new(id, enter, run), |_: &Scheduler| {}).unwrap();
        }

        let mut result = sched.run();
        while result.is_ok() {
            let me = sched.current();
            sched.advance_clock(me.run_time);
            result = sched.exit_current();
        }
        assert_eq!(result, Err(ExecError::NoRunnableThread));
        assert!(sched.is_drained());

        let order = sched.reports().iter().map(|r| (r.id.as_u32(), r.run_time)).collect();
        (order, sched.now())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    #[test]
    fn test_shorter_run_wins_id_tie() {
        let pool = pool(&[(1, 0, 20), (1, 0, 10), (3, 5, 15)]);
        assert_eq!(create_policy().select(&pool, 5), Some(ThreadHandle::new(2)));
    }

    #[test]
    fn test_tie_break_independent_of_slot_order() {
        let pool = pool(&[(3, 5, 15), (1, 0, 10), (1, 0, 20)]);
        assert_eq!(create_policy().select(&pool, 5), Some(ThreadHandle::new(2)));
    }

    #[test]
    fn test_arrival_only_takes_lowest_slot() {
        let pool = pool(&[(1, 0, 20), (1, 0, 10)]);
        let policy = FcfsScheduler::new(FcfsConfig::arrival_only());
        assert_eq!(policy.select(&pool, 0), Some(ThreadHandle::new(1)));
    }

    #[test]
    fn test_exact_tie_takes_lowest_slot() {
        let pool = pool(&[(2, 0, 7), (2, 0, 7), (2, 0, 7)]);
        assert_eq!(create_policy().select(&pool, 0), Some(ThreadHandle::new(1)));
    }

    #[test]
    fn test_exact_tie_ignores_enter_time() {
        let earlier_first = pool(&[(1, 0, 10), (1, 3, 10)]);
        assert_eq!(create_policy().select(&earlier_first, 5), Some(ThreadHandle::new(1)));

        let later_first = pool(&[(1, 3, 10), (1, 0, 10)]);
        assert_eq!(create_policy().select(&later_first, 5), Some(ThreadHandle::new(1)));
    }

    #[test]
    fn test_future_arrivals_ignored() {
        let pool = pool(&[(0, 50, 1), (4, 0, 9)]);
        assert_eq!(create_policy().select(&pool, 10), Some(ThreadHandle::new(2)));
        assert_eq!(create_policy().select(&pool, 50), Some(ThreadHandle::new(1)));
    }

    #[test]
    fn test_nothing_eligible() {
        assert_eq!(create_policy().select(&pool(&[]), 0), None);
        assert_eq!(create_policy().select(&pool(&[(1, 5, 1)]), 4), None);
    }

    // =========================================================================
    // Full Workload
    // =========================================================================

    #[test]
    fn test_reference_workload_order() {
        let specs = [(1, 0, 20), (1, 0, 10), (3, 5, 15), (4, 10, 5), (5, 15, 30), (6, 20, 10)];
        let (order, end) = drain(create_policy(), &specs);
        assert_eq!(order, vec![(1, 10), (1, 20), (3, 15), (4, 5), (5, 30), (6, 10)]);
        assert_eq!(end, 90);
    }

    #[test]
    fn test_workload_without_tie_break() {
        let specs = [(1, 0, 20), (1, 0, 10), (3, 5, 15)];
        let (order, _) = drain(FcfsScheduler::new(FcfsConfig::arrival_only()), &specs);
        assert_eq!(order, vec![(1, 20), (1, 10), (3, 15)]);
    }

    // =========================================================================
    // Determinism
    // =========================================================================

    proptest! {
        #[test]
        fn prop_choice_minimal_and_order_independent(
            specs in proptest::collection::vec((0u32..4, 0u64..20, 1u64..8), 0..7),
            now in 0u64..25,
        ) {
            let policy = create_policy();
            let forward = pool(&specs);
            let reversed: Vec<_> = specs.iter().rev().copied().collect();
            let backward = pool(&reversed);

            let key = |p: &ThreadPool, h: Option<ThreadHandle>| h.map(|h| (p[h].id(), p[h].run_time()));
            let chosen = policy.select(&forward, now);
            prop_assert_eq!(key(&forward, chosen), key(&backward, policy.select(&backward, now)));

            let best = forward.eligible(now).map(|t| (t.id(), t.run_time())).min();
            prop_assert_eq!(key(&forward, chosen), best);

            let first = forward.eligible(now)
                .find(|t| Some((t.id(), t.run_time())) == best)
                .map(|t| t.handle());
            prop_assert_eq!(chosen, first);
        }
    }
}
