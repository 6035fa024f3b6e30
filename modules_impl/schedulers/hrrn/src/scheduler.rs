//! # HRRN Scheduler Implementation

use crate::ResponseRatio;
use helix_uthread::{
    ExecError, ExecResult, SchedulingPolicy, SimTime, Tcb, ThreadHandle, ThreadPool, ThreadSpec,
};

/// Highest-response-ratio-next scheduler
#[derive(Debug, Clone, Copy, Default)]
pub struct HrrnScheduler;

impl HrrnScheduler {
    /// Create a new scheduler
    pub const fn new() -> Self {
        Self
    }
}

impl SchedulingPolicy for HrrnScheduler {
    fn name(&self) -> &'static str {
        "HRRN"
    }

    fn admit(&self, spec: &ThreadSpec) -> ExecResult<()> {
        if spec.run_time == 0 {
            return Err(ExecError::ZeroRunTime { id: spec.id });
        }
        Ok(())
    }

    fn select(&self, pool: &ThreadPool, now: SimTime) -> Option<ThreadHandle> {
        let mut best: Option<(&Tcb, ResponseRatio)> = None;

        for candidate in pool.eligible(now) {
            let Some(ratio) = ResponseRatio::of(candidate, now) else {
                // Only reachable by bypassing admission
                log::warn!("[hrrn] thread {} has a zero run time, skipped", candidate.id());
                continue;
            };
            log::trace!(
                "[hrrn] t={}: thread {} waited {}, ratio {}",
                now,
                candidate.id(),
                ratio.waited(),
                ratio
            );

            // Strictly greater: the first seen keeps an exact tie
            if best.is_none_or(|(_, top)| ratio > top) {
                best = Some((candidate, ratio));
            }
        }

        let (tcb, ratio) = best?;
        log::debug!(
            "[hrrn] t={}: thread {} in slot {} selected (ratio {})",
            now,
            tcb.id(),
            tcb.handle(),
            ratio
        );
        Some(tcb.handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_policy;
    use helix_uthread::{RecordingTransfer, Scheduler, SchedulerConfig, ThreadId};
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

    // =========================================================================
    // Selection
    // =========================================================================

    #[test]
    fn test_highest_ratio_selected() {
        // At t=20: 3.0 against about 1.17
        let forward = pool(&[(1, 0, 10), (2, 15, 30)]);
        assert_eq!(create_policy().select(&forward, 20), Some(ThreadHandle::new(1)));

        let backward = pool(&[(2, 15, 30), (1, 0, 10)]);
        assert_eq!(create_policy().select(&backward, 20), Some(ThreadHandle::new(2)));
    }

    #[test]
    fn test_equal_ratio_first_seen_wins() {
        // Both 3.0 at t=20
        let forward = pool(&[(1, 0, 10), (2, 10, 5)]);
        assert_eq!(create_policy().select(&forward, 20), Some(ThreadHandle::new(1)));

        let backward = pool(&[(2, 10, 5), (1, 0, 10)]);
        assert_eq!(create_policy().select(&backward, 20), Some(ThreadHandle::new(1)));
    }

    #[test]
    fn test_not_yet_arrived_ignored() {
        let pool = pool(&[(1, 30, 1), (2, 0, 50)]);
        assert_eq!(create_policy().select(&pool, 20), Some(ThreadHandle::new(2)));
        assert_eq!(create_policy().select(&pool, 0), Some(ThreadHandle::new(2)));
    }

    #[test]
    fn test_zero_run_time_skipped() {
        let mixed = pool(&[(1, 0, 0), (2, 0, 4)]);
        assert_eq!(create_policy().select(&mixed, 3), Some(ThreadHandle::new(2)));
        assert_eq!(create_policy().select(&pool(&[(1, 0, 0)]), 3), None);
    }

    // =========================================================================
    // Admission
    // =========================================================================

    #[test]
    fn test_zero_run_time_refused() {
        let policy = create_policy();
        assert_eq!(
            policy.admit(&ThreadSpec::new(9, 0, 0)),
            Err(ExecError::ZeroRunTime { id: ThreadId::new(9) })
        );
        assert!(policy.admit(&ThreadSpec::new(9, 0, 1)).is_ok());
    }

    #[test]
    fn test_spawn_refused_through_scheduler() {
        let sched = Scheduler::new(SchedulerConfig::testing(), create_policy(), RecordingTransfer::new()).unwrap();
        assert!(sched.spawn(ThreadSpec::new(1, 0, 0), |_: &Scheduler| {}).is_err());
        assert!(sched.is_drained());
        assert_eq!(sched.metrics().rejected(), 1);
    }

    // =========================================================================
    // Full Workload
    // =========================================================================

    #[test]
    fn test_reference_workload_order() {
        let sched = Scheduler::new(SchedulerConfig::testing(), create_policy(), RecordingTransfer::new()).unwrap();
        for (id, enter, run) in [(1, 0, 20), (2, 0, 10), (3, 5, 15), (4, 10, 5), (5, 15, 30), (6, 20, 10)] {
            sched.spawn(ThreadSpec::new(id, enter, run), |_: &Scheduler| {}).unwrap();
        }

        let mut result = sched.run();
        while result.is_ok() {
            let me = sched.current();
            sched.advance_clock(me.run_time);
            result = sched.exit_current();
        }

        assert_eq!(result, Err(ExecError::NoRunnableThread));
        let order: Vec<u32> = sched.reports().iter().map(|r| r.id.as_u32()).collect();
        assert_eq!(order, vec![1, 2, 4, 3, 6, 5]);
        assert_eq!(sched.now(), 90);
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    proptest! {
        #[test]
        fn prop_first_highest_ratio(
            specs in proptest::collection::vec((0u32..9, 0u64..20, 1u64..12), 0..7),
            now in 0u64..30,
        ) {
            let pool = pool(&specs);
            let chosen = create_policy().select(&pool, now);

            let top = pool.eligible(now).filter_map(|t| ResponseRatio::of(t, now)).max();
            let first = pool.eligible(now)
                .find(|t| ResponseRatio::of(t, now) == top)
                .map(|t| t.handle());
            prop_assert_eq!(chosen, first);

            if let Some(handle) = chosen {
                prop_assert!(pool[handle].is_eligible(now));
            }
        }
    }
}
