//! # Workload
//!
//! Built-in thread sets, the demo thread body and the end-of-run summary.

use anyhow::{bail, Context as _};
use core::fmt;
use helix_uthread::{ExecError, Scheduler, SimTime, ThreadReport, ThreadSpec};

/// FCFS workload: ids are arrival sequence numbers, two threads share id 1
pub const FCFS_WORKLOAD: [ThreadSpec; 6] = [
    ThreadSpec::new(1, 0, 20),
    ThreadSpec::new(1, 0, 10),
    ThreadSpec::new(3, 5, 15),
    ThreadSpec::new(4, 10, 5),
    ThreadSpec::new(5, 15, 30),
    ThreadSpec::new(6, 20, 10),
];

/// HRRN workload: same timings with distinct ids
pub const HRRN_WORKLOAD: [ThreadSpec; 6] = [
    ThreadSpec::new(1, 0, 20),
    ThreadSpec::new(2, 0, 10),
    ThreadSpec::new(3, 5, 15),
    ThreadSpec::new(4, 10, 5),
    ThreadSpec::new(5, 15, 30),
    ThreadSpec::new(6, 20, 10),
];

/// Demo thread: report in, do `run_time` ticks of work, advance the clock
fn thread_body(sched: &Scheduler) {
    let me = sched.current();
    println!("thread {} starts at t={}", me.id, sched.now());
    sched.delay(me.run_time);
    let now = sched.advance_clock(me.run_time);
    log::debug!("thread {} done, clock at {}", me.id, now);
}

/// Create every thread of the workload, in order
pub fn spawn_all(sched: &Scheduler, specs: &[ThreadSpec]) -> anyhow::Result<()> {
    for spec in specs {
        sched.spawn(*spec, thread_body).with_context(|| {
            format!(
                "cannot create thread {} (enter {}, run {})",
                spec.id, spec.enter_time, spec.run_time
            )
        })?;
    }
    Ok(())
}

/// Hand the CPU to the workload until nothing is left to run
pub fn drive(sched: &Scheduler) -> anyhow::Result<Summary> {
    match sched.run() {
        Err(ExecError::NoRunnableThread) => {}
        Err(err) => return Err(err).context("scheduler failed"),
        Ok(()) => bail!("scheduler returned to the host with work still pending"),
    }

    Ok(Summary {
        reports: sched.reports(),
        unfinished: sched.with_pool(|pool| pool.live_count()),
        end_time: sched.now(),
    })
}

// =============================================================================
// Summary
// =============================================================================

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct Summary {
    /// Finished threads, in completion order
    pub reports: Vec<ThreadReport>,
    /// Threads still waiting when the scheduler halted
    pub unfinished: usize,
    /// Clock at the halt
    pub end_time: SimTime,
}

impl Summary {
    /// Check if every thread finished
    pub fn is_drained(&self) -> bool {
        self.unfinished == 0
    }

    /// Average time between arrival and first dispatch
    pub fn average_waiting(&self) -> f64 {
        self.average(ThreadReport::waiting_time)
    }

    /// Average time between arrival and completion
    pub fn average_turnaround(&self) -> f64 {
        self.average(ThreadReport::turnaround_time)
    }

    fn average(&self, metric: fn(&ThreadReport) -> SimTime) -> f64 {
        if self.reports.is_empty() {
            return 0.0;
        }
        let total: SimTime = self.reports.iter().map(metric).sum();
        total as f64 / self.reports.len() as f64
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>4} {:>6} {:>5} {:>6} {:>7} {:>8} {:>11}", "id", "enter", "run", "start", "finish", "waiting", "turnaround")?;
        for r in &self.reports {
            writeln!(
                f,
                "{:>4} {:>6} {:>5} {:>6} {:>7} {:>8} {:>11}",
                r.id,
                r.enter_time,
                r.run_time,
                r.first_dispatch,
                r.completed_at,
                r.waiting_time(),
                r.turnaround_time()
            )?;
        }
        writeln!(
            f,
            "{} finished, {} unfinished at t={}; average waiting {:.2}, average turnaround {:.2}",
            self.reports.len(),
            self.unfinished,
            self.end_time,
            self.average_waiting(),
            self.average_turnaround()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_scheduler_fcfs::{create_policy_with_config, FcfsConfig};
    use helix_uthread::{NativeTransfer, SchedulerConfig};

    fn fcfs(config: FcfsConfig) -> Scheduler {
        let policy = create_policy_with_config(config);
        Scheduler::new(SchedulerConfig::new(), policy, NativeTransfer::new()).unwrap()
    }

    fn hrrn() -> Scheduler {
        let policy = helix_scheduler_hrrn::create_policy();
        Scheduler::new(SchedulerConfig::new(), policy, NativeTransfer::new()).unwrap()
    }

    fn order(summary: &Summary) -> Vec<(u32, SimTime)> {
        summary.reports.iter().map(|r| (r.id.as_u32(), r.run_time)).collect()
    }

    #[test]
    fn test_fcfs_workload() {
        let sched = fcfs(FcfsConfig::default());
        spawn_all(&sched, &FCFS_WORKLOAD).unwrap();
        let summary = drive(&sched).unwrap();

        assert!(summary.is_drained());
        assert_eq!(order(&summary), vec![(1, 10), (1, 20), (3, 15), (4, 5), (5, 30), (6, 10)]);
        assert_eq!(summary.end_time, 90);
        assert_eq!(summary.average_waiting(), 27.5);
        assert_eq!(summary.average_turnaround(), 42.5);
        assert_eq!(sched.metrics().dispatches(), 6);
    }

    #[test]
    fn test_fcfs_workload_without_tie_break() {
        let sched = fcfs(FcfsConfig::arrival_only());
        spawn_all(&sched, &FCFS_WORKLOAD).unwrap();
        let summary = drive(&sched).unwrap();
        assert_eq!(order(&summary)[..2], [(1, 20), (1, 10)]);
    }

    #[test]
    fn test_hrrn_workload() {
        let sched = hrrn();
        spawn_all(&sched, &HRRN_WORKLOAD).unwrap();
        let summary = drive(&sched).unwrap();

        let ids: Vec<u32> = order(&summary).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2, 4, 3, 6, 5]);
        assert!(summary.is_drained());
        assert_eq!(summary.end_time, 90);
    }

    #[test]
    fn test_pool_full_is_an_error() {
        let sched = hrrn();
        let mut specs = HRRN_WORKLOAD.to_vec();
        specs.push(ThreadSpec::new(7, 25, 5));

        let err = spawn_all(&sched, &specs).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExecError>(),
            Some(&ExecError::PoolFull { capacity: 6 })
        );
    }

    #[test]
    fn test_zero_run_time_refused_under_hrrn() {
        let sched = hrrn();
        assert!(spawn_all(&sched, &[ThreadSpec::new(1, 0, 0)]).is_err());
    }

    #[test]
    fn test_starved_thread_left_unfinished() {
        let sched = fcfs(FcfsConfig::default());
        spawn_all(&sched, &[ThreadSpec::new(1, 0, 4), ThreadSpec::new(2, 100, 4)]).unwrap();
        let summary = drive(&sched).unwrap();

        assert!(!summary.is_drained());
        assert_eq!(summary.unfinished, 1);
        assert_eq!(summary.end_time, 4);
        assert!(summary.to_string().contains("1 finished, 1 unfinished at t=4"));
    }
}
