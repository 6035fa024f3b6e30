//! # Scheduler
//!
//! The scheduler owns the thread pool, the simulated clock and the
//! "currently running" handle. It asks its [`SchedulingPolicy`] which thread
//! to run next and hands the switch to its [`ControlTransfer`].
//!
//! The policy and the transfer are injected, so one scheduler implementation
//! serves every policy, and the decision logic can be driven without real
//! stack switching.

pub mod metrics;
pub mod traits;

pub use metrics::*;
pub use traits::*;

use crate::context::{ControlTransfer, Switch, SwitchReason};
use crate::thread::{ThreadInfo, ThreadPool, ThreadSpec, ThreadState};
use crate::{ExecError, ExecResult, SchedulerConfig, SimTime, ThreadHandle};
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use spin::Mutex;

/// State guarded by the scheduler lock
///
/// The lock gives `&Scheduler` interior mutability; it is never held across
/// a control transfer.
struct RunState {
    /// All thread control blocks
    pool: ThreadPool,
    /// Thread holding the CPU
    current: ThreadHandle,
    /// Error waiting for the host once it is switched back to
    halt: Option<ExecError>,
    /// Terminated threads, in completion order
    reports: Vec<ThreadReport>,
}

/// Cooperative scheduler
pub struct Scheduler {
    /// Configuration
    config: SchedulerConfig,
    /// Selection policy
    policy: Box<dyn SchedulingPolicy>,
    /// Control-transfer primitive
    transfer: Box<dyn ControlTransfer>,
    /// Pool and current thread
    run: Mutex<RunState>,
    /// Simulated clock
    clock: AtomicU64,
    /// Statistics
    metrics: SchedulerMetrics,
}

impl Scheduler {
    /// Create a scheduler
    ///
    /// The calling thread becomes slot 0, RUNNING, so the first transfer has
    /// somewhere to save its context.
    pub fn new<P, T>(config: SchedulerConfig, policy: P, transfer: T) -> ExecResult<Self>
    where
        P: SchedulingPolicy + 'static,
        T: ControlTransfer + 'static,
    {
        let pool = ThreadPool::new(&config)?;

        log::info!(
            "uthread scheduler: policy {} v{}, transfer {}, {} slots of {} bytes",
            policy.name(),
            policy.version(),
            transfer.name(),
            config.max_threads,
            config.stack_size,
        );

        Ok(Self {
            config,
            policy: Box::new(policy),
            transfer: Box::new(transfer),
            run: Mutex::new(RunState {
                pool,
                current: ThreadHandle::HOST,
                halt: None,
                reports: Vec::new(),
            }),
            clock: AtomicU64::new(0),
            metrics: SchedulerMetrics::new(),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Get the policy name
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Get the control-transfer name
    pub fn transfer_name(&self) -> &'static str {
        self.transfer.name()
    }

    /// Get scheduler metrics
    pub fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    // =========================================================================
    // Simulated Clock
    // =========================================================================

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.clock.load(Ordering::Relaxed)
    }

    /// Advance the simulated clock, returning the new time
    ///
    /// Only threads advance the clock, once their work is done. The clock
    /// saturates at `SimTime::MAX`.
    pub fn advance_clock(&self, ticks: SimTime) -> SimTime {
        let advance = |now: SimTime| Some(now.saturating_add(ticks));
        let before = self.clock
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, advance)
            .unwrap_or_else(|now| now);
        let now = before.saturating_add(ticks);
        log::trace!("clock advanced by {} to {}", ticks, now);
        now
    }

    /// Block the host process for `ticks` simulated ticks of work
    pub fn delay(&self, ticks: SimTime) {
        if self.config.tick_delay.is_zero() {
            return;
        }
        for _ in 0..ticks {
            std::thread::sleep(self.config.tick_delay);
        }
    }

    // =========================================================================
    // Thread Lifecycle
    // =========================================================================

    /// Create a thread in the first FREE slot (FREE -> RUNNABLE)
    ///
    /// The policy may refuse the parameters first. Refusals are logged and
    /// returned, never dropped.
    pub fn spawn<F>(&self, spec: ThreadSpec, entry: F) -> ExecResult<ThreadHandle>
    where
        F: FnOnce(&Scheduler) + Send + 'static,
    {
        if let Err(err) = self.policy.admit(&spec) {
            log::warn!("thread {} refused by {}: {}", spec.id, self.policy.name(), err);
            self.metrics.record_rejection();
            return Err(err);
        }

        let created = self.run.lock().pool.create(spec, entry, self.transfer.entry_point());
        match created {
            Ok(handle) => {
                self.metrics.record_creation();
                log::info!(
                    "created thread {} in slot {} (enter {}, run {})",
                    spec.id, handle, spec.enter_time, spec.run_time
                );
                Ok(handle)
            }
            Err(err) => {
                log::warn!("cannot create thread {}: {}", spec.id, err);
                self.metrics.record_rejection();
                Err(err)
            }
        }
    }

    /// Give up the CPU and let the policy pick the next thread
    ///
    /// A worker still RUNNING goes back to RUNNABLE and competes with the
    /// others. If the policy picks the caller again, nothing is switched.
    /// Otherwise the caller is suspended here until it is selected again.
    ///
    /// When nothing is eligible the result is
    /// [`ExecError::NoRunnableThread`]: returned directly to the host, or
    /// delivered to the host by switching back to it when a worker runs out
    /// of successors.
    pub fn run(&self) -> ExecResult<()> {
        let switch = {
            let mut guard = self.run.lock();
            self.prepare_switch(&mut guard)?
        };

        let Some(switch) = switch else {
            return Ok(());
        };

        self.metrics.record_switch(switch.reason);
        // SAFETY: both contexts live in the pool, which outlives this call,
        // and the scheduler lock was released above
        unsafe { self.transfer.transfer(&switch) };

        // Resumed: pick up a halt left for us by the last thread
        match self.run.lock().halt.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Voluntarily give up the CPU, staying RUNNABLE
    pub fn yield_now(&self) -> ExecResult<()> {
        self.metrics.record_yield();
        log::debug!("thread in slot {} yields at t={}", self.current().handle, self.now());
        self.run()
    }

    /// Terminate the running thread (RUNNING -> FREE) and schedule the next
    ///
    /// With a real control transfer this does not return: a FREE slot is
    /// never resumed. The host cannot exit.
    pub fn exit_current(&self) -> ExecResult<()> {
        {
            let mut guard = self.run.lock();
            let run = &mut *guard;
            let now = self.now();
            let current = run.current;
            if current.is_host() {
                return Err(ExecError::InvalidState {
                    from: ThreadState::Running,
                    to: ThreadState::Free,
                });
            }

            let tcb = &mut run.pool[current];
            tcb.transition(ThreadState::Free)?;
            let report = ThreadReport {
                id: tcb.id(),
                handle: current,
                enter_time: tcb.enter_time(),
                run_time: tcb.run_time(),
                first_dispatch: tcb.first_dispatch().unwrap_or(now),
                completed_at: now,
            };
            log::info!(
                "thread {} finished at t={} (waited {}, turnaround {})",
                report.id, now, report.waiting_time(), report.turnaround_time()
            );
            run.reports.push(report);
        }

        self.metrics.record_exit();
        self.run()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The thread holding the CPU
    pub fn current(&self) -> ThreadInfo {
        let run = self.run.lock();
        run.pool[run.current].info()
    }

    /// Look up a thread by handle
    pub fn thread(&self, handle: ThreadHandle) -> ExecResult<ThreadInfo> {
        self.run.lock().pool.get(handle).map(|t| t.info())
    }

    /// Snapshot of every slot
    pub fn threads(&self) -> Vec<ThreadInfo> {
        self.run.lock().pool.iter().map(|t| t.info()).collect()
    }

    /// Inspect the pool under the scheduler lock
    ///
    /// `f` must not call back into the scheduler.
    pub fn with_pool<R>(&self, f: impl FnOnce(&ThreadPool) -> R) -> R {
        f(&self.run.lock().pool)
    }

    /// Reports of terminated threads, in completion order
    pub fn reports(&self) -> Vec<ThreadReport> {
        self.run.lock().reports.clone()
    }

    /// Check if every created thread has terminated
    pub fn is_drained(&self) -> bool {
        self.run.lock().pool.live_count() == 0
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply one scheduling decision to the pool
    ///
    /// Returns the switch to perform, or `None` when the caller keeps the CPU.
    /// A running worker is demoted to RUNNABLE so it competes with the
    /// others; if the decision fails it is restored to RUNNING.
    fn prepare_switch(&self, run: &mut RunState) -> ExecResult<Option<Switch>> {
        let from = run.current;

        let (reason, demoted) = match run.pool[from].state() {
            ThreadState::Running if from.is_host() => (SwitchReason::Park, false),
            ThreadState::Running => {
                run.pool[from].transition(ThreadState::Runnable)?;
                (SwitchReason::Yield, true)
            }
            ThreadState::Runnable => (SwitchReason::Yield, false),
            ThreadState::Free => (SwitchReason::Exit, false),
            ThreadState::Parked => {
                return Err(ExecError::InvalidState {
                    from: ThreadState::Parked,
                    to: ThreadState::Running,
                });
            }
        };

        let decision = self.decide(run, from, reason);
        if decision.is_err() && demoted && run.current == from && run.pool[from].state().is_runnable() {
            log::debug!("thread in slot {} keeps the CPU after a failed decision", from);
            run.pool[from].transition(ThreadState::Running)?;
        }
        decision
    }

    /// Ask the policy, validate its pick, then commit the switch
    ///
    /// The pool is left untouched until the pick has been validated.
    fn decide(&self, run: &mut RunState, from: ThreadHandle, reason: SwitchReason) -> ExecResult<Option<Switch>> {
        let now = self.now();
        let Some(to) = self.policy.select(&run.pool, now) else {
            return self.prepare_halt(run, from, now);
        };

        let next = run.pool.get(to)?;
        if !next.is_eligible(now) {
            log::error!(
                "{} picked thread {} in slot {} ({:?}, enter {}) at t={}",
                self.policy.name(), next.id(), to, next.state(), next.enter_time(), now
            );
            return Err(ExecError::InvalidState {
                from: next.state(),
                to: ThreadState::Running,
            });
        }

        if to == from {
            run.pool[to].dispatch(now)?;
            log::debug!("thread {} keeps the CPU at t={}", run.pool[to].id(), now);
            return Ok(None);
        }

        let first_run = run.pool[to].dispatch(now)?;
        if reason == SwitchReason::Park {
            run.pool[from].transition(ThreadState::Parked)?;
        }
        run.current = to;

        let next = &run.pool[to];
        log::info!(
            "switch to thread {} in slot {} at t={} (enter {}, run {})",
            next.id(), to, now, next.enter_time(), next.run_time()
        );

        // Both handles were checked above
        let (save, load) = run.pool.context_pair(from, to)?;
        Ok(Some(Switch {
            from,
            to,
            reason,
            first_run,
            save,
            load,
            scheduler: self,
        }))
    }

    /// Nothing is eligible: report to the host, switching back to it if needed
    fn prepare_halt(&self, run: &mut RunState, from: ThreadHandle, now: SimTime) -> ExecResult<Option<Switch>> {
        self.metrics.record_halt();
        log::warn!(
            "no runnable threads at t={} ({} created threads not finished)",
            now,
            run.pool.live_count()
        );

        let host = ThreadHandle::HOST;
        if from.is_host() || run.pool[host].state() != ThreadState::Parked {
            return Err(ExecError::NoRunnableThread);
        }

        run.pool[host].transition(ThreadState::Running)?;
        run.current = host;
        run.halt = Some(ExecError::NoRunnableThread);

        let (save, load) = run.pool.context_pair(from, host)?;
        Ok(Some(Switch {
            from,
            to: host,
            reason: SwitchReason::Halt,
            first_run: false,
            save,
            load,
            scheduler: self,
        }))
    }

    /// Run the current thread's body, then terminate it
    ///
    /// Entered from the native trampoline on the thread's own stack.
    #[cfg(all(
        feature = "native",
        any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "riscv64")
    ))]
    pub(crate) fn launch_current(&self) -> ! {
        let entry = {
            let mut guard = self.run.lock();
            let current = guard.current;
            guard.pool[current].take_entry()
        };

        match entry {
            Some(entry) => entry(self),
            None => log::error!("thread in slot {} launched without a body", self.current().handle),
        }

        if let Err(err) = self.exit_current() {
            log::error!("thread exit failed: {}", err);
        }
        // A FREE slot is never selected again
        log::error!("terminated thread was resumed");
        std::process::abort()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("policy", &self.policy.name())
            .field("transfer", &self.transfer.name())
            .field("now", &self.now())
            .field("config", &self.config)
            .finish()
    }
}
