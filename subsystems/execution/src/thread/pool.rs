//! # Thread Pool
//!
//! Fixed-capacity arena of thread control blocks. Slot 0 always belongs to
//! the host; every other slot is handed out by [`ThreadPool::create`].

use super::{Tcb, ThreadEntry, ThreadSpec, ThreadState};
use crate::context::Context;
use crate::scheduler::Scheduler;
use crate::{ExecError, ExecResult, SchedulerConfig, SimTime, ThreadHandle};
use core::ops::{Index, IndexMut};

/// Thread pool
#[derive(Debug)]
pub struct ThreadPool {
    /// All slots; the boxed slice is never reallocated
    slots: Box<[Tcb]>,
}

impl ThreadPool {
    /// Create a pool with the host registered as RUNNING in slot 0
    pub fn new(config: &SchedulerConfig) -> ExecResult<Self> {
        config.validate()?;

        let slots = (0..config.max_threads)
            .map(|slot| match slot {
                0 => Tcb::host(),
                _ => Tcb::new(ThreadHandle::new(slot), config.stack_size),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self { slots })
    }

    /// Total number of slots, host included
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots available to created threads
    pub fn worker_capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Claim the first FREE slot for a new thread
    ///
    /// `resume` is the address a never-run thread starts at; it is supplied
    /// by the control-transfer implementation. Only the claimed slot is
    /// touched.
    pub fn create<F>(&mut self, spec: ThreadSpec, entry: F, resume: usize) -> ExecResult<ThreadHandle>
    where
        F: FnOnce(&Scheduler) + Send + 'static,
    {
        let entry: ThreadEntry = Box::new(entry);
        let capacity = self.worker_capacity();
        let tcb = self.slots.iter_mut()
            .find(|t| t.state().is_free())
            .ok_or(ExecError::PoolFull { capacity })?;

        tcb.launch(spec, entry, resume)?;
        Ok(tcb.handle())
    }

    /// Get a TCB by handle
    pub fn get(&self, handle: ThreadHandle) -> ExecResult<&Tcb> {
        self.slots.get(handle.index())
            .ok_or(ExecError::InvalidHandle(handle))
    }

    /// Iterate over all slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &Tcb> {
        self.slots.iter()
    }

    /// Iterate over RUNNABLE threads whose arrival time has passed, in index order
    pub fn eligible(&self, now: SimTime) -> impl Iterator<Item = &Tcb> {
        self.slots.iter().filter(move |t| t.is_eligible(now))
    }

    /// Count slots in a state
    pub fn count_in(&self, state: ThreadState) -> usize {
        self.slots.iter().filter(|t| t.state() == state).count()
    }

    /// Created threads that have not terminated yet
    pub fn live_count(&self) -> usize {
        self.slots.iter()
            .filter(|t| !t.is_host())
            .filter(|t| t.state().is_runnable() || t.state().is_running())
            .count()
    }

    /// Context pointers for a transfer between two distinct slots
    ///
    /// Both pointers come from the same base so neither invalidates the
    /// other. They stay valid for the life of the pool.
    pub(crate) fn context_pair(
        &mut self,
        from: ThreadHandle,
        to: ThreadHandle,
    ) -> ExecResult<(*mut Context, *const Context)> {
        let len = self.slots.len();
        for handle in [from, to] {
            if handle.index() >= len {
                return Err(ExecError::InvalidHandle(handle));
            }
        }

        let base = self.slots.as_mut_ptr();
        // SAFETY: both indices were bounds-checked above
        unsafe {
            let save = core::ptr::addr_of_mut!((*base.add(from.index())).context);
            let load = core::ptr::addr_of!((*base.add(to.index())).context);
            Ok((save, load))
        }
    }
}

impl Index<ThreadHandle> for ThreadPool {
    type Output = Tcb;

    fn index(&self, handle: ThreadHandle) -> &Tcb {
        &self.slots[handle.index()]
    }
}

impl IndexMut<ThreadHandle> for ThreadPool {
    fn index_mut(&mut self, handle: ThreadHandle) -> &mut Tcb {
        &mut self.slots[handle.index()]
    }
}
