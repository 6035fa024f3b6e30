//! # Thread Control Block
//!
//! Core thread data structure.

use super::ThreadState;
use crate::context::Context;
use crate::scheduler::Scheduler;
use crate::{ExecError, ExecResult, SimTime, ThreadHandle, ThreadId};
use core::fmt;

/// Thread flags
pub mod flags {
    use bitflags::bitflags;

    bitflags! {
        /// Thread flags
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct TcbFlags: u32 {
            /// Slot belongs to the thread that built the scheduler
            const HOST = 1 << 0;
            /// Thread has been dispatched at least once
            const LAUNCHED = 1 << 1;
        }
    }
}

pub use flags::TcbFlags;

/// Body of a pooled thread
///
/// Called once, on the thread's own stack, the first time it is dispatched.
/// Returning from the body terminates the thread.
pub type ThreadEntry = Box<dyn FnOnce(&Scheduler) + Send + 'static>;

/// Creation parameters of a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadSpec {
    /// Caller-assigned identifier (FCFS arrival key)
    pub id: ThreadId,
    /// Clock value from which the thread is eligible
    pub enter_time: SimTime,
    /// Declared total execution time
    pub run_time: SimTime,
}

impl ThreadSpec {
    /// Create a thread spec
    pub const fn new(id: u32, enter_time: SimTime, run_time: SimTime) -> Self {
        Self {
            id: ThreadId::new(id),
            enter_time,
            run_time,
        }
    }
}

/// Copy of a TCB's scheduling fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Slot
    pub handle: ThreadHandle,
    /// Caller-assigned identifier
    pub id: ThreadId,
    /// Lifecycle state
    pub state: ThreadState,
    /// Arrival time
    pub enter_time: SimTime,
    /// Declared run time
    pub run_time: SimTime,
    /// Flags
    pub flags: TcbFlags,
}

/// Thread stack
///
/// Allocated once with the pool. The buffer never moves, so a stack top
/// written into a [`Context`] stays valid for the life of the pool.
pub struct Stack {
    buf: Box<[u8]>,
}

impl Stack {
    /// Stack alignment required by every supported ABI
    pub const ALIGN: usize = 16;

    /// Allocate a zeroed stack
    pub fn allocate(size: usize) -> Self {
        Self {
            buf: vec![0u8; size].into_boxed_slice(),
        }
    }

    /// Stack of a thread that brought its own (the host)
    pub fn borrowed() -> Self {
        Self { buf: Box::new([]) }
    }

    /// Get stack top (highest address, aligned down)
    pub fn top(&self) -> usize {
        let end = self.buf.as_ptr() as usize + self.buf.len();
        end & !(Self::ALIGN - 1)
    }

    /// Get stack base (lowest address)
    pub fn base(&self) -> usize {
        self.buf.as_ptr() as usize
    }

    /// Get stack size
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("base", &format_args!("{:#x}", self.base()))
            .field("size", &self.size())
            .finish()
    }
}

/// Thread control block
pub struct Tcb {
    handle: ThreadHandle,
    /// Saved registers; only touched by creation and control transfer
    pub(crate) context: Context,
    stack: Stack,
    state: ThreadState,
    flags: TcbFlags,
    id: ThreadId,
    enter_time: SimTime,
    run_time: SimTime,
    entry: Option<ThreadEntry>,
    first_dispatch: Option<SimTime>,
}

impl Tcb {
    /// Create a FREE slot with its own stack
    pub(crate) fn new(handle: ThreadHandle, stack_size: usize) -> Self {
        Self {
            handle,
            context: Context::empty(),
            stack: Stack::allocate(stack_size),
            state: ThreadState::Free,
            flags: TcbFlags::empty(),
            id: ThreadId::default(),
            enter_time: 0,
            run_time: 0,
            entry: None,
            first_dispatch: None,
        }
    }

    /// Create the host slot, already RUNNING on the caller's stack
    pub(crate) fn host() -> Self {
        Self {
            handle: ThreadHandle::HOST,
            context: Context::empty(),
            stack: Stack::borrowed(),
            state: ThreadState::Running,
            flags: TcbFlags::HOST | TcbFlags::LAUNCHED,
            id: ThreadId::default(),
            enter_time: 0,
            run_time: 0,
            entry: None,
            first_dispatch: Some(0),
        }
    }

    /// Get slot handle
    pub fn handle(&self) -> ThreadHandle {
        self.handle
    }

    /// Get caller-assigned ID
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Get current state
    pub fn state(&self) -> ThreadState {
        self.state
    }

    /// Get flags
    pub fn flags(&self) -> TcbFlags {
        self.flags
    }

    /// Get arrival time
    pub fn enter_time(&self) -> SimTime {
        self.enter_time
    }

    /// Get declared run time
    pub fn run_time(&self) -> SimTime {
        self.run_time
    }

    /// Clock value at the first dispatch, if any
    pub fn first_dispatch(&self) -> Option<SimTime> {
        self.first_dispatch
    }

    /// Get the thread's stack
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Check if this is the host slot
    pub fn is_host(&self) -> bool {
        self.flags.contains(TcbFlags::HOST)
    }

    /// RUNNABLE and arrived by `now`
    pub fn is_eligible(&self, now: SimTime) -> bool {
        self.state.is_runnable() && self.enter_time <= now
    }

    /// Snapshot of the scheduling fields
    pub fn info(&self) -> ThreadInfo {
        ThreadInfo {
            handle: self.handle,
            id: self.id,
            state: self.state,
            enter_time: self.enter_time,
            run_time: self.run_time,
            flags: self.flags,
        }
    }

    /// Move to `to`, rejecting transitions the state machine does not allow
    pub(crate) fn transition(&mut self, to: ThreadState) -> ExecResult<()> {
        if !self.state.can_transition(to) {
            return Err(ExecError::InvalidState { from: self.state, to });
        }
        self.state = to;
        Ok(())
    }

    /// Initialize a FREE slot for a new thread (FREE -> RUNNABLE)
    pub(crate) fn launch(&mut self, spec: ThreadSpec, entry: ThreadEntry, resume: usize) -> ExecResult<()> {
        self.transition(ThreadState::Runnable)?;
        self.context = Context::launch(self.stack.top(), resume);
        self.flags = TcbFlags::empty();
        self.id = spec.id;
        self.enter_time = spec.enter_time;
        self.run_time = spec.run_time;
        self.entry = Some(entry);
        self.first_dispatch = None;
        Ok(())
    }

    /// Select the thread (RUNNABLE -> RUNNING)
    ///
    /// Returns true when this is the thread's first dispatch.
    pub(crate) fn dispatch(&mut self, now: SimTime) -> ExecResult<bool> {
        self.transition(ThreadState::Running)?;
        let first = !self.flags.contains(TcbFlags::LAUNCHED);
        if first {
            self.flags.insert(TcbFlags::LAUNCHED);
            self.first_dispatch = Some(now);
        }
        Ok(first)
    }

    /// Hand the body over to the trampoline
    pub(crate) fn take_entry(&mut self) -> Option<ThreadEntry> {
        self.entry.take()
    }
}

impl fmt::Debug for Tcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tcb")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .field("state", &self.state)
            .field("flags", &self.flags)
            .field("enter_time", &self.enter_time)
            .field("run_time", &self.run_time)
            .field("stack", &self.stack)
            .field("has_entry", &self.entry.is_some())
            .finish()
    }
}
