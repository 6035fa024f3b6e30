//! # Context Switching
//!
//! Saved execution state and the control-transfer contract.
//!
//! The scheduler never looks inside a [`Context`]. It only hands pairs of
//! them to a [`ControlTransfer`] implementation, which either performs a real
//! register switch ([`NativeTransfer`]) or records the switch and returns
//! ([`RecordingTransfer`]).

mod recording;

cfg_if::cfg_if! {
    if #[cfg(all(
        feature = "native",
        any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "riscv64")
    ))] {
        mod native;
        pub use native::NativeTransfer;
    }
}

pub use recording::{RecordingTransfer, SwitchRecord};

use crate::scheduler::Scheduler;
use crate::ThreadHandle;
use static_assertions::const_assert_eq;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        /// Callee-saved registers: rbx, rbp, r12-r15
        pub const SAVED_REGS: usize = 6;
    } else if #[cfg(target_arch = "aarch64")] {
        /// Callee-saved registers: x19-x30, d8-d15
        pub const SAVED_REGS: usize = 20;
    } else if #[cfg(target_arch = "riscv64")] {
        /// Callee-saved registers: ra, s0-s11, fs0-fs11
        pub const SAVED_REGS: usize = 25;
    } else {
        /// No native switch on this architecture
        pub const SAVED_REGS: usize = 0;
    }
}

/// Saved execution context of a thread
///
/// Field offsets are fixed: the native switch addresses `sp` at 0, `ip` at
/// one word and the register file right after.
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Stack pointer
    sp: usize,
    /// Resume address
    ip: usize,
    /// Callee-saved registers (architecture-specific count)
    regs: [u64; SAVED_REGS],
}

const_assert_eq!(core::mem::offset_of!(Context, sp), 0);
const_assert_eq!(core::mem::offset_of!(Context, ip), core::mem::size_of::<usize>());
const_assert_eq!(core::mem::offset_of!(Context, regs), 2 * core::mem::size_of::<usize>());

impl Context {
    /// A context that has never been saved into
    pub const fn empty() -> Self {
        Self {
            sp: 0,
            ip: 0,
            regs: [0; SAVED_REGS],
        }
    }

    /// Context of a thread that has not run yet
    pub const fn launch(stack_top: usize, resume: usize) -> Self {
        Self {
            sp: stack_top,
            ip: resume,
            regs: [0; SAVED_REGS],
        }
    }

    /// Get the saved stack pointer
    pub fn stack_pointer(&self) -> usize {
        self.sp
    }

    /// Get the address execution resumes at
    pub fn resume_address(&self) -> usize {
        self.ip
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::empty()
    }
}

/// Why the previous thread gave up the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchReason {
    /// The host parked itself to start the workload
    Park,
    /// Voluntary yield, the thread stays RUNNABLE
    Yield,
    /// Thread terminated
    Exit,
    /// Nothing is runnable, control goes back to the host
    Halt,
}

/// One control transfer, as prepared by the scheduler
#[derive(Debug)]
pub struct Switch {
    /// Thread giving up the CPU
    pub from: ThreadHandle,
    /// Thread receiving the CPU
    pub to: ThreadHandle,
    /// Why `from` gave up the CPU
    pub reason: SwitchReason,
    /// `to` has never run before and will enter through the trampoline
    pub first_run: bool,
    /// Where to save the current registers (`from`'s context)
    pub save: *mut Context,
    /// Registers to load (`to`'s context)
    pub load: *const Context,
    /// Scheduler handed to a thread entering for the first time
    pub scheduler: *const Scheduler,
}

/// Control-transfer primitive
///
/// All implementations must implement this trait.
pub trait ControlTransfer: Send + Sync {
    /// Get the implementation name
    fn name(&self) -> &'static str;

    /// Resume address written into the context of a newly created thread
    fn entry_point(&self) -> usize;

    /// Save the running context into `switch.save` and resume `switch.load`
    ///
    /// Returns only once the saving thread is switched back to.
    ///
    /// # Safety
    /// `save` and `load` must point to live contexts of distinct slots, and
    /// `load` must hold either a context saved by this implementation or one
    /// built by [`Context::launch`] with [`ControlTransfer::entry_point`].
    /// No lock on the scheduler may be held across the call.
    unsafe fn transfer(&self, switch: &Switch);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_context() {
        let ctx = Context::launch(0x8000, 0x1234);
        assert_eq!(ctx.stack_pointer(), 0x8000);
        assert_eq!(ctx.resume_address(), 0x1234);
        assert_eq!(Context::default(), Context::empty());
    }

    #[test]
    fn test_context_layout() {
        let word = core::mem::size_of::<usize>();
        assert_eq!(core::mem::size_of::<Context>(), 2 * word + SAVED_REGS * 8);
    }
}
