//! # Native Register Switch
//!
//! Saves the callee-saved registers, stack pointer and a resume address of
//! the running thread, then loads another thread's. Caller-saved registers
//! are already spilled by the compiler around the call, so the callee-saved
//! set is the whole state a suspended thread needs.
//!
//! A thread that has never run has a context built by [`Context::launch`]:
//! its stack pointer is the top of its stack and its resume address is the
//! trampoline, which calls into the scheduler to run the thread's body.
//! The scheduler pointer travels in the third argument register, which the
//! switch leaves untouched.

use super::{Context, ControlTransfer, Switch};
use crate::scheduler::Scheduler;
use core::arch::naked_asm;

/// Real stack and register switching
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTransfer;

impl NativeTransfer {
    /// Create the native transfer
    pub const fn new() -> Self {
        Self
    }
}

impl ControlTransfer for NativeTransfer {
    fn name(&self) -> &'static str {
        "native"
    }

    fn entry_point(&self) -> usize {
        thread_trampoline as usize
    }

    unsafe fn transfer(&self, switch: &Switch) {
        log::trace!("native switch {} -> {}", switch.from, switch.to);
        // SAFETY: upheld by the caller per the trait contract
        unsafe { context_switch(switch.save, switch.load, switch.scheduler) }
    }
}

/// First code a new thread runs, on its own stack
extern "C" fn thread_start(scheduler: *const Scheduler) -> ! {
    // SAFETY: the host is parked inside `Scheduler::run`, which borrows the
    // scheduler for as long as any pooled thread can execute
    let scheduler = unsafe { &*scheduler };
    scheduler.launch_current()
}

#[cfg(target_arch = "x86_64")]
#[unsafe(naked)]
unsafe extern "C" fn context_switch(_save: *mut Context, _load: *const Context, _scheduler: *const Scheduler) {
    naked_asm!(
        "mov [rdi + 0x00], rsp",
        "lea rax, [rip + 2f]",
        "mov [rdi + 0x08], rax",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], rbp",
        "mov [rdi + 0x20], r12",
        "mov [rdi + 0x28], r13",
        "mov [rdi + 0x30], r14",
        "mov [rdi + 0x38], r15",
        "mov rsp, [rsi + 0x00]",
        "mov rbx, [rsi + 0x10]",
        "mov rbp, [rsi + 0x18]",
        "mov r12, [rsi + 0x20]",
        "mov r13, [rsi + 0x28]",
        "mov r14, [rsi + 0x30]",
        "mov r15, [rsi + 0x38]",
        "jmp qword ptr [rsi + 0x08]",
        // Resumed: rsp points at our return address again
        "2:",
        "ret",
    );
}

#[cfg(target_arch = "x86_64")]
#[unsafe(naked)]
unsafe extern "C" fn thread_trampoline() -> ! {
    naked_asm!(
        "mov rdi, rdx",
        "call {start}",
        "ud2",
        start = sym thread_start,
    );
}

#[cfg(target_arch = "aarch64")]
#[unsafe(naked)]
unsafe extern "C" fn context_switch(_save: *mut Context, _load: *const Context, _scheduler: *const Scheduler) {
    naked_asm!(
        "mov x9, sp",
        "str x9, [x0, #0]",
        "adr x10, 2f",
        "str x10, [x0, #8]",
        "stp x19, x20, [x0, #16]",
        "stp x21, x22, [x0, #32]",
        "stp x23, x24, [x0, #48]",
        "stp x25, x26, [x0, #64]",
        "stp x27, x28, [x0, #80]",
        "stp x29, x30, [x0, #96]",
        "stp d8, d9, [x0, #112]",
        "stp d10, d11, [x0, #128]",
        "stp d12, d13, [x0, #144]",
        "stp d14, d15, [x0, #160]",
        "ldr x9, [x1, #0]",
        "mov sp, x9",
        "ldp x19, x20, [x1, #16]",
        "ldp x21, x22, [x1, #32]",
        "ldp x23, x24, [x1, #48]",
        "ldp x25, x26, [x1, #64]",
        "ldp x27, x28, [x1, #80]",
        "ldp x29, x30, [x1, #96]",
        "ldp d8, d9, [x1, #112]",
        "ldp d10, d11, [x1, #128]",
        "ldp d12, d13, [x1, #144]",
        "ldp d14, d15, [x1, #160]",
        "ldr x10, [x1, #8]",
        "br x10",
        // Resumed: x30 holds our return address again
        "2:",
        "ret",
    );
}

#[cfg(target_arch = "aarch64")]
#[unsafe(naked)]
unsafe extern "C" fn thread_trampoline() -> ! {
    naked_asm!(
        "mov x0, x2",
        "bl {start}",
        "brk #0",
        start = sym thread_start,
    );
}

#[cfg(target_arch = "riscv64")]
#[unsafe(naked)]
unsafe extern "C" fn context_switch(_save: *mut Context, _load: *const Context, _scheduler: *const Scheduler) {
    naked_asm!(
        "sd sp, 0(a0)",
        "lla t0, 2f",
        "sd t0, 8(a0)",
        "sd ra, 16(a0)",
        "sd s0, 24(a0)",
        "sd s1, 32(a0)",
        "sd s2, 40(a0)",
        "sd s3, 48(a0)",
        "sd s4, 56(a0)",
        "sd s5, 64(a0)",
        "sd s6, 72(a0)",
        "sd s7, 80(a0)",
        "sd s8, 88(a0)",
        "sd s9, 96(a0)",
        "sd s10, 104(a0)",
        "sd s11, 112(a0)",
        "fsd fs0, 120(a0)",
        "fsd fs1, 128(a0)",
        "fsd fs2, 136(a0)",
        "fsd fs3, 144(a0)",
        "fsd fs4, 152(a0)",
        "fsd fs5, 160(a0)",
        "fsd fs6, 168(a0)",
        "fsd fs7, 176(a0)",
        "fsd fs8, 184(a0)",
        "fsd fs9, 192(a0)",
        "fsd fs10, 200(a0)",
        "fsd fs11, 208(a0)",
        "ld sp, 0(a1)",
        "ld ra, 16(a1)",
        "ld s0, 24(a1)",
        "ld s1, 32(a1)",
        "ld s2, 40(a1)",
        "ld s3, 48(a1)",
        "ld s4, 56(a1)",
        "ld s5, 64(a1)",
        "ld s6, 72(a1)",
        "ld s7, 80(a1)",
        "ld s8, 88(a1)",
        "ld s9, 96(a1)",
        "ld s10, 104(a1)",
        "ld s11, 112(a1)",
        "fld fs0, 120(a1)",
        "fld fs1, 128(a1)",
        "fld fs2, 136(a1)",
        "fld fs3, 144(a1)",
        "fld fs4, 152(a1)",
        "fld fs5, 160(a1)",
        "fld fs6, 168(a1)",
        "fld fs7, 176(a1)",
        "fld fs8, 184(a1)",
        "fld fs9, 192(a1)",
        "fld fs10, 200(a1)",
        "fld fs11, 208(a1)",
        "ld t0, 8(a1)",
        "jr t0",
        // Resumed: ra holds our return address again
        "2:",
        "ret",
    );
}

#[cfg(target_arch = "riscv64")]
#[unsafe(naked)]
unsafe extern "C" fn thread_trampoline() -> ! {
    naked_asm!(
        "mv a0, a2",
        "call {start}",
        "unimp",
        start = sym thread_start,
    );
}
