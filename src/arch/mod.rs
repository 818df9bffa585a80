//! # Low-Level Trampoline Contract
//!
//! The architecture-specific SVC trap entry/exit and PendSV-equivalent
//! context-switch assembly are treated as an external collaborator,
//! specified only by the contract below — this crate never implements the
//! trap trampoline itself. Raising the trap is kernel-side work instead:
//! [`crate::stubs`] issues `svc #n` directly from naked functions, since the
//! immediate operand `n` must be baked into the instruction rather than
//! passed through a call. What this module implements, in [`cortex_m4`], is
//! the one genuinely kernel-side, architecture-specific operation:
//! synthesising the initial exception frame a brand-new process's first
//! context switch resumes into, plus thin pass-throughs to the contract
//! below.
//!
//! The functions declared here are provided by a separate trampoline crate
//! or by board-support assembly linked into the final firmware image.

pub mod cortex_m4;

extern "C" {
    /// Install `sp` as the running process stack pointer and enter thread
    /// mode. Used only by [`cortex_m4::start_first_process`].
    pub fn setstack(sp: *const u32);

    /// Request that the trampoline perform a deferred context switch at its
    /// next return from interrupt context, resuming whichever process
    /// `system_call`/`interrupt_cxt_switch` (see [`crate::syscall`]) left as
    /// current. Called by [`crate::interrupt::Kernel::interrupt`] when a
    /// handler preempts lower-priority work.
    pub fn reschedule();

    /// Enable IRQ line `n` at the interrupt controller.
    pub fn enable_irq(n: usize);
    /// Disable IRQ line `n` at the interrupt controller.
    pub fn disable_irq(n: usize);
    /// Return the IRQ number currently being serviced.
    pub fn active_irq() -> usize;

    /// Put the CPU to sleep until the next interrupt.
    pub fn pause();

    /// Disable interrupts for the duration of a diagnostic report; paired
    /// with `restore`.
    pub fn lock() -> u32;
    /// Restore the interrupt mask saved by `lock`.
    pub fn restore(saved: u32);
}
