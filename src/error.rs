//! # Fatal Error Reporting
//!
//! Every condition below is unrecoverable: the kernel has no notion of
//! retrying or degrading gracefully, so surfacing one always ends in
//! `kernel_panic`, which halts the device. `BadMessageType` is not part of
//! this enum because it never arises from kernel code — see
//! [`crate::message::bad_message_type`] for the application-facing variant.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    OutOfMemory,
    TooManyProcesses,
    BadDestination(crate::message::Pid),
    BadIrq(i32),
    BadPriority(u8),
    LateStart,
    UnknownSyscall(u32),
    UnexpectedIrq(usize),
    HardFault,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::OutOfMemory => write!(f, "out of memory"),
            KernelError::TooManyProcesses => write!(f, "too many processes"),
            KernelError::BadDestination(pid) => write!(f, "bad destination pid {}", pid),
            KernelError::BadIrq(irq) => write!(f, "bad irq {}", irq),
            KernelError::BadPriority(p) => write!(f, "bad priority {}", p),
            KernelError::LateStart => write!(f, "start() called after scheduler start"),
            KernelError::UnknownSyscall(n) => write!(f, "unknown syscall {}", n),
            KernelError::UnexpectedIrq(n) => write!(f, "unexpected irq {}", n),
            KernelError::HardFault => write!(f, "hard fault"),
        }
    }
}

/// Mask interrupts, report `err` through the registered diagnostic sink
/// (naming the current process if one is known), then spin forever.
///
/// There is no return from this function: the only recovery is a device
/// reset, so the interrupt mask taken by `lock` is never paired with a
/// `restore`.
pub fn kernel_panic(err: KernelError, current_name: Option<&str>) -> ! {
    unsafe {
        let _ = crate::arch::cortex_m4::lock();
    }
    crate::debug::report_fatal(err, current_name);
    loop {
        unsafe { crate::arch::cortex_m4::pause() };
    }
}

/// Entry point for a HardFault exception. The fault-vector wiring itself —
/// registering this as the `HardFault` handler with `cortex-m-rt` — is
/// board-support code and out of scope here; this is the kernel-side
/// reaction the original source owns, mirroring its `panic("HardFault")`.
pub fn hardfault_handler() -> ! {
    kernel_panic(KernelError::HardFault, None)
}
