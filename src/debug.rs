//! # Diagnostics
//!
//! The process-table dump and the fatal-error reporter share a single
//! pluggable sink rather than talking to a UART directly — concrete wiring
//! of that sink to hardware is board-support code, out of scope here.

use core::fmt::Write;

use crate::error::KernelError;
use crate::kernel::Kernel;
use crate::process::{ProcessState, Priority};

/// Registered once, before interrupts are enabled, by board-support code.
static mut SINK: Option<&'static mut dyn Write> = None;

/// Register the sink that `dump()` and the panic path write through.
///
/// # Safety
/// Must be called before interrupts are enabled and at most once.
pub unsafe fn set_sink(sink: &'static mut dyn Write) {
    SINK = Some(sink);
}

fn state_label(s: ProcessState) -> &'static str {
    match s {
        ProcessState::Dead => "DEAD",
        ProcessState::Active => "ACTIVE",
        ProcessState::Sending => "SENDING",
        ProcessState::Receiving => "RECEIVING",
        ProcessState::SendRec => "SENDREC",
        ProcessState::Idling => "IDLING",
    }
}

fn priority_label(p: Priority) -> &'static str {
    match p {
        Priority::Handler => "HANDLER",
        Priority::High => "HIGH",
        Priority::Low => "LOW",
        Priority::Idle => "IDLE",
    }
}

/// Walk the process table and print PID, state, stack base, (used/total)
/// stack bytes, and name for every process slot that has ever been
/// started. Runs on the kernel stack via the syscall path so its working
/// memory never competes with the caller's own stack depth. Interrupts are
/// masked for the duration via the trampoline's `lock`/`restore` pair so the
/// table cannot change shape mid-walk.
pub fn dump(k: &Kernel) {
    let saved = unsafe { crate::arch::cortex_m4::lock() };
    unsafe {
        if let Some(sink) = SINK.as_deref_mut() {
            for pid in 0..k.table.nprocs() as crate::message::Pid {
                let p = k.table.get(pid);
                let _ = writeln!(
                    sink,
                    "{:>3}  {:<9} {:<7} base={:p} used={}/{} {}",
                    pid,
                    state_label(p.state),
                    priority_label(p.priority),
                    p.stack_base,
                    p.stack_used(),
                    p.stack_size,
                    p.name.as_str(),
                );
            }
        }
    }
    unsafe { crate::arch::cortex_m4::restore(saved) };
}

/// Report a fatal error through the sink, naming the offending process
/// when known. Called only from [`crate::error::kernel_panic`], which has
/// already masked interrupts.
pub fn report_fatal(err: KernelError, process_name: Option<&str>) {
    unsafe {
        let Some(sink) = SINK.as_deref_mut() else {
            return;
        };
        match process_name {
            Some(name) => {
                let _ = writeln!(sink, "kernel panic in '{}': {}", name, err);
            }
            None => {
                let _ = writeln!(sink, "kernel panic: {}", err);
            }
        }
    }
}
