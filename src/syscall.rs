//! # System-Call Dispatcher
//!
//! The kernel-side half of the trap trampoline contract (see
//! [`crate::arch`]). `system_call` is the symbol the trampoline's SVC
//! handler calls into; `interrupt_cxt_switch` is its counterpart for the
//! deferred context switch requested after an IRQ preempts the running
//! process. Both record the incoming stack pointer on `current`, perform a
//! kernel operation, and return the (possibly new) current process's saved
//! stack pointer for the trampoline to resume.

use crate::error::{kernel_panic, KernelError};
use crate::kernel::kernel_mut;
use crate::message::{Message, MsgType, Pid};
use crate::process::ProcessState;

pub const SYS_YIELD: u32 = 0;
pub const SYS_SEND: u32 = 1;
pub const SYS_RECEIVE: u32 = 2;
pub const SYS_SENDREC: u32 = 3;
pub const SYS_EXIT: u32 = 4;
pub const SYS_DUMP: u32 = 5;

/// Index of R0 and PC within the 8-word hardware-stacked exception frame.
const R0: usize = 0;
const R1: usize = 1;
const R2: usize = 2;
const PC: usize = 6;

/// Recover the trap's immediate operand, Thumb `SVC #imm` being a 16-bit
/// instruction with the immediate in its low byte, located at `PC - 2`.
unsafe fn svc_opcode(saved_sp: *mut u32) -> u32 {
    let pc = *saved_sp.add(PC) as *const u16;
    let instr = core::ptr::read_unaligned(pc.sub(1));
    (instr & 0x00FF) as u32
}

/// Entry point called by the trampoline's SVC handler. Returns the stack
/// pointer of the process that should run next.
///
/// # Safety
/// Must only be called from the trampoline's trap entry, with `saved_sp`
/// pointing at a valid hardware-stacked exception frame on the calling
/// process's stack.
#[no_mangle]
pub unsafe extern "C" fn system_call(saved_sp: *mut u32) -> *mut u32 {
    let k = kernel_mut();
    let current: Pid = k.table.current;
    k.table.get_mut(current).saved_sp = saved_sp;

    let opcode = svc_opcode(saved_sp);
    let r0 = *saved_sp.add(R0);
    let r1 = *saved_sp.add(R1);
    let r2 = *saved_sp.add(R2);

    match opcode {
        SYS_YIELD => {
            k.table.enqueue_ready(current);
            k.reschedule();
        }
        SYS_SEND => k.send(current, r0 as Pid, r1 as *const Message),
        SYS_RECEIVE => k.receive(current, r0 as MsgType, r1 as *mut Message),
        SYS_SENDREC => k.sendrec(current, r0 as Pid, r1 as *mut Message),
        SYS_EXIT => {
            k.table.get_mut(current).state = ProcessState::Dead;
            k.reschedule();
        }
        SYS_DUMP => {
            crate::debug::dump(k);
            k.table.current = current;
        }
        other => {
            let name = k.table.get(current).name.clone();
            kernel_panic(KernelError::UnknownSyscall(other), Some(name.as_str()));
        }
    }
    let _ = r2;

    k.table.current().saved_sp
}

/// Entry point called after an IRQ's handler body, when `interrupt()` set
/// `reschedule_pending` because a handler preempted lower-priority work.
/// Unlike `system_call`, the current process was preempted rather than
/// blocked, so it is unconditionally re-enqueued before a new one is
/// chosen.
///
/// # Safety
/// Must only be called from the trampoline's IRQ exit path, with
/// `saved_sp` pointing at the interrupted process's exception frame.
#[no_mangle]
pub unsafe extern "C" fn interrupt_cxt_switch(saved_sp: *mut u32) -> *mut u32 {
    let k = kernel_mut();
    let current = k.table.current;
    k.table.get_mut(current).saved_sp = saved_sp;
    if !k.reschedule_pending {
        return saved_sp;
    }
    k.reschedule_pending = false;
    k.table.enqueue_ready(current);
    k.reschedule();
    k.table.current().saved_sp
}
