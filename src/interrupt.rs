//! # Interrupt Bridge
//!
//! Translates hardware IRQs into `INTERRUPT` messages delivered to a
//! registered handler process, preempting lower-priority work when
//! necessary. `connect` is the only way a process becomes a handler;
//! `interrupt` is the entry point the common IRQ trampoline calls once it
//! has identified which process owns the IRQ that just fired.

use crate::arch::cortex_m4;
use crate::error::{kernel_panic, KernelError};
use crate::kernel::Kernel;
use crate::message::Pid;
use crate::process::{PendingReceive, ProcessState};

impl Kernel {
    /// Deliver an interrupt to `dest`. If `dest` is blocked in a receive
    /// that accepts `INTERRUPT`, deliver immediately and, if the currently
    /// running process is not itself a handler, request a reschedule so
    /// the handler preempts it. Otherwise, set `dest`'s pending-interrupt
    /// flag for the next qualifying receive to pick up.
    pub fn interrupt(&mut self, dest: Pid) {
        use crate::message::{HARDWARE, INTERRUPT};

        let accepts = matches!(self.table.get(dest).state, ProcessState::Receiving)
            && self
                .table
                .get(dest)
                .recv
                .map(|r: PendingReceive| r.accept == crate::message::ANY || r.accept == INTERRUPT)
                .unwrap_or(false);

        if accepts {
            let recv = self.table.get(dest).recv.unwrap();
            unsafe {
                core::ptr::write(
                    recv.buffer,
                    crate::message::Message { sender: HARDWARE, msg_type: INTERRUPT, payload: [0; crate::config::MESSAGE_PAYLOAD_BYTES] },
                );
            }
            self.table.get_mut(dest).recv = None;
            self.table.enqueue_ready(dest);

            let running = self.table.current;
            if running != dest && self.table.get(running).priority != crate::process::Priority::Handler {
                self.reschedule_pending = true;
                unsafe { cortex_m4::reschedule() };
            }
        } else {
            self.table.get_mut(dest).pending_interrupt = true;
        }
    }

    /// Register the calling (i.e. currently running) process as the
    /// handler for IRQ `irq`, raising it to `Priority::Handler` and
    /// enabling the line. Negative `irq` values (exception vectors) are
    /// fatal.
    pub fn connect(&mut self, irq: i32) {
        let caller = self.table.current;
        if irq < 0 || irq as usize > crate::config::MAX_IRQ {
            let name = self.table.get(caller).name.clone();
            kernel_panic(KernelError::BadIrq(irq), Some(name.as_str()));
        }
        self.handlers[irq as usize] = caller;
        self.table.get_mut(caller).priority = crate::process::Priority::Handler;
        unsafe { cortex_m4::enable_irq(irq as usize) };
    }

    /// Entry point for the common IRQ trampoline: look up the active IRQ's
    /// registered handler, disable the line, and deliver. An IRQ with no
    /// registered handler is fatal.
    pub fn irq_entry(&mut self) {
        let irq = unsafe { cortex_m4::active_irq() };
        if irq > crate::config::MAX_IRQ {
            kernel_panic(KernelError::UnexpectedIrq(irq), None);
        }
        let handler = self.handlers[irq];
        if handler == 0 {
            kernel_panic(KernelError::UnexpectedIrq(irq), None);
        }
        unsafe { cortex_m4::disable_irq(irq) };
        self.interrupt(handler);
    }
}
