//! # Process Descriptor
//!
//! Defines the process record and its state machine. Each process is a
//! fixed slot in the kernel's process table, identified by its index (PID).

use crate::config::NAME_LEN;
use crate::message::{Message, MsgType, Pid};

/// Scheduling priority. Lower numeric value runs first. `Idle` is never
/// enqueued in a ready queue — it is selected only as the fallback when
/// every ready queue is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Priority {
    Handler = 0,
    High = 1,
    Low = 2,
    Idle = 3,
}

impl Priority {
    /// Number of priority levels that are actually scheduled (excludes `Idle`).
    pub const LEVELS: usize = 3;

    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Priority::Handler),
            1 => Some(Priority::High),
            2 => Some(Priority::Low),
            3 => Some(Priority::Idle),
            _ => None,
        }
    }

    /// Index into a 3-element ready-queue array. Panics (via `None`) for `Idle`.
    pub const fn queue_index(self) -> Option<usize> {
        match self {
            Priority::Handler => Some(0),
            Priority::High => Some(1),
            Priority::Low => Some(2),
            Priority::Idle => None,
        }
    }
}

/// Execution state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Slot has never been started, or the process has exited.
    Dead,
    /// Runnable or running; present in a ready queue or currently executing.
    Active,
    /// Blocked trying to send; linked into the destination's waiting-senders list.
    Sending,
    /// Blocked waiting for a matching message; not in any list.
    Receiving,
    /// Blocked trying to send, will transition to `Receiving(Reply)` once delivered.
    SendRec,
    /// The permanently-idle process when no other process is runnable.
    Idling,
}

/// A process's pending receive request: the type it will accept and where
/// the delivered message should be copied. `buffer` is `None` only for the
#[derive(Clone, Copy)]
pub struct PendingReceive {
    pub accept: MsgType,
    pub buffer: *mut Message,
}

/// A process's outgoing message, recorded while it is `Sending` or
/// `SendRec`. The message type is read directly off `*buffer` rather than
/// duplicated here, since the caller filled it in before sending.
#[derive(Clone, Copy)]
pub struct PendingSend {
    pub buffer: *const Message,
}

/// Fixed-capacity process name, matching the teacher's preference for
/// inline, non-heap string storage.
pub type Name = heapless::String<NAME_LEN>;

/// A single process's full kernel-visible state.
///
/// Stored inline in the process table — never boxed, never heap-allocated.
/// `next` is reused for both the ready queue and a receiver's waiting-senders
/// list; a process is linked into at most one of the two at any time.
pub struct ProcessDescriptor {
    pub pid: Pid,
    pub name: Name,
    pub state: ProcessState,
    pub priority: Priority,
    pub saved_sp: *mut u32,
    pub stack_base: *mut u8,
    pub stack_size: usize,
    /// Head of the FIFO list of processes blocked sending to this one.
    pub waiting_head: Option<Pid>,
    pub waiting_tail: Option<Pid>,
    /// Shared link: ready-queue next, or waiting-list next. Mutually exclusive.
    pub next: Option<Pid>,
    pub pending_interrupt: bool,
    pub recv: Option<PendingReceive>,
    pub send: Option<PendingSend>,
}

// Safety: the raw pointers here (`saved_sp`, `stack_base`, message buffer
// pointers) always point either into this process's own stack or into a
// caller's live message buffer on that caller's stack, and the kernel only
// touches a process's fields from inside a critical section.
unsafe impl Send for ProcessDescriptor {}

impl ProcessDescriptor {
    pub const fn empty(pid: Pid) -> Self {
        Self {
            pid,
            name: Name::new(),
            state: ProcessState::Dead,
            priority: Priority::Idle,
            saved_sp: core::ptr::null_mut(),
            stack_base: core::ptr::null_mut(),
            stack_size: 0,
            waiting_head: None,
            waiting_tail: None,
            next: None,
            pending_interrupt: false,
            recv: None,
            send: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.state, ProcessState::Dead)
    }

    /// High-water mark of stack usage: bytes between the first non-sentinel
    /// word (scanning from the low end) and the top of the stack.
    pub fn stack_used(&self) -> usize {
        use crate::config::STACK_SENTINEL;
        let words = self.stack_size / 4;
        let base = self.stack_base as *const u32;
        let mut first_used = words;
        for i in 0..words {
            let w = unsafe { core::ptr::read_volatile(base.add(i)) };
            if w != STACK_SENTINEL {
                first_used = i;
                break;
            }
        }
        (words - first_used) * 4
    }
}
