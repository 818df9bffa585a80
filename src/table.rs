//! # Process Table and Ready Queues
//!
//! The process table is the kernel's sole arena: every cross-reference
//! (ready queues, waiting-senders lists, the interrupt handler table, a
//! message's `sender` field) is a [`Pid`] — an index into this table —
//! never an owning pointer. The table also owns the three priority ready
//! queues and the per-process waiting-senders lists, both built from the
//! same `next: Option<Pid>` field on [`ProcessDescriptor`]; invariant (1)
//! says a process is linked into at most one of the two at a time, so the
//! sharing is sound.

use crate::config::MAX_PROCESSES;
use crate::message::Pid;
use crate::process::{Priority, ProcessDescriptor, ProcessState};

#[derive(Clone, Copy)]
struct Queue {
    head: Option<Pid>,
    tail: Option<Pid>,
}

impl Queue {
    const fn empty() -> Self {
        Self { head: None, tail: None }
    }
}

pub struct ProcessTable {
    procs: [ProcessDescriptor; MAX_PROCESSES],
    nprocs: usize,
    ready: [Queue; Priority::LEVELS],
    pub current: Pid,
}

impl ProcessTable {
    pub const fn new() -> Self {
        // MAX_PROCESSES const array of `empty()` descriptors, PID = index.
        // Built via `MaybeUninit` (rather than filling a dummy placeholder
        // and overwriting each slot) because overwriting a live
        // `ProcessDescriptor` would run its destructor, which isn't
        // allowed in a const fn.
        let mut procs: [core::mem::MaybeUninit<ProcessDescriptor>; MAX_PROCESSES] =
            [const { core::mem::MaybeUninit::uninit() }; MAX_PROCESSES];
        let mut i = 0;
        while i < MAX_PROCESSES {
            procs[i] = core::mem::MaybeUninit::new(ProcessDescriptor::empty(i as Pid));
            i += 1;
        }
        // Safety: every slot was written by the loop above.
        let procs = unsafe {
            (&procs as *const _ as *const [ProcessDescriptor; MAX_PROCESSES]).read()
        };
        Self {
            procs,
            nprocs: 0,
            ready: [Queue::empty(); Priority::LEVELS],
            current: 0,
        }
    }

    pub fn get(&self, pid: Pid) -> &ProcessDescriptor {
        &self.procs[pid as usize]
    }

    pub fn get_mut(&mut self, pid: Pid) -> &mut ProcessDescriptor {
        &mut self.procs[pid as usize]
    }

    pub fn current(&self) -> &ProcessDescriptor {
        self.get(self.current)
    }

    pub fn current_mut(&mut self) -> &mut ProcessDescriptor {
        self.get_mut(self.current)
    }

    pub fn nprocs(&self) -> usize {
        self.nprocs
    }

    pub fn valid_pid(&self, pid: Pid) -> bool {
        (pid as usize) < self.nprocs
    }

    /// Reserve the next dense PID for a new process. Returns `None` once
    /// the table is full.
    pub fn reserve_pid(&mut self) -> Option<Pid> {
        if self.nprocs >= MAX_PROCESSES {
            return None;
        }
        let pid = self.nprocs as Pid;
        self.nprocs += 1;
        Some(pid)
    }

    // -----------------------------------------------------------------
    // Ready queues
    // -----------------------------------------------------------------

    /// Mark `pid` active and append it to the tail of its priority's ready
    /// queue. A no-op for `Priority::Idle` — the idle process is never
    /// enqueued.
    pub fn enqueue_ready(&mut self, pid: Pid) {
        let prio = self.get(pid).priority;
        let Some(level) = prio.queue_index() else {
            return;
        };
        self.get_mut(pid).state = ProcessState::Active;
        self.get_mut(pid).next = None;
        let q = &mut self.ready[level];
        match q.tail {
            Some(tail) => {
                self.get_mut(tail).next = Some(pid);
            }
            None => {
                q.head = Some(pid);
            }
        }
        self.ready[level].tail = Some(pid);
    }

    /// Pick and dequeue the next process to run: the head of the
    /// highest-priority non-empty queue, or `idle` if all are empty.
    pub fn choose_next(&mut self, idle: Pid) -> Pid {
        for level in 0..Priority::LEVELS {
            if let Some(head) = self.ready[level].head {
                let next = self.get(head).next;
                self.ready[level].head = next;
                if next.is_none() {
                    self.ready[level].tail = None;
                }
                self.get_mut(head).next = None;
                return head;
            }
        }
        idle
    }

    // -----------------------------------------------------------------
    // Waiting-senders lists
    // -----------------------------------------------------------------

    /// Append `sender` to the tail of `dest`'s waiting-senders list.
    pub fn push_waiting(&mut self, dest: Pid, sender: Pid) {
        self.get_mut(sender).next = None;
        let tail = self.get(dest).waiting_tail;
        match tail {
            Some(t) => self.get_mut(t).next = Some(sender),
            None => self.get_mut(dest).waiting_head = Some(sender),
        }
        self.get_mut(dest).waiting_tail = Some(sender);
    }

    /// Scan `dest`'s waiting-senders list in FIFO order for the first entry
    /// whose pending send type is accepted by `accepts`, unlink it, and
    /// return its PID. Leaves the relative order of the remaining waiters
    /// untouched.
    ///
    /// Unlinking a non-head match repairs the *previous* node's `next`
    /// link, not the receiver's own link — the corrected form of the
    /// FIFO-skip-over removal.
    pub fn pop_waiting_matching<F>(&mut self, dest: Pid, accepts: F) -> Option<Pid>
    where
        F: Fn(&ProcessDescriptor) -> bool,
    {
        let mut prev: Option<Pid> = None;
        let mut cur = self.get(dest).waiting_head;
        while let Some(node) = cur {
            let next = self.get(node).next;
            if accepts(self.get(node)) {
                match prev {
                    Some(p) => self.get_mut(p).next = next,
                    None => self.get_mut(dest).waiting_head = next,
                }
                if self.get(dest).waiting_tail == Some(node) {
                    self.get_mut(dest).waiting_tail = prev;
                }
                self.get_mut(node).next = None;
                return Some(node);
            }
            prev = cur;
            cur = next;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::PendingSend;

    fn make_process(t: &mut ProcessTable, prio: Priority) -> Pid {
        let pid = t.reserve_pid().unwrap();
        t.get_mut(pid).priority = prio;
        t.get_mut(pid).state = ProcessState::Active;
        pid
    }

    #[test]
    fn ready_queue_is_fifo_within_a_level() {
        let mut t = ProcessTable::new();
        let idle = make_process(&mut t, Priority::Idle);
        let a = make_process(&mut t, Priority::Low);
        let b = make_process(&mut t, Priority::Low);
        t.enqueue_ready(a);
        t.enqueue_ready(b);
        assert_eq!(t.choose_next(idle), a);
        assert_eq!(t.choose_next(idle), b);
        assert_eq!(t.choose_next(idle), idle);
    }

    #[test]
    fn higher_priority_runs_first() {
        let mut t = ProcessTable::new();
        let idle = make_process(&mut t, Priority::Idle);
        let low = make_process(&mut t, Priority::Low);
        let high = make_process(&mut t, Priority::High);
        t.enqueue_ready(low);
        t.enqueue_ready(high);
        assert_eq!(t.choose_next(idle), high);
        assert_eq!(t.choose_next(idle), low);
    }

    #[test]
    fn idle_is_never_enqueued() {
        let mut t = ProcessTable::new();
        let idle = make_process(&mut t, Priority::Idle);
        t.enqueue_ready(idle);
        assert_eq!(t.choose_next(idle), idle);
    }

    #[test]
    fn pop_waiting_skips_over_non_matching_and_repairs_links() {
        let mut t = ProcessTable::new();
        let receiver = make_process(&mut t, Priority::Low);
        let s1 = make_process(&mut t, Priority::Low);
        let s2 = make_process(&mut t, Priority::Low);
        let s3 = make_process(&mut t, Priority::Low);

        let m5 = crate::message::Message::new(5);
        let m7 = crate::message::Message::new(7);
        t.get_mut(s1).send = Some(PendingSend { buffer: &m5 as *const _ });
        t.get_mut(s2).send = Some(PendingSend { buffer: &m7 as *const _ });
        t.get_mut(s3).send = Some(PendingSend { buffer: &m5 as *const _ });
        t.push_waiting(receiver, s1);
        t.push_waiting(receiver, s2);
        t.push_waiting(receiver, s3);

        let matched = t
            .pop_waiting_matching(receiver, |p| {
                p.send
                    .map(|s| unsafe { (*s.buffer).msg_type } == 7)
                    .unwrap_or(false)
            })
            .unwrap();
        assert_eq!(matched, s2);

        // s1 and s3 must still be reachable in original order.
        let first = t.get(receiver).waiting_head.unwrap();
        assert_eq!(first, s1);
        let second = t.get(s1).next.unwrap();
        assert_eq!(second, s3);
        assert_eq!(t.get(s3).next, None);
        assert_eq!(t.get(receiver).waiting_tail, Some(s3));
    }
}
