//! # Rendezvous Engine
//!
//! Synchronous, unbuffered, typed message passing. Every message crossing a
//! pair of processes is copied by value inside the kernel; user buffers are
//! never shared across the boundary. All three operations below run with
//! interrupts masked and always end by either leaving the caller runnable
//! (a non-blocking path) or handing `current` to whatever `choose_next`
//! picks.

use crate::error::{kernel_panic, KernelError};
use crate::kernel::Kernel;
use crate::message::{Message, MsgType, Pid, ANY, HARDWARE, INTERRUPT, REPLY};
use crate::process::{PendingReceive, PendingSend, ProcessState};

impl Kernel {
    fn check_destination(&self, dest: Pid) -> Result<(), KernelError> {
        if !self.table.valid_pid(dest) || self.table.get(dest).is_dead() {
            return Err(KernelError::BadDestination(dest));
        }
        Ok(())
    }

    fn fatal_bad_destination(&self, sender: Pid, dest: Pid) -> ! {
        let name = self.table.get(sender).name.clone();
        kernel_panic(KernelError::BadDestination(dest), Some(name.as_str()))
    }

    fn accepts(recv: &PendingReceive, msg_type: MsgType) -> bool {
        recv.accept == ANY || recv.accept == msg_type
    }

    /// True if `dest` is currently blocked in a receive that would accept a
    /// message of `msg_type` right now.
    fn ready_to_accept(&self, dest: Pid, msg_type: MsgType) -> bool {
        matches!(self.table.get(dest).state, ProcessState::Receiving)
            && self
                .table
                .get(dest)
                .recv
                .map(|r| Self::accepts(&r, msg_type))
                .unwrap_or(false)
    }

    /// Copy `*src` into `recv.buffer`, stamping the true sender and type.
    unsafe fn deliver(recv: PendingReceive, sender: Pid, src: *const Message) {
        let mut msg = *src;
        msg.sender = sender;
        core::ptr::write(recv.buffer, msg);
    }

    /// `send(dest, msg)`: deliver immediately if `dest` is receiving a
    /// compatible type, otherwise block the caller on `dest`'s
    /// waiting-senders list.
    pub fn send(&mut self, sender: Pid, dest: Pid, msg: *const Message) {
        if self.check_destination(dest).is_err() {
            self.fatal_bad_destination(sender, dest);
        }
        let msg_type = unsafe { (*msg).msg_type };

        if self.ready_to_accept(dest, msg_type) {
            let recv = self.table.get(dest).recv.unwrap();
            unsafe { Self::deliver(recv, sender, msg) };
            self.table.get_mut(dest).recv = None;
            self.table.enqueue_ready(dest);
            // Sender stays current; no reschedule.
            return;
        }

        let s = self.table.get_mut(sender);
        s.state = ProcessState::Sending;
        s.send = Some(PendingSend { buffer: msg });
        self.table.push_waiting(dest, sender);
        self.reschedule();
    }

    /// `receive(accept, msg)`: pending interrupt first, then a matching
    /// waiting sender, then block.
    pub fn receive(&mut self, receiver: Pid, accept: MsgType, msg: *mut Message) {
        if (accept == ANY || accept == INTERRUPT) && self.table.get(receiver).pending_interrupt {
            self.table.get_mut(receiver).pending_interrupt = false;
            unsafe {
                core::ptr::write(
                    msg,
                    Message { sender: HARDWARE, msg_type: INTERRUPT, payload: [0; crate::config::MESSAGE_PAYLOAD_BYTES] },
                );
            }
            return;
        }

        if accept != INTERRUPT {
            let matched = self.table.pop_waiting_matching(receiver, |p| {
                p.send
                    .map(|s| {
                        let t = unsafe { (*s.buffer).msg_type };
                        accept == ANY || t == accept
                    })
                    .unwrap_or(false)
            });
            if let Some(sender) = matched {
                let send = self.table.get(sender).send.unwrap();
                unsafe { Self::deliver(PendingReceive { accept, buffer: msg }, sender, send.buffer) };
                self.table.get_mut(sender).send = None;
                match self.table.get(sender).state {
                    ProcessState::Sending => self.table.enqueue_ready(sender),
                    ProcessState::SendRec => {
                        let s = self.table.get_mut(sender);
                        s.state = ProcessState::Receiving;
                        s.recv = Some(PendingReceive { accept: REPLY, buffer: send.buffer as *mut Message });
                    }
                    _ => unreachable!("waiting-list member must be Sending or SendRec"),
                }
                return;
            }
        }

        let r = self.table.get_mut(receiver);
        r.state = ProcessState::Receiving;
        r.recv = Some(PendingReceive { accept, buffer: msg });
        self.reschedule();
    }

    /// `sendrec(dest, msg)`: send `msg`, then unconditionally block for a
    /// `REPLY` delivered into the same buffer. Atomic from the caller's
    /// point of view — nothing else can be observed by the caller between
    /// the send half and the receive half.
    pub fn sendrec(&mut self, caller: Pid, dest: Pid, msg: *mut Message) {
        if self.check_destination(dest).is_err() {
            self.fatal_bad_destination(caller, dest);
        }
        let msg_type = unsafe { (*msg).msg_type };

        if self.ready_to_accept(dest, msg_type) {
            let recv = self.table.get(dest).recv.unwrap();
            unsafe { Self::deliver(recv, caller, msg) };
            self.table.get_mut(dest).recv = None;
            self.table.enqueue_ready(dest);
            // Caller now waits for the reply but was never blocked on dest.
            let c = self.table.get_mut(caller);
            c.state = ProcessState::Receiving;
            c.recv = Some(PendingReceive { accept: REPLY, buffer: msg });
        } else {
            let c = self.table.get_mut(caller);
            c.state = ProcessState::SendRec;
            c.send = Some(PendingSend { buffer: msg });
            c.recv = Some(PendingReceive { accept: REPLY, buffer: msg });
            self.table.push_waiting(dest, caller);
        }
        self.reschedule();
    }

    /// Re-enqueue nothing (the caller has already set its own state above)
    /// and select the next process to run.
    pub(crate) fn reschedule(&mut self) {
        let next = self.table.choose_next(self.idle);
        self.table.current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Priority;

    fn spawn(k: &mut Kernel, prio: Priority) -> Pid {
        let pid = k.table.reserve_pid().unwrap();
        k.table.get_mut(pid).priority = prio;
        k.table.get_mut(pid).state = ProcessState::Active;
        pid
    }

    fn fresh_kernel() -> Kernel {
        let mut k = Kernel::new_for_test();
        let idle = spawn(&mut k, Priority::Idle);
        k.idle = idle;
        k
    }

    #[test]
    fn direct_rendezvous_delivers_immediately_and_stamps_sender() {
        let mut k = fresh_kernel();
        let a = spawn(&mut k, Priority::Low);
        let b = spawn(&mut k, Priority::Low);

        let mut inbox = Message::new(0);
        k.receive(b, ANY, &mut inbox as *mut Message);
        assert_eq!(k.table.get(b).state, ProcessState::Receiving);

        let mut out = Message::new(7);
        out.payload[0] = 0x42;
        k.send(a, b, &out as *const Message);

        assert_eq!(inbox.sender, a);
        assert_eq!(inbox.msg_type, 7);
        assert_eq!(inbox.payload[0], 0x42);
        assert_eq!(k.table.get(a).state, ProcessState::Active);
    }

    #[test]
    fn sender_first_queuing_is_fifo_with_type_skip() {
        let mut k = fresh_kernel();
        let a = spawn(&mut k, Priority::Low);
        let c = spawn(&mut k, Priority::Low);
        let b = spawn(&mut k, Priority::Low);
        k.table.current = b;

        let m1 = Message::new(1);
        let m2 = Message::new(2);
        k.send(a, b, &m1 as *const Message);
        k.send(c, b, &m2 as *const Message);

        let mut inbox = Message::new(0);
        k.receive(b, 2, &mut inbox as *mut Message);
        assert_eq!(inbox.sender, c);
        assert_eq!(k.table.get(c).state, ProcessState::Active);
        assert_eq!(k.table.get(a).state, ProcessState::Sending);

        let mut inbox2 = Message::new(0);
        k.receive(b, ANY, &mut inbox2 as *mut Message);
        assert_eq!(inbox2.sender, a);
    }

    #[test]
    fn sendrec_completes_on_reply() {
        let mut k = fresh_kernel();
        let client = spawn(&mut k, Priority::Low);
        let server = spawn(&mut k, Priority::Low);

        let mut req_reply = Message::new(10);
        k.sendrec(client, server, &mut req_reply as *mut Message);
        assert_eq!(k.table.get(client).state, ProcessState::SendRec);

        let mut req = Message::new(0);
        k.receive(server, 10, &mut req as *mut Message);
        assert_eq!(req.sender, client);
        assert_eq!(k.table.get(client).state, ProcessState::Receiving);

        let mut resp = Message::new(REPLY);
        resp.payload[0] = 99;
        k.send(server, req.sender, &resp as *const Message);

        assert_eq!(req_reply.payload[0], 99);
        assert_eq!(req_reply.msg_type, REPLY);
        assert_eq!(k.table.get(client).state, ProcessState::Active);
    }

    #[test]
    fn pending_interrupt_is_observed_before_waiting_senders() {
        let mut k = fresh_kernel();
        let h = spawn(&mut k, Priority::Handler);
        let sender = spawn(&mut k, Priority::Low);
        k.table.get_mut(h).pending_interrupt = true;

        let m = Message::new(5);
        k.table.push_waiting(h, sender);
        k.table.get_mut(sender).state = ProcessState::Sending;
        k.table.get_mut(sender).send = Some(PendingSend { buffer: &m as *const Message });

        let mut inbox = Message::new(0);
        k.receive(h, ANY, &mut inbox as *mut Message);
        assert_eq!(inbox.msg_type, INTERRUPT);
        assert_eq!(inbox.sender, HARDWARE);
        assert!(!k.table.get(h).pending_interrupt);
        // The waiting sender from before is untouched.
        assert_eq!(k.table.get(sender).state, ProcessState::Sending);
    }

    #[test]
    fn send_to_dead_process_is_fatal() {
        // `check_destination` alone is exercised here; the panic path
        // itself halts the device and is not something a host test can
        // observe without intercepting `kernel_panic`.
        let k = fresh_kernel();
        assert!(k.check_destination(99).is_err());
    }
}
