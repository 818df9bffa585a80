//! # Messages
//!
//! The wire format exchanged between processes and between hardware
//! interrupts and their registered handlers.

use crate::config::MESSAGE_PAYLOAD_BYTES;

/// Process identifier: a dense index into the process table. Stable for the
/// lifetime of the process.
pub type Pid = u8;

/// Reserved PID standing in for a message's true origin when the message
/// was synthesised by the interrupt bridge rather than sent by a process.
pub const HARDWARE: Pid = Pid::MAX;

/// Message type tag. Applications are free to use any value; three are
/// reserved by the kernel.
pub type MsgType = u16;

/// Wildcard accepted by `receive` to match any sender and any type.
pub const ANY: MsgType = 0;
/// Synthesised by the interrupt bridge when a registered handler's
/// interrupt fires.
pub const INTERRUPT: MsgType = 1;
/// Conventional type used by the receiving side of a `sendrec` to label
/// the reply it is waiting for.
pub const REPLY: MsgType = 2;

/// A message record as seen by both kernel and application code. The
/// kernel copies this record by value on delivery and overwrites `sender`
/// and `msg_type` on the receiving side to reflect the true origin —
/// callers set `msg_type` (and may leave `sender` unset) before sending.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct Message {
    pub sender: Pid,
    pub msg_type: MsgType,
    pub payload: [u8; MESSAGE_PAYLOAD_BYTES],
}

impl Message {
    pub const fn new(msg_type: MsgType) -> Self {
        Self {
            sender: 0,
            msg_type,
            payload: [0; MESSAGE_PAYLOAD_BYTES],
        }
    }
}

/// Panics with a message naming the offending type. Applications call this
/// from the default arm of a match over expected message types; it never
/// arises from kernel code itself.
pub fn bad_message_type(got: MsgType) -> ! {
    panic!("unexpected message type {}", got);
}
