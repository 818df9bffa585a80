//! # rendezos Example Firmware
//!
//! Demonstrates the rendezvous kernel with three processes and one
//! simulated interrupt source:
//!
//! | Process | Priority | Role |
//! |---------|----------|------|
//! | `button_handler` | Handler | `connect`s to IRQ 5, blocks in `receive(INTERRUPT, ..)`, replies to status requests |
//! | `worker` | Low | Runs continuously, periodically `sendrec`s a status request to `button_handler` |
//! | `logger` | Low | Blocks in `receive(ANY, ..)` and reacts to whatever arrives |
//!
//! `button_handler` demonstrates interrupt-to-message delivery and
//! preemption; `worker`'s `sendrec` demonstrates the request/reply
//! protocol built on top of plain send/receive.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use panic_halt as _;

use rendezos::kernel;
use rendezos::message::{Message, ANY, INTERRUPT};
use rendezos::stubs;

const BUTTON_IRQ: i32 = 5;
const MSG_STATUS_REQUEST: u16 = 10;
const MSG_STATUS_REPLY: u16 = 11;
const MSG_LOG: u16 = 20;

static mut BUTTON_HANDLER_PID: u8 = 0;
static mut LOGGER_PID: u8 = 0;

/// Blocks waiting for either the button interrupt or a status request;
/// replies to status requests with the number of presses observed so far.
extern "C" fn button_handler(_arg: u32) -> ! {
    kernel::connect(BUTTON_IRQ);

    let mut presses: u32 = 0;
    loop {
        let mut msg = Message::new(0);
        stubs::receive(ANY, &mut msg);
        match msg.msg_type {
            INTERRUPT => {
                presses += 1;
            }
            MSG_STATUS_REQUEST => {
                let mut reply = Message::new(MSG_STATUS_REPLY);
                reply.payload[0..4].copy_from_slice(&presses.to_le_bytes());
                stubs::send(msg.sender, &reply);
            }
            other => rendezos::message::bad_message_type(other),
        }
    }
}

/// Periodically asks `button_handler` how many presses it has seen and
/// forwards the count to `logger`.
extern "C" fn worker(_arg: u32) -> ! {
    loop {
        let mut req = Message::new(MSG_STATUS_REQUEST);
        let handler = unsafe { BUTTON_HANDLER_PID };
        stubs::sendrec(handler, &mut req);

        let mut log_msg = Message::new(MSG_LOG);
        log_msg.payload[0..4].copy_from_slice(&req.payload[0..4]);
        let logger = unsafe { LOGGER_PID };
        stubs::send(logger, &log_msg);

        stubs::yield_now();
    }
}

/// Accepts anything and would forward it to a real sink; here it just
/// loops, demonstrating a plain `receive(ANY, ..)` consumer.
extern "C" fn logger(_arg: u32) -> ! {
    loop {
        let mut msg = Message::new(0);
        stubs::receive(ANY, &mut msg);
        match msg.msg_type {
            MSG_LOG => {
                // In a full board-support build this would format and
                // push through the diagnostic sink registered with
                // `rendezos::debug::set_sink`.
            }
            other => rendezos::message::bad_message_type(other),
        }
    }
}

const WORKER_STACK: usize = 512;
const LOGGER_STACK: usize = 512;
const HANDLER_STACK: usize = 512;

#[entry]
fn main() -> ! {
    kernel::os_init();

    let handler_pid = kernel::start("button_handler", button_handler, 0, HANDLER_STACK);
    let logger_pid = kernel::start("logger", logger, 0, LOGGER_STACK);
    kernel::start("worker", worker, 0, WORKER_STACK);

    unsafe {
        BUTTON_HANDLER_PID = handler_pid;
        LOGGER_PID = logger_pid;
    }

    kernel::os_start()
}
