//! # rendezos
//!
//! A minimal preemptive microkernel for ARM Cortex-M built entirely on
//! synchronous message passing. There is no shared memory between
//! processes and no buffered IPC: every exchange is a rendezvous between
//! exactly one sender and one receiver, and hardware interrupts are
//! delivered to their registered handler as an ordinary message.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Application Processes                 │
//! ├────────────────────────────────────────────────────────┤
//! │                  Trap Stubs (stubs.rs)                   │
//! │     yield_now · send · receive · sendrec · exit · dump   │
//! ├──────────────┬────────────────────┬──────────────────────┤
//! │  Dispatcher  │  Rendezvous Engine │  Interrupt Bridge    │
//! │  syscall.rs  │  ipc.rs            │  interrupt.rs        │
//! ├──────────────┴────────────────────┴──────────────────────┤
//! │      Process Table & Ready Queues (table.rs, process.rs)  │
//! ├────────────────────────────────────────────────────────┤
//! │            Kernel Bootstrap & Global Context (kernel.rs)  │
//! ├────────────────────────────────────────────────────────┤
//! │     Arch Contract (arch/mod.rs) · Frame Synthesis        │
//! │                   (arch/cortex_m4.rs)                     │
//! ├────────────────────────────────────────────────────────┤
//! │         ARM Cortex-M Hardware (Thumb-2)                  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling
//!
//! Three priority levels are scheduled — `Handler`, `High`, `Low` — with
//! strict priority ordering and FIFO within a level. A fourth, `Idle`, is
//! reserved for the permanently-runnable idle process and is never placed
//! in a ready queue. There is no timeslicing: a process runs until it
//! blocks, yields, exits, or is preempted by an interrupt.
//!
//! ## Memory Model
//!
//! - **No heap**: all kernel state is statically allocated.
//! - **No `alloc`**: pure `core`, plus `heapless` for bounded strings.
//! - **Fixed-size process table**: `[ProcessDescriptor; MAX_PROCESSES]`.
//! - **Bump-allocated stack arena**: process stacks only; see
//!   `memory.rs` and `DESIGN.md` for why descriptors are not also
//!   arena-allocated.
//! - **Critical sections**: `cortex_m::interrupt::free()` guard every
//!   mutation of the global kernel context.

#![no_std]

pub mod arch;
pub mod config;
pub mod debug;
pub mod error;
pub mod ipc;
pub mod interrupt;
pub mod kernel;
pub mod memory;
pub mod message;
pub mod process;
pub mod stubs;
pub mod sync;
pub mod syscall;
pub mod table;
