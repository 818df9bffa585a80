//! # Kernel Configuration
//!
//! Compile-time constants governing kernel capacity and layout.
//! All limits are fixed at compile time — no dynamic allocation.

/// Maximum number of processes the kernel can manage, including IDLE.
/// Bounds the static process table. PID 0 is always IDLE.
pub const MAX_PROCESSES: usize = 32;

/// Highest valid IRQ index. IRQ numbers are `0..=MAX_IRQ`.
pub const MAX_IRQ: usize = 31;

/// Maximum length, in bytes, of a process name (excludes any terminator).
pub const NAME_LEN: usize = 15;

/// Size in bytes of the dedicated IDLE process stack.
pub const IDLE_STACK_BYTES: usize = 128;

/// Total size, in bytes, of the static arena that process stacks are
/// bump-allocated from. Must be large enough for every `start()` call
/// made before the scheduler starts, including the IDLE stack.
pub const STACK_ARENA_BYTES: usize = 16 * 1024;

/// Size in bytes of the opaque payload carried by a `Message`.
/// Chosen to comfortably hold a handful of `u32`/`u16` fields without
/// bloating the fixed-size message record.
pub const MESSAGE_PAYLOAD_BYTES: usize = 20;

/// Sentinel word used to pre-fill unused stack memory so that `dump()`
/// can measure high-water-mark usage by scanning for the first word
/// that has been overwritten.
pub const STACK_SENTINEL: u32 = 0xDEAD_BEEF;

/// Default priority assigned to a process created by `start()`.
pub const DEFAULT_PRIORITY: u8 = crate::process::Priority::Low as u8;
