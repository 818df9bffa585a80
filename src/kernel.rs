//! # Kernel
//!
//! Top-level kernel state and bootstrap. Owns the process table and the
//! interrupt handler table as a single global context, mutated only from
//! inside a critical section — the same discipline a single-core scheduler
//! singleton requires, just applied to a rendezvous kernel instead of a
//! tick-driven one.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init()     ← create PID 0 (IDLE)
//!         ├─► kernel::start()    ← create user processes (×N)
//!         └─► kernel::os_start() ← launch scheduler (no return)
//! ```

use crate::arch::cortex_m4;
use crate::config::IDLE_STACK_BYTES;
use crate::error::{kernel_panic, KernelError};
use crate::memory;
use crate::message::Pid;
use crate::process::{Priority, ProcessState};
use crate::sync;
use crate::table::ProcessTable;

/// Global kernel context: the process table plus the interrupt handler
/// table and scheduler-started flag.
pub struct Kernel {
    pub(crate) table: ProcessTable,
    pub(crate) handlers: [Pid; crate::config::MAX_IRQ + 1],
    pub(crate) started: bool,
    pub(crate) reschedule_pending: bool,
    pub(crate) idle: Pid,
}

impl Kernel {
    const fn new() -> Self {
        Self {
            table: ProcessTable::new(),
            handlers: [0; crate::config::MAX_IRQ + 1],
            started: false,
            reschedule_pending: false,
            idle: 0,
        }
    }
}

#[cfg(test)]
impl Kernel {
    /// A standalone kernel context for host-side unit tests, bypassing the
    /// global singleton and stack-arena bootstrap that real hardware needs.
    pub(crate) fn new_for_test() -> Self {
        Kernel::new()
    }
}

static mut KERNEL: Kernel = Kernel::new();

/// Raw pointer to the global kernel context, read from ISR context (the
/// PendSV-equivalent context-switch path) which cannot easily thread a
/// reference through.
#[no_mangle]
pub static mut KERNEL_PTR: *mut Kernel = core::ptr::null_mut();

/// # Safety
/// Must be called exactly once, with interrupts disabled, before any other
/// kernel entry point.
pub unsafe fn kernel_mut() -> &'static mut Kernel {
    &mut *KERNEL_PTR
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Body of the permanently-idle process: parks the CPU in a low-power
/// wait-for-interrupt loop. Scheduled only when every ready queue is empty.
extern "C" fn idle_body(_arg: u32) -> ! {
    loop {
        unsafe { cortex_m4::pause() };
    }
}

/// Initialize the kernel: point [`KERNEL_PTR`] at the global instance and
/// create PID 0 as the permanently-idle process, with a real initial stack
/// frame so it is resumable the moment every ready queue drains. Must be
/// called before any call to `start`.
pub fn os_init() {
    sync::critical_section(|_cs| unsafe {
        KERNEL = Kernel::new();
        KERNEL_PTR = &mut KERNEL as *mut Kernel;
        let k = kernel_mut();
        let pid = k.table.reserve_pid().expect("idle process must be PID 0");
        let stack = match memory::alloc_stack(IDLE_STACK_BYTES) {
            Ok(s) => s,
            Err(e) => kernel_panic(e, None),
        };
        let desc = k.table.get_mut(pid);
        desc.name.push_str("idle").ok();
        desc.state = ProcessState::Idling;
        desc.priority = Priority::Idle;
        desc.stack_base = stack;
        desc.stack_size = IDLE_STACK_BYTES;
        let top = stack.add(IDLE_STACK_BYTES);
        desc.saved_sp = cortex_m4::build_initial_frame(top as *mut u32, idle_body, 0);
        k.idle = pid;
    });
}

/// Allocate a process slot and its stack, without scheduling it. Shared by
/// `start()`. Panics (fatally) on table or arena exhaustion.
fn init_proc(name: &str, stack_size: usize) -> Pid {
    let k = unsafe { kernel_mut() };
    let pid = match k.table.reserve_pid() {
        Some(p) => p,
        None => kernel_panic(KernelError::TooManyProcesses, None),
    };
    let stack = match unsafe { memory::alloc_stack(stack_size) } {
        Ok(s) => s,
        Err(e) => kernel_panic(e, Some(name)),
    };
    let desc = k.table.get_mut(pid);
    desc.name.clear();
    let _ = desc.name.push_str(name);
    desc.stack_base = stack;
    desc.stack_size = stack_size;
    pid
}

/// Create a new process running `body(arg)` on a freshly-allocated stack of
/// `stack_size` bytes, at the default `Low` priority. Must be called before
/// [`os_start`] — calling it afterwards is fatal.
///
/// Returns the new process's PID.
pub fn start(name: &str, body: extern "C" fn(u32) -> !, arg: u32, stack_size: usize) -> Pid {
    sync::critical_section(|_cs| unsafe {
        let k = kernel_mut();
        if k.started {
            kernel_panic(KernelError::LateStart, Some(name));
        }
        let pid = init_proc(name, stack_size);
        let desc = k.table.get_mut(pid);
        desc.priority = Priority::Low;
        let top = desc.stack_base.add(desc.stack_size);
        desc.saved_sp = cortex_m4::build_initial_frame(top as *mut u32, body, arg);
        k.table.enqueue_ready(pid);
        pid
    })
}

/// Launch the scheduler. Makes the idle process current, installs its
/// stack, and performs one `yield` to enter the first real process. Never
/// returns to the caller; when no process is ready the idle process parks
/// the CPU in a `wfi` loop.
pub fn os_start() -> ! {
    let first_sp = sync::critical_section(|_cs| unsafe {
        let k = kernel_mut();
        k.started = true;
        k.table.current = k.idle;
        let next = k.table.choose_next(k.idle);
        k.table.current = next;
        k.table.get(next).saved_sp
    });
    unsafe {
        cortex_m4::start_first_process(first_sp);
    }
}

/// Register the currently-running process as the handler for `irq`,
/// raising its priority to `Handler` and enabling the IRQ line. Fatal for
/// exception vectors (`irq < 0`).
pub fn connect(irq: i32) {
    sync::critical_section(|_cs| unsafe { kernel_mut().connect(irq) });
}

/// Set the currently-running process's priority. Valid for
/// `Handler`/`High`/`Low` (0..=2); any other value is fatal.
pub fn priority(p: u8) {
    match Priority::from_u8(p) {
        Some(prio) if prio != Priority::Idle => {
            sync::critical_section(|_cs| unsafe {
                let k = kernel_mut();
                let current = k.table.current;
                k.table.get_mut(current).priority = prio;
            });
        }
        _ => {
            let name = current_name();
            kernel_panic(KernelError::BadPriority(p), Some(name));
        }
    }
}

/// The currently-running process's PID, as tracked by the kernel.
pub fn current_pid() -> Pid {
    unsafe { kernel_mut().table.current }
}

fn current_name() -> &'static str {
    let k: &'static Kernel = unsafe { kernel_mut() };
    k.table.current().name.as_str()
}
