//! # Stack Arena
//!
//! Process descriptors live in a fixed-size array (see [`crate::table`]), but
//! stacks have no compile-time-uniform size, so they are bump-allocated from
//! a single static byte region. This plays the role of the free-RAM region
//! between `__end` and `__stack_limit` in the source this kernel is modeled
//! on, simplified to a single direction of growth now that descriptors no
//! longer share the region.

use crate::config::{STACK_ARENA_BYTES, STACK_SENTINEL};
use crate::error::KernelError;

#[repr(align(8))]
struct Arena([u8; STACK_ARENA_BYTES]);

static mut ARENA: Arena = Arena([0; STACK_ARENA_BYTES]);
static mut BUMP: usize = 0;

/// Allocate `size` bytes (rounded up to 8) from the arena, filled with the
/// stack sentinel so high-water-mark usage can later be measured.
///
/// # Safety
/// Must only be called before the scheduler starts, with interrupts masked.
pub unsafe fn alloc_stack(size: usize) -> Result<*mut u8, KernelError> {
    let size = (size + 7) & !7;
    let start = BUMP;
    let end = start + size;
    if end > STACK_ARENA_BYTES {
        return Err(KernelError::OutOfMemory);
    }
    let base = ARENA.0.as_mut_ptr().add(start);
    let words = base as *mut u32;
    for i in 0..(size / 4) {
        core::ptr::write_volatile(words.add(i), STACK_SENTINEL);
    }
    BUMP = end;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_do_not_overlap() {
        unsafe {
            BUMP = 0;
            let a = alloc_stack(64).unwrap();
            let b = alloc_stack(64).unwrap();
            assert!((b as usize) >= (a as usize) + 64);
        }
    }

    #[test]
    fn exhaustion_is_reported() {
        unsafe {
            BUMP = 0;
            let res = alloc_stack(STACK_ARENA_BYTES + 8);
            assert_eq!(res, Err(KernelError::OutOfMemory));
        }
    }
}
