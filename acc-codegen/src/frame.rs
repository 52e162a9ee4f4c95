//! Stack-frame layout resolution
//!
//! Every distinct local variable gets a permanently reserved 8-byte slot
//! below the frame base, in registration order, with no reuse. The frame
//! size is the local storage rounded up to the 16-byte stack alignment
//! the AArch64 ABI requires.

use acc_frontend::Program;

/// Size in bytes of one local-variable slot
pub const SLOT_SIZE: i32 = 8;

/// Required stack alignment in bytes
pub const STACK_ALIGN: i32 = 16;

/// Round `n` up to the next multiple of `align`
pub fn align_to(n: i32, align: i32) -> i32 {
    (n + align - 1) / align * align
}

/// Assign each local a frame offset and compute each function's frame
/// size. Mutates the program once; afterwards it is read-only.
pub fn resolve_frames(program: &mut Program) {
    for function in &mut program.functions {
        let mut offset = 0;
        for local in &mut function.locals {
            offset += SLOT_SIZE;
            local.offset = offset;
        }
        function.frame_size = align_to(offset, STACK_ALIGN);
    }
}
