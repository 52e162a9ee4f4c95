//! AArch64 Teaching C Compiler - Code Generation Backend
//!
//! This crate handles the back half of the pipeline:
//!
//! - Frame layout: assigning each local variable a slot below the frame
//!   base and rounding the frame to the 16-byte stack alignment
//! - Code generation: lowering the AST through a stack-machine
//!   evaluation model to AArch64 instructions
//! - Emission: rendering the instruction list to assembler text

pub mod asm;
pub mod codegen;
pub mod emit;
pub mod frame;

pub use asm::{Cond, Instr, Reg};
pub use codegen::{CodeGenerator, ARG_REGS};
pub use emit::emit;
pub use frame::{align_to, resolve_frames, SLOT_SIZE, STACK_ALIGN};

use acc_common::CompilerError;
use acc_frontend::Program;

/// Resolve frame layout and lower a parsed program to assembly text.
///
/// The program must not have been resolved already; this is the one
/// mutation in its lifecycle.
pub fn generate_assembly(program: &mut Program) -> Result<String, CompilerError> {
    resolve_frames(program);
    let instrs = CodeGenerator::new().generate(program)?;
    Ok(emit(&instrs))
}
