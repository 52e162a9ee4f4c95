//! AArch64 Teaching C Compiler - Common Types and Utilities
//!
//! This crate contains shared types, error definitions, and utilities
//! used across all components of the compiler.

pub mod error;
pub mod source_loc;

pub use error::CompilerError;
pub use source_loc::{render_snippet, SourceLocation, SourceSpan};
