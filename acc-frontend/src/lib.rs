//! AArch64 Teaching C Compiler - Frontend
//!
//! This crate provides the frontend components of the compiler:
//! - Lexer: tokenizes source text
//! - Parser: builds an AST and per-function local tables from tokens
//! - AST: abstract syntax tree definitions

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, Function, Local, LocalId, Program, Stmt, MAX_CALL_ARGS};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;

use acc_common::CompilerError;

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Parse source text into a program
    pub fn parse_source(source: &str) -> Result<Program, CompilerError> {
        let tokens = Self::tokenize_source(source)?;
        Parser::new(tokens).parse_program()
    }

    /// Parse an already-tokenized stream into a program
    pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, CompilerError> {
        Parser::new(tokens).parse_program()
    }

    /// Tokenize source text (for debugging and token dumps)
    pub fn tokenize_source(source: &str) -> Result<Vec<Token>, CompilerError> {
        let mut lexer = Lexer::new(source);
        lexer.tokenize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_parse_simple_function() {
        let program = Frontend::parse_source("main() { return 42; }").unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name, "main");
    }

    #[test]
    fn test_frontend_propagates_lex_error() {
        let err = Frontend::parse_source("main() { return $; }").unwrap_err();
        assert!(matches!(err, CompilerError::LexError { .. }));
    }

    #[test]
    fn test_frontend_tokenize_source() {
        let tokens = Frontend::tokenize_source("return 1;").unwrap();
        assert_eq!(tokens.len(), 4); // return, 1, ;, EOF
    }
}
