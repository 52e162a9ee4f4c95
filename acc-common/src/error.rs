//! Error handling for the compiler
//!
//! This module defines the common error type shared by every stage of the
//! pipeline. All errors are fatal: the first one reported aborts
//! compilation, and no assembly is emitted after it.

use crate::source_loc::SourceLocation;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("lexical error at {location}: {message}")]
    LexError {
        location: SourceLocation,
        message: String,
    },

    #[error("parse error at {location}: {message}")]
    ParseError {
        location: SourceLocation,
        message: String,
    },

    #[error("I/O error: {message}")]
    IoError { message: String },

    /// A defect in the compiler itself, not bad input. Should be
    /// unreachable given a correct parser.
    #[error("internal compiler error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create a lexer error
    pub fn lex_error(message: String, location: SourceLocation) -> Self {
        CompilerError::LexError { location, message }
    }

    /// Create a parse error
    pub fn parse_error(message: String, location: SourceLocation) -> Self {
        CompilerError::ParseError { location, message }
    }

    /// Create an internal error
    pub fn internal_error(message: String) -> Self {
        CompilerError::InternalError { message }
    }

    /// The source position this error points at, if it is user-facing
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            CompilerError::LexError { location, .. } => Some(location),
            CompilerError::ParseError { location, .. } => Some(location),
            CompilerError::IoError { .. } | CompilerError::InternalError { .. } => None,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Convert from String (for simple error cases)
impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::InternalError { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_display() {
        let err = CompilerError::lex_error(
            "unexpected character: '@'".to_string(),
            SourceLocation::new(1, 7, 6),
        );
        assert_eq!(
            format!("{}", err),
            "lexical error at 1:7: unexpected character: '@'"
        );
    }

    #[test]
    fn test_parse_error_carries_location() {
        let err = CompilerError::parse_error(
            "expected `;`".to_string(),
            SourceLocation::new(2, 3, 12),
        );
        assert_eq!(err.location(), Some(&SourceLocation::new(2, 3, 12)));
    }

    #[test]
    fn test_internal_error_has_no_location() {
        let err = CompilerError::internal_error("not an lvalue".to_string());
        assert_eq!(err.location(), None);
        assert_eq!(format!("{}", err), "internal compiler error: not an lvalue");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: CompilerError = io_err.into();
        assert!(matches!(err, CompilerError::IoError { .. }));
    }
}
