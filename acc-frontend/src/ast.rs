//! Abstract Syntax Tree definitions
//!
//! The AST is a set of tagged variants with one case per node kind, each
//! carrying exactly the fields that kind needs. The tree is single-owner:
//! children are held by `Box` or `Vec` and no node has two parents.
//!
//! Unary negation never appears here: the parser desugars `-x` into
//! `0 - x`. Likewise `>` and `>=` are rewritten by operand swap into
//! `<` and `<=`, so only the latter two exist as operators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a local variable within its function's table
pub type LocalId = usize;

/// The calling convention passes at most this many integer arguments in
/// registers; the parser rejects calls and parameter lists beyond it.
pub const MAX_CALL_ARGS: usize = 6;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison (producing 0 or 1)
    Equal,
    NotEqual,
    Less,
    LessEqual,
}

impl BinaryOp {
    /// Comparison operators produce a 0/1 boolean result
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal | BinaryOp::NotEqual | BinaryOp::Less | BinaryOp::LessEqual
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
        };
        write!(f, "{}", op_str)
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal
    Num(i64),

    /// Reference to a local variable
    Var(LocalId),

    /// Binary arithmetic or comparison
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Assignment; itself an expression whose value is the stored value
    Assign { target: Box<Expr>, value: Box<Expr> },

    /// Function call with at most [`MAX_CALL_ARGS`] arguments
    Call { name: String, args: Vec<Expr> },
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Expression statement; the value is discarded
    Expr(Expr),

    /// `return expr;`
    Return(Expr),

    /// `if (cond) then [else els]`
    If {
        cond: Expr,
        then: Box<Stmt>,
        els: Option<Box<Stmt>>,
    },

    /// `while (cond) body`
    While { cond: Expr, body: Box<Stmt> },

    /// `for (init; cond; step) body`; every clause may be absent, and an
    /// absent condition means the loop always enters its body
    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },

    /// `{ stmt* }`
    Block(Vec<Stmt>),
}

/// A local variable: its name and its frame offset in bytes below the
/// frame base. The offset is 0 until the frame layout resolver runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Local {
    pub name: String,
    pub offset: i32,
}

/// A function definition.
///
/// Built once by the parser; the frame layout resolver then fills in
/// local offsets and `frame_size`, after which the function is read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Parameters, as entries in the local table (registration order)
    pub params: Vec<LocalId>,
    pub body: Vec<Stmt>,
    /// Local variable table in registration order
    pub locals: Vec<Local>,
    /// Bytes of local storage, rounded up to 16; 0 until resolved
    pub frame_size: i32,
}

impl Function {
    pub fn local(&self, id: LocalId) -> &Local {
        &self.locals[id]
    }
}

/// A complete program: an ordered sequence of functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_display() {
        assert_eq!(format!("{}", BinaryOp::Add), "+");
        assert_eq!(format!("{}", BinaryOp::LessEqual), "<=");
        assert_eq!(format!("{}", BinaryOp::NotEqual), "!=");
    }

    #[test]
    fn test_comparison_classification() {
        assert!(BinaryOp::Equal.is_comparison());
        assert!(BinaryOp::Less.is_comparison());
        assert!(!BinaryOp::Add.is_comparison());
        assert!(!BinaryOp::Div.is_comparison());
    }

    #[test]
    fn test_ast_serializes_to_json() {
        let expr = Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::Num(1)),
            rhs: Box::new(Expr::Var(0)),
        };

        let json = serde_json::to_string(&expr).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, back);
    }
}
