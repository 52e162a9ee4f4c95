//! Recursive descent parser
//!
//! Consumes the token stream through a single forward cursor (one token
//! of lookahead, no backtracking) and builds one AST per function.
//!
//! As a side effect of parsing, each function's ordered local-variable
//! table is built: an identifier used as a bare primary is resolved
//! against the table and registered on first use. There is no
//! declaration statement, no shadowing, and no block scoping.

use crate::ast::{BinaryOp, Expr, Function, Local, LocalId, Program, Stmt, MAX_CALL_ARGS};
use crate::lexer::{Token, TokenType};
use acc_common::{CompilerError, SourceLocation, SourceSpan};
use std::collections::VecDeque;

/// Parser for the C subset
pub struct Parser {
    tokens: VecDeque<Token>,
    /// Local table of the function currently being parsed
    locals: Vec<Local>,
    /// Position of the most recently consumed token, for diagnostics
    /// after the stream runs out
    last_location: SourceLocation,
}

impl Parser {
    /// Create a new parser over a token stream produced by the lexer
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into(),
            locals: Vec::new(),
            last_location: SourceLocation::start(),
        }
    }

    /// Peek at current token without consuming
    fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    /// Get current token and advance
    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.pop_front();
        if let Some(token) = &token {
            self.last_location = token.span.start.clone();
        }
        token
    }

    /// Check if current token matches expected type
    fn check(&self, token_type: &TokenType) -> bool {
        if let Some(token) = self.peek() {
            std::mem::discriminant(&token.token_type) == std::mem::discriminant(token_type)
        } else {
            matches!(token_type, TokenType::EndOfFile)
        }
    }

    /// Consume token if it matches expected type
    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect and consume a specific token type
    fn expect(&mut self, token_type: TokenType, context: &str) -> Result<Token, CompilerError> {
        match self.advance() {
            Some(token)
                if std::mem::discriminant(&token.token_type)
                    == std::mem::discriminant(&token_type) =>
            {
                Ok(token)
            }
            Some(token) => Err(CompilerError::parse_error(
                format!(
                    "expected `{}` in {}, found `{}`",
                    token_type, context, token.token_type
                ),
                token.span.start,
            )),
            None => Err(CompilerError::parse_error(
                format!("expected `{}` in {}", token_type, context),
                self.last_location.clone(),
            )),
        }
    }

    /// Expect and consume an identifier, returning its name and span
    fn expect_identifier(&mut self, context: &str) -> Result<(String, SourceSpan), CompilerError> {
        match self.advance() {
            Some(Token {
                token_type: TokenType::Identifier(name),
                span,
            }) => Ok((name, span)),
            Some(token) => Err(CompilerError::parse_error(
                format!(
                    "expected an identifier in {}, found `{}`",
                    context, token.token_type
                ),
                token.span.start,
            )),
            None => Err(CompilerError::parse_error(
                format!("expected an identifier in {}", context),
                self.last_location.clone(),
            )),
        }
    }

    /// Get current location for error reporting
    fn current_location(&self) -> SourceLocation {
        match self.peek() {
            Some(token) => token.span.start.clone(),
            None => self.last_location.clone(),
        }
    }

    /// Register a variable on first use, or return the existing entry.
    /// Re-mentioning a name always refers to the same storage slot.
    fn register_local(&mut self, name: String) -> LocalId {
        if let Some(id) = self.locals.iter().position(|local| local.name == name) {
            id
        } else {
            self.locals.push(Local { name, offset: 0 });
            self.locals.len() - 1
        }
    }

    /// program := function*
    pub fn parse_program(&mut self) -> Result<Program, CompilerError> {
        let mut functions = Vec::new();

        while !self.check(&TokenType::EndOfFile) {
            functions.push(self.parse_function()?);
        }

        log::debug!("parsed {} functions", functions.len());
        Ok(Program { functions })
    }

    /// function := identifier "(" params? ")" "{" stmt* "}"
    ///
    /// Parameters are registered in the local table exactly like
    /// body-local variables; the code generator spills the incoming
    /// argument registers into their slots.
    fn parse_function(&mut self) -> Result<Function, CompilerError> {
        let (name, _) = self.expect_identifier("function definition")?;
        self.expect(TokenType::LeftParen, "function definition")?;

        let mut params = Vec::new();
        while !self.check(&TokenType::RightParen) {
            let (param_name, span) = self.expect_identifier("parameter list")?;
            if params.len() == MAX_CALL_ARGS {
                return Err(CompilerError::parse_error(
                    format!("more than {} parameters", MAX_CALL_ARGS),
                    span.start,
                ));
            }
            // Only parameters are registered so far, so any existing
            // entry is a repeated name; letting it through would make
            // both register spills target one slot.
            if self.locals.iter().any(|local| local.name == param_name) {
                return Err(CompilerError::parse_error(
                    format!("duplicate parameter `{}`", param_name),
                    span.start,
                ));
            }
            params.push(self.register_local(param_name));
            self.match_token(&TokenType::Comma);
        }
        self.expect(TokenType::RightParen, "parameter list")?;

        self.expect(TokenType::LeftBrace, "function body")?;
        let mut body = Vec::new();
        while !self.check(&TokenType::RightBrace) {
            if self.check(&TokenType::EndOfFile) {
                return Err(CompilerError::parse_error(
                    "expected `}` to close function body".to_string(),
                    self.current_location(),
                ));
            }
            body.push(self.parse_stmt()?);
        }
        self.expect(TokenType::RightBrace, "function body")?;

        Ok(Function {
            name,
            params,
            body,
            locals: std::mem::take(&mut self.locals),
            frame_size: 0,
        })
    }

    /// stmt := "return" expr ";"
    ///       | "if" "(" expr ")" stmt ("else" stmt)?
    ///       | "while" "(" expr ")" stmt
    ///       | "for" "(" expr? ";" expr? ";" expr? ")" stmt
    ///       | "{" stmt* "}"
    ///       | ";"
    ///       | expr ";"
    fn parse_stmt(&mut self) -> Result<Stmt, CompilerError> {
        // Null statement, e.g. the empty body of `for (...);`
        if self.match_token(&TokenType::Semicolon) {
            return Ok(Stmt::Block(Vec::new()));
        }

        if self.match_token(&TokenType::Return) {
            let expr = self.parse_expr()?;
            self.expect(TokenType::Semicolon, "return statement")?;
            return Ok(Stmt::Return(expr));
        }

        if self.match_token(&TokenType::If) {
            self.expect(TokenType::LeftParen, "if condition")?;
            let cond = self.parse_expr()?;
            self.expect(TokenType::RightParen, "if condition")?;
            let then = Box::new(self.parse_stmt()?);
            let els = if self.match_token(&TokenType::Else) {
                Some(Box::new(self.parse_stmt()?))
            } else {
                None
            };
            return Ok(Stmt::If { cond, then, els });
        }

        if self.match_token(&TokenType::While) {
            self.expect(TokenType::LeftParen, "while condition")?;
            let cond = self.parse_expr()?;
            self.expect(TokenType::RightParen, "while condition")?;
            let body = Box::new(self.parse_stmt()?);
            return Ok(Stmt::While { cond, body });
        }

        if self.match_token(&TokenType::For) {
            self.expect(TokenType::LeftParen, "for clauses")?;

            let init = if self.check(&TokenType::Semicolon) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(TokenType::Semicolon, "for clauses")?;

            let cond = if self.check(&TokenType::Semicolon) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(TokenType::Semicolon, "for clauses")?;

            let step = if self.check(&TokenType::RightParen) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(TokenType::RightParen, "for clauses")?;

            let body = Box::new(self.parse_stmt()?);
            return Ok(Stmt::For {
                init,
                cond,
                step,
                body,
            });
        }

        if self.match_token(&TokenType::LeftBrace) {
            let mut stmts = Vec::new();
            while !self.check(&TokenType::RightBrace) {
                if self.check(&TokenType::EndOfFile) {
                    return Err(CompilerError::parse_error(
                        "expected `}` to close block".to_string(),
                        self.current_location(),
                    ));
                }
                stmts.push(self.parse_stmt()?);
            }
            self.expect(TokenType::RightBrace, "block")?;
            return Ok(Stmt::Block(stmts));
        }

        let expr = self.parse_expr()?;
        self.expect(TokenType::Semicolon, "expression statement")?;
        Ok(Stmt::Expr(expr))
    }

    /// expr := assign
    fn parse_expr(&mut self) -> Result<Expr, CompilerError> {
        self.parse_assign()
    }

    /// assign := equality ("=" assign)?
    ///
    /// Right-associative, so `a = b = 1` assigns through. The target
    /// must be a variable; rejecting anything else here keeps the code
    /// generator's address-of path unreachable for user input.
    fn parse_assign(&mut self) -> Result<Expr, CompilerError> {
        let node = self.parse_equality()?;

        if self.check(&TokenType::Equal) {
            let eq_location = self.current_location();
            self.advance();

            if !matches!(node, Expr::Var(_)) {
                return Err(CompilerError::parse_error(
                    "invalid assignment target, expected a variable".to_string(),
                    eq_location,
                ));
            }

            let value = self.parse_assign()?;
            return Ok(Expr::Assign {
                target: Box::new(node),
                value: Box::new(value),
            });
        }

        Ok(node)
    }

    /// equality := relational (("==" | "!=") relational)*
    fn parse_equality(&mut self) -> Result<Expr, CompilerError> {
        let mut node = self.parse_relational()?;

        loop {
            if self.match_token(&TokenType::EqualEqual) {
                node = binary(BinaryOp::Equal, node, self.parse_relational()?);
            } else if self.match_token(&TokenType::BangEqual) {
                node = binary(BinaryOp::NotEqual, node, self.parse_relational()?);
            } else {
                return Ok(node);
            }
        }
    }

    /// relational := additive (("<" | "<=" | ">" | ">=") additive)*
    ///
    /// `>` and `>=` are rewritten by swapping operands into `<` and
    /// `<=`; they never exist as distinct node kinds.
    fn parse_relational(&mut self) -> Result<Expr, CompilerError> {
        let mut node = self.parse_additive()?;

        loop {
            if self.match_token(&TokenType::Less) {
                node = binary(BinaryOp::Less, node, self.parse_additive()?);
            } else if self.match_token(&TokenType::LessEqual) {
                node = binary(BinaryOp::LessEqual, node, self.parse_additive()?);
            } else if self.match_token(&TokenType::Greater) {
                node = binary(BinaryOp::Less, self.parse_additive()?, node);
            } else if self.match_token(&TokenType::GreaterEqual) {
                node = binary(BinaryOp::LessEqual, self.parse_additive()?, node);
            } else {
                return Ok(node);
            }
        }
    }

    /// additive := term (("+" | "-") term)*
    fn parse_additive(&mut self) -> Result<Expr, CompilerError> {
        let mut node = self.parse_term()?;

        loop {
            if self.match_token(&TokenType::Plus) {
                node = binary(BinaryOp::Add, node, self.parse_term()?);
            } else if self.match_token(&TokenType::Minus) {
                node = binary(BinaryOp::Sub, node, self.parse_term()?);
            } else {
                return Ok(node);
            }
        }
    }

    /// term := unary (("*" | "/") unary)*
    fn parse_term(&mut self) -> Result<Expr, CompilerError> {
        let mut node = self.parse_unary()?;

        loop {
            if self.match_token(&TokenType::Star) {
                node = binary(BinaryOp::Mul, node, self.parse_unary()?);
            } else if self.match_token(&TokenType::Slash) {
                node = binary(BinaryOp::Div, node, self.parse_unary()?);
            } else {
                return Ok(node);
            }
        }
    }

    /// unary := ("+" | "-")? unary | primary
    ///
    /// `-x` is desugared to `0 - x`; there is no negate node kind.
    fn parse_unary(&mut self) -> Result<Expr, CompilerError> {
        if self.match_token(&TokenType::Plus) {
            return self.parse_unary();
        }
        if self.match_token(&TokenType::Minus) {
            return Ok(binary(BinaryOp::Sub, Expr::Num(0), self.parse_unary()?));
        }
        self.parse_primary()
    }

    /// primary := "(" expr ")" | identifier ("(" args? ")")? | number
    fn parse_primary(&mut self) -> Result<Expr, CompilerError> {
        if self.match_token(&TokenType::LeftParen) {
            let expr = self.parse_expr()?;
            self.expect(TokenType::RightParen, "parenthesized expression")?;
            return Ok(expr);
        }

        match self.advance() {
            Some(Token {
                token_type: TokenType::IntLiteral(value),
                ..
            }) => Ok(Expr::Num(value)),

            Some(Token {
                token_type: TokenType::Identifier(name),
                ..
            }) => {
                if self.match_token(&TokenType::LeftParen) {
                    self.parse_call_args(name)
                } else {
                    Ok(Expr::Var(self.register_local(name)))
                }
            }

            Some(token) => Err(CompilerError::parse_error(
                format!("expected an expression, found `{}`", token.token_type),
                token.span.start,
            )),

            None => Err(CompilerError::parse_error(
                "expected an expression".to_string(),
                self.last_location.clone(),
            )),
        }
    }

    /// Parse the argument list of a call; the opening `(` is consumed.
    /// Commas between arguments are optional separators.
    fn parse_call_args(&mut self, name: String) -> Result<Expr, CompilerError> {
        let mut args = Vec::new();

        while !self.check(&TokenType::RightParen) {
            if args.len() == MAX_CALL_ARGS {
                return Err(CompilerError::parse_error(
                    format!("function call with more than {} arguments", MAX_CALL_ARGS),
                    self.current_location(),
                ));
            }
            args.push(self.parse_expr()?);
            self.match_token(&TokenType::Comma);
        }
        self.expect(TokenType::RightParen, "argument list")?;

        Ok(Expr::Call { name, args })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Result<Program, CompilerError> {
        let tokens = Lexer::new(source).tokenize()?;
        Parser::new(tokens).parse_program()
    }

    fn parse_single(source: &str) -> Function {
        let mut program = parse(source).unwrap();
        assert_eq!(program.functions.len(), 1);
        program.functions.pop().unwrap()
    }

    #[test]
    fn test_minimal_function() {
        let func = parse_single("main() { return 0; }");
        assert_eq!(func.name, "main");
        assert!(func.params.is_empty());
        assert_eq!(func.body, vec![Stmt::Return(Expr::Num(0))]);
    }

    #[test]
    fn test_operator_precedence() {
        // 1+2*3 parses as 1+(2*3)
        let func = parse_single("main() { return 1+2*3; }");
        match &func.body[0] {
            Stmt::Return(Expr::Binary { op, lhs, rhs }) => {
                assert_eq!(*op, BinaryOp::Add);
                assert_eq!(**lhs, Expr::Num(1));
                assert!(matches!(
                    **rhs,
                    Expr::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        // (1+2)*3 parses as (1+2)*3
        let func = parse_single("main() { return (1+2)*3; }");
        match &func.body[0] {
            Stmt::Return(Expr::Binary { op, lhs, .. }) => {
                assert_eq!(*op, BinaryOp::Mul);
                assert!(matches!(
                    **lhs,
                    Expr::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_greater_rewritten_as_swapped_less() {
        // a > b becomes b < a
        let func = parse_single("main() { a = 1; b = 2; return a > b; }");
        match &func.body[2] {
            Stmt::Return(Expr::Binary { op, lhs, rhs }) => {
                assert_eq!(*op, BinaryOp::Less);
                assert_eq!(**lhs, Expr::Var(1)); // b
                assert_eq!(**rhs, Expr::Var(0)); // a
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_desugars_to_zero_minus() {
        let func = parse_single("main() { return -5; }");
        match &func.body[0] {
            Stmt::Return(Expr::Binary { op, lhs, rhs }) => {
                assert_eq!(*op, BinaryOp::Sub);
                assert_eq!(**lhs, Expr::Num(0));
                assert_eq!(**rhs, Expr::Num(5));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_unary_plus_is_noop() {
        let func = parse_single("main() { return +7; }");
        assert_eq!(func.body[0], Stmt::Return(Expr::Num(7)));
    }

    #[test]
    fn test_implicit_declaration_by_first_use() {
        let func = parse_single("main() { a = 3; b = 5; return a + b; }");
        assert_eq!(func.locals.len(), 2);
        assert_eq!(func.locals[0].name, "a");
        assert_eq!(func.locals[1].name, "b");
    }

    #[test]
    fn test_same_name_shares_one_slot() {
        let func = parse_single("main() { a = 1; a = a + 1; return a; }");
        assert_eq!(func.locals.len(), 1);
        assert_eq!(func.locals[0].name, "a");
    }

    #[test]
    fn test_chained_assignment_is_right_associative() {
        let func = parse_single("main() { a = b = 1; return a; }");
        match &func.body[0] {
            Stmt::Expr(Expr::Assign { target, value }) => {
                assert_eq!(**target, Expr::Var(0)); // a
                assert!(matches!(**value, Expr::Assign { .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_if_else_binding() {
        let func = parse_single("main() { if (1) return 1; else return 2; }");
        match &func.body[0] {
            Stmt::If { cond, els, .. } => {
                assert_eq!(*cond, Expr::Num(1));
                assert!(els.is_some());
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_for_with_all_clauses_empty() {
        let func = parse_single("main() { for (;;) return 1; }");
        match &func.body[0] {
            Stmt::For {
                init, cond, step, ..
            } => {
                assert!(init.is_none());
                assert!(cond.is_none());
                assert!(step.is_none());
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_for_with_null_statement_body() {
        let func = parse_single("main() { for (i = 0; i < 3; i = i + 1); return i; }");
        match &func.body[0] {
            Stmt::For { body, .. } => assert_eq!(**body, Stmt::Block(Vec::new())),
            other => panic!("unexpected statement: {:?}", other),
        }
        assert_eq!(func.body[1], Stmt::Return(Expr::Var(0)));
    }

    #[test]
    fn test_for_with_empty_body() {
        let func = parse_single("main() { for (i = 0; i < 3; i = i + 1) {} return i; }");
        match &func.body[0] {
            Stmt::For { body, .. } => assert_eq!(**body, Stmt::Block(Vec::new())),
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_function_parameters_are_locals() {
        let func = parse_single("add(a, b) { return a + b; }");
        assert_eq!(func.params, vec![0, 1]);
        assert_eq!(func.locals.len(), 2);
    }

    #[test]
    fn test_parameters_without_commas() {
        let func = parse_single("add(a b) { return a + b; }");
        assert_eq!(func.params.len(), 2);
    }

    #[test]
    fn test_call_with_arguments() {
        let func = parse_single("main() { return add(1, 2); }");
        match &func.body[0] {
            Stmt::Return(Expr::Call { name, args }) => {
                assert_eq!(name, "add");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_call_with_seven_arguments_is_rejected() {
        let err = parse("main() { return f(1, 2, 3, 4, 5, 6, 7); }").unwrap_err();
        match err {
            CompilerError::ParseError { message, .. } => {
                assert!(message.contains("more than 6 arguments"), "{}", message);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_parameter_names_are_rejected() {
        let err = parse("f(a, a) { return a; }").unwrap_err();
        match err {
            CompilerError::ParseError { message, location } => {
                assert!(message.contains("duplicate parameter `a`"), "{}", message);
                assert_eq!(location.line, 1);
                assert_eq!(location.column, 6);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_seven_parameters_are_rejected() {
        assert!(parse("f(a, b, c, d, e, g, h) { return 0; }").is_err());
    }

    #[test]
    fn test_multiple_functions_keep_separate_locals() {
        let program = parse("one() { x = 1; return x; } two() { y = 2; return y; }").unwrap();
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.functions[0].locals.len(), 1);
        assert_eq!(program.functions[0].locals[0].name, "x");
        assert_eq!(program.functions[1].locals.len(), 1);
        assert_eq!(program.functions[1].locals[0].name, "y");
    }

    #[test]
    fn test_missing_semicolon_reports_position() {
        let err = parse("main() { return 1 }").unwrap_err();
        match err {
            CompilerError::ParseError { location, message } => {
                assert!(message.contains(';'), "{}", message);
                assert_eq!(location.line, 1);
                assert_eq!(location.column, 19);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_to_non_lvalue_is_rejected() {
        let err = parse("main() { 1 = 2; }").unwrap_err();
        match err {
            CompilerError::ParseError { message, .. } => {
                assert!(message.contains("assignment target"), "{}", message);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_function_body() {
        assert!(parse("main() { return 1;").is_err());
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert!(parse("main() { return 1; } ;").is_err());
    }
}
