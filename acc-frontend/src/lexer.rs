//! Lexer for the C subset
//!
//! Tokenizes source text into a stream of tokens in one left-to-right
//! scan. Handles keywords, punctuators, integer literals, and
//! identifiers. The token stream always ends with an end-of-input marker.

use acc_common::{CompilerError, SourceLocation, SourceSpan};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Token types for the C subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenType {
    /// Integer literal with its decoded value
    IntLiteral(i64),

    /// Identifier
    Identifier(String),

    // Keywords
    Return,
    If,
    Else,
    While,
    For,

    // Operators
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Equal,        // =
    Less,         // <
    Greater,      // >
    LessEqual,    // <=
    GreaterEqual, // >=
    EqualEqual,   // ==
    BangEqual,    // !=

    // Delimiters
    LeftParen,  // (
    RightParen, // )
    LeftBrace,  // {
    RightBrace, // }
    Semicolon,  // ;
    Comma,      // ,

    // Special
    EndOfFile,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::IntLiteral(n) => write!(f, "{}", n),
            TokenType::Identifier(s) => write!(f, "{}", s),

            TokenType::Return => write!(f, "return"),
            TokenType::If => write!(f, "if"),
            TokenType::Else => write!(f, "else"),
            TokenType::While => write!(f, "while"),
            TokenType::For => write!(f, "for"),

            TokenType::Plus => write!(f, "+"),
            TokenType::Minus => write!(f, "-"),
            TokenType::Star => write!(f, "*"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Equal => write!(f, "="),
            TokenType::Less => write!(f, "<"),
            TokenType::Greater => write!(f, ">"),
            TokenType::LessEqual => write!(f, "<="),
            TokenType::GreaterEqual => write!(f, ">="),
            TokenType::EqualEqual => write!(f, "=="),
            TokenType::BangEqual => write!(f, "!="),

            TokenType::LeftParen => write!(f, "("),
            TokenType::RightParen => write!(f, ")"),
            TokenType::LeftBrace => write!(f, "{{"),
            TokenType::RightBrace => write!(f, "}}"),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Comma => write!(f, ","),

            TokenType::EndOfFile => write!(f, "end of input"),
        }
    }
}

/// A token with location information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub span: SourceSpan,
}

impl Token {
    pub fn new(token_type: TokenType, span: SourceSpan) -> Self {
        Self { token_type, span }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.token_type, self.span.start)
    }
}

/// Lexer for the C subset
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    keywords: HashMap<String, TokenType>,
}

impl Lexer {
    /// Create a new lexer
    pub fn new(input: &str) -> Self {
        let keywords = [
            ("return", TokenType::Return),
            ("if", TokenType::If),
            ("else", TokenType::Else),
            ("while", TokenType::While),
            ("for", TokenType::For),
        ]
        .into_iter()
        .map(|(kw, token_type)| (kw.to_string(), token_type))
        .collect();

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            keywords,
        }
    }

    /// Get current character
    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(ch)
        } else {
            None
        }
    }

    /// Consume the following character if it matches `expected`
    fn match_char(&mut self, expected: char) -> bool {
        if self.current_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Get current location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.position)
    }

    /// Skip whitespace
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Tokenize an identifier or keyword.
    ///
    /// Maximal munch also gives keyword/identifier disambiguation for
    /// free: `returnx` scans as one identifier, never `return` + `x`.
    fn tokenize_identifier(&mut self) -> TokenType {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(keyword_token) = self.keywords.get(&identifier) {
            keyword_token.clone()
        } else {
            TokenType::Identifier(identifier)
        }
    }

    /// Tokenize an integer literal
    fn tokenize_integer(&mut self) -> Result<TokenType, CompilerError> {
        let start_location = self.current_location();
        let mut number = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let value = number.parse::<i64>().map_err(|_| {
            CompilerError::lex_error(
                format!("integer literal out of range: {}", number),
                start_location,
            )
        })?;

        Ok(TokenType::IntLiteral(value))
    }

    /// Get next token
    pub fn next_token(&mut self) -> Result<Token, CompilerError> {
        self.skip_whitespace();

        let start_location = self.current_location();

        let token_type = match self.current_char() {
            None => TokenType::EndOfFile,

            Some(ch) if ch.is_ascii_alphabetic() => self.tokenize_identifier(),

            Some(ch) if ch.is_ascii_digit() => self.tokenize_integer()?,

            Some('+') => {
                self.advance();
                TokenType::Plus
            }
            Some('-') => {
                self.advance();
                TokenType::Minus
            }
            Some('*') => {
                self.advance();
                TokenType::Star
            }
            Some('/') => {
                self.advance();
                TokenType::Slash
            }

            // Two-character punctuators are matched greedily so that
            // `==` is never split into two `=` tokens.
            Some('=') => {
                self.advance();
                if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                }
            }
            Some('<') => {
                self.advance();
                if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                }
            }
            Some('>') => {
                self.advance();
                if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                }
            }
            Some('!') => {
                self.advance();
                if self.match_char('=') {
                    TokenType::BangEqual
                } else {
                    return Err(CompilerError::lex_error(
                        "unexpected character: '!'".to_string(),
                        start_location,
                    ));
                }
            }

            Some('(') => {
                self.advance();
                TokenType::LeftParen
            }
            Some(')') => {
                self.advance();
                TokenType::RightParen
            }
            Some('{') => {
                self.advance();
                TokenType::LeftBrace
            }
            Some('}') => {
                self.advance();
                TokenType::RightBrace
            }
            Some(';') => {
                self.advance();
                TokenType::Semicolon
            }
            Some(',') => {
                self.advance();
                TokenType::Comma
            }

            Some(ch) => {
                return Err(CompilerError::lex_error(
                    format!("unexpected character: '{}'", ch),
                    start_location,
                ));
            }
        };

        let end_location = self.current_location();
        let span = SourceSpan::new(start_location, end_location);

        Ok(Token::new(token_type, span))
    }

    /// Tokenize the entire input into a vector of tokens.
    ///
    /// Never returns a partial sequence: the first unrecognized
    /// character aborts with a lexical error.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::EndOfFile);
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        log::debug!("tokenized {} tokens", tokens.len());
        Ok(tokens)
    }
}
