use std::convert::TryFrom;
use std::error::Error;
use std::fmt::{self, Display};

const OPERATOR_BYTES: &str = "+-*/%^<>=!&|";

const fn build_operator_table() -> [bool; 256] {
    let mut tbl = [false; 256];
    let bytes = OPERATOR_BYTES.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        tbl[bytes[i] as usize] = true;
        i += 1;
    }
    tbl
}
static OPERATOR_TABLE: [bool; 256] = build_operator_table();

#[inline(always)]
fn is_operator_byte(c: u8) -> bool {
    OPERATOR_TABLE[c as usize]
}

static TWO_BYTE_OPERATORS: &[&str] = &["==", "!=", "<>", "<=", ">=", "&&", "||"];

/// A custom error type for the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerError {
    pub message: String,
    pub pos: usize,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenizerError: {}", self.message)
    }
}

impl Error for TokenizerError {}

impl From<TokenizerError> for formcalc_common::EvalError {
    fn from(e: TokenizerError) -> Self {
        formcalc_common::EvalError::Tokenize {
            message: e.message,
            position: e.pos,
        }
    }
}

/// The type of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Number,
    Text,
    Identifier,
    Operator,
    OpenParen,
    CloseParen,
    Separator,
    Question,
    Colon,
}

impl Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A token in a bound-field expression.
///
/// `value` holds the source slice, except for text literals where it holds the
/// unquoted, unescaped content.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: String,
    pub token_type: TokenType,
    pub start: usize,
    pub end: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} value: {}>", self.token_type, self.value)
    }
}

impl Token {
    pub fn new(value: String, token_type: TokenType, start: usize, end: usize) -> Self {
        Token {
            value,
            token_type,
            start,
            end,
        }
    }

    fn from_slice(source: &str, token_type: TokenType, start: usize, end: usize) -> Self {
        Token {
            value: source[start..end].to_string(),
            token_type,
            start,
            end,
        }
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.token_type == TokenType::Operator && self.value == op
    }
}

/// A tokenizer for bound-field expressions such as `harga * qty` or
/// `sumif(rows_?_status, "paid", rows_?_amount)`.
#[derive(Debug)]
pub struct Tokenizer {
    expression: String,
    pub items: Vec<Token>,
    offset: usize,
}

impl Tokenizer {
    /// Create a new tokenizer and immediately tokenize the expression.
    pub fn new(expression: &str) -> Result<Self, TokenizerError> {
        let mut tokenizer = Tokenizer {
            expression: expression.to_string(),
            items: Vec::with_capacity(expression.len() / 2),
            offset: 0,
        };
        tokenizer.parse()?;
        Ok(tokenizer)
    }

    #[inline]
    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.expression.as_bytes().get(pos).copied()
    }

    fn parse(&mut self) -> Result<(), TokenizerError> {
        // A leading '=' is tolerated so spreadsheet-style attributes work too.
        let bytes = self.expression.as_bytes();
        let mut start = 0;
        while start < bytes.len() && bytes[start].is_ascii_whitespace() {
            start += 1;
        }
        if bytes.get(start) == Some(&b'=') && bytes.get(start + 1) != Some(&b'=') {
            start += 1;
        }
        self.offset = start;

        while let Some(curr) = self.byte_at(self.offset) {
            match curr {
                b' ' | b'\t' | b'\n' | b'\r' => self.offset += 1,
                b'0'..=b'9' => self.parse_number()?,
                b'.' if self.byte_at(self.offset + 1).is_some_and(|b| b.is_ascii_digit()) => {
                    self.parse_number()?
                }
                b'"' | b'\'' => self.parse_string()?,
                b'(' => self.push_single(TokenType::OpenParen),
                b')' => self.push_single(TokenType::CloseParen),
                b',' | b';' => self.push_single(TokenType::Separator),
                b'?' => self.push_single(TokenType::Question),
                b':' => self.push_single(TokenType::Colon),
                c if is_operator_byte(c) => self.parse_operator()?,
                c if c == b'_' || c == b'$' || c.is_ascii_alphabetic() || c >= 0x80 => {
                    self.parse_identifier()
                }
                _ => {
                    return Err(TokenizerError {
                        message: format!(
                            "Unexpected character '{}'",
                            self.expression[self.offset..].chars().next().unwrap_or('?')
                        ),
                        pos: self.offset,
                    });
                }
            }
        }

        Ok(())
    }

    fn push_single(&mut self, token_type: TokenType) {
        let start = self.offset;
        self.offset += 1;
        self.items.push(Token::from_slice(
            &self.expression,
            token_type,
            start,
            self.offset,
        ));
    }

    fn parse_number(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        let mut dot_seen = false;
        while let Some(b) = self.byte_at(self.offset) {
            match b {
                b'0'..=b'9' => self.offset += 1,
                b'.' if !dot_seen => {
                    dot_seen = true;
                    self.offset += 1;
                }
                _ => break,
            }
        }
        // Scientific notation: 1.5e3, 2E-4
        if matches!(self.byte_at(self.offset), Some(b'e' | b'E')) {
            let mut lookahead = self.offset + 1;
            if matches!(self.byte_at(lookahead), Some(b'+' | b'-')) {
                lookahead += 1;
            }
            if self.byte_at(lookahead).is_some_and(|b| b.is_ascii_digit()) {
                self.offset = lookahead;
                while self.byte_at(self.offset).is_some_and(|b| b.is_ascii_digit()) {
                    self.offset += 1;
                }
            }
        }
        // `12abc` is not a number followed by an identifier.
        if let Some(b) = self.byte_at(self.offset)
            && (b == b'_' || b.is_ascii_alphabetic())
        {
            return Err(TokenizerError {
                message: format!(
                    "Invalid number literal '{}'",
                    &self.expression[start..=self.offset]
                ),
                pos: start,
            });
        }
        self.items.push(Token::from_slice(
            &self.expression,
            TokenType::Number,
            start,
            self.offset,
        ));
        Ok(())
    }

    /// Identifiers may carry a `?` row wildcard, but only directly after an
    /// underscore (`rows_?_amount`); elsewhere `?` is the ternary operator.
    fn parse_identifier(&mut self) {
        let start = self.offset;
        while let Some(b) = self.byte_at(self.offset) {
            let accept = match b {
                b'_' | b'$' | b'0'..=b'9' => true,
                b'?' => self.offset > start && self.byte_at(self.offset - 1) == Some(b'_'),
                b if b.is_ascii_alphabetic() => true,
                b if b >= 0x80 => true,
                _ => false,
            };
            if !accept {
                break;
            }
            self.offset += 1;
        }
        self.items.push(Token::from_slice(
            &self.expression,
            TokenType::Identifier,
            start,
            self.offset,
        ));
    }

    /// Parse a quoted text literal. Either quote style works; the delimiter is
    /// escaped by doubling it or with a backslash.
    fn parse_string(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        let delim = self.expression.as_bytes()[start];
        let mut content = String::new();
        let mut pos = start + 1;
        let rest = &self.expression[pos..];
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let c_len = c.len_utf8();
            if c == '\\' {
                if let Some((_, escaped)) = chars.next() {
                    content.push(escaped);
                    pos = start + 1 + i + 1 + escaped.len_utf8();
                    continue;
                }
                break;
            }
            if c as u32 == delim as u32 {
                if chars.peek().is_some_and(|&(_, next)| next as u32 == delim as u32) {
                    chars.next();
                    content.push(c);
                    continue;
                }
                self.offset = start + 1 + i + c_len;
                self.items.push(Token::new(
                    content,
                    TokenType::Text,
                    start,
                    self.offset,
                ));
                return Ok(());
            }
            content.push(c);
            pos = start + 1 + i + c_len;
        }
        Err(TokenizerError {
            message: "Reached end of expression while parsing string".to_string(),
            pos: pos.max(start),
        })
    }

    fn parse_operator(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        if let Some(pair) = self.expression.get(start..start + 2)
            && TWO_BYTE_OPERATORS.contains(&pair)
        {
            self.offset += 2;
            self.items.push(Token::from_slice(
                &self.expression,
                TokenType::Operator,
                start,
                self.offset,
            ));
            return Ok(());
        }
        let curr = self.expression.as_bytes()[start];
        if curr == b'&' || curr == b'|' {
            return Err(TokenizerError {
                message: format!("Unsupported operator '{}'", curr as char),
                pos: start,
            });
        }
        self.push_single(TokenType::Operator);
        Ok(())
    }

    /// Reconstructs an expression string from the tokens.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.items.iter().enumerate() {
            if i > 0 && needs_space(&self.items[i - 1], token) {
                out.push(' ');
            }
            match token.token_type {
                TokenType::Text => {
                    out.push('"');
                    out.push_str(&token.value.replace('"', "\"\""));
                    out.push('"');
                }
                _ => out.push_str(&token.value),
            }
        }
        out
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

fn needs_space(prev: &Token, next: &Token) -> bool {
    use TokenType::*;
    match (prev.token_type, next.token_type) {
        (OpenParen, _) | (_, CloseParen) | (_, Separator) => false,
        (Identifier, OpenParen) => false,
        (Separator, _) => true,
        (Operator, _) | (_, Operator) => true,
        (Question, _) | (_, Question) | (Colon, _) | (_, Colon) => true,
        _ => false,
    }
}

impl TryFrom<&str> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Tokenizer::new(value)
    }
}

impl TryFrom<String> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tokenizer::new(&value)
    }
}
