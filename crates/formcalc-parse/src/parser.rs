use crate::tokenizer::{Token, TokenType, Tokenizer, TokenizerError};

use std::fmt::{self, Display};
use thiserror::Error;

/// A parse failure with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("ParseError at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

impl From<TokenizerError> for ParseError {
    fn from(e: TokenizerError) -> Self {
        ParseError::new(e.message, e.pos)
    }
}

impl From<ParseError> for formcalc_common::EvalError {
    fn from(e: ParseError) -> Self {
        formcalc_common::EvalError::Parse {
            message: e.message,
            position: e.position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    fn from_token(token: &Token) -> Option<Self> {
        if token.token_type != TokenType::Operator {
            return None;
        }
        Some(match token.value.as_str() {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "^" => BinaryOp::Pow,
            "==" | "=" => BinaryOp::Eq,
            "!=" | "<>" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }

    /// Binding power for infix parsing. `^` binds tighter than unary minus and
    /// is handled separately.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 5,
            BinaryOp::Pow => 6,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 3
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// The type of an AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum ASTNodeType {
    Number(f64),
    Text(String),
    Boolean(bool),
    Variable(String),
    UnaryOp {
        op: UnaryOp,
        expr: Box<ASTNode>,
    },
    BinaryOp {
        op: BinaryOp,
        left: Box<ASTNode>,
        right: Box<ASTNode>,
    },
    Conditional {
        condition: Box<ASTNode>,
        then: Box<ASTNode>,
        otherwise: Box<ASTNode>,
    },
    Function {
        name: String,
        args: Vec<ASTNode>,
    },
}

/// An AST node. `position` is the byte offset of the token that started it.
#[derive(Debug, Clone, PartialEq)]
pub struct ASTNode {
    pub node_type: ASTNodeType,
    pub position: usize,
}

impl ASTNode {
    pub fn new(node_type: ASTNodeType, position: usize) -> Self {
        ASTNode {
            node_type,
            position,
        }
    }

    /// The variable name if this node is a bare variable reference.
    pub fn as_variable(&self) -> Option<&str> {
        match &self.node_type {
            ASTNodeType::Variable(name) => Some(name),
            _ => None,
        }
    }
}

impl Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_type {
            ASTNodeType::Number(n) => write!(f, "{n}"),
            ASTNodeType::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            ASTNodeType::Boolean(b) => write!(f, "{b}"),
            ASTNodeType::Variable(name) => write!(f, "{name}"),
            ASTNodeType::UnaryOp { op, expr } => match op {
                UnaryOp::Neg => write!(f, "-{expr}"),
                UnaryOp::Plus => write!(f, "+{expr}"),
                UnaryOp::Not => write!(f, "!{expr}"),
            },
            ASTNodeType::BinaryOp { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            ASTNodeType::Conditional {
                condition,
                then,
                otherwise,
            } => write!(f, "({condition} ? {then} : {otherwise})"),
            ASTNodeType::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Recursive-descent parser over the token stream.
///
/// Grammar, loosest binding first:
/// `?:`, `||`, `&&`, comparisons, `+ -`, `* / %`, unary `- + !`, `^`, primary.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    source_len: usize,
    depth: usize,
}

/// Deepest nesting of parentheses, calls and prefix operators accepted.
pub const MAX_NESTING_DEPTH: usize = 128;

impl Parser {
    pub fn new(tokens: Vec<Token>, source_len: usize) -> Self {
        Parser {
            tokens,
            position: 0,
            source_len,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<ASTNode, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::new("Empty expression", 0));
        }
        let node = self.parse_conditional()?;
        if let Some(token) = self.peek() {
            return Err(ParseError::new(
                format!("Unexpected token '{}'", token.value),
                token.start,
            ));
        }
        Ok(node)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn end_position(&self) -> usize {
        self.source_len
    }

    fn expect(&mut self, token_type: TokenType, what: &str) -> Result<Token, ParseError> {
        match self.next() {
            Some(token) if token.token_type == token_type => Ok(token),
            Some(token) => Err(ParseError::new(
                format!("Expected {what}, found '{}'", token.value),
                token.start,
            )),
            None => Err(ParseError::new(
                format!("Expected {what}, reached end of expression"),
                self.end_position(),
            )),
        }
    }

    fn parse_conditional(&mut self) -> Result<ASTNode, ParseError> {
        self.descend()?;
        let node = self.parse_conditional_inner();
        self.depth -= 1;
        node
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            let at = self.peek().map_or(self.end_position(), |t| t.start);
            return Err(ParseError::new(
                format!("Expression nested deeper than {MAX_NESTING_DEPTH} levels"),
                at,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_conditional_inner(&mut self) -> Result<ASTNode, ParseError> {
        let condition = self.parse_binary(1)?;
        if self
            .peek()
            .is_some_and(|t| t.token_type == TokenType::Question)
        {
            self.next();
            let then = self.parse_conditional()?;
            self.expect(TokenType::Colon, "':'")?;
            let otherwise = self.parse_conditional()?;
            let position = condition.position;
            return Ok(ASTNode::new(
                ASTNodeType::Conditional {
                    condition: Box::new(condition),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                },
                position,
            ));
        }
        Ok(condition)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<ASTNode, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let Some(op) = self.peek().and_then(BinaryOp::from_token) else {
                break;
            };
            // `^` is consumed by `parse_power`; anything left here is misplaced.
            if op == BinaryOp::Pow {
                break;
            }
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.next();
            let right = self.parse_binary(precedence + 1)?;
            let position = left.position;
            left = ASTNode::new(
                ASTNodeType::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                position,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ASTNode, ParseError> {
        let prefix = match self.peek() {
            Some(t) if t.is_operator("-") => Some((UnaryOp::Neg, t.start)),
            Some(t) if t.is_operator("+") => Some((UnaryOp::Plus, t.start)),
            Some(t) if t.is_operator("!") => Some((UnaryOp::Not, t.start)),
            _ => None,
        };
        if let Some((op, start)) = prefix {
            self.next();
            self.descend()?;
            let expr = self.parse_unary();
            self.depth -= 1;
            let expr = expr?;
            return Ok(ASTNode::new(
                ASTNodeType::UnaryOp {
                    op,
                    expr: Box::new(expr),
                },
                start,
            ));
        }
        self.parse_power()
    }

    /// `^` is right-associative and its exponent may carry a sign: `2^-1`.
    fn parse_power(&mut self) -> Result<ASTNode, ParseError> {
        let base = self.parse_primary()?;
        if self.peek().is_some_and(|t| t.is_operator("^")) {
            self.next();
            self.descend()?;
            let exponent = self.parse_unary();
            self.depth -= 1;
            let exponent = exponent?;
            let position = base.position;
            return Ok(ASTNode::new(
                ASTNodeType::BinaryOp {
                    op: BinaryOp::Pow,
                    left: Box::new(base),
                    right: Box::new(exponent),
                },
                position,
            ));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<ASTNode, ParseError> {
        let Some(token) = self.next() else {
            return Err(ParseError::new(
                "Unexpected end of expression",
                self.end_position(),
            ));
        };
        match token.token_type {
            TokenType::Number => {
                let n = token.value.parse::<f64>().map_err(|_| {
                    ParseError::new(format!("Invalid number '{}'", token.value), token.start)
                })?;
                Ok(ASTNode::new(ASTNodeType::Number(n), token.start))
            }
            TokenType::Text => Ok(ASTNode::new(ASTNodeType::Text(token.value), token.start)),
            TokenType::Identifier => {
                if self
                    .peek()
                    .is_some_and(|t| t.token_type == TokenType::OpenParen)
                {
                    self.next();
                    return self.parse_call(token);
                }
                let node_type = match token.value.to_ascii_lowercase().as_str() {
                    "true" => ASTNodeType::Boolean(true),
                    "false" => ASTNodeType::Boolean(false),
                    _ => ASTNodeType::Variable(token.value),
                };
                Ok(ASTNode::new(node_type, token.start))
            }
            TokenType::OpenParen => {
                let inner = self.parse_conditional()?;
                self.expect(TokenType::CloseParen, "')'")?;
                Ok(inner)
            }
            _ => Err(ParseError::new(
                format!("Unexpected token '{}'", token.value),
                token.start,
            )),
        }
    }

    fn parse_call(&mut self, name: Token) -> Result<ASTNode, ParseError> {
        let mut args = Vec::new();
        if self
            .peek()
            .is_some_and(|t| t.token_type == TokenType::CloseParen)
        {
            self.next();
        } else {
            loop {
                args.push(self.parse_conditional()?);
                match self.next() {
                    Some(t) if t.token_type == TokenType::Separator => continue,
                    Some(t) if t.token_type == TokenType::CloseParen => break,
                    Some(t) => {
                        return Err(ParseError::new(
                            format!("Expected ',' or ')' in call to {}, found '{}'", name.value, t.value),
                            t.start,
                        ));
                    }
                    None => {
                        return Err(ParseError::new(
                            format!("Unclosed call to {}", name.value),
                            self.end_position(),
                        ));
                    }
                }
            }
        }
        Ok(ASTNode::new(
            ASTNodeType::Function {
                name: name.value,
                args,
            },
            name.start,
        ))
    }
}

/// Tokenize and parse an expression.
pub fn parse(expression: &str) -> Result<ASTNode, ParseError> {
    let tokenizer = Tokenizer::new(expression)?;
    let mut parser = Parser::new(tokenizer.items, expression.len());
    parser.parse()
}
