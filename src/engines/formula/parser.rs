use super::ast::{BinaryOp, Node, UnaryOp};
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::Power => "**".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
        }
    }
}

/// Splits formula text into tokens.
///
/// Whitespace is skipped and any character outside the formula alphabet is
/// dropped without error.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() {
                    let ch = chars[i];
                    let exponent_sign = (ch == '+' || ch == '-')
                        && i > start
                        && matches!(chars[i - 1], 'e' | 'E');
                    if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' || exponent_sign {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                // Overflowing literals such as 1e999 would print back as `inf`
                let value = text
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ParseError::InvalidNumber { text: text.clone() })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Power);
                i += 2;
            }
            '+' | '-' | '*' | '/' | '(' | ')' | ',' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Comma,
                });
                i += 1;
            }
            _ => i += 1,
        }
    }

    Ok(tokens)
}

/// Parses infix formula text into an expression tree.
pub fn parse_formula(input: &str) -> Result<Node, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let node = parser.parse_expression()?;

    match parser.peek() {
        None => Ok(node),
        Some(Token::RParen) => Err(ParseError::UnmatchedParen {
            position: parser.pos,
        }),
        Some(_) => Err(ParseError::TrailingTokens {
            position: parser.pos,
        }),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            position: self.pos,
            found: self
                .peek()
                .map(Token::describe)
                .unwrap_or_else(|| "end of input".to_string()),
        }
    }

    // additive := multiplicative (('+' | '-') multiplicative)*
    fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Node::binary(op, left, right);
        }
        Ok(left)
    }

    // multiplicative := power (('*' | '/') power)*
    fn parse_multiplicative(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_power()?;
            left = Node::binary(op, left, right);
        }
        Ok(left)
    }

    // power := unary ('**' power)?   (right-associative)
    fn parse_power(&mut self) -> Result<Node, ParseError> {
        let base = self.parse_unary()?;
        if self.peek() == Some(&Token::Power) {
            self.pos += 1;
            let exponent = self.parse_power()?;
            return Ok(Node::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    // unary := '-' unary | primary
    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Node::unary(UnaryOp::Negate, operand));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        match self.peek().cloned() {
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(Node::constant(value))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                if self.peek() == Some(&Token::LParen) {
                    self.parse_call(name)
                } else {
                    Ok(Node::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let open = self.pos;
                self.pos += 1;
                let inner = self.parse_expression()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ParseError::UnmatchedParen { position: open }),
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Node, ParseError> {
        let expected = match name.as_str() {
            "sqrt" | "log" | "exp" | "abs" => 1,
            "pow" | "max" | "min" => 2,
            _ => return Err(ParseError::UnknownFunction { name }),
        };

        let open = self.pos;
        self.pos += 1;

        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.parse_expression()?);
                match self.advance() {
                    Some(Token::Comma) => continue,
                    Some(Token::RParen) => break,
                    None => return Err(ParseError::UnmatchedParen { position: open }),
                    Some(_) => {
                        self.pos -= 1;
                        return Err(self.unexpected());
                    }
                }
            }
        }

        if args.len() != expected {
            return Err(ParseError::WrongArgumentCount {
                function: name,
                expected,
                found: args.len(),
            });
        }

        let mut args = args.into_iter();
        let (first, second) = (args.next(), args.next());
        let node = match (name.as_str(), first, second) {
            ("sqrt", Some(x), None) => Node::unary(UnaryOp::Sqrt, x),
            ("log", Some(x), None) => Node::unary(UnaryOp::Log, x),
            ("exp", Some(x), None) => Node::unary(UnaryOp::Exp, x),
            ("abs", Some(x), None) => Node::unary(UnaryOp::Abs, x),
            ("pow", Some(a), Some(b)) => Node::binary(BinaryOp::Pow, a, b),
            ("max", Some(a), Some(b)) => Node::binary(BinaryOp::Max, a, b),
            ("min", Some(a), Some(b)) => Node::binary(BinaryOp::Min, a, b),
            _ => return Err(ParseError::UnknownFunction { name }),
        };
        Ok(node)
    }
}
