//! Recursive-descent parser producing the expression AST
//!
//! Precedence, lowest first: conditional `?:`, `??`, `||`, `&&`, equality,
//! comparison, additive, multiplicative, unary, then postfix member access,
//! indexing and calls. Lambdas (`x => e`, `(a, b) => e`) sit at the same
//! level as the conditional.

use std::rc::Rc;

use super::lexer::{Spanned, Token};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Operators that may skip evaluating their right side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Coalesce,
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    NoValue,
    Ident(String),
    List(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Lambda(Vec<String>, Rc<Expr>),
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Let(String, Expr),
    Return(Expr),
    Expr(Expr),
}

/// A `;`-separated statement sequence
#[derive(Debug, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Parse a single expression that must consume all tokens
pub fn parse_expression(tokens: Vec<Spanned>) -> Result<Expr, String> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    parser.expect(&Token::Eof, "end of expression")?;
    Ok(expr)
}

/// Parse a statement sequence
pub fn parse_program(tokens: Vec<Spanned>) -> Result<Program, String> {
    let mut parser = Parser { tokens, pos: 0 };
    let mut statements = Vec::new();
    loop {
        while parser.eat(&Token::Semicolon) {}
        if parser.check(&Token::Eof) {
            break;
        }
        statements.push(parser.statement()?);
        if !parser.eat(&Token::Semicolon) {
            parser.expect(&Token::Eof, "';' or end of block")?;
            break;
        }
    }
    Ok(Program { statements })
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        self.tokens
            .get(self.pos + n)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.offset)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), String> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> String {
        match self.peek() {
            Token::Eof => format!("expected {} but the expression ended", what),
            token => format!("expected {} but found {:?} at {}", what, token, self.offset()),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, String> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn statement(&mut self) -> Result<Stmt, String> {
        if self.eat(&Token::Let) {
            let name = self.ident("variable name")?;
            self.expect(&Token::Assign, "'='")?;
            return Ok(Stmt::Let(name, self.expression()?));
        }
        if self.eat(&Token::Return) {
            return Ok(Stmt::Return(self.expression()?));
        }
        Ok(Stmt::Expr(self.expression()?))
    }

    fn expression(&mut self) -> Result<Expr, String> {
        if let Some(params) = self.lambda_params() {
            let body = self.expression()?;
            return Ok(Expr::Lambda(params, Rc::new(body)));
        }
        self.conditional()
    }

    /// Consume a lambda parameter list and its `=>` if one starts here
    fn lambda_params(&mut self) -> Option<Vec<String>> {
        if let (Token::Ident(name), Token::Arrow) = (self.peek(), self.peek_at(1)) {
            let params = vec![name.clone()];
            self.pos += 2;
            return Some(params);
        }
        if !self.check(&Token::LParen) {
            return None;
        }

        let mut params = Vec::new();
        let mut n = 1;
        if self.peek_at(n) != &Token::RParen {
            loop {
                match self.peek_at(n) {
                    Token::Ident(name) => params.push(name.clone()),
                    _ => return None,
                }
                n += 1;
                match self.peek_at(n) {
                    Token::Comma => n += 1,
                    Token::RParen => break,
                    _ => return None,
                }
            }
        }
        if self.peek_at(n + 1) != &Token::Arrow {
            return None;
        }
        self.pos += n + 2;
        Some(params)
    }

    fn conditional(&mut self) -> Result<Expr, String> {
        let condition = self.logical(0)?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then = self.expression()?;
        self.expect(&Token::Colon, "':' in conditional")?;
        let otherwise = self.expression()?;
        Ok(Expr::Conditional(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    /// `??` binds loosest, then `||`, then `&&`
    fn logical(&mut self, level: usize) -> Result<Expr, String> {
        let (token, op) = match level {
            0 => (Token::QuestionQuestion, LogicalOp::Coalesce),
            1 => (Token::OrOr, LogicalOp::Or),
            2 => (Token::AndAnd, LogicalOp::And),
            _ => return self.equality(),
        };

        let mut left = self.logical(level + 1)?;
        while self.eat(&token) {
            let right = self.logical(level + 1)?;
            left = Expr::Logical(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, String> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinaryOp::Eq,
                Token::BangEq => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.comparison()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn comparison(&mut self) -> Result<Expr, String> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn additive(&mut self) -> Result<Expr, String> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, String> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        let op = match self.peek() {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        self.advance();
        Ok(Expr::Unary(op, Box::new(self.unary()?)))
    }

    fn postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let name = self.member_name()?;
                expr = Expr::Member(Box::new(expr), name);
            } else if self.eat(&Token::LBracket) {
                let index = self.expression()?;
                self.expect(&Token::RBracket, "']'")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.eat(&Token::LParen) {
                let args = self.sequence(&Token::RParen, "')'")?;
                expr = Expr::Call(Box::new(expr), args);
            } else {
                return Ok(expr);
            }
        }
    }

    /// Property names may reuse keywords, as in `item.null`
    fn member_name(&mut self) -> Result<String, String> {
        let name = match self.peek() {
            Token::Ident(name) => name.clone(),
            Token::Let => "let".to_string(),
            Token::Return => "return".to_string(),
            Token::True => "true".to_string(),
            Token::False => "false".to_string(),
            Token::Null => "null".to_string(),
            Token::NoValue => "noValue".to_string(),
            _ => return Err(self.unexpected("property name")),
        };
        self.advance();
        Ok(name)
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed
    fn sequence(&mut self, close: &Token, what: &str) -> Result<Vec<Expr>, String> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                self.expect(close, what)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr, String> {
        let expr = match self.peek().clone() {
            Token::Number(n) => Expr::Number(n),
            Token::Str(s) => Expr::Str(s),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Null => Expr::Null,
            Token::NoValue => Expr::NoValue,
            Token::Ident(name) => Expr::Ident(name),
            Token::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                return Ok(inner);
            }
            Token::LBracket => {
                self.advance();
                return Ok(Expr::List(self.sequence(&Token::RBracket, "']'")?));
            }
            Token::LBrace => {
                self.advance();
                return self.object();
            }
            _ => return Err(self.unexpected("a value")),
        };
        self.advance();
        Ok(expr)
    }

    fn object(&mut self) -> Result<Expr, String> {
        let mut entries = Vec::new();
        while !self.eat(&Token::RBrace) {
            let (key, shorthand) = match self.peek().clone() {
                Token::Ident(name) => (name, true),
                Token::Str(key) => (key, false),
                Token::Number(n) => (super::value::format_number(n), false),
                _ => return Err(self.unexpected("object key")),
            };
            self.advance();

            let value = if self.eat(&Token::Colon) {
                self.expression()?
            } else if shorthand {
                Expr::Ident(key.clone())
            } else {
                return Err(self.unexpected("':'"));
            };
            entries.push((key, value));

            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBrace, "'}'")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }
}
