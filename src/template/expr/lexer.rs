//! Tokenizer for the expression language

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Let,
    Return,
    True,
    False,
    Null,
    NoValue,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Question,
    QuestionQuestion,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    BangEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Arrow,
    Assign,
    Eof,
}

/// A token and the byte offset where it starts
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Split source text into tokens, ending with [`Token::Eof`]
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, String> {
    let mut lexer = Lexer {
        chars: source.char_indices().collect(),
        pos: 0,
        len: source.len(),
    };
    let mut tokens = Vec::new();
    loop {
        lexer.skip_trivia()?;
        let offset = lexer.offset();
        let token = lexer.next_token()?;
        let done = token == Token::Eof;
        tokens.push(Spanned { token, offset });
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer {
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map(|(i, _)| *i).unwrap_or(self.len)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) -> Result<(), String> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.pos += 1;
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.offset();
                    self.pos += 2;
                    loop {
                        match self.bump() {
                            Some('*') if self.eat('/') => break,
                            Some(_) => {}
                            None => return Err(format!("unterminated comment at {}", start)),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, String> {
        let offset = self.offset();
        let Some(c) = self.bump() else {
            return Ok(Token::Eof);
        };

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            '.' => Token::Dot,
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '?' if self.eat('?') => Token::QuestionQuestion,
            '?' => Token::Question,
            '!' if self.eat('=') => {
                self.eat('=');
                Token::BangEq
            }
            '!' => Token::Bang,
            '=' if self.eat('>') => Token::Arrow,
            '=' if self.eat('=') => {
                self.eat('=');
                Token::EqEq
            }
            '=' => Token::Assign,
            '<' if self.eat('=') => Token::Le,
            '<' => Token::Lt,
            '>' if self.eat('=') => Token::Ge,
            '>' => Token::Gt,
            '&' if self.eat('&') => Token::AndAnd,
            '|' if self.eat('|') => Token::OrOr,
            '\'' | '"' => Token::Str(self.string(c, offset)?),
            c if c.is_ascii_digit() => self.number(c)?,
            c if is_ident_start(c) => keyword_or_ident(self.ident(c)),
            other => return Err(format!("unexpected character '{}' at {}", other, offset)),
        };
        Ok(token)
    }

    fn string(&mut self, quote: char, start: usize) -> Result<String, String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(format!("unterminated string starting at {}", start)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('u') => self.unicode_escape()?,
                        Some(other) => other,
                        None => return Err(format!("unterminated string starting at {}", start)),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char, String> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| "invalid \\u escape".to_string())?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| format!("invalid code point \\u{:04x}", code))
    }

    fn number(&mut self, first: char) -> Result<Token, String> {
        let mut text = String::from(first);
        self.digits(&mut text);
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.pos += 1;
            self.digits(&mut text);
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_at(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.bump() {
                        text.push(c);
                    }
                }
                self.digits(&mut text);
            }
        }
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|e| format!("invalid number '{}': {}", text, e))
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
            text.push(c);
            self.pos += 1;
        }
    }

    fn ident(&mut self, first: char) -> String {
        let mut name = String::from(first);
        while let Some(c) = self.peek().filter(|c| is_ident_continue(*c)) {
            name.push(c);
            self.pos += 1;
        }
        name
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn keyword_or_ident(name: String) -> Token {
    match name.as_str() {
        "let" | "const" => Token::Let,
        "return" => Token::Return,
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        "noValue" => Token::NoValue,
        _ => Token::Ident(name),
    }
}
