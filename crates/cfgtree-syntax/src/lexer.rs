//! Tokenizer for the configuration language.

use std::fmt;

use cfgtree_core::path::{is_name_char, is_name_start};
use cfgtree_core::ConfigResult;

use crate::source::Source;

/// Lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier: setting name or boolean keyword.
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    /// `=` or `:`
    Assign,
    Semicolon,
    Comma,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{name}'"),
            Self::Int(v) => write!(f, "integer {v}"),
            Self::Float(v) => write!(f, "float {v}"),
            Self::Str(_) => write!(f, "string"),
            Self::Assign => write!(f, "'='"),
            Self::Semicolon => write!(f, "';'"),
            Self::Comma => write!(f, "','"),
            Self::LeftBrace => write!(f, "'{{'"),
            Self::RightBrace => write!(f, "'}}'"),
            Self::LeftParen => write!(f, "'('"),
            Self::RightParen => write!(f, "')'"),
            Self::LeftBracket => write!(f, "'['"),
            Self::RightBracket => write!(f, "']'"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// A token and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

/// Splits `source` into tokens. The result always ends with [`Token::Eof`].
pub fn tokenize(source: &Source) -> ConfigResult<Vec<Spanned>> {
    Lexer::new(source).run()
}

struct Lexer<'s> {
    source: &'s Source,
    chars: Vec<char>,
    position: usize,
    line: u32,
}

impl<'s> Lexer<'s> {
    fn new(source: &'s Source) -> Self {
        Self {
            source,
            chars: source.text().chars().collect(),
            position: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn run(mut self) -> ConfigResult<Vec<Spanned>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            let line = self.line;
            let token = match ch {
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                '#' => {
                    self.skip_line();
                    continue;
                }
                '/' if self.peek_at(1) == Some('/') => {
                    self.skip_line();
                    continue;
                }
                '/' if self.peek_at(1) == Some('*') => {
                    self.skip_block_comment()?;
                    continue;
                }
                '=' | ':' => self.single(Token::Assign),
                ';' => self.single(Token::Semicolon),
                ',' => self.single(Token::Comma),
                '{' => self.single(Token::LeftBrace),
                '}' => self.single(Token::RightBrace),
                '(' => self.single(Token::LeftParen),
                ')' => self.single(Token::RightParen),
                '[' => self.single(Token::LeftBracket),
                ']' => self.single(Token::RightBracket),
                '"' => self.string()?,
                c if self.starts_number(c) => self.number()?,
                c if is_name_start(c) => self.name(),
                '@' => {
                    return Err(self
                        .source
                        .error(line, "include directives are not enabled for this input"));
                }
                other => {
                    return Err(self
                        .source
                        .error(line, format!("unexpected character '{}'", other.escape_debug())));
                }
            };
            tokens.push(Spanned { token, line });
        }

        tokens.push(Spanned {
            token: Token::Eof,
            line: self.line,
        });
        Ok(tokens)
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) -> ConfigResult<()> {
        let start = self.line;
        self.position += 2;
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(self.source.error(start, "unterminated comment")),
            }
        }
    }

    fn starts_number(&self, ch: char) -> bool {
        let digit_or_dot = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit() || c == '.');
        match ch {
            '0'..='9' => true,
            '.' => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            '+' | '-' => digit_or_dot(self.peek_at(1)),
            _ => false,
        }
    }

    fn name(&mut self) -> Token {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if !is_name_char(ch) {
                break;
            }
            name.push(ch);
            self.bump();
        }
        Token::Name(name)
    }

    fn string(&mut self) -> ConfigResult<Token> {
        let start = self.line;
        self.bump();
        let mut value = String::new();

        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.source.error(start, "unterminated string literal"));
                }
                Some('"') => break,
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('f') => '\u{c}',
                        Some('x') => self.hex_escape()?,
                        Some(other) => {
                            return Err(self.source.error(
                                self.line,
                                format!("invalid escape sequence '\\{}'", other.escape_debug()),
                            ));
                        }
                        None => {
                            return Err(self.source.error(start, "unterminated string literal"));
                        }
                    };
                    value.push(escaped);
                }
                Some(ch) => value.push(ch),
            }
        }

        Ok(Token::Str(value))
    }

    fn hex_escape(&mut self) -> ConfigResult<char> {
        let digits: String = (0..2).filter_map(|i| self.peek_at(i)).collect();
        match u8::from_str_radix(&digits, 16) {
            Ok(byte) if digits.len() == 2 && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
                self.position += 2;
                Ok(char::from(byte))
            }
            _ => Err(self
                .source
                .error(self.line, "'\\x' must be followed by two hex digits")),
        }
    }

    fn number(&mut self) -> ConfigResult<Token> {
        let line = self.line;
        let mut text = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            text.push(sign);
            self.bump();
        }
        let hex = matches!(
            (self.peek(), self.peek_at(1)),
            (Some('0'), Some('x' | 'X'))
        );

        while let Some(ch) = self.peek() {
            let exponent_sign = !hex
                && matches!(ch, '+' | '-')
                && text.ends_with(['e', 'E']);
            if ch.is_ascii_alphanumeric() || ch == '.' || exponent_sign {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        classify_number(&text).map_err(|message| self.source.error(line, message))
    }
}

/// Turns the text of a numeric literal into a token.
///
/// Plain integers that fit in 32 bits are ints. Anything with a point or an
/// exponent, and unsuffixed integers that overflow 32 bits, are floats. An
/// `L`/`LL` suffix forces a 64-bit int.
fn classify_number(text: &str) -> Result<Token, String> {
    let invalid = || format!("invalid numeric literal '{text}'");
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (body, forced) = match unsigned
        .strip_suffix("LL")
        .or_else(|| unsigned.strip_suffix('L'))
    {
        Some(body) => (body, true),
        None => (unsigned, false),
    };

    if let Some(digits) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let raw = u64::from_str_radix(digits, 16).map_err(|_| invalid())?;
        return Ok(if forced {
            let value = raw as i64;
            Token::Int(if negative { value.wrapping_neg() } else { value })
        } else if raw <= u64::from(u32::MAX) {
            let value = raw as i64;
            Token::Int(if negative { -value } else { value })
        } else {
            let value = raw as f64;
            Token::Float(if negative { -value } else { value })
        });
    }

    let is_float = body.contains(['.', 'e', 'E']);
    if !body.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) {
        return Err(invalid());
    }
    let signed = format!("{}{body}", if negative { "-" } else { "" });

    if is_float {
        if forced {
            return Err(format!("integer suffix on floating point literal '{text}'"));
        }
        let value: f64 = signed.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(format!("floating point literal '{text}' is out of range"));
        }
        return Ok(Token::Float(value));
    }

    match signed.parse::<i64>() {
        Ok(value) if forced || i32::try_from(value).is_ok() => Ok(Token::Int(value)),
        Ok(value) => Ok(Token::Float(value as f64)),
        Err(_) if forced => Err(format!("integer literal '{text}' is out of range")),
        Err(_) => signed
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|_| invalid()),
    }
}
