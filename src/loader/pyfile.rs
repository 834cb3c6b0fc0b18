//! Reader for Python-style config modules
//!
//! Only the literal subset used by settings files is understood:
//!
//! ```text
//! # comment
//! DEBUG = False
//! PORT = 8_080
//! HOSTS = ["a.internal", 'b.internal']
//! LIMITS = {"rps": 1.5, "burst": (10, 20)}
//! ```
//!
//! Names that are not UPPERCASE are parsed but not exported.

use crate::error::LoadError;
use serde_json::{Map, Number, Value};

/// Parse assignments in source order, keeping only UPPERCASE names.
pub fn parse_assignments(content: &str) -> Result<Vec<(String, Value)>, LoadError> {
    let mut parser = Parser::new(content);
    let mut entries = Vec::new();

    loop {
        parser.skip_blank_lines();
        if parser.at_end() {
            break;
        }

        let line = parser.line;
        let name = parser.identifier().ok_or_else(|| parser.error("expected an assignment"))?;
        parser.skip_inline_space();
        if parser.peek() != Some('=') || parser.peek_at(1) == Some('=') {
            return Err(parser.error(format!("expected '=' after '{name}'")));
        }
        parser.bump();
        parser.skip_inline_space();

        let value = parser.value()?;
        parser.end_of_statement()?;

        if is_upper(&name) {
            tracing::trace!(name = %name, line, "pyfile assignment");
            entries.push((name, value));
        }
    }

    Ok(entries)
}

/// Mirrors `str.isupper`: at least one cased character, none lowercase.
fn is_upper(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && !name.chars().any(char::is_lowercase)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Parser {
    fn new(content: &str) -> Self {
        Self { chars: content.chars().collect(), pos: 0, line: 1 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LoadError {
        LoadError::Syntax { line: self.line, message: message.into() }
    }

    fn skip_comment(&mut self) {
        if self.peek() == Some('#') {
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.bump();
            }
        }
    }

    fn skip_inline_space(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.bump();
        }
    }

    /// Whitespace, newlines and comments between statements or inside brackets.
    fn skip_blank_lines(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => self.skip_comment(),
                _ => break,
            }
        }
    }

    fn end_of_statement(&mut self) -> Result<(), LoadError> {
        self.skip_inline_space();
        self.skip_comment();
        match self.peek() {
            None => Ok(()),
            Some('\n' | ';') => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("unexpected '{c}' after value"))),
        }
    }

    fn identifier(&mut self) -> Option<String> {
        let first = self.peek()?;
        if !(first.is_alphabetic() || first == '_') {
            return None;
        }
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Some(name)
    }

    fn value(&mut self) -> Result<Value, LoadError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => {
                self.bump();
                Ok(Value::Array(self.sequence(']')?))
            }
            Some('(') => self.parenthesized(),
            Some('{') => self.dict(),
            Some('\'' | '"') => self.string().map(Value::String),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(_) => {
                let word = self.identifier().ok_or_else(|| self.error("expected a value"))?;
                match word.as_str() {
                    "True" => Ok(Value::Bool(true)),
                    "False" => Ok(Value::Bool(false)),
                    "None" => Ok(Value::Null),
                    other => Err(self.error(format!("unsupported expression '{other}'"))),
                }
            }
        }
    }

    /// Comma-separated values up to `close`; the opening bracket is already consumed.
    fn sequence(&mut self, close: char) -> Result<Vec<Value>, LoadError> {
        let mut items = Vec::new();
        loop {
            self.skip_blank_lines();
            match self.peek() {
                None => return Err(self.error(format!("missing closing '{close}'"))),
                Some(c) if c == close => {
                    self.bump();
                    return Ok(items);
                }
                _ => {}
            }
            items.push(self.value()?);
            self.skip_blank_lines();
            match self.bump() {
                Some(',') => {}
                Some(c) if c == close => return Ok(items),
                Some(c) => return Err(self.error(format!("expected ',' or '{close}', found '{c}'"))),
                None => return Err(self.error(format!("missing closing '{close}'"))),
            }
        }
    }

    /// `(x)` is a grouped value, `()` and `(x,)` are tuples.
    fn parenthesized(&mut self) -> Result<Value, LoadError> {
        self.bump();
        self.skip_blank_lines();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.value()?;
        self.skip_blank_lines();
        match self.bump() {
            Some(')') => Ok(first),
            Some(',') => {
                let mut items = vec![first];
                items.extend(self.sequence(')')?);
                Ok(Value::Array(items))
            }
            Some(c) => Err(self.error(format!("expected ',' or ')', found '{c}'"))),
            None => Err(self.error("missing closing ')'")),
        }
    }

    fn dict(&mut self) -> Result<Value, LoadError> {
        self.bump();
        let mut map = Map::new();
        loop {
            self.skip_blank_lines();
            match self.peek() {
                None => return Err(self.error("missing closing '}'")),
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                Some('\'' | '"') => {}
                Some(_) => return Err(self.error("dict keys must be strings")),
            }
            let key = self.string()?;
            self.skip_blank_lines();
            if self.bump() != Some(':') {
                return Err(self.error(format!("expected ':' after key '{key}'")));
            }
            self.skip_blank_lines();
            let value = self.value()?;
            map.insert(key, value);
            self.skip_blank_lines();
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(Value::Object(map)),
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found '{c}'"))),
                None => return Err(self.error("missing closing '}'")),
            }
        }
    }

    fn string(&mut self) -> Result<String, LoadError> {
        let start_line = self.line;
        let Some(quote) = self.bump() else {
            return Err(self.error("expected a string"));
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(LoadError::Syntax {
                    line: start_line,
                    message: "unterminated string".to_string(),
                });
            };
            match c {
                c if c == quote && !triple => return Ok(out),
                c if c == quote && self.peek() == Some(quote) && self.peek_at(1) == Some(quote) => {
                    self.bump();
                    self.bump();
                    return Ok(out);
                }
                '\n' if !triple => {
                    return Err(LoadError::Syntax {
                        line: start_line,
                        message: "unterminated string".to_string(),
                    });
                }
                '\\' => self.escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LoadError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape"));
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' | '\'' | '"' => out.push(c),
            '\n' => {}
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, LoadError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("truncated hex escape"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn number(&mut self) -> Result<Value, LoadError> {
        let mut raw = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek() {
            raw.push(sign);
            self.bump();
        }
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '+' | '-')
                && matches!(raw.chars().last(), Some('e' | 'E'))
                && !is_prefixed(&raw);
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                raw.push(c);
                self.bump();
            } else {
                break;
            }
        }

        parse_number(&raw).ok_or_else(|| self.error(format!("invalid number '{raw}'")))
    }
}

fn is_prefixed(raw: &str) -> bool {
    let digits = raw.trim_start_matches(['-', '+']).to_ascii_lowercase();
    digits.starts_with("0x") || digits.starts_with("0o") || digits.starts_with("0b")
}

fn parse_number(raw: &str) -> Option<Value> {
    let cleaned = raw.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    if digits.is_empty() {
        return None;
    }

    let lower = digits.to_ascii_lowercase();
    let radix = match lower.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let magnitude = u64::from_str_radix(&lower[2..], radix).ok()?;
        return integer(negative, magnitude);
    }

    if lower.contains(['.', 'e']) {
        let float: f64 = lower.parse().ok()?;
        let float = if negative { -float } else { float };
        return Number::from_f64(float).map(Value::Number);
    }

    let magnitude: u64 = lower.parse().ok()?;
    integer(negative, magnitude)
}

/// Integers span `i64::MIN..=u64::MAX`, the range a JSON number can hold exactly.
fn integer(negative: bool, magnitude: u64) -> Option<Value> {
    if negative {
        i64::try_from(-i128::from(magnitude)).ok().map(Value::from)
    } else {
        Some(Value::from(magnitude))
    }
}
