//! Streaming JSON tokenizer that reports absolute byte offsets.
//!
//! The tokenizer walks a document strictly forward through a fixed-size buffer
//! and never materializes the document as a whole. Each [`Token`] carries the
//! offset of its first byte and the read position right after it, which is what
//! the index builder records for member objects.

use std::io::Read;

use orestore_common::{Error, Result, try_or_ret_some_err};
use serde_json::{Map, Number, Value};

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Deepest container nesting `read_value` builds, matching serde_json's own limit.
pub const MAX_NESTING: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(String),
    String(String),
    /// Number literal, kept as its source text.
    Number(String),
    Bool(bool),
    Null,
}

impl TokenKind {
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TokenKind::String(_) | TokenKind::Number(_) | TokenKind::Bool(_) | TokenKind::Null
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Absolute offset of the first byte of the token.
    pub start: u64,
    /// Absolute read position after the token.
    pub end: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    KeyOrEnd,
    Key,
    Colon,
    Value,
    CommaOrEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    ValueOrEnd,
    Value,
    CommaOrEnd,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Object(ObjectState),
    Array(ArrayState),
}

/// Forward-only JSON scanner over any `Read`.
pub struct JsonTokenizer<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    /// Absolute offset of `buf[0]`.
    base: u64,
    stack: Vec<Frame>,
    root_done: bool,
    started: bool,
}

impl<R: Read> JsonTokenizer<R> {
    pub fn new(inner: R) -> JsonTokenizer<R> {
        Self::with_buffer_size(inner, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(inner: R, buffer_size: usize) -> JsonTokenizer<R> {
        JsonTokenizer {
            inner,
            buf: vec![0u8; buffer_size.max(16)].into_boxed_slice(),
            pos: 0,
            filled: 0,
            base: 0,
            stack: Vec::new(),
            root_done: false,
            started: false,
        }
    }

    /// Current read position: the number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Number of currently open objects and arrays.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns the next token, or `None` once the root value is complete and only
    /// whitespace remains.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if !self.started {
            self.started = true;
            self.skip_bom()?;
        }
        loop {
            self.skip_whitespace()?;
            let Some(b) = self.peek()? else {
                if self.root_done {
                    return Ok(None);
                }
                return Err(self.error("unexpected end of input"));
            };

            match self.stack.last().copied() {
                None => {
                    if self.root_done {
                        return Err(self.error("trailing characters after the root value"));
                    }
                    return self.value_token(b).map(Some);
                }
                Some(Frame::Object(state)) => match state {
                    ObjectState::KeyOrEnd | ObjectState::CommaOrEnd if b == b'}' => {
                        return Ok(Some(self.close(TokenKind::EndObject)));
                    }
                    ObjectState::KeyOrEnd | ObjectState::Key => {
                        if b != b'"' {
                            return Err(self.error("expected a field name"));
                        }
                        let start = self.offset();
                        let name = self.scan_string()?;
                        self.set_top(Frame::Object(ObjectState::Colon));
                        return Ok(Some(self.token(TokenKind::FieldName(name), start)));
                    }
                    ObjectState::Colon => {
                        if b != b':' {
                            return Err(self.error("expected ':'"));
                        }
                        self.pos += 1;
                        self.set_top(Frame::Object(ObjectState::Value));
                    }
                    ObjectState::Value => {
                        self.set_top(Frame::Object(ObjectState::CommaOrEnd));
                        return self.value_token(b).map(Some);
                    }
                    ObjectState::CommaOrEnd => {
                        if b != b',' {
                            return Err(self.error("expected ',' or '}'"));
                        }
                        self.pos += 1;
                        self.set_top(Frame::Object(ObjectState::Key));
                    }
                },
                Some(Frame::Array(state)) => match state {
                    ArrayState::ValueOrEnd | ArrayState::CommaOrEnd if b == b']' => {
                        return Ok(Some(self.close(TokenKind::EndArray)));
                    }
                    ArrayState::ValueOrEnd | ArrayState::Value => {
                        self.set_top(Frame::Array(ArrayState::CommaOrEnd));
                        return self.value_token(b).map(Some);
                    }
                    ArrayState::CommaOrEnd => {
                        if b != b',' {
                            return Err(self.error("expected ',' or ']'"));
                        }
                        self.pos += 1;
                        self.set_top(Frame::Array(ArrayState::Value));
                    }
                },
            }
        }
    }

    /// Reads the remainder of the value that begins with `first` and builds it as a
    /// `serde_json::Value`, preserving object field order.
    ///
    /// Numbers keep their source text. Containers nested more than
    /// [`MAX_NESTING`] levels below `first` are a `Parse` error.
    pub fn read_value(&mut self, first: Token) -> Result<Value> {
        self.read_nested(first, 0)
    }

    fn read_nested(&mut self, first: Token, nesting: usize) -> Result<Value> {
        if matches!(first.kind, TokenKind::StartObject | TokenKind::StartArray)
            && nesting >= MAX_NESTING
        {
            return Err(Error::parse(
                first.start,
                format!("nesting deeper than {MAX_NESTING} levels"),
            ));
        }
        match first.kind {
            TokenKind::StartObject => {
                let mut map = Map::new();
                loop {
                    let token = self.expect_token()?;
                    match token.kind {
                        TokenKind::EndObject => return Ok(Value::Object(map)),
                        TokenKind::FieldName(name) => {
                            let value_token = self.expect_token()?;
                            let value = self.read_nested(value_token, nesting + 1)?;
                            map.insert(name, value);
                        }
                        _ => return Err(Error::parse(token.start, "expected a field name")),
                    }
                }
            }
            TokenKind::StartArray => {
                let mut items = Vec::new();
                loop {
                    let token = self.expect_token()?;
                    if token.kind == TokenKind::EndArray {
                        return Ok(Value::Array(items));
                    }
                    items.push(self.read_nested(token, nesting + 1)?);
                }
            }
            TokenKind::String(s) => Ok(Value::String(s)),
            TokenKind::Number(text) => text
                .parse::<Number>()
                .map(Value::Number)
                .map_err(|e| Error::parse(first.start, format!("number {text}: {e}"))),
            TokenKind::Bool(b) => Ok(Value::Bool(b)),
            TokenKind::Null => Ok(Value::Null),
            TokenKind::EndObject | TokenKind::EndArray | TokenKind::FieldName(_) => {
                Err(Error::parse(first.start, "expected a value"))
            }
        }
    }

    /// Consumes the remainder of the value that begins with `first`.
    pub fn skip_value(&mut self, first: &Token) -> Result<()> {
        let target_depth = match first.kind {
            TokenKind::StartObject | TokenKind::StartArray => self.depth() - 1,
            _ => return Ok(()),
        };
        while self.depth() > target_depth {
            self.expect_token()?;
        }
        Ok(())
    }

    /// Like `next_token`, but end of input is an error.
    pub fn expect_token(&mut self) -> Result<Token> {
        self.next_token()?
            .ok_or_else(|| self.error("unexpected end of input"))
    }

    fn value_token(&mut self, b: u8) -> Result<Token> {
        let start = self.offset();
        let kind = match b {
            b'{' => {
                self.pos += 1;
                self.stack.push(Frame::Object(ObjectState::KeyOrEnd));
                return Ok(self.token(TokenKind::StartObject, start));
            }
            b'[' => {
                self.pos += 1;
                self.stack.push(Frame::Array(ArrayState::ValueOrEnd));
                return Ok(self.token(TokenKind::StartArray, start));
            }
            b'"' => TokenKind::String(self.scan_string()?),
            b'-' | b'0'..=b'9' => TokenKind::Number(self.scan_number()?),
            b't' => {
                self.scan_literal(b"true")?;
                TokenKind::Bool(true)
            }
            b'f' => {
                self.scan_literal(b"false")?;
                TokenKind::Bool(false)
            }
            b'n' => {
                self.scan_literal(b"null")?;
                TokenKind::Null
            }
            _ => return Err(self.error(format!("unexpected character '{}'", b.escape_ascii()))),
        };
        if self.stack.is_empty() {
            self.root_done = true;
        }
        Ok(self.token(kind, start))
    }

    fn close(&mut self, kind: TokenKind) -> Token {
        let start = self.offset();
        self.pos += 1;
        self.stack.pop();
        if self.stack.is_empty() {
            self.root_done = true;
        }
        self.token(kind, start)
    }

    fn token(&self, kind: TokenKind, start: u64) -> Token {
        let token = Token {
            kind,
            start,
            end: self.offset(),
        };
        log::trace!("token {:?} at {}..{}", token.kind, token.start, token.end);
        token
    }

    fn set_top(&mut self, frame: Frame) {
        if let Some(top) = self.stack.last_mut() {
            *top = frame;
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.offset(), message)
    }

    fn fill(&mut self) -> Result<bool> {
        if self.pos < self.filled {
            return Ok(true);
        }
        self.base += self.filled as u64;
        self.pos = 0;
        self.filled = 0;
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => {
                    self.filled = n;
                    return Ok(n > 0);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::io(format!("read at {}", self.base), e)),
            }
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        if self.fill()? {
            Ok(Some(self.buf[self.pos]))
        } else {
            Ok(None)
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let b = self.peek()?;
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }

    fn expect_byte(&mut self) -> Result<u8> {
        self.next_byte()?
            .ok_or_else(|| self.error("unexpected end of input"))
    }

    fn skip_bom(&mut self) -> Result<()> {
        if self.peek()? != Some(0xEF) {
            return Ok(());
        }
        for expected in [0xEF, 0xBB, 0xBF] {
            if self.expect_byte()? != expected {
                return Err(self.error("invalid byte order mark"));
            }
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b) = self.peek()? {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
        Ok(())
    }

    fn scan_literal(&mut self, literal: &[u8]) -> Result<()> {
        for &expected in literal {
            if self.peek()? != Some(expected) {
                return Err(self.error(format!(
                    "invalid literal, expected '{}'",
                    literal.escape_ascii()
                )));
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn scan_number(&mut self) -> Result<String> {
        let start = self.offset();
        let mut text = String::new();
        while let Some(b) = self.peek()? {
            match b {
                b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E' => {
                    text.push(b as char);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if !is_valid_number(&text) {
            return Err(Error::parse(start, format!("invalid number '{text}'")));
        }
        Ok(text)
    }

    /// Scans a string literal starting at the opening quote and returns its
    /// decoded content.
    fn scan_string(&mut self) -> Result<String> {
        let start = self.offset();
        self.pos += 1;
        let mut bytes = Vec::new();
        loop {
            let b = self.expect_byte()?;
            match b {
                b'"' => break,
                b'\\' => self.scan_escape(&mut bytes)?,
                0x00..=0x1F => return Err(self.error("control character in string")),
                _ => bytes.push(b),
            }
        }
        String::from_utf8(bytes).map_err(|_| Error::parse(start, "invalid UTF-8 in string"))
    }

    fn scan_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let c = match self.expect_byte()? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let first = self.scan_hex4()?;
                match first {
                    0xD800..=0xDBFF => {
                        if self.expect_byte()? != b'\\' || self.expect_byte()? != b'u' {
                            return Err(self.error("unpaired surrogate in string"));
                        }
                        let second = self.scan_hex4()?;
                        if !(0xDC00..=0xDFFF).contains(&second) {
                            return Err(self.error("invalid low surrogate in string"));
                        }
                        let code = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))?
                    }
                    0xDC00..=0xDFFF => return Err(self.error("unpaired surrogate in string")),
                    _ => char::from_u32(first).ok_or_else(|| self.error("invalid code point"))?,
                }
            }
            _ => return Err(self.error("invalid escape sequence")),
        };
        let mut utf8 = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
        Ok(())
    }

    fn scan_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let b = self.expect_byte()?;
            let digit = (b as char)
                .to_digit(16)
                .ok_or_else(|| self.error("invalid \\u escape"))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }
}

impl<R: Read> Iterator for JsonTokenizer<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = try_or_ret_some_err!(self.next_token());
        token.map(Ok)
    }
}

/// Checks `text` against the JSON number grammar:
/// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`.
fn is_valid_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i - start
    };

    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            digits(&mut i);
        }
        _ => return false,
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        if digits(&mut i) == 0 {
            return false;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if digits(&mut i) == 0 {
            return false;
        }
    }
    i == bytes.len()
}
