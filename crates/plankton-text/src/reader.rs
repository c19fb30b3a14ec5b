//! Recursive-descent parser for the text syntax (§4.2, §4.4).
//!
//! Ported in spirit from `TextReaderImpl` in
//! `examples/original_source/src/c/plankton-text.cc`, extended for `Id`
//! literals, seed/object literals (`@Header(...)` / `@Header{...}`), and the
//! command dialect's top-level `arg* (--key value)*` grammar.

use plankton_core::{Arena, Variant};

use crate::dialect::Dialect;
use crate::error::SyntaxError;
use crate::lexer::{is_digit, is_hex_digit, is_unquoted_part, is_unquoted_start, skip_whitespace_and_comments};

/// The result of parsing a top-level command line (§4.2's command dialect):
/// an ordered list of positional arguments and a map of `--key value` options.
#[derive(Debug, Clone)]
pub struct Command<'a> {
    /// Positional arguments, in the order they appeared.
    pub arguments: Vec<Variant<'a>>,
    /// `--key value` options, keyed by the unquoted key token.
    pub options: plankton_core::MapRef<'a>,
}

impl<'a> Command<'a> {
    /// Reconstruct a single string from [`Self::arguments`], inserting a
    /// single space between each. Non-string arguments are rendered as their
    /// literal token form; empty string arguments leave adjacent separators.
    #[must_use]
    pub fn join_arguments(&self) -> String {
        self.arguments
            .iter()
            .map(|v| stringify_arg(*v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn stringify_arg(value: Variant<'_>) -> String {
    match value {
        Variant::String(s) => s.with_bytes(|b| String::from_utf8_lossy(b).into_owned()),
        Variant::Integer(i) => i.to_string(),
        Variant::Bool(true) => "%t".to_string(),
        Variant::Bool(false) => "%f".to_string(),
        Variant::Null => "%n".to_string(),
        _ => String::new(),
    }
}

/// Parses text-syntax input into [`Variant`] trees.
///
/// Failure is recorded on the reader rather than propagated through
/// `Result`: [`Self::parse`]/[`Self::parse_command`] return a null/absent
/// result and record `{offender, offset}`, queryable via [`Self::has_failed`]
/// and [`Self::error`] until the next call to either method resets it. This
/// mirrors the original `TextReader`'s `has_failed()`/offender model.
pub struct TextReader<'a> {
    arena: &'a Arena,
    dialect: Dialect,
    last_error: std::cell::Cell<Option<SyntaxError>>,
}

impl<'a> TextReader<'a> {
    /// Create a reader bound to `arena`, parsing the given dialect's grammar.
    #[must_use]
    pub fn new(arena: &'a Arena, dialect: Dialect) -> Self {
        Self {
            arena,
            dialect,
            last_error: std::cell::Cell::new(None),
        }
    }

    /// `true` if the most recent [`Self::parse`]/[`Self::parse_command`] call
    /// failed.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.last_error.get().is_some()
    }

    /// The offender/offset recorded by the most recent failed parse, if any.
    #[must_use]
    pub fn error(&self) -> Option<SyntaxError> {
        self.last_error.get()
    }

    /// Parse `input` as a single top-level value. On success, returns the
    /// parsed value and clears [`Self::has_failed`]. On failure, records the
    /// [`SyntaxError`] (retrievable via [`Self::error`]) and returns
    /// [`Variant::Null`].
    pub fn parse(&self, input: &[u8]) -> Variant<'a> {
        self.last_error.set(None);
        match self.decode_value(input) {
            Ok(value) => value,
            Err(err) => {
                self.last_error.set(Some(err));
                Variant::Null
            }
        }
    }

    fn decode_value(&self, input: &[u8]) -> Result<Variant<'a>, SyntaxError> {
        let mut session = Session {
            bytes: input,
            cursor: 0,
            arena: self.arena,
            dialect: self.dialect,
        };
        session.skip_ws();
        let value = session.decode()?;
        if session.has_more() {
            return Err(session.error_here());
        }
        Ok(value)
    }

    /// Parse `input` as a command line: `arg* (--key value)*`. On success,
    /// returns the parsed [`Command`] and clears [`Self::has_failed`]. On
    /// failure, records the [`SyntaxError`] and returns `None`.
    pub fn parse_command(&self, input: &[u8]) -> Option<Command<'a>> {
        self.last_error.set(None);
        match self.decode_command(input) {
            Ok(command) => Some(command),
            Err(err) => {
                self.last_error.set(Some(err));
                None
            }
        }
    }

    // Invariant: the value just came out of an Arena constructor for this
    // exact kind, so the as_*/identity_key projection cannot fail here.
    #[allow(clippy::expect_used)]
    fn decode_command(&self, input: &[u8]) -> Result<Command<'a>, SyntaxError> {
        let mut session = Session {
            bytes: input,
            cursor: 0,
            arena: self.arena,
            dialect: self.dialect,
        };
        session.skip_ws();
        let options = self.arena.new_map();
        let options_ref = options.as_map().expect("new_map returns Variant::Map");
        let mut arguments = Vec::new();
        while session.has_more() {
            if session.current() == b'-' && session.peek(1) == Some(b'-') {
                session.advance();
                session.advance();
                session.skip_ws();
                let key = session.decode_unquoted_string()?;
                session.skip_ws();
                let value = session.decode()?;
                options_ref
                    .set(key, value)
                    .map_err(|_| session.error_at(session.cursor))?;
            } else {
                let arg = session.decode()?;
                arguments.push(arg);
            }
        }
        options_ref.freeze();
        Ok(Command {
            arguments,
            options: options_ref,
        })
    }
}

struct Session<'a> {
    bytes: &'a [u8],
    cursor: usize,
    arena: &'a Arena,
    dialect: Dialect,
}

impl<'a> Session<'a> {
    fn has_more(&self) -> bool {
        self.cursor < self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes.get(self.cursor).copied().unwrap_or(0)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.cursor + ahead).copied()
    }

    fn advance(&mut self) {
        if self.has_more() {
            self.cursor += 1;
        }
    }

    fn skip_ws(&mut self) {
        skip_whitespace_and_comments(self.bytes, &mut self.cursor);
    }

    fn advance_and_skip(&mut self) {
        self.advance();
        self.skip_ws();
    }

    fn error_here(&self) -> SyntaxError {
        self.error_at(self.cursor)
    }

    fn error_at(&self, offset: usize) -> SyntaxError {
        SyntaxError {
            offender: self.bytes.get(offset).copied().unwrap_or(0),
            offset,
        }
    }

    fn decode(&mut self) -> Result<Variant<'a>, SyntaxError> {
        match self.current() {
            b'%' => {
                self.advance();
                match self.current() {
                    b'f' => {
                        self.advance_and_skip();
                        Ok(Variant::Bool(false))
                    }
                    b't' => {
                        self.advance_and_skip();
                        Ok(Variant::Bool(true))
                    }
                    b'n' => {
                        self.advance_and_skip();
                        Ok(Variant::Null)
                    }
                    b'[' => self.decode_blob(),
                    _ => Err(self.error_here()),
                }
            }
            b'[' => self.decode_array(),
            b'{' => self.decode_map(),
            b'"' => self.decode_quoted_string(),
            b'~' => self.decode_id(),
            b'@' => self.decode_object(),
            c if c == b'-' || is_digit(c) => self.decode_integer(),
            c if is_unquoted_start(c) => self.decode_unquoted_string(),
            _ => Err(self.error_here()),
        }
    }

    fn decode_integer(&mut self) -> Result<Variant<'a>, SyntaxError> {
        let start = self.cursor;
        let mut is_negative = false;
        if self.current() == b'-' {
            is_negative = true;
            self.advance();
        }
        let digits_start = self.cursor;
        while is_digit(self.current()) {
            self.advance();
        }
        if self.cursor == digits_start {
            // No digits: matches the original's fallthrough (lone `-` parses as 0).
            self.skip_ws();
            return Ok(Variant::Integer(0));
        }
        let digits = std::str::from_utf8(&self.bytes[digits_start..self.cursor])
            .map_err(|_| self.error_at(start))?;
        let magnitude: i64 = digits.parse().map_err(|_| self.error_at(start))?;
        self.skip_ws();
        Ok(Variant::Integer(if is_negative { -magnitude } else { magnitude }))
    }

    fn decode_unquoted_string(&mut self) -> Result<Variant<'a>, SyntaxError> {
        let start = self.cursor;
        while is_unquoted_part(self.current()) {
            self.advance();
        }
        if self.cursor == start {
            return Err(self.error_here());
        }
        let text = &self.bytes[start..self.cursor];
        self.skip_ws();
        // SAFETY-free: `is_unquoted_part` only admits ASCII.
        Ok(self.arena.new_string(std::str::from_utf8(text).unwrap_or_default()))
    }

    fn decode_quoted_string(&mut self) -> Result<Variant<'a>, SyntaxError> {
        self.advance();
        let mut buf = Vec::new();
        while self.has_more() && self.current() != b'"' {
            if self.current() == b'\\' {
                self.advance();
                if !self.has_more() {
                    return Err(self.error_here());
                }
                if self.current() == b'x' {
                    self.advance();
                    let high = parse_hex_digit(self.current()).ok_or_else(|| self.error_here())?;
                    self.advance();
                    let low = parse_hex_digit(self.current()).ok_or_else(|| self.error_here())?;
                    self.advance();
                    buf.push((high << 4) | low);
                } else {
                    let special = decode_short_escape(self.current()).ok_or_else(|| self.error_here())?;
                    buf.push(special);
                    self.advance();
                }
            } else {
                buf.push(self.current());
                self.advance();
            }
        }
        if self.current() != b'"' {
            return Err(self.error_here());
        }
        self.advance_and_skip();
        Ok(self.arena.new_string_with_encoding(&buf, plankton_core::Encoding::Utf8))
    }

    // Invariant: the value just came out of an Arena constructor for this
    // exact kind, so the as_*/identity_key projection cannot fail here.
    #[allow(clippy::expect_used)]
    fn decode_array(&mut self) -> Result<Variant<'a>, SyntaxError> {
        self.advance_and_skip();
        let result = self.arena.new_array();
        let array = result.as_array().expect("new_array returns Variant::Array");
        while self.has_more() && self.current() != b']' {
            let next = self.decode()?;
            array.push(next).map_err(|_| self.error_here())?;
            match self.dialect {
                Dialect::Source => {
                    if self.current() == b',' {
                        self.advance_and_skip();
                    } else {
                        break;
                    }
                }
                Dialect::Command => {
                    if self.current() == b']' {
                        break;
                    }
                }
            }
        }
        if self.current() != b']' {
            return Err(self.error_here());
        }
        self.advance_and_skip();
        array.freeze();
        Ok(result)
    }

    // Invariant: the value just came out of an Arena constructor for this
    // exact kind, so the as_*/identity_key projection cannot fail here.
    #[allow(clippy::expect_used)]
    fn decode_map(&mut self) -> Result<Variant<'a>, SyntaxError> {
        self.advance_and_skip();
        let result = self.arena.new_map();
        let map = result.as_map().expect("new_map returns Variant::Map");
        while self.has_more() && self.current() != b'}' {
            match self.dialect {
                Dialect::Source => {
                    let key = self.decode()?;
                    if self.current() != b':' {
                        return Err(self.error_here());
                    }
                    self.advance_and_skip();
                    let value = self.decode()?;
                    map.set(key, value).map_err(|_| self.error_here())?;
                    if self.current() == b',' {
                        self.advance_and_skip();
                    } else {
                        break;
                    }
                }
                Dialect::Command => {
                    if self.current() != b'-' || self.peek(1) != Some(b'-') {
                        return Err(self.error_here());
                    }
                    self.advance();
                    self.advance();
                    self.skip_ws();
                    let key = self.decode_unquoted_string()?;
                    self.skip_ws();
                    let value = self.decode()?;
                    map.set(key, value).map_err(|_| self.error_here())?;
                    if self.current() == b'}' {
                        break;
                    }
                }
            }
        }
        if self.current() != b'}' {
            return Err(self.error_here());
        }
        self.advance_and_skip();
        map.freeze();
        Ok(result)
    }

    fn decode_blob(&mut self) -> Result<Variant<'a>, SyntaxError> {
        let mut data = Vec::new();
        if self.current() == b'[' {
            self.advance_and_skip();
        } else {
            return Err(self.error_here());
        }
        while self.has_more() && self.current() != b']' {
            let a = self.read_sextet()?;
            let b = self.read_sextet()?;
            let c = self.read_sextet_or_padding()?;
            let d = self.read_sextet_or_padding()?;
            data.push((a << 2) | (b >> 4));
            if let Some(c) = c {
                data.push(((b << 4) | (c >> 2)) & 0xFF);
                if let Some(d) = d {
                    data.push(((c << 6) | d) & 0xFF);
                }
            }
        }
        if self.current() != b']' {
            return Err(self.error_here());
        }
        self.advance_and_skip();
        Ok(self.arena.new_blob(&data))
    }

    fn read_sextet(&mut self) -> Result<u8, SyntaxError> {
        match crate::base64::decode_char(self.current()) {
            crate::base64::Sextet::Value(v) => {
                self.advance_and_skip();
                Ok(v)
            }
            _ => Err(self.error_here()),
        }
    }

    fn read_sextet_or_padding(&mut self) -> Result<Option<u8>, SyntaxError> {
        match crate::base64::decode_char(self.current()) {
            crate::base64::Sextet::Value(v) => {
                self.advance_and_skip();
                Ok(Some(v))
            }
            crate::base64::Sextet::Padding => {
                self.advance_and_skip();
                Ok(None)
            }
            crate::base64::Sextet::Invalid => Err(self.error_here()),
        }
    }

    fn decode_id(&mut self) -> Result<Variant<'a>, SyntaxError> {
        self.advance();
        let decimal_start = self.cursor;
        while is_digit(self.current()) {
            self.advance();
        }
        let (size, hex_start) = if self.cursor > decimal_start && self.current() == b':' {
            let size_text = std::str::from_utf8(&self.bytes[decimal_start..self.cursor])
                .map_err(|_| self.error_at(decimal_start))?;
            let size: u32 = size_text.parse().map_err(|_| self.error_at(decimal_start))?;
            self.advance();
            (size, self.cursor)
        } else {
            self.cursor = decimal_start;
            (0, decimal_start)
        };
        while is_hex_digit(self.current()) {
            self.advance();
        }
        let hex_text = std::str::from_utf8(&self.bytes[hex_start..self.cursor])
            .map_err(|_| self.error_at(hex_start))?;
        let size = if size == 0 {
            match hex_text.len() {
                2 => 8,
                4 => 16,
                8 => 32,
                16 => 64,
                _ => return Err(self.error_at(hex_start)),
            }
        } else {
            size
        };
        let value = u64::from_str_radix(hex_text, 16).map_err(|_| self.error_at(hex_start))?;
        self.skip_ws();
        Ok(Variant::Id { size, value })
    }

    // Invariant: the value just came out of an Arena constructor for this
    // exact kind, so the as_*/identity_key projection cannot fail here.
    #[allow(clippy::expect_used)]
    fn decode_object(&mut self) -> Result<Variant<'a>, SyntaxError> {
        self.advance();
        let header = self.decode()?;
        let (open, close) = match self.current() {
            b'(' => (b'(', b')'),
            b'{' => (b'{', b'}'),
            _ => return Err(self.error_here()),
        };
        debug_assert_eq!(self.current(), open);
        self.advance_and_skip();
        let payload = self.arena.new_map();
        let map = payload.as_map().expect("new_map returns Variant::Map");
        while self.has_more() && self.current() != close {
            let key = self.decode()?;
            if self.current() != b':' {
                return Err(self.error_here());
            }
            self.advance_and_skip();
            let value = self.decode()?;
            map.set(key, value).map_err(|_| self.error_here())?;
            if self.current() == b',' {
                self.advance_and_skip();
            } else {
                break;
            }
        }
        if self.current() != close {
            return Err(self.error_here());
        }
        self.advance_and_skip();
        map.freeze();
        Ok(self.arena.new_object_with_payload(header, payload))
    }
}

fn parse_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn decode_short_escape(c: u8) -> Option<u8> {
    Some(match c {
        b'a' => 0x07,
        b'b' => 0x08,
        b'f' => 0x0C,
        b'n' => b'\n',
        b't' => b'\t',
        b'r' => b'\r',
        b'v' => 0x0B,
        b'0' => 0x00,
        b'\\' => b'\\',
        b'"' => b'"',
        _ => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Source);
        assert_eq!(reader.parse(b"%t").as_bool(), Some(true));
        assert_eq!(reader.parse(b"%f").as_bool(), Some(false));
        assert!(reader.parse(b"%n").is_null());
        assert_eq!(reader.parse(b"-42").as_integer(), Some(-42));
        assert!(!reader.has_failed());
    }

    #[test]
    fn parses_unquoted_and_quoted_strings() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Source);
        let s = reader.parse(b"hello-world_1");
        assert_eq!(s.as_string().unwrap().with_bytes(|b| b.to_vec()), b"hello-world_1");
        let q = reader.parse(br#""a\nb""#);
        assert_eq!(q.as_string().unwrap().with_bytes(|b| b.to_vec()), b"a\nb");
    }

    #[test]
    fn parses_array_and_map() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Source);
        let array = reader.parse(b"[1, 2, 3]");
        let items: Vec<_> = array.as_array().unwrap().iter().collect();
        assert_eq!(items.len(), 3);
        let map = reader.parse(b"{foo: 1, bar: 2}");
        assert_eq!(map.as_map().unwrap().len(), 2);
    }

    #[test]
    fn parses_blob() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Source);
        let blob = reader.parse(b"%[YWJj]");
        assert_eq!(blob.as_blob().unwrap().with_bytes(|b| b.to_vec()), b"abc");
    }

    #[test]
    fn parses_id_shorthands_and_general_form() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Source);
        assert_eq!(reader.parse(b"~ab"), Variant::Id { size: 8, value: 0xAB });
        match reader.parse(b"~12:abc") {
            Variant::Id { size, value } => {
                assert_eq!(size, 12);
                assert_eq!(value, 0xABC);
            }
            other => panic!("expected Id, got {other:?}"),
        }
    }

    #[test]
    fn parses_seed_short_and_long_forms() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Source);
        let value = reader.parse(b"@Header(x: 10, y: 18)");
        let object = value.as_object().unwrap();
        assert_eq!(object.payload().len(), 2);
        let value2 = reader.parse(b"@Header{x: 10}");
        assert!(value2.as_object().is_some());
    }

    #[test]
    fn rejects_trailing_garbage() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Source);
        assert!(reader.parse(b"%t %t").is_null());
        assert!(reader.has_failed());
        let error = reader.error().expect("failed parse records an error");
        assert!(error.offset > 0);
    }

    #[test]
    fn has_failed_resets_on_next_parse() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Source);
        assert!(reader.parse(b"%t %t").is_null());
        assert!(reader.has_failed());
        assert!(reader.parse(b"%t").as_bool().is_some());
        assert!(!reader.has_failed(), "a successful parse clears the prior failure");
        assert!(reader.error().is_none());
    }

    #[test]
    fn parses_command_arguments_and_options() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Command);
        let command = reader
            .parse_command(b"build --verbose %t --target x86")
            .expect("well-formed command line parses");
        assert_eq!(command.arguments.len(), 1);
        assert_eq!(command.options.len(), 2);
        assert_eq!(command.join_arguments(), "build");
    }

    #[test]
    fn parse_command_records_error_and_returns_none_on_malformed_input() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Command);
        assert!(reader.parse_command(b"build --").is_none());
        assert!(reader.has_failed());
    }
}
