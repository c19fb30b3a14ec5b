//! Pretty-printing writer for the text syntax (§4.2, §4.3).
//!
//! Ported in spirit from `TextWriterImpl` in
//! `examples/original_source/src/c/plankton-text.cc`: the same bounded
//! short-length probe, the same base64 blob encoding, the same escape table.
//! Extended for the variant kinds the original writer never had to handle
//! (`Id`, seed `Object`, `Native`) and for the command dialect's whitespace/
//! `--key` container syntax.

use plankton_core::Variant;

use crate::base64;
use crate::dialect::Dialect;

/// Lengths up to (but not including) this are considered short; past it the
/// writer switches a container to block form. Matches
/// `TextWriterImpl::kShortLengthLimit`.
const SHORT_LENGTH_LIMIT: usize = 80;

/// Writes [`Variant`] trees as 7-bit ASCII text in a chosen [`Dialect`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextWriter {
    dialect: Dialect,
}

impl TextWriter {
    /// Create a writer for the given dialect.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Format `value` as text.
    #[must_use]
    pub fn write(&self, value: Variant<'_>) -> String {
        let mut session = WriterSession {
            dialect: self.dialect,
            out: String::new(),
            indent: 0,
            pending_newline: false,
        };
        session.write(value);
        session.flush_pending_newline();
        session.out
    }
}

struct WriterSession {
    dialect: Dialect,
    out: String,
    indent: usize,
    pending_newline: bool,
}

impl WriterSession {
    fn flush_pending_newline(&mut self) {
        if !self.pending_newline {
            return;
        }
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push(' ');
        }
        self.pending_newline = false;
    }

    fn push_str(&mut self, s: &str) {
        self.flush_pending_newline();
        self.out.push_str(s);
    }

    fn push_char(&mut self, c: char) {
        self.flush_pending_newline();
        self.out.push(c);
    }

    fn schedule_newline(&mut self) {
        self.pending_newline = true;
    }

    fn indent_in(&mut self) {
        self.indent += 2;
    }

    fn indent_out(&mut self) {
        self.indent -= 2;
    }

    fn write(&mut self, value: Variant<'_>) {
        match value {
            Variant::Null => self.push_str("%n"),
            Variant::Bool(true) => self.push_str("%t"),
            Variant::Bool(false) => self.push_str("%f"),
            Variant::Integer(i) => self.push_str(&i.to_string()),
            Variant::Id { size, value } => self.write_id(size, value),
            Variant::String(s) => s.with_bytes(|b| self.write_string(b)),
            Variant::Blob(b) => b.with_bytes(|bytes| self.write_blob(bytes)),
            Variant::Array(a) => self.write_array(a.iter().collect()),
            Variant::Map(m) => self.write_map(m.iter().collect()),
            Variant::Object(o) => self.write_object(o.header(), o.payload().iter().collect()),
            Variant::Native(n) => {
                let descriptor = n.descriptor();
                let arena = n.arena();
                let seed = n.with_any(|any| descriptor.encode(any, arena));
                match seed {
                    Variant::Object(o) => self.write_object(o.header(), o.payload().iter().collect()),
                    other => self.write(other),
                }
            }
        }
    }

    fn write_id(&mut self, size: u32, value: u64) {
        let text = match size {
            64 => format!("~{value:016x}"),
            32 => format!("~{value:08x}"),
            16 => format!("~{value:04x}"),
            8 => format!("~{value:02x}"),
            other => format!("~{other}:{value:x}"),
        };
        self.push_str(&text);
    }

    fn write_string(&mut self, bytes: &[u8]) {
        if is_unquoted(bytes) {
            // SAFETY-free: unquoted strings are ASCII letters/digits/`_`/`-`.
            self.push_str(std::str::from_utf8(bytes).unwrap_or_default());
            return;
        }
        self.push_char('"');
        for &b in bytes {
            if is_unescaped(b) {
                self.out.push(b as char);
            } else if let Some(short) = encode_short_escape(b) {
                self.out.push('\\');
                self.out.push(short);
            } else {
                self.out.push('\\');
                self.out.push('x');
                self.out.push_str(&format!("{b:02x}"));
            }
        }
        self.out.push('"');
    }

    fn write_blob(&mut self, bytes: &[u8]) {
        self.push_str("%[");
        base64::encode(bytes, &mut self.out);
        self.out.push(']');
    }

    fn write_array(&mut self, items: Vec<Variant<'_>>) {
        let is_long = get_short_length_items(&items, self.indent) >= SHORT_LENGTH_LIMIT;
        self.push_char('[');
        if is_long {
            self.indent_in();
            self.schedule_newline();
        }
        for (i, item) in items.iter().enumerate() {
            self.write(*item);
            let is_last = i + 1 == items.len();
            if self.dialect == Dialect::Source && !is_last {
                self.push_char(',');
                if !is_long {
                    self.push_char(' ');
                }
            } else if self.dialect == Dialect::Command && !is_last && !is_long {
                self.push_char(' ');
            }
            if is_long {
                self.schedule_newline();
            }
        }
        if is_long {
            self.indent_out();
        }
        self.push_char(']');
    }

    fn write_map(&mut self, entries: Vec<(Variant<'_>, Variant<'_>)>) {
        let is_long = get_short_length_map(&entries, self.indent) >= SHORT_LENGTH_LIMIT;
        self.push_char('{');
        if is_long {
            self.indent_in();
            self.schedule_newline();
        }
        for (i, (key, value)) in entries.iter().enumerate() {
            let is_last = i + 1 == entries.len();
            match self.dialect {
                Dialect::Source => {
                    self.write(*key);
                    self.push_char(':');
                    self.push_char(' ');
                    self.write(*value);
                    if !is_last {
                        self.push_char(',');
                        if !is_long {
                            self.push_char(' ');
                        }
                    }
                }
                Dialect::Command => {
                    self.push_str("--");
                    self.write(*key);
                    self.push_char(' ');
                    self.write(*value);
                    if !is_last && !is_long {
                        self.push_char(' ');
                    }
                }
            }
            if is_long {
                self.schedule_newline();
            }
        }
        if is_long {
            self.indent_out();
        }
        self.push_char('}');
    }

    fn write_object(&mut self, header: Variant<'_>, fields: Vec<(Variant<'_>, Variant<'_>)>) {
        let is_long = get_short_length_object(&header, &fields, self.indent) >= SHORT_LENGTH_LIMIT;
        self.push_char('@');
        self.write(header);
        let (open, close) = if is_long { ('{', '}') } else { ('(', ')') };
        self.push_char(open);
        if is_long {
            self.indent_in();
            self.schedule_newline();
        }
        for (i, (key, value)) in fields.iter().enumerate() {
            self.write(*key);
            self.push_char(':');
            self.push_char(' ');
            self.write(*value);
            let is_last = i + 1 == fields.len();
            if !is_last {
                self.push_char(',');
                if !is_long {
                    self.push_char(' ');
                }
            }
            if is_long {
                self.schedule_newline();
            }
        }
        if is_long {
            self.indent_out();
        }
        self.push_char(close);
    }
}

/// Bounded-length probe for a value, mirroring `TextWriterImpl::get_short_length`:
/// a linear walk that returns early once `offset` reaches [`SHORT_LENGTH_LIMIT`],
/// treating that as effectively infinite so a deeply nested long value can't
/// blow up the probe's own cost.
fn get_short_length(value: &Variant<'_>, offset: usize) -> usize {
    match value {
        Variant::Integer(_) => offset + 5,
        Variant::Bool(_) | Variant::Null => offset + 2,
        Variant::String(s) => offset + s.len(),
        Variant::Blob(b) => offset + 4 + (b.len() * 4).div_ceil(3),
        Variant::Array(a) => get_short_length_items(&a.iter().collect::<Vec<_>>(), offset),
        Variant::Map(m) => get_short_length_map(&m.iter().collect::<Vec<_>>(), offset),
        // Ids, objects and natives are treated as already over threshold —
        // the original's default case for unmodeled variant kinds.
        Variant::Id { .. } | Variant::Object(_) | Variant::Native(_) => SHORT_LENGTH_LIMIT,
    }
}

fn get_short_length_items(items: &[Variant<'_>], offset: usize) -> usize {
    let mut current = offset + 2;
    for item in items {
        if current >= SHORT_LENGTH_LIMIT {
            break;
        }
        current = get_short_length(item, current) + 2;
    }
    current
}

fn get_short_length_map(entries: &[(Variant<'_>, Variant<'_>)], offset: usize) -> usize {
    let mut current = offset + 2;
    for (key, value) in entries {
        if current >= SHORT_LENGTH_LIMIT {
            break;
        }
        current = get_short_length(key, current) + 2;
        current = get_short_length(value, current);
    }
    current
}

fn get_short_length_object(
    header: &Variant<'_>,
    fields: &[(Variant<'_>, Variant<'_>)],
    offset: usize,
) -> usize {
    let after_header = get_short_length(header, offset + 1);
    get_short_length_map(fields, after_header)
}

fn is_unquoted(bytes: &[u8]) -> bool {
    match bytes.split_first() {
        None => false,
        Some((&first, rest)) => {
            crate::lexer::is_unquoted_start(first) && rest.iter().all(|&b| crate::lexer::is_unquoted_part(b))
        }
    }
}

fn is_unescaped(c: u8) -> bool {
    (b' '..=b'~').contains(&c) && c != b'"' && c != b'\\'
}

fn encode_short_escape(c: u8) -> Option<char> {
    Some(match c {
        0x07 => 'a',
        0x08 => 'b',
        0x0C => 'f',
        b'\n' => 'n',
        b'\t' => 't',
        b'\r' => 'r',
        0x0B => 'v',
        0x00 => '0',
        b'\\' => '\\',
        b'"' => '"',
        _ => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use plankton_core::Arena;

    #[test]
    fn writes_scalars() {
        let writer = TextWriter::new(Dialect::Source);
        assert_eq!(writer.write(Variant::Null), "%n");
        assert_eq!(writer.write(Variant::Bool(true)), "%t");
        assert_eq!(writer.write(Variant::Bool(false)), "%f");
        assert_eq!(writer.write(Variant::Integer(-42)), "-42");
    }

    #[test]
    fn writes_unquoted_string() {
        let arena = Arena::new();
        let writer = TextWriter::new(Dialect::Source);
        let s = arena.new_string("hello-world_1");
        assert_eq!(writer.write(s), "hello-world_1");
    }

    #[test]
    fn quotes_and_escapes_string() {
        let arena = Arena::new();
        let writer = TextWriter::new(Dialect::Source);
        let s = arena.new_string("a\nb");
        assert_eq!(writer.write(s), "\"a\\nb\"");
    }

    #[test]
    fn writes_map_with_mixed_keys_inline() {
        let arena = Arena::new();
        let map = arena.new_map().as_map().unwrap();
        map.set(arena.new_string("foo"), arena.new_string("bar")).unwrap();
        map.set(Variant::Integer(8), Variant::Integer(16)).unwrap();
        map.set(arena.new_array(), arena.new_map()).unwrap();
        let writer = TextWriter::new(Dialect::Source);
        assert_eq!(writer.write(Variant::Map(map)), "{foo: bar, 8: 16, []: {}}");
    }

    #[test]
    fn writes_id_shorthands() {
        let writer = TextWriter::new(Dialect::Source);
        assert_eq!(writer.write(Variant::Id { size: 8, value: 0xAB }), "~ab");
        assert_eq!(writer.write(Variant::Id { size: 16, value: 0xABCD }), "~abcd");
    }

    #[test]
    fn writes_blob_as_base64() {
        let arena = Arena::new();
        let writer = TextWriter::new(Dialect::Source);
        let blob = arena.new_blob(b"abc");
        assert_eq!(writer.write(blob), "%[YWJj]");
    }

    #[test]
    fn long_array_switches_to_block_form() {
        let arena = Arena::new();
        let array = arena.new_array().as_array().unwrap();
        for i in 0..30 {
            array.push(Variant::Integer(i)).unwrap();
        }
        let writer = TextWriter::new(Dialect::Source);
        let text = writer.write(Variant::Array(array));
        assert!(text.contains('\n'), "long array should wrap onto multiple lines");
    }
}
