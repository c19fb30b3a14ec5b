//! Character classification and whitespace/comment skipping shared by the
//! reader and writer.
//!
//! Ground rule for nested block comments: `#` has no
//! special meaning while a block comment is open. Only a balanced `#{`/`#}`
//! pair advances or closes the nesting depth; an end-of-line comment cannot
//! start, and so cannot "eat", a `#}` marker while a block comment owns the
//! cursor.

/// `true` for the format's whitespace set: space, tab, newline, form feed,
/// carriage return.
#[must_use]
pub(crate) fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | 0x0C | b'\r')
}

/// `true` for the characters that terminate an end-of-line comment.
#[must_use]
pub(crate) fn is_newline(c: u8) -> bool {
    matches!(c, b'\n' | 0x0C)
}

#[must_use]
pub(crate) fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

#[must_use]
pub(crate) fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

/// `true` for the lead character of an unquoted string/identifier.
#[must_use]
pub(crate) fn is_unquoted_start(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

/// `true` for a non-lead character of an unquoted string/identifier.
#[must_use]
pub(crate) fn is_unquoted_part(c: u8) -> bool {
    is_unquoted_start(c) || c.is_ascii_digit() || c == b'_' || c == b'-'
}

/// Skip whitespace, end-of-line comments (`#` through the next newline) and
/// nested block comments (`#{ ... #}`), advancing `*cursor` past all of it.
pub(crate) fn skip_whitespace_and_comments(bytes: &[u8], cursor: &mut usize) {
    loop {
        while *cursor < bytes.len() && is_whitespace(bytes[*cursor]) {
            *cursor += 1;
        }
        if *cursor < bytes.len() && bytes[*cursor] == b'#' {
            if bytes.get(*cursor + 1) == Some(&b'{') {
                *cursor += 2;
                skip_block_comment(bytes, cursor);
            } else {
                while *cursor < bytes.len() && !is_newline(bytes[*cursor]) {
                    *cursor += 1;
                }
            }
            continue;
        }
        break;
    }
}

/// Skip the body of a block comment whose opening `#{` has already been
/// consumed, tracking full nesting depth.
fn skip_block_comment(bytes: &[u8], cursor: &mut usize) {
    let mut depth = 1usize;
    while depth > 0 && *cursor < bytes.len() {
        if bytes[*cursor] == b'#' && bytes.get(*cursor + 1) == Some(&b'{') {
            depth += 1;
            *cursor += 2;
        } else if bytes[*cursor] == b'#' && bytes.get(*cursor + 1) == Some(&b'}') {
            depth -= 1;
            *cursor += 2;
        } else {
            *cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip(input: &str) -> usize {
        let bytes = input.as_bytes();
        let mut cursor = 0;
        skip_whitespace_and_comments(bytes, &mut cursor);
        cursor
    }

    #[test]
    fn skips_plain_whitespace() {
        assert_eq!(skip("   x"), 3);
    }

    #[test]
    fn skips_end_of_line_comment() {
        assert_eq!(skip("# here comes false\n %f"), "# here comes false\n ".len());
    }

    #[test]
    fn skips_deeply_nested_block_comment() {
        let input = "#{ #{ #{ deeply nested #} #} #} %t";
        let prefix_len = input.len() - "%t".len();
        assert_eq!(skip(input), prefix_len);
    }

    #[test]
    fn hash_inside_block_comment_has_no_meaning() {
        let input = "#{ # not an eol comment #} %n";
        let prefix_len = input.len() - "%n".len();
        assert_eq!(skip(input), prefix_len);
    }
}
