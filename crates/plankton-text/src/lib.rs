// SPDX-License-Identifier: Apache-2.0
//! 7-bit ASCII text syntax for the Plankton data model.
//!
//! [`TextWriter`] pretty-prints a [`plankton_core::Variant`] tree into one of
//! two [`Dialect`]s; [`TextReader`] parses it back, including the command
//! dialect's top-level `arg* (--key value)*` grammar via
//! [`TextReader::parse_command`].

mod base64;
mod dialect;
mod error;
mod lexer;
mod reader;
mod writer;

pub use dialect::Dialect;
pub use error::{SyntaxError, TextError};
pub use reader::{Command, TextReader};
pub use writer::TextWriter;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use plankton_core::Arena;

    #[test]
    fn round_trips_through_source_dialect() {
        let arena = Arena::new();
        let array = arena.new_array().as_array().unwrap();
        array.push(arena.new_string("hi")).unwrap();
        array.push(plankton_core::Variant::Integer(7)).unwrap();
        array.freeze();

        let writer = TextWriter::new(Dialect::Source);
        let text = writer.write(plankton_core::Variant::Array(array));

        let reader = TextReader::new(&arena, Dialect::Source);
        let parsed = reader.parse(text.as_bytes());
        assert!(!reader.has_failed());
        let items: Vec<_> = parsed.as_array().unwrap().iter().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_integer(), Some(7));
    }

    #[test]
    fn command_dialect_parses_flags_and_values() {
        let arena = Arena::new();
        let reader = TextReader::new(&arena, Dialect::Command);
        let command = reader
            .parse_command(b"deploy staging --replicas 3 --dry-run %f")
            .unwrap();
        assert_eq!(command.arguments.len(), 1);
        assert_eq!(command.join_arguments(), "deploy");
        assert_eq!(command.options.len(), 2);
    }
}
