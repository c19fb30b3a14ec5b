//! The two text-syntax dialects (§4.2).

/// Which flavor of the text grammar a [`crate::writer::TextWriter`] or
/// [`crate::reader::TextReader`] speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// The source dialect: comma-separated arrays/maps, `key: value` map
    /// entries, optional trailing comma.
    #[default]
    Source,
    /// The command dialect, intended for shell-style argv: whitespace
    /// separates array/command elements and map keys are introduced with
    /// `--`.
    Command,
}
