// SPDX-License-Identifier: Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used)]
use plankton_core::{Arena, Variant};
use plankton_text::{Dialect, TextReader, TextWriter};
use proptest::prelude::*;

proptest! {
    #[test]
    fn integer_roundtrips_through_source_dialect(value in any::<i64>()) {
        let arena = Arena::new();
        let text = TextWriter::new(Dialect::Source).write(Variant::Integer(value));
        let reader = TextReader::new(&arena, Dialect::Source);
        let parsed = reader.parse(text.as_bytes());
        prop_assert!(!reader.has_failed());
        prop_assert_eq!(parsed.as_integer(), Some(value));
    }

    #[test]
    fn unquoted_string_roundtrips_through_source_dialect(
        s in "[A-Za-z][A-Za-z0-9_-]{0,31}"
    ) {
        let arena = Arena::new();
        let value = arena.new_string(&s);
        let text = TextWriter::new(Dialect::Source).write(value);
        let reader = TextReader::new(&arena, Dialect::Source);
        let parsed = reader.parse(text.as_bytes());
        prop_assert!(!reader.has_failed());
        prop_assert_eq!(
            parsed.as_string().unwrap().with_bytes(|b| b.to_vec()),
            s.into_bytes()
        );
    }

    #[test]
    fn integer_array_roundtrips_through_source_dialect(values in prop::collection::vec(any::<i64>(), 0..16)) {
        let arena = Arena::new();
        let array = arena.new_array();
        let array_ref = array.as_array().unwrap();
        for v in &values {
            array_ref.push(Variant::Integer(*v)).unwrap();
        }
        array_ref.freeze();

        let text = TextWriter::new(Dialect::Source).write(array);
        let reader = TextReader::new(&arena, Dialect::Source);
        let parsed = reader.parse(text.as_bytes());
        prop_assert!(!reader.has_failed());
        let items: Vec<_> = parsed.as_array().unwrap().iter().collect();
        prop_assert_eq!(items.len(), values.len());
        for (item, expected) in items.iter().zip(values.iter()) {
            prop_assert_eq!(item.as_integer(), Some(*expected));
        }
    }
}
