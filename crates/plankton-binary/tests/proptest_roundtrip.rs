// SPDX-License-Identifier: Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used)]
use plankton_binary::varint::{
    read_biased_uvarint, write_biased_uvarint, zigzag_decode, zigzag_encode,
};
use plankton_binary::{BinaryReader, BinaryWriter};
use plankton_core::{Arena, Variant};
use proptest::prelude::*;

proptest! {
    #[test]
    fn uvarint_roundtrips_for_any_u64(value in any::<u64>()) {
        let mut bytes = Vec::new();
        write_biased_uvarint(value, &mut bytes);
        let mut cursor = 0;
        let decoded = read_biased_uvarint(&bytes, &mut cursor).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(cursor, bytes.len());
    }

    #[test]
    fn zigzag_roundtrips_for_any_i64(value in any::<i64>()) {
        prop_assert_eq!(zigzag_decode(zigzag_encode(value)), value);
    }

    #[test]
    fn integer_tree_roundtrips_through_binary_codec(values in prop::collection::vec(any::<i64>(), 0..16)) {
        let arena = Arena::new();
        let array = arena.new_array();
        let array_ref = array.as_array().unwrap();
        for v in &values {
            array_ref.push(Variant::Integer(*v)).unwrap();
        }
        array_ref.freeze();

        let bytes = BinaryWriter::new().write(array);

        let out_arena = Arena::new();
        let decoded = BinaryReader::new(&out_arena).parse(&bytes).unwrap();
        let items: Vec<_> = decoded.as_array().unwrap().iter().collect();
        prop_assert_eq!(items.len(), values.len());
        for (item, expected) in items.iter().zip(values.iter()) {
            prop_assert_eq!(item.as_integer(), Some(*expected));
        }
    }

    // A string long enough to be referenceable (see `REFERENCEABLE_LEN_THRESHOLD`)
    // followed by two pushes of the same shared array: the writer assigns the
    // string and the shared array each a reference offset, and the two array
    // slots must decode back to the identical shared value regardless of the
    // string's exact length, pinning down the writer/reader offset-counter fix.
    #[test]
    fn shared_array_after_a_long_string_decodes_to_the_same_value(len in 17usize..64) {
        let arena = Arena::new();
        let outer = arena.new_array();
        let outer_ref = outer.as_array().unwrap();
        let long_string = arena.new_string(&"x".repeat(len));
        let inner = arena.new_array();
        let inner_ref = inner.as_array().unwrap();
        inner_ref.push(Variant::Integer(42)).unwrap();
        inner_ref.freeze();
        outer_ref.push(long_string).unwrap();
        outer_ref.push(inner).unwrap();
        outer_ref.push(inner).unwrap();
        outer_ref.freeze();

        let bytes = BinaryWriter::new().write(outer);

        let out_arena = Arena::new();
        let decoded = BinaryReader::new(&out_arena).parse(&bytes).unwrap();
        let items: Vec<_> = decoded.as_array().unwrap().iter().collect();
        prop_assert_eq!(items.len(), 3);
        prop_assert_eq!(items[1], items[2]);
    }
}
