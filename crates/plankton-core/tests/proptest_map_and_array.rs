// SPDX-License-Identifier: Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used)]
use plankton_core::{Arena, Variant};
use proptest::prelude::*;

proptest! {
    #[test]
    fn array_get_returns_pushed_values_in_order(values in prop::collection::vec(any::<i64>(), 0..32)) {
        let arena = Arena::new();
        let array = arena.new_array();
        let array_ref = array.as_array().unwrap();
        for v in &values {
            array_ref.push(Variant::Integer(*v)).unwrap();
        }
        prop_assert_eq!(array_ref.len(), values.len());
        for (i, expected) in values.iter().enumerate() {
            prop_assert_eq!(array_ref.get(i).unwrap().as_integer(), Some(*expected));
        }
    }

    // A map built from `keys` (with possible repeats) and arbitrary values must
    // keep only the first value ever associated with a repeated key: later
    // `set` calls for a key already present are no-ops.
    #[test]
    fn map_keeps_first_value_for_repeated_keys(keys in prop::collection::vec(0u8..6, 1..24)) {
        let arena = Arena::new();
        let map = arena.new_map().as_map().unwrap();
        let mut first_seen = std::collections::HashMap::new();
        for (i, k) in keys.iter().enumerate() {
            let key = arena.new_string(&format!("k{k}"));
            let value = Variant::Integer(i as i64);
            map.set(key, value).unwrap();
            first_seen.entry(*k).or_insert(i as i64);
        }
        for k in first_seen.keys() {
            let key = arena.new_string(&format!("k{k}"));
            prop_assert_eq!(map.get(&key).unwrap().as_integer(), Some(first_seen[k]));
        }
        prop_assert_eq!(map.len(), first_seen.len());
    }
}
