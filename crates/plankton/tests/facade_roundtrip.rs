// SPDX-License-Identifier: Apache-2.0
//! Smoke-tests the `plankton` facade's re-exported surface: a value built
//! through `plankton::Arena` round-trips through both the binary and text
//! codecs, and a value sent over a socket pair arrives at the same stream id
//! it was addressed to.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use plankton::{
    Arena, BinaryReader, BinaryWriter, Dialect, InputSocket, OutputSocket, TextReader, TextWriter,
    Variant, ROOT_STREAM_ID,
};

#[test]
fn value_round_trips_through_binary_and_text_codecs() {
    let arena = Arena::new();
    let array = arena.new_array().as_array().expect("fresh array");
    array.push(arena.new_string("plankton")).unwrap();
    array.push(Variant::Integer(-7)).unwrap();
    array.push(Variant::Bool(true)).unwrap();
    array.freeze();
    let value = Variant::Array(array);

    let encoded = BinaryWriter::new().write(value);
    let decode_arena = Arena::new();
    let decoded = BinaryReader::new(&decode_arena).parse(&encoded).unwrap();
    let items: Vec<_> = decoded.as_array().unwrap().iter().collect();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].as_integer(), Some(-7));

    let text = TextWriter::new(Dialect::Source).write(value);
    let text_arena = Arena::new();
    let text_reader = TextReader::new(&text_arena, Dialect::Source);
    let reparsed = text_reader.parse(text.as_bytes());
    assert!(!text_reader.has_failed());
    let reparsed_items: Vec<_> = reparsed.as_array().unwrap().iter().collect();
    assert_eq!(reparsed_items.len(), 3);
    assert_eq!(reparsed_items[2].as_bool(), Some(true));
}

#[tokio::test]
async fn value_sent_over_a_socket_pair_arrives_on_the_addressed_stream() {
    let mut output = OutputSocket::new(Vec::new(), plankton::SocketConfig::default());
    output.init().await.unwrap();
    output
        .send_value(Variant::Integer(99), b"telemetry")
        .await
        .unwrap();
    output.send_value(Variant::Bool(false), ROOT_STREAM_ID).await.unwrap();
    let wire = output.into_inner();

    let mut input = InputSocket::new(wire.as_slice());
    input.init().await.unwrap();
    while input.process_next_instruction().await.unwrap() {}

    let arena = Arena::new();
    let telemetry = input
        .stream(b"telemetry")
        .expect("telemetry stream was addressed")
        .pull_message(&arena)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(telemetry.as_integer(), Some(99));

    let root = input
        .root_stream()
        .pull_message(&arena)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(root.as_bool(), Some(false));
}
