// SPDX-License-Identifier: Apache-2.0
//! Runs a socket round trip with a real `tracing` subscriber installed, so
//! the `tracing::debug!`/`tracing::warn!` call sites in `InputSocket`/
//! `OutputSocket` actually execute their formatting path under test instead
//! of going through a no-op default subscriber.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use plankton_core::{Arena, Variant};
use plankton_socket::{InputSocket, OutputSocket, SocketConfig, ROOT_STREAM_ID};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn value_round_trips_with_tracing_enabled() {
    init_tracing();

    let mut output = OutputSocket::new(Vec::new(), SocketConfig::default());
    output.init().await.unwrap();
    output.send_value(Variant::Integer(7), ROOT_STREAM_ID).await.unwrap();
    let wire = output.into_inner();

    let mut input = InputSocket::new(wire.as_slice());
    input.init().await.unwrap();
    while input.process_next_instruction().await.unwrap() {}

    let arena = Arena::new();
    let value = input
        .root_stream()
        .pull_message(&arena)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value.as_integer(), Some(7));
}
