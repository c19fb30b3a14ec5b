// SPDX-License-Identifier: Apache-2.0
//! Framed value-message socket protocol for the Plankton data-interchange
//! format.
//!
//! [`OutputSocket`] writes a stream header followed by any number of
//! `SEND_VALUE` messages; [`InputSocket`] reads them back, demultiplexing
//! onto per-stream-id [`BufferInputStream`]s. [`ByteBufferStream`] is the
//! bounded, concurrent byte connector the two sides of an in-process
//! connection share.

pub mod buffer_input_stream;
pub mod byte_stream;
pub mod config;
pub mod error;
pub mod frame;
pub mod input_socket;
pub mod output_socket;

pub use buffer_input_stream::BufferInputStream;
pub use byte_stream::ByteBufferStream;
pub use config::{ConfigError, ConfigStore, SocketConfig, SocketConfigService};
pub use error::SocketError;
pub use frame::{ROOT_STREAM_ID, SEND_VALUE, SET_DEFAULT_STRING_ENCODING, STREAM_MAGIC};
pub use input_socket::InputSocket;
pub use output_socket::OutputSocket;
