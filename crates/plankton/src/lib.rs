// SPDX-License-Identifier: Apache-2.0
//! Plankton: a variant data model, binary and text codecs, a marshalling
//! layer for native Rust types, and a framed socket protocol for exchanging
//! values between processes.
//!
//! This crate is a thin facade over the five crates that do the actual
//! work:
//!
//! - [`plankton_core`] — the [`Variant`] data model, [`Arena`] allocator,
//!   [`Sink`] write-once cells, and [`TypeRegistry`]/[`ObjectType`] for
//!   native object descriptors.
//! - [`plankton_binary`] — the biased-varint opcode-stream wire codec
//!   ([`BinaryWriter`]/[`BinaryReader`]).
//! - [`plankton_text`] — the 7-bit ASCII source and command text dialects
//!   ([`TextWriter`]/[`TextReader`]).
//! - [`plankton_marshal`] — [`TypeRegistryBuilder`] and the atomic/cyclic
//!   descriptor helpers for mapping native Rust types onto [`ObjectType`]s.
//! - [`plankton_socket`] — [`OutputSocket`]/[`InputSocket`] framing and the
//!   [`ByteBufferStream`] connector between them.

pub use plankton_core::{
    identity_key, Arena, ArenaError, ArrayRef, BlobRef, Encoding, HeaderKey, MapRef, NativeRef,
    ObjectRef, ObjectType, OwnedVariant, Sink, StringRef, TypeRegistry, Variant,
    WIRE_FORMAT_VERSION,
};

pub use plankton_binary::{
    decode_next_instruction, Assembler, BinaryReader, BinaryWriter, DecodeError, Instruction,
    InstructionPayload, Opcode, REFERENCEABLE_LEN_THRESHOLD,
};

pub use plankton_text::{Command, Dialect, SyntaxError, TextError, TextReader, TextWriter};

pub use plankton_marshal::{atomic_type, cyclic_type, on_native_drop, TypedDescriptor, TypeRegistryBuilder};

pub use plankton_socket::{
    BufferInputStream, ByteBufferStream, ConfigError, ConfigStore, InputSocket, OutputSocket,
    SocketConfig, SocketConfigService, SocketError, ROOT_STREAM_ID, SEND_VALUE,
    SET_DEFAULT_STRING_ENCODING, STREAM_MAGIC,
};
