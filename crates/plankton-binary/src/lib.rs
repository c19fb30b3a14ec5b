// SPDX-License-Identifier: Apache-2.0
//! Biased-varint opcode-stream binary codec for the Plankton data model.
//!
//! [`BinaryWriter`] walks a [`plankton_core::Variant`] tree into an opcode
//! stream; [`BinaryReader`] walks it back, resolving back-references and
//! driving the marshalling layer's two-phase object reconstruction.
//! [`decode_next_instruction`] decodes one opcode at a time without an
//! arena, for disassemblers and other stream inspection tools.

pub mod assembler;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod reader;
pub mod varint;
pub mod writer;

pub use assembler::Assembler;
pub use error::DecodeError;
pub use instruction::{decode_next_instruction, Instruction, InstructionPayload};
pub use opcode::Opcode;
pub use reader::BinaryReader;
pub use writer::{BinaryWriter, REFERENCEABLE_LEN_THRESHOLD};
