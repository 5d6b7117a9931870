// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! Binary and textual encoding for `stackl-isa` instructions: the fixed
//! 8-byte-per-instruction wire format, a line-oriented textual assembler,
//! and a disassembler that renders instructions back to mnemonic text.

pub mod assembler;
pub mod codec;
pub mod disassembler;

pub use assembler::assemble;
pub use codec::{decode, decode_program, encode, encode_program};
pub use disassembler::disassemble;
