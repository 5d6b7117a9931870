// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! Renders decoded instructions back to mnemonic text, the inverse of
//! [`crate::assembler::assemble`] (minus label recovery — addresses stay
//! numeric, matching resolved assembly).

use stackl_isa::Instruction;

/// Disassemble a program to one mnemonic line per instruction.
///
/// When `with_addresses` is set, each line is prefixed `<ip>: ` per the
/// compiler's `-i` debug option (spec §6).
pub fn disassemble(program: &[Instruction], with_addresses: bool) -> String {
    program
        .iter()
        .enumerate()
        .map(|(ip, instruction)| disassemble_line(ip as u64, *instruction, with_addresses))
        .collect::<Vec<_>>()
        .join("\n")
}

fn disassemble_line(ip: u64, instruction: Instruction, with_addresses: bool) -> String {
    let opcode = instruction.opcode();
    let body = if opcode.has_argument() {
        let arg = if opcode.takes_signed_argument() {
            instruction.signed_arg().to_string()
        } else {
            instruction.unsigned_arg().to_string()
        };
        format!("{} {}", opcode.mnemonic(), arg)
    } else {
        opcode.mnemonic().to_string()
    };

    if with_addresses {
        format!("{ip}: {body}")
    } else {
        body
    }
}
