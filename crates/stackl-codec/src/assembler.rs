// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! The textual assembler: one instruction per line, resolved assembly in
//! (no labels — that's `stackl-linker`'s job), `Vec<Instruction>` out.
//!
//! Grammar per line: an optional `<ip>:` disassembly prefix (stripped and
//! ignored), a lowercase mnemonic, and — for argument-bearing mnemonics —
//! a single trailing integer literal (decimal, `0x…`, `0o…`, `0b…`, with an
//! optional leading `-`).

use stackl_isa::{CompileError, Instruction, Opcode};

/// Assemble already-resolved textual assembly into a program.
///
/// Blank lines are skipped. A label line (`name:`, with no leading digits)
/// reaching this parser means the input was never linked — rejected as
/// [`CompileError::MalformedProgram`].
pub fn assemble(text: &str) -> Result<Vec<Instruction>, CompileError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(assemble_line)
        .collect()
}

fn assemble_line(line: &str) -> Result<Instruction, CompileError> {
    let line = strip_ip_prefix(line);
    let mut parts = line.splitn(2, char::is_whitespace);
    let mnemonic = parts.next().unwrap_or("");
    let operand = parts.next().map(str::trim).filter(|s| !s.is_empty());

    if mnemonic.is_empty() {
        return Err(CompileError::MalformedProgram(line.to_string()));
    }
    if mnemonic.ends_with(':') {
        return Err(CompileError::MalformedProgram(format!(
            "unresolved label: {line}"
        )));
    }

    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| CompileError::UnknownMnemonic(mnemonic.to_string()))?;

    match (opcode.has_argument(), operand) {
        (true, Some(text)) => {
            let value = parse_integer_literal(text)
                .ok_or_else(|| CompileError::MalformedProgram(line.to_string()))?;
            Ok(if opcode.takes_signed_argument() {
                Instruction::with_signed_arg(opcode, value)
            } else {
                Instruction::with_unsigned_arg(opcode, value as u64)
            })
        }
        (true, None) => Err(CompileError::MalformedProgram(format!(
            "`{mnemonic}` requires an argument"
        ))),
        (false, None) => Ok(Instruction::bare(opcode)),
        (false, Some(_)) => Err(CompileError::MalformedProgram(format!(
            "`{mnemonic}` takes no argument"
        ))),
    }
}

/// Strip a leading `<digits>:` disassembly prefix, if present.
fn strip_ip_prefix(line: &str) -> &str {
    if let Some((prefix, rest)) = line.split_once(':') {
        if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
            return rest.trim_start();
        }
    }
    line
}

/// Parse a signed integer literal: decimal, `0x…`, `0o…`, `0b…`, with an
/// optional leading `-`.
fn parse_integer_literal(text: &str) -> Option<i64> {
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8).ok()?
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else {
        text.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}
