// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! Binary codec: `[arg:56 | opcode:8]`, little-endian, exactly 8 bytes per
//! instruction (`stackl_isa::INSTRUCTION_SIZE_IN_BYTES`).

use stackl_isa::{Instruction, Opcode, Trap, INSTRUCTION_SIZE_IN_BYTES};

const ARG_MASK: u64 = (1u64 << 56) - 1;

/// Pack a single instruction into its 8-byte wire form.
pub fn encode(instruction: Instruction) -> [u8; INSTRUCTION_SIZE_IN_BYTES] {
    let word = ((instruction.opcode() as u64) << 56) | (instruction.raw_arg() & ARG_MASK);
    word.to_le_bytes()
}

/// Unpack a single instruction from an 8-byte slice.
///
/// An unrecognized high byte, or a slice whose length isn't exactly
/// [`INSTRUCTION_SIZE_IN_BYTES`], is [`Trap::IllegalInstruction`].
pub fn decode(bytes: &[u8]) -> Result<Instruction, Trap> {
    let bytes: [u8; INSTRUCTION_SIZE_IN_BYTES] =
        bytes.try_into().map_err(|_| Trap::IllegalInstruction)?;
    let word = u64::from_le_bytes(bytes);
    let opcode_byte = (word >> 56) as u8;
    let opcode = Opcode::from_u8(opcode_byte).ok_or(Trap::IllegalInstruction)?;
    let raw_arg = word & ARG_MASK;

    Ok(if opcode.takes_signed_argument() {
        Instruction::with_signed_arg(opcode, sign_extend_56(raw_arg))
    } else if opcode.has_argument() {
        Instruction::with_unsigned_arg(opcode, raw_arg)
    } else {
        Instruction::bare(opcode)
    })
}

fn sign_extend_56(raw_arg: u64) -> i64 {
    const SIGN_BIT: u64 = 1u64 << 55;
    if raw_arg & SIGN_BIT != 0 {
        (raw_arg | !ARG_MASK) as i64
    } else {
        raw_arg as i64
    }
}

/// Concatenate every instruction's 8-byte encoding, in order.
pub fn encode_program(program: &[Instruction]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(program.len() * INSTRUCTION_SIZE_IN_BYTES);
    for &instruction in program {
        bytes.extend_from_slice(&encode(instruction));
    }
    bytes
}

/// Chunk a byte stream into instructions. A length not divisible by 8 is
/// malformed (`IllegalInstruction`).
pub fn decode_program(bytes: &[u8]) -> Result<Vec<Instruction>, Trap> {
    if bytes.len() % INSTRUCTION_SIZE_IN_BYTES != 0 {
        return Err(Trap::IllegalInstruction);
    }
    bytes.chunks(INSTRUCTION_SIZE_IN_BYTES).map(decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn width_is_always_eight_bytes() {
        assert_eq!(encode(Instruction::bare(Opcode::Stop)).len(), 8);
        assert_eq!(
            encode(Instruction::with_unsigned_arg(Opcode::Push, 42)).len(),
            8
        );
    }

    #[test]
    fn roundtrips_every_bare_opcode() {
        for byte in 0..=Opcode::Stop as u8 {
            let opcode = Opcode::from_u8(byte).unwrap();
            let original = if opcode.takes_signed_argument() {
                Instruction::with_signed_arg(opcode, -7)
            } else if opcode.has_argument() {
                Instruction::with_unsigned_arg(opcode, 123)
            } else {
                Instruction::bare(opcode)
            };
            assert_eq!(decode(&encode(original)).unwrap(), original);
        }
    }

    #[test]
    fn roundtrips_whole_programs() {
        let program = vec![
            Instruction::with_signed_arg(Opcode::Call, 2),
            Instruction::bare(Opcode::Stop),
            Instruction::bare(Opcode::Ret),
        ];
        let bytes = encode_program(&program);
        assert_eq!(bytes.len(), 24);
        assert_eq!(decode_program(&bytes).unwrap(), program);
    }

    #[test]
    fn sign_extends_negative_relative_displacement() {
        let ins = Instruction::with_signed_arg(Opcode::Jmp, -3);
        let decoded = decode(&encode(ins)).unwrap();
        assert_eq!(decoded.signed_arg(), -3);
    }

    #[test]
    fn zero_extends_unsigned_argument() {
        let ins = Instruction::with_unsigned_arg(Opcode::Push, u64::MAX);
        let decoded = decode(&encode(ins)).unwrap();
        assert_eq!(decoded.unsigned_arg(), (1u64 << 56) - 1);
    }

    #[test]
    fn unknown_opcode_byte_is_illegal_instruction() {
        let mut bytes = [0u8; 8];
        bytes[7] = 0xff;
        assert_eq!(decode(&bytes), Err(Trap::IllegalInstruction));
    }

    #[test]
    fn truncated_stream_is_illegal_instruction() {
        assert_eq!(decode_program(&[0u8; 5]), Err(Trap::IllegalInstruction));
    }
}
