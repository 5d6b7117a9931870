// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! Process exit codes. A small wrapper around platform primitives, in
//! the same spirit as the teacher's `ancvm_extcall_util` crate.

use stackl_isa::Trap;

pub const SUCCESS: i32 = 0;
pub const INTERRUPTED: i32 = 1;

/// `ENOENT`, for a missing input file — matches
/// `std::io::ErrorKind::NotFound`.
pub fn missing_input() -> i32 {
    libc::ENOENT
}

/// Trap-specific, stable within this implementation but not a promise
/// across versions.
pub fn for_trap(trap: &Trap) -> i32 {
    match trap {
        Trap::StackUnderflow => 3,
        Trap::InvalidAddress(_) => 4,
        Trap::IllegalInstruction => 5,
        Trap::ZeroDivision => 6,
    }
}
