// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

/// A runtime fault. Traps are atomic: the operand stack, frame stack and
/// `ip` are left exactly as they were before the faulting instruction was
/// dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Trap {
    #[error("operand or frame stack underflow")]
    StackUnderflow,

    #[error("invalid instruction address: {0:#x}")]
    InvalidAddress(u64),

    #[error("illegal instruction")]
    IllegalInstruction,

    #[error("division by zero")]
    ZeroDivision,
}
