// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use crate::context::{Context, Frame};
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::trap::Trap;

/// What the caller (the VM's step loop) should do with `ip` after this
/// instruction ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    /// Advance to the next instruction (`ip + 1`).
    Next,
    /// Set `ip` to this absolute instruction address. Used by `call`,
    /// `ret`, `jmp` and taken `jift`.
    Jump(u64),
    /// `stop` was executed; the program has finished.
    Halt,
}

impl Instruction {
    /// Execute this instruction against `ctx`. `ip` is the address of
    /// *this* instruction (not yet advanced), needed by the
    /// control-transfer opcodes to compute an absolute target from their
    /// relative displacement.
    ///
    /// On `Err`, `ctx` is left exactly as it was before the call — every
    /// opcode below pops its operands only after confirming they all
    /// exist, and never partially mutates `ctx` before a trap.
    pub fn execute(self, ctx: &mut Context, ip: u64) -> Result<ControlFlow, Trap> {
        use Opcode::*;
        match self.opcode() {
            Nop => Ok(ControlFlow::Next),

            // -- stack shuffling ------------------------------------------------
            Push => {
                ctx.push(self.unsigned_arg());
                Ok(ControlFlow::Next)
            }
            Pop => {
                ctx.pop()?;
                Ok(ControlFlow::Next)
            }
            Swap => {
                let (a, b) = ctx.pop2()?;
                ctx.push(b);
                ctx.push(a);
                Ok(ControlFlow::Next)
            }
            Dup => {
                let a = ctx.pop()?;
                ctx.push(a);
                ctx.push(a);
                Ok(ControlFlow::Next)
            }

            // -- binary arithmetic, wrapping/truncating -------------------------
            Add => binary(ctx, |a, b| a.wrapping_add(b)),
            Sub => binary(ctx, |a, b| a.wrapping_sub(b)),
            Mul => binary(ctx, |a, b| a.wrapping_mul(b)),
            Div => {
                let (a, b) = ctx.pop2()?;
                if b == 0 {
                    ctx.push(a);
                    ctx.push(b);
                    return Err(Trap::ZeroDivision);
                }
                ctx.push(a.wrapping_div(b));
                Ok(ControlFlow::Next)
            }
            Mod => {
                let (a, b) = ctx.pop2()?;
                if b == 0 {
                    ctx.push(a);
                    ctx.push(b);
                    return Err(Trap::ZeroDivision);
                }
                ctx.push(a.wrapping_rem(b));
                Ok(ControlFlow::Next)
            }
            Shl => binary(ctx, |a, b| a.wrapping_shl(b as u32)),
            Shr => binary(ctx, |a, b| a.wrapping_shr(b as u32)),
            And => binary(ctx, |a, b| a & b),
            Or => binary(ctx, |a, b| a | b),
            Xor => binary(ctx, |a, b| a ^ b),
            Max => binary(ctx, std::cmp::max),
            Min => binary(ctx, std::cmp::min),

            // -- unary arithmetic --------------------------------------------------
            Inc => unary(ctx, |a| a.wrapping_add(1)),
            Dec => unary(ctx, |a| a.wrapping_sub(1)),
            Neg => unary(ctx, |a| (a as i64).wrapping_neg() as u64),
            Not => unary(ctx, |a| !a),

            // -- comparisons, push 1/0 ------------------------------------------------
            Lt => compare(ctx, |a, b| a < b),
            Le => compare(ctx, |a, b| a <= b),
            Eq => compare(ctx, |a, b| a == b),
            Neq => compare(ctx, |a, b| a != b),
            Ge => compare(ctx, |a, b| a >= b),
            Gt => compare(ctx, |a, b| a > b),

            // -- frame-local variables -----------------------------------------------
            Load => {
                let id = self.unsigned_arg();
                let value = ctx.current_frame()?.load(id);
                ctx.push(value);
                Ok(ControlFlow::Next)
            }
            Store => {
                let id = self.unsigned_arg();
                let value = ctx.pop()?;
                ctx.current_frame_mut()?.store(id, value);
                Ok(ControlFlow::Next)
            }

            // -- control transfer ------------------------------------------------------
            Call => {
                let target = (ip as i64).wrapping_add(self.signed_arg()) as u64;
                ctx.frames.push(Frame::new(ip + 1));
                Ok(ControlFlow::Jump(target))
            }
            Ret => {
                let frame = ctx.frames.pop().ok_or(Trap::StackUnderflow)?;
                Ok(ControlFlow::Jump(frame.return_address))
            }
            Jmp => {
                let target = (ip as i64).wrapping_add(self.signed_arg()) as u64;
                Ok(ControlFlow::Jump(target))
            }
            Jift => {
                let cond = ctx.pop()?;
                if cond != 0 {
                    let target = (ip as i64).wrapping_add(self.signed_arg()) as u64;
                    Ok(ControlFlow::Jump(target))
                } else {
                    Ok(ControlFlow::Next)
                }
            }
            Stop => Ok(ControlFlow::Halt),
        }
    }
}

fn binary(ctx: &mut Context, f: impl Fn(u64, u64) -> u64) -> Result<ControlFlow, Trap> {
    let (a, b) = ctx.pop2()?;
    ctx.push(f(a, b));
    Ok(ControlFlow::Next)
}

fn unary(ctx: &mut Context, f: impl Fn(u64) -> u64) -> Result<ControlFlow, Trap> {
    let a = ctx.pop()?;
    ctx.push(f(a));
    Ok(ControlFlow::Next)
}

fn compare(ctx: &mut Context, f: impl Fn(u64, u64) -> bool) -> Result<ControlFlow, Trap> {
    let (a, b) = ctx.pop2()?;
    ctx.push(f(a, b) as u64);
    Ok(ControlFlow::Next)
}
