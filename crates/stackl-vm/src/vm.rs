// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! The `Vm`: owns the execution context, the loaded program, and the
//! breakpoint table. Single-threaded, synchronous, cooperative only at
//! instruction boundaries — grounded on `original_source/rusty/vm.py`'s
//! `VM` class, corrected per its `break_on`/`delete_bp` invariant (see
//! `remove_breakpoint`).

use stackl_isa::{Context, Frame, ControlFlow, Instruction, Trap};

/// A single breakpoint slot. `None` marks a removed id — ids are never
/// reused within a session, so a `Vec<Option<u64>>` indexed by id keeps
/// ids stable while letting duplicates (two ids on the same line)
/// coexist.
type Breakpoints = Vec<Option<u64>>;

#[derive(Debug, Default)]
pub struct Vm {
    ctx: Context,
    program: Vec<Instruction>,
    halted: bool,
    breakpoints: Breakpoints,
    /// Set when a previous `run()` stopped because `ip` landed on a live
    /// breakpoint without executing it. The next `run()` must step over
    /// that one instruction unconditionally before resuming its
    /// breakpoint scan, or a paused VM could never make progress again.
    paused_on_breakpoint: bool,
}

impl Vm {
    pub fn new() -> Self {
        Vm::default()
    }

    /// Replace the loaded program and reset execution state. The VM is
    /// restartable by calling this again; breakpoints survive a reload.
    pub fn load_program(&mut self, program: Vec<Instruction>) {
        self.program = program;
        self.ctx = Context::new();
        self.halted = false;
        self.paused_on_breakpoint = false;
    }

    /// Execute up to `n` instructions, stopping early once `halted`.
    /// Does not stop at breakpoints — that's `run`'s job.
    pub fn step(&mut self, n: u64) -> Result<(), Trap> {
        for _ in 0..n {
            if self.halted {
                break;
            }
            self.step_one()?;
        }
        Ok(())
    }

    fn step_one(&mut self) -> Result<(), Trap> {
        let ip = self.ctx.ip;
        if ip >= self.program.len() as u64 {
            return Err(Trap::InvalidAddress(ip));
        }
        let instruction = self.program[ip as usize];
        self.ctx.ip = ip + 1;

        let flow = instruction.execute(&mut self.ctx, ip)?;
        tracing::trace!(ip, opcode = instruction.opcode().mnemonic(), "stepped");
        match flow {
            ControlFlow::Next => {}
            ControlFlow::Jump(target) => self.ctx.ip = target,
            ControlFlow::Halt => self.halted = true,
        }
        Ok(())
    }

    /// Step one instruction at a time until halted or `ip` lands on a
    /// live breakpoint, in which case the breakpointed instruction is
    /// *not* executed.
    ///
    /// If the VM is resuming from a previous `run()` that paused at a
    /// breakpoint, that one instruction is stepped over first — otherwise
    /// `ip` would still be sitting on the same live breakpoint and `run`
    /// would return instantly without making progress.
    pub fn run(&mut self) -> Result<(), Trap> {
        if self.paused_on_breakpoint {
            self.paused_on_breakpoint = false;
            self.step(1)?;
        }
        while !self.halted {
            if self.is_breakpoint(self.ctx.ip) {
                self.paused_on_breakpoint = true;
                break;
            }
            self.step(1)?;
        }
        Ok(())
    }

    /// Add a breakpoint at `line`, returning its id, or `-1` if `line`
    /// is outside the loaded program. Duplicate lines are allowed and
    /// get distinct ids.
    pub fn add_breakpoint(&mut self, line: u64) -> i64 {
        if line >= self.program.len() as u64 {
            return -1;
        }
        let id = self.breakpoints.len();
        self.breakpoints.push(Some(line));
        id as i64
    }

    /// Drop the breakpoint with this id. If another id still maps to
    /// the same line, execution keeps pausing there — only scanning the
    /// surviving slots makes that true without separate refcounting.
    pub fn remove_breakpoint(&mut self, id: u64) {
        if let Some(slot) = self.breakpoints.get_mut(id as usize) {
            *slot = None;
        }
    }

    fn is_breakpoint(&self, ip: u64) -> bool {
        self.breakpoints.iter().flatten().any(|&line| line == ip)
    }

    pub fn ip(&self) -> u64 {
        self.ctx.ip
    }

    pub fn size(&self) -> usize {
        self.program.len()
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn list(&self, addr: u64) -> Option<Instruction> {
        self.program.get(addr as usize).copied()
    }

    pub fn list_range(&self, begin: u64, end: u64) -> &[Instruction] {
        let begin = (begin as usize).min(self.program.len());
        let end = (end as usize).min(self.program.len()).max(begin);
        &self.program[begin..end]
    }

    pub fn info_operands(&self) -> &[u64] {
        &self.ctx.operands
    }

    pub fn info_frames(&self) -> &[Frame] {
        &self.ctx.frames
    }

    /// `(id, line)` for every breakpoint still alive, in id order.
    pub fn info_breakpoints(&self) -> Vec<(usize, u64)> {
        self.breakpoints
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.map(|line| (id, line)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stackl_isa::Opcode;

    fn program_push_push_add_stop() -> Vec<Instruction> {
        vec![
            Instruction::with_unsigned_arg(Opcode::Push, 6),
            Instruction::with_unsigned_arg(Opcode::Push, 8),
            Instruction::bare(Opcode::Add),
            Instruction::bare(Opcode::Stop),
        ]
    }

    #[test]
    fn load_program_resets_context_and_halted() {
        let mut vm = Vm::new();
        vm.load_program(program_push_push_add_stop());
        vm.run().unwrap();
        assert!(vm.halted());

        vm.load_program(program_push_push_add_stop());
        assert!(!vm.halted());
        assert_eq!(vm.ip(), 0);
        assert!(vm.info_operands().is_empty());
    }

    #[test]
    fn run_executes_to_halt() {
        let mut vm = Vm::new();
        vm.load_program(program_push_push_add_stop());
        vm.run().unwrap();
        assert!(vm.halted());
        assert_eq!(vm.info_operands(), &[14]);
    }

    #[test]
    fn step_advances_ip_by_one_instruction() {
        let mut vm = Vm::new();
        vm.load_program(program_push_push_add_stop());
        vm.step(1).unwrap();
        assert_eq!(vm.ip(), 1);
        assert_eq!(vm.info_operands(), &[6]);
    }

    #[test]
    fn stepping_past_the_end_is_an_invalid_address_trap() {
        let mut vm = Vm::new();
        vm.load_program(vec![Instruction::bare(Opcode::Nop)]);
        vm.step(1).unwrap();
        assert_eq!(vm.step(1), Err(Trap::InvalidAddress(1)));
    }

    #[test]
    fn run_pauses_at_a_breakpoint_without_executing_it() {
        let mut vm = Vm::new();
        vm.load_program(program_push_push_add_stop());
        vm.add_breakpoint(2);
        vm.run().unwrap();
        assert!(!vm.halted());
        assert_eq!(vm.ip(), 2);
        assert_eq!(vm.info_operands(), &[6, 8]);

        vm.run().unwrap();
        assert!(vm.halted());
    }

    #[test]
    fn run_resumes_past_a_breakpoint_it_is_already_paused_on() {
        let mut vm = Vm::new();
        vm.load_program(program_push_push_add_stop());
        vm.add_breakpoint(2);
        vm.run().unwrap();
        assert_eq!(vm.ip(), 2);

        // A second run() must step over the instruction at the breakpoint
        // rather than re-checking is_breakpoint(2) and returning instantly.
        vm.run().unwrap();
        assert!(vm.halted());
        assert_eq!(vm.info_operands(), &[14]);

        // A third run() on an already-halted VM is a no-op, not a crash.
        vm.run().unwrap();
        assert!(vm.halted());
    }

    #[test]
    fn a_fresh_load_at_a_breakpoint_address_does_not_execute_on_first_run() {
        let mut vm = Vm::new();
        vm.load_program(program_push_push_add_stop());
        vm.add_breakpoint(0);
        vm.run().unwrap();
        assert!(!vm.halted());
        assert_eq!(vm.ip(), 0);
        assert!(vm.info_operands().is_empty());

        vm.run().unwrap();
        assert_eq!(vm.ip(), 1);
        assert_eq!(vm.info_operands(), &[6]);
    }

    #[test]
    fn add_breakpoint_out_of_range_returns_negative_one() {
        let mut vm = Vm::new();
        vm.load_program(program_push_push_add_stop());
        assert_eq!(vm.add_breakpoint(100), -1);
    }

    #[test]
    fn removing_one_of_two_breakpoints_on_the_same_line_keeps_the_other_live() {
        let mut vm = Vm::new();
        vm.load_program(program_push_push_add_stop());
        let first = vm.add_breakpoint(2);
        let second = vm.add_breakpoint(2);
        vm.remove_breakpoint(first as u64);
        assert_eq!(vm.info_breakpoints(), vec![(second as usize, 2)]);

        vm.run().unwrap();
        assert_eq!(vm.ip(), 2);
    }

    #[test]
    fn info_frames_reflects_call_depth() {
        let program = vec![
            Instruction::with_signed_arg(Opcode::Call, 2),
            Instruction::bare(Opcode::Stop),
            Instruction::bare(Opcode::Ret),
        ];
        let mut vm = Vm::new();
        vm.load_program(program);
        vm.step(1).unwrap();
        assert_eq!(vm.info_frames().len(), 1);
    }

    #[test]
    fn ret_with_no_active_frame_is_a_stack_underflow_trap() {
        let mut vm = Vm::new();
        vm.load_program(vec![Instruction::bare(Opcode::Ret), Instruction::bare(Opcode::Stop)]);
        assert_eq!(vm.step(1), Err(Trap::StackUnderflow));
    }

    #[test]
    fn list_range_clamps_to_program_bounds() {
        let mut vm = Vm::new();
        vm.load_program(program_push_push_add_stop());
        assert_eq!(vm.list_range(2, 100).len(), 2);
    }
}
