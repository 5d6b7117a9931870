// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! Shared plumbing for the `stacklc` and `stackl` binaries.

pub mod exit;
pub mod source;

/// Whole-pipeline scenarios: source surface → frontend → linker → codec →
/// VM. Each one is a concrete instance of the toolchain's invariants, not
/// a mechanical round-trip grid.
#[cfg(test)]
mod end_to_end {
    use pretty_assertions::assert_eq;
    use stackl_codec::{assemble, disassemble, encode_program};
    use stackl_isa::Trap;
    use stackl_vm::Vm;

    use crate::source;

    fn build_and_run(text: &str) -> Vm {
        let krate = source::parse(text).unwrap();
        let symbolic = stackl_frontend::compile(&krate).unwrap();
        let resolved = stackl_linker::resolve(&symbolic).unwrap();
        let program = assemble(&resolved).unwrap();
        let mut vm = Vm::new();
        vm.load_program(program);
        vm.run().unwrap();
        vm
    }

    #[test]
    fn empty_main_is_call_main_stop_ret_and_32_bytes_encoded() {
        let krate = source::parse("(fn main () (block))").unwrap();
        let symbolic = stackl_frontend::compile(&krate).unwrap();
        let resolved = stackl_linker::resolve(&symbolic).unwrap();
        let program = assemble(&resolved).unwrap();
        assert_eq!(
            disassemble(&program, false),
            "call 2\nstop\nret"
        );
        assert_eq!(encode_program(&program).len(), 32);
    }

    #[test]
    fn literal_tail_value_is_on_the_stack_at_halt() {
        let vm = build_and_run("(fn main () (block 42))");
        assert!(vm.halted());
        assert_eq!(vm.info_operands(), &[42]);
    }

    #[test]
    fn addition_computes_at_the_top_of_stack() {
        let vm = build_and_run("(fn main () (block (+ 6 8)))");
        assert_eq!(vm.info_operands(), &[14]);
    }

    #[test]
    fn while_loop_counts_to_ten() {
        let vm = build_and_run(
            "(fn main () (block \
               (let (mut x) 0) \
               (while (< (path x) 10) (block (+= x 1))) \
               (path x)))",
        );
        assert_eq!(vm.info_operands(), &[10]);
    }

    #[test]
    fn division_by_zero_traps() {
        let program = assemble("push 5\npush 0\ndiv\nstop").unwrap();
        let mut vm = Vm::new();
        vm.load_program(program);
        assert_eq!(vm.run(), Err(Trap::ZeroDivision));
    }

    #[test]
    fn ret_with_no_call_is_a_stack_underflow() {
        let program = assemble("ret\nstop").unwrap();
        let mut vm = Vm::new();
        vm.load_program(program);
        assert_eq!(vm.run(), Err(Trap::StackUnderflow));
    }

    #[test]
    fn reassigning_an_immutable_binding_is_rejected() {
        let krate = source::parse(
            "(fn main () (block (let x 1) (= x 2)))",
        )
        .unwrap();
        let err = stackl_frontend::compile(&krate).unwrap_err();
        assert_eq!(
            err,
            stackl_isa::CompileError::ImmutableAssignment("x".to_string())
        );
    }

    #[test]
    fn a_crate_with_no_main_is_rejected() {
        let krate = source::parse("(fn helper () (block))").unwrap();
        assert_eq!(
            stackl_frontend::compile(&krate).unwrap_err(),
            stackl_isa::CompileError::MissingMain
        );
    }

    #[test]
    fn hex_literal_in_source_compiles_to_a_decimal_push() {
        let krate = source::parse("(fn main () (block 255))").unwrap();
        let symbolic = stackl_frontend::compile(&krate).unwrap();
        assert!(symbolic.contains("push 255"));
    }
}
