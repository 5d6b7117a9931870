// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! `stackl`: the run/encode/decode toolkit binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stackl_cli::exit;
use stackl_vm::Vm;

#[derive(Parser)]
#[command(name = "stackl", about = "Run and inspect stackl bytecode")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a binary program file to completion.
    Run {
        bytecode: PathBuf,
        /// Trace every instruction as it executes.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Assemble resolved textual assembly into a binary program file.
    Encode {
        src: PathBuf,
        dst: PathBuf,
        /// Also print the disassembly of what was written.
        #[arg(short, long)]
        print: bool,
    },
    /// Disassemble a binary program file back to textual assembly.
    Decode {
        bytecode: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run(&Cli::parse()) {
        Ok(()) => ExitCode::from(exit::SUCCESS as u8),
        Err(code) => ExitCode::from(code as u8),
    }
}

fn read_file(path: &PathBuf) -> Result<Vec<u8>, i32> {
    std::fs::read(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            exit::missing_input()
        } else {
            exit::INTERRUPTED
        }
    })
}

fn run(cli: &Cli) -> Result<(), i32> {
    match &cli.command {
        Command::Run { bytecode, verbose } => run_bytecode(bytecode, *verbose),
        Command::Encode { src, dst, print } => encode(src, dst, *print),
        Command::Decode { bytecode, out } => decode(bytecode, out.as_ref()),
    }
}

fn run_bytecode(path: &PathBuf, verbose: bool) -> Result<(), i32> {
    let bytes = read_file(path)?;
    let program = stackl_codec::decode_program(&bytes).map_err(|trap| {
        tracing::error!(%trap, "malformed bytecode");
        exit::for_trap(&trap)
    })?;

    let mut vm = Vm::new();
    vm.load_program(program);

    let result = if verbose {
        loop {
            if vm.halted() {
                break Ok(());
            }
            let ip = vm.ip();
            match vm.step(1) {
                Ok(()) => eprintln!("{ip}: ok, operands={:?}", vm.info_operands()),
                Err(trap) => break Err(trap),
            }
        }
    } else {
        vm.run()
    };

    result.map_err(|trap| {
        eprintln!("trap: {trap}");
        exit::for_trap(&trap)
    })?;

    println!("{:?}", vm.info_operands());
    Ok(())
}

fn encode(src: &PathBuf, dst: &PathBuf, print: bool) -> Result<(), i32> {
    let text = std::fs::read_to_string(src).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            exit::missing_input()
        } else {
            exit::INTERRUPTED
        }
    })?;
    let instructions = stackl_codec::assemble(&text).map_err(|err| {
        tracing::error!(%err, "assembling failed");
        exit::INTERRUPTED
    })?;
    let bytes = stackl_codec::encode_program(&instructions);
    std::fs::write(dst, &bytes).map_err(|_| exit::INTERRUPTED)?;
    if print {
        println!("{}", stackl_codec::disassemble(&instructions, true));
    }
    Ok(())
}

fn decode(path: &PathBuf, out: Option<&PathBuf>) -> Result<(), i32> {
    let bytes = read_file(path)?;
    let instructions = stackl_codec::decode_program(&bytes).map_err(|trap| {
        tracing::error!(%trap, "decoding failed");
        exit::for_trap(&trap)
    })?;
    let text = stackl_codec::disassemble(&instructions, false);
    match out {
        Some(path) => std::fs::write(path, text).map_err(|_| exit::INTERRUPTED)?,
        None => println!("{text}"),
    }
    Ok(())
}
