// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! `stacklc`: the compiler driver. Reads a source file in the embedded
//! surface format (`stackl_cli::source`), walks it to symbolic assembly,
//! links it, and writes the result — or stops after the front-end with
//! `--only-frontend`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use stackl_cli::{exit, source};

#[derive(Parser)]
#[command(name = "stacklc", about = "Compile a stackl source file to assembly")]
struct Cli {
    /// Input source file, in stackl's embedded expression surface format.
    file: PathBuf,

    /// Write output here instead of stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Stop after the front-end: emit unresolved symbolic assembly
    /// (labels unresolved, no instruction addresses).
    #[arg(short = 'f', long = "only-frontend")]
    only_frontend: bool,

    /// Prepend each instruction's address to its line (post-link only).
    #[arg(short = 'i')]
    with_addresses: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::from(exit::SUCCESS as u8),
        Err(code) => ExitCode::from(code as u8),
    }
}

fn run(cli: &Cli) -> Result<(), i32> {
    let text = std::fs::read_to_string(&cli.file).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            exit::missing_input()
        } else {
            exit::INTERRUPTED
        }
    })?;

    let krate = source::parse(&text).map_err(|err| {
        tracing::error!(%err, "failed to parse source");
        exit::INTERRUPTED
    })?;

    let symbolic = stackl_frontend::compile(&krate).map_err(|err| {
        tracing::error!(%err, "front-end translation failed");
        exit::INTERRUPTED
    })?;

    let output = if cli.only_frontend {
        symbolic
    } else {
        let resolved = stackl_linker::resolve(&symbolic).map_err(|err| {
            tracing::error!(%err, "linking failed");
            exit::INTERRUPTED
        })?;
        let instructions = stackl_codec::assemble(&resolved).map_err(|err| {
            tracing::error!(%err, "assembling resolved text failed");
            exit::INTERRUPTED
        })?;
        stackl_codec::disassemble(&instructions, cli.with_addresses)
    };

    match &cli.out {
        Some(path) => std::fs::write(path, output).map_err(|_| exit::INTERRUPTED)?,
        None => println!("{output}"),
    }
    Ok(())
}
