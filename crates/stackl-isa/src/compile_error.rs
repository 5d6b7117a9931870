// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

/// The closed set of failures the frontend and linker can report.
/// Shared between the two crates so a caller driving the whole pipeline
/// (the CLI) deals with a single error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("undefined label: {0}")]
    UndefinedLabel(String),

    #[error("duplicate function: {0}")]
    DuplicateFunction(String),

    #[error("no `main` function defined")]
    MissingMain,

    #[error("duplicate parameter `{0}` in function `{1}`")]
    DuplicateParameter(String, String),

    #[error("duplicate local `{0}` in function `{1}`")]
    DuplicateLocal(String, String),

    #[error("undeclared variable: {0}")]
    UndeclaredVariable(String),

    #[error("cannot assign to immutable variable: {0}")]
    ImmutableAssignment(String),

    #[error("`break` outside of a loop")]
    BreakOutsideLoop,

    #[error("`continue` outside of a loop")]
    ContinueOutsideLoop,

    #[error("unknown mnemonic: {0}")]
    UnknownMnemonic(String),

    #[error("malformed program: {0}")]
    MalformedProgram(String),
}
