// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! Tree-walk frontend: lowers an `ast::Crate` to symbolic assembly text
//! ready for `stackl_linker::resolve`.

pub mod ast;
pub mod lower;
pub mod meta;
pub mod walker;

pub use meta::{FunctionMeta, VariableMeta};
pub use walker::{compile, Walker};
