// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! A small, deliberately minimal surface syntax for `stacklc`'s input
//! files.
//!
//! Parsing a full Rust-like grammar (precedence climbing, statement vs.
//! expression position, type annotations) is out of scope for this
//! toolchain — a real front-end is expected to construct
//! `stackl_frontend::ast::Crate` directly. This module exists only so the
//! `stacklc` binary has *something* to read from the command line: a
//! fully-parenthesized, prefix-notation expression format with one form
//! per AST node. It is not meant to be a pleasant language to write by
//! hand.
//!
//! ```text
//! (fn main ()
//!   (let (mut x) 6)
//!   (+ (path x) 8))
//! ```

use stackl_isa::CompileError;
use stackl_frontend::ast::{BinOp, Block, Crate, Expr, Function, Param, Stmt, UnOp};

pub fn parse(text: &str) -> Result<Crate, CompileError> {
    let tokens = tokenize(text);
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let mut functions = Vec::new();
    while parser.pos < parser.tokens.len() {
        functions.push(parser.parse_function()?);
    }
    Ok(Crate { functions })
}

fn tokenize(text: &str) -> Vec<String> {
    text.replace('(', " ( ")
        .replace(')', " ) ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

struct Parser<'a> {
    tokens: &'a [String],
    pos: usize,
}

enum Form {
    Let { name: String, mutable: bool, init: Expr },
    Expr(Expr),
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn bump(&mut self) -> Result<String, CompileError> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| CompileError::MalformedProgram("unexpected end of input".to_string()))?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, expected: &str) -> Result<(), CompileError> {
        let tok = self.bump()?;
        if tok != expected {
            return Err(CompileError::MalformedProgram(format!(
                "expected `{expected}`, found `{tok}`"
            )));
        }
        Ok(())
    }

    fn parse_function(&mut self) -> Result<Function, CompileError> {
        self.expect("(")?;
        self.expect("fn")?;
        let name = self.bump()?;
        self.expect("(")?;
        let mut params = Vec::new();
        while self.peek() != Some(")") {
            params.push(self.parse_param()?);
        }
        self.expect(")")?;
        let body = self.parse_block()?;
        self.expect(")")?;
        Ok(Function { name, params, body })
    }

    fn parse_param(&mut self) -> Result<Param, CompileError> {
        if self.peek() == Some("(") {
            self.expect("(")?;
            self.expect("mut")?;
            let name = self.bump()?;
            self.expect(")")?;
            Ok(Param { name, mutable: true })
        } else {
            Ok(Param {
                name: self.bump()?,
                mutable: false,
            })
        }
    }

    fn parse_block(&mut self) -> Result<Block, CompileError> {
        self.expect("(")?;
        self.expect("block")?;
        let mut forms = Vec::new();
        while self.peek() != Some(")") {
            forms.push(self.parse_form()?);
        }
        self.expect(")")?;

        let mut block = Block::default();
        let tail = match forms.pop() {
            Some(Form::Expr(expr)) => Some(Box::new(expr)),
            Some(other) => {
                forms.push(other);
                None
            }
            None => None,
        };
        for form in forms {
            block.stmts.push(match form {
                Form::Let { name, mutable, init } => Stmt::Let {
                    name,
                    mutable,
                    init: Some(init),
                },
                Form::Expr(expr) => Stmt::Expr(expr),
            });
        }
        block.tail = tail;
        Ok(block)
    }

    fn parse_form(&mut self) -> Result<Form, CompileError> {
        if self.tokens.get(self.pos).map(String::as_str) == Some("(")
            && self.tokens.get(self.pos + 1).map(String::as_str) == Some("let")
        {
            self.expect("(")?;
            self.expect("let")?;
            let (name, mutable) = if self.peek() == Some("(") {
                self.expect("(")?;
                self.expect("mut")?;
                let name = self.bump()?;
                self.expect(")")?;
                (name, true)
            } else {
                (self.bump()?, false)
            };
            let init = self.parse_expr()?;
            self.expect(")")?;
            Ok(Form::Let { name, mutable, init })
        } else {
            Ok(Form::Expr(self.parse_expr()?))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        if self.peek() == Some("(") {
            self.expect("(")?;
            let head = self.bump()?;
            let expr = match head.as_str() {
                "block" => {
                    self.pos -= 2; // rewind past the `(` and `block` head we just consumed
                    return Ok(Expr::Block(self.parse_block()?));
                }
                "neg" => Expr::Unary {
                    op: UnOp::Neg,
                    expr: Box::new(self.parse_expr()?),
                },
                "not" => Expr::Unary {
                    op: UnOp::Not,
                    expr: Box::new(self.parse_expr()?),
                },
                "=" => {
                    let name = self.bump()?;
                    Expr::Assign {
                        name,
                        value: Box::new(self.parse_expr()?),
                    }
                }
                "call" => {
                    let name = self.bump()?;
                    let mut args = Vec::new();
                    while self.peek() != Some(")") {
                        args.push(self.parse_expr()?);
                    }
                    Expr::Call { name, args }
                }
                "return" => {
                    let value = if self.peek() == Some(")") {
                        None
                    } else {
                        Some(Box::new(self.parse_expr()?))
                    };
                    Expr::Return(value)
                }
                "if" => {
                    let cond = Box::new(self.parse_expr()?);
                    let then_block = self.parse_block()?;
                    let else_branch = if self.peek() != Some(")") {
                        Some(Box::new(self.parse_expr()?))
                    } else {
                        None
                    };
                    Expr::If {
                        cond,
                        then_block,
                        else_branch,
                    }
                }
                "loop" => Expr::Loop {
                    body: self.parse_block()?,
                },
                "while" => {
                    let cond = Box::new(self.parse_expr()?);
                    let body = self.parse_block()?;
                    Expr::While { cond, body }
                }
                mnemonic => {
                    if let Some(op) = binop(mnemonic) {
                        let lhs = Box::new(self.parse_expr()?);
                        let rhs = Box::new(self.parse_expr()?);
                        Expr::Binary { op, lhs, rhs }
                    } else if let Some(op) = compound_op(mnemonic) {
                        let name = self.bump()?;
                        let value = Box::new(self.parse_expr()?);
                        Expr::CompoundAssign { op, name, value }
                    } else {
                        return Err(CompileError::MalformedProgram(format!(
                            "unknown form `{mnemonic}`"
                        )));
                    }
                }
            };
            self.expect(")")?;
            Ok(expr)
        } else {
            let atom = self.bump()?;
            Ok(match atom.as_str() {
                "true" => Expr::BoolLiteral(true),
                "false" => Expr::BoolLiteral(false),
                "break" => Expr::Break,
                "continue" => Expr::Continue,
                "path" => Expr::Path(self.bump()?),
                _ => {
                    if let Ok(value) = atom.parse::<u64>() {
                        Expr::IntLiteral(value)
                    } else if let Ok(value) = atom.parse::<f64>() {
                        Expr::FloatLiteral(value)
                    } else {
                        Expr::Path(atom)
                    }
                }
            })
        }
    }
}

fn binop(mnemonic: &str) -> Option<BinOp> {
    Some(match mnemonic {
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "%" => BinOp::Mod,
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "<<" => BinOp::Shl,
        ">>" => BinOp::Shr,
        "&" => BinOp::BitAnd,
        "|" => BinOp::BitOr,
        "^" => BinOp::BitXor,
        "==" => BinOp::Eq,
        "!=" => BinOp::Neq,
        "<" => BinOp::Lt,
        ">" => BinOp::Gt,
        "<=" => BinOp::Le,
        ">=" => BinOp::Ge,
        "&&" => BinOp::And,
        "||" => BinOp::Or,
        _ => return None,
    })
}

fn compound_op(mnemonic: &str) -> Option<BinOp> {
    mnemonic.strip_suffix('=').and_then(binop)
}
