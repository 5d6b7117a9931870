// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! The post-order tree walker: turns an `ast::Crate` into symbolic
//! assembly text (instructions TAB-prefixed, labels as `name:`), one
//! construct at a time, exactly following spec.md §4.4's "Code shapes
//! emitted" table. Grounded throughout on
//! `original_source/rustyc/frontend.py`'s `FERListener`.

use std::collections::HashMap;

use stackl_isa::CompileError;

use crate::ast::{BinOp, Block, Crate, Expr, Function, Stmt, UnOp};
use crate::lower;
use crate::meta::FunctionMeta;

/// Carries the function table, the monotonic label counter, and the
/// nested-loop label stack (spec.md §9 "Tree-walker state").
#[derive(Debug, Default)]
pub struct Walker {
    functions: HashMap<String, FunctionMeta>,
    counter: u32,
    /// `(continue_label, break_label)`, innermost loop on top.
    loop_labels: Vec<(String, String)>,
    current_function: Option<String>,
}

/// Translate a whole crate to resolved-label-free symbolic assembly.
pub fn compile(krate: &Crate) -> Result<String, CompileError> {
    Walker::default().walk_crate(krate)
}

impl Walker {
    /// Mint a fresh label, e.g. `.3_then_utlbl` (spec.md §4.4 "Label
    /// uniqueness").
    fn next_label(&mut self, purpose: &str) -> String {
        let label = format!(".{}_{purpose}_utlbl", self.counter);
        self.counter += 1;
        label
    }

    /// The function currently being translated. Only ever `None` outside
    /// of `walk_function`, which is the only caller of anything that
    /// reaches here.
    fn current_meta(&self) -> &FunctionMeta {
        let name = self
            .current_function
            .as_ref()
            .expect("expression walked outside of a function body");
        self.functions.get(name).expect("registered during walk_crate's first pass")
    }

    fn current_meta_mut(&mut self) -> &mut FunctionMeta {
        let name = self
            .current_function
            .clone()
            .expect("expression walked outside of a function body");
        self.functions.get_mut(&name).expect("registered during walk_crate's first pass")
    }

    pub fn walk_crate(&mut self, krate: &Crate) -> Result<String, CompileError> {
        for func in &krate.functions {
            if self.functions.contains_key(&func.name) {
                return Err(CompileError::DuplicateFunction(func.name.clone()));
            }
            let mut meta = FunctionMeta::new(func.name.clone());
            for param in &func.params {
                meta.declare_parameter(&param.name, param.mutable)?;
            }
            self.functions.insert(func.name.clone(), meta);
        }
        if !self.functions.contains_key("main") {
            return Err(CompileError::MissingMain);
        }

        let mut lines = vec!["\tcall main".to_string(), "\tstop".to_string()];
        for func in &krate.functions {
            lines.push(self.walk_function(func)?);
        }
        tracing::debug!(functions = krate.functions.len(), "translated crate to symbolic assembly");
        Ok(lines.join("\n"))
    }

    fn walk_function(&mut self, func: &Function) -> Result<String, CompileError> {
        self.current_function = Some(func.name.clone());

        let mut lines = vec![format!("{}:", func.name)];
        for id in self.current_meta().parameter_ids_descending() {
            lines.push(format!("\tstore {id}"));
        }

        let body = self.walk_block(&func.body);
        self.current_function = None;
        let body = body?;
        if !body.is_empty() {
            lines.push(body);
        }
        lines.push("\tret".to_string());
        Ok(lines.join("\n"))
    }

    fn walk_block(&mut self, block: &Block) -> Result<String, CompileError> {
        let mut lines = Vec::new();
        for stmt in &block.stmts {
            let code = self.walk_stmt(stmt)?;
            if !code.is_empty() {
                lines.push(code);
            }
        }
        if let Some(tail) = &block.tail {
            let code = self.walk_expr(tail)?;
            if !code.is_empty() {
                lines.push(code);
            }
        }
        Ok(lines.join("\n"))
    }

    fn walk_stmt(&mut self, stmt: &Stmt) -> Result<String, CompileError> {
        match stmt {
            Stmt::Empty => Ok("\tnop".to_string()),
            Stmt::Expr(expr) => self.walk_expr(expr),
            Stmt::Let { name, mutable, init } => {
                let init_code = match init {
                    Some(expr) => self.walk_expr(expr)?,
                    None => "\tpush 0".to_string(),
                };
                let meta = self.current_meta_mut().declare_local(name, *mutable)?;
                Ok(format!("{init_code}\n\tstore {}", meta.id))
            }
        }
    }

    fn walk_expr(&mut self, expr: &Expr) -> Result<String, CompileError> {
        match expr {
            Expr::IntLiteral(value) => Ok(lower::lower_int_literal(*value)),
            Expr::FloatLiteral(value) => lower::lower_float_literal(*value),
            Expr::BoolLiteral(value) => Ok(lower::lower_bool_literal(*value)),

            Expr::Path(name) => {
                let meta = self.current_meta().lookup(name)?;
                Ok(format!("\tload {}", meta.id))
            }

            Expr::Unary { op, expr } => {
                let inner = self.walk_expr(expr)?;
                let mnemonic = match op {
                    UnOp::Neg => "neg",
                    UnOp::Not => "not",
                };
                Ok(format!("{inner}\n\t{mnemonic}"))
            }

            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.walk_expr(lhs)?;
                let rhs = self.walk_expr(rhs)?;
                Ok(format!("{lhs}\n{rhs}\n\t{}", op.mnemonic()))
            }

            Expr::Assign { name, value } => {
                let meta = self.current_meta().lookup(name)?;
                if !meta.mutable {
                    return Err(CompileError::ImmutableAssignment(name.clone()));
                }
                let value = self.walk_expr(value)?;
                Ok(format!("{value}\n\tstore {}", meta.id))
            }

            Expr::CompoundAssign { op, name, value } => {
                let meta = self.current_meta().lookup(name)?;
                if !meta.mutable {
                    return Err(CompileError::ImmutableAssignment(name.clone()));
                }
                let value = self.walk_expr(value)?;
                Ok(format!(
                    "\tload {}\n{value}\n\t{}\n\tstore {}",
                    meta.id,
                    op.mnemonic(),
                    meta.id
                ))
            }

            Expr::Call { name, args } => {
                let mut lines = Vec::with_capacity(args.len() + 1);
                for arg in args {
                    lines.push(self.walk_expr(arg)?);
                }
                lines.push(format!("\tcall {name}"));
                Ok(lines.join("\n"))
            }

            Expr::Return(value) => {
                let mut lines = Vec::new();
                if let Some(value) = value {
                    lines.push(self.walk_expr(value)?);
                }
                lines.push("\tret".to_string());
                Ok(lines.join("\n"))
            }

            Expr::Break => {
                let (_, break_label) = self
                    .loop_labels
                    .last()
                    .ok_or(CompileError::BreakOutsideLoop)?
                    .clone();
                Ok(format!("\tjmp {break_label}"))
            }

            Expr::Continue => {
                let (continue_label, _) = self
                    .loop_labels
                    .last()
                    .ok_or(CompileError::ContinueOutsideLoop)?
                    .clone();
                Ok(format!("\tjmp {continue_label}"))
            }

            Expr::If {
                cond,
                then_block,
                else_branch,
            } => self.walk_if(cond, then_block, else_branch.as_deref()),

            Expr::Loop { body } => self.walk_loop(body),

            Expr::While { cond, body } => self.walk_while(cond, body),

            Expr::Block(block) => self.walk_block(block),
        }
    }

    fn walk_if(
        &mut self,
        cond: &Expr,
        then_block: &Block,
        else_branch: Option<&Expr>,
    ) -> Result<String, CompileError> {
        let lbl_then = self.next_label("then");
        let lbl_fi = self.next_label("fi");

        let mut lines = vec![self.walk_expr(cond)?, format!("\tjift {lbl_then}")];
        if let Some(else_expr) = else_branch {
            let code = self.walk_expr(else_expr)?;
            if !code.is_empty() {
                lines.push(code);
            }
        }
        lines.push(format!("\tjmp {lbl_fi}"));
        lines.push(format!("{lbl_then}:"));
        let then_code = self.walk_block(then_block)?;
        if !then_code.is_empty() {
            lines.push(then_code);
        }
        lines.push(format!("{lbl_fi}:"));
        Ok(lines.join("\n"))
    }

    fn walk_loop(&mut self, body: &Block) -> Result<String, CompileError> {
        let enter = self.next_label("info_enter");
        let exit = self.next_label("inflo_exit");
        self.loop_labels.push((enter.clone(), exit.clone()));
        let body_code = self.walk_block(body);
        self.loop_labels.pop();
        let body_code = body_code?;

        let mut lines = vec![format!("{enter}:")];
        if !body_code.is_empty() {
            lines.push(body_code);
        }
        lines.push(format!("\tjmp {enter}"));
        lines.push(format!("{exit}:"));
        Ok(lines.join("\n"))
    }

    fn walk_while(&mut self, cond: &Expr, body: &Block) -> Result<String, CompileError> {
        let cond_label = self.next_label("predlo_cond");
        let exit_label = self.next_label("predlo_exit");
        self.loop_labels.push((cond_label.clone(), exit_label.clone()));
        let enter_label = self.next_label("predlo_enter");

        let result = (|| {
            let body_code = self.walk_block(body)?;
            let cond_code = self.walk_expr(cond)?;
            Ok::<_, CompileError>((body_code, cond_code))
        })();
        self.loop_labels.pop();
        let (body_code, cond_code) = result?;

        let mut lines = vec![format!("\tjmp {cond_label}"), format!("{enter_label}:")];
        if !body_code.is_empty() {
            lines.push(body_code);
        }
        lines.push(format!("{cond_label}:"));
        lines.push(cond_code);
        lines.push(format!("\tjift {enter_label}"));
        lines.push(format!("{exit_label}:"));
        Ok(lines.join("\n"))
    }
}
