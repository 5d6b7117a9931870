// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! Label resolution: takes the symbolic assembly text emitted by
//! `stackl-frontend` (instruction lines prefixed with a TAB, label lines
//! of the form `name:` with no leading TAB) and rewrites every
//! `jmp`/`jift`/`call` operand to a signed relative displacement, stripping
//! the label lines.
//!
//! Two passes over the line list, grounded on
//! `original_source/rustyc/backend.py`'s `fold_labels`/`process_instruction`:
//! the first collects `label -> synthetic ip`, the second substitutes and
//! drops labels.

use std::collections::HashMap;

use stackl_isa::{CompileError, Opcode};

/// Resolve symbolic labels in `text` to relative displacements, returning
/// the resolved assembly (ready for `stackl_codec::assemble`).
#[tracing::instrument(skip(text))]
pub fn resolve(text: &str) -> Result<String, CompileError> {
    let lines: Vec<&str> = text.lines().collect();
    let labels = collect_labels(&lines)?;

    let mut resolved = Vec::with_capacity(lines.len());
    let mut ip: i64 = 0;
    for line in &lines {
        if is_label_line(line) {
            continue;
        }
        resolved.push(resolve_instruction_line(line, ip, &labels)?);
        ip += 1;
    }

    tracing::debug!(labels = labels.len(), instructions = ip, "resolved program");
    Ok(resolved.join("\n"))
}

fn collect_labels(lines: &[&str]) -> Result<HashMap<String, i64>, CompileError> {
    let mut labels = HashMap::new();
    let mut ip: i64 = 0;
    for line in lines {
        if is_label_line(line) {
            let name = line.trim().trim_end_matches(':').to_string();
            if labels.insert(name.clone(), ip).is_some() {
                return Err(CompileError::DuplicateLabel(name));
            }
        } else {
            ip += 1;
        }
    }
    Ok(labels)
}

/// A label definition is an un-indented line ending in `:`; an instruction
/// line is prefixed with a TAB (or other leading whitespace).
fn is_label_line(line: &str) -> bool {
    !line.is_empty()
        && !line.starts_with(char::is_whitespace)
        && line.trim_end().ends_with(':')
}

fn resolve_instruction_line(
    line: &str,
    ip: i64,
    labels: &HashMap<String, i64>,
) -> Result<String, CompileError> {
    let trimmed = line.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let mnemonic = parts.next().unwrap_or("");
    let operand = parts.next().map(str::trim);

    let is_control_transfer = Opcode::from_mnemonic(mnemonic)
        .map(|opcode| opcode.takes_signed_argument())
        .unwrap_or(false);

    if !is_control_transfer {
        return Ok(line.to_string());
    }

    let label = operand.ok_or_else(|| CompileError::MalformedProgram(line.to_string()))?;
    let target = labels
        .get(label)
        .ok_or_else(|| CompileError::UndefinedLabel(label.to_string()))?;
    let displacement = target - ip;

    Ok(format!("\t{mnemonic} {displacement}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_a_forward_jump() {
        let input = "\tjmp skip\n\tpush 1\nskip:\n\tstop";
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved, "\tjmp 2\n\tpush 1\n\tstop");
    }

    #[test]
    fn resolves_a_backward_jump() {
        let input = "loop:\n\tpush 1\n\tjmp loop";
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved, "\tpush 1\n\tjmp -1");
    }

    #[test]
    fn non_control_transfer_lines_pass_through_unchanged() {
        let input = "\tpush 42\n\tadd";
        assert_eq!(resolve(input).unwrap(), input);
    }

    #[test]
    fn undefined_label_is_an_error() {
        let input = "\tjmp nowhere\n\tstop";
        assert_eq!(
            resolve(input),
            Err(CompileError::UndefinedLabel("nowhere".to_string()))
        );
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let input = "a:\n\tnop\na:\n\tstop";
        assert_eq!(
            resolve(input),
            Err(CompileError::DuplicateLabel("a".to_string()))
        );
    }

    #[test]
    fn call_and_jift_are_also_resolved() {
        let input = "\tcall main\n\tstop\nmain:\n\tret";
        let resolved = resolve(input).unwrap();
        assert_eq!(resolved, "\tcall 2\n\tstop\n\tret");
    }

    #[test]
    fn resolution_matches_label_address_sum_invariant() {
        // sum(instruction_ip + operand) == resolved label address
        let input = "\tjmp end\n\tpush 1\n\tpush 2\nend:\n\tstop";
        let resolved = resolve(input).unwrap();
        let first_line = resolved.lines().next().unwrap();
        let displacement: i64 = first_line.trim().split_whitespace().nth(1).unwrap().parse().unwrap();
        assert_eq!(0 + displacement, 3);
    }
}
