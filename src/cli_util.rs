use std::io::{self, Write};

use crate::{BracketFault, MachineError};

// Show a short window around the position for context
const WINDOW: usize = 32;

/// Pretty-print a [`MachineError`] with caret positioning.
/// If `program` is `Some("bfm")`, prefix messages with "bfm: ...".
pub fn print_machine_error(program: Option<&str>, code: &[u8], err: &MachineError) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    let msg = match err {
        MachineError::MemoryOverflow { ptr, op, .. } => {
            prefix_program(&format!("Runtime error: memory overflow (ptr={ptr}, op={op})"))
        }
        MachineError::UnbalancedBrackets { fault: BracketFault::CountMismatch { open, close } } => {
            prefix_program(&format!("Parse error: unbalanced brackets ({open} '[' vs {close} ']')"))
        }
        MachineError::UnbalancedBrackets { fault: BracketFault::UnmatchedOpen { .. } } => {
            prefix_program("Runtime error: unbalanced brackets, '[' has no matching ']'")
        }
        MachineError::UnbalancedBrackets { fault: BracketFault::UnmatchedClose { .. } } => {
            prefix_program("Runtime error: unbalanced brackets, ']' has no matching '['")
        }
        MachineError::Io { source, .. } => prefix_program(&format!("I/O error: {source}")),
        MachineError::StepLimitExceeded { .. } | MachineError::Canceled => {
            prefix_program(&err.to_string())
        }
    };

    match err.ip() {
        Some(ip) => eprint!("{}", format_error_with_context(&msg, code, ip)),
        None => eprintln!("{msg}"),
    }
    let _ = io::stderr().flush();
}

/// A concise error line with the instruction index, followed by a window of
/// the program and a caret under position `pos`.
///
/// Bytes that would not print as a single column are shown as spaces so the
/// caret stays aligned.
pub fn format_error_with_context(prefix: &str, code: &[u8], pos: usize) -> String {
    let start = pos.saturating_sub(WINDOW);
    let end = (pos + WINDOW + 1).min(code.len());

    let slice: String = code
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { ' ' })
        .collect();

    let underline = format!("{}^", " ".repeat(pos - start));
    format!("{prefix} at instruction {pos}\n  {slice}\n  {underline}\n")
}
