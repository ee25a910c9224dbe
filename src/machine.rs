//! The execution engine.
//!
//! A [`Machine`] interprets raw instruction bytes directly; there is no
//! lexer or jump table. Behaviors:
//! - Memory tape initialized to 0 before every run ([`DEFAULT_TAPE_SIZE`] cells unless configured).
//! - Strict pointer bounds: moving left from cell 0 or right past the last
//!   cell fails with [`MachineError::MemoryOverflow`].
//! - `+`/`-` wrap modulo 256.
//! - `.` writes the current cell to the output sink; sink failures abort the run.
//! - `,` is reserved and does nothing.
//! - Any other byte is skipped.
//! - Brackets are checked in two stages: a global `[`/`]` count comparison
//!   before the first instruction runs, then a depth-counted scan each time a
//!   jump is taken. Mis-nested programs with equal counts (`][`) therefore
//!   only fail once execution reaches the bad bracket.
//!
//! Quick start:
//!
//! ```
//! use bf_machine::Machine;
//!
//! let mut machine = Machine::new();
//! let mut out = Vec::new();
//! machine.execute(b"++++++++[>++++++++<-]>+.", &mut out).unwrap();
//! assert_eq!(out, b"A");
//! ```

use std::fmt;
use std::io::{Read, Write};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, trace, warn};

use crate::tape::{DEFAULT_TAPE_SIZE, OutOfBounds, Tape};

/// Errors that can abort a run.
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    /// The data pointer attempted to move left of cell 0 or beyond the last cell.
    #[error("Memory overflow at instruction {ip} (ptr={ptr}, op='{op}')")]
    MemoryOverflow { ip: usize, ptr: usize, op: char },

    /// A `[` or `]` has no structural partner.
    #[error("Unbalanced brackets: {fault}")]
    UnbalancedBrackets { fault: BracketFault },

    /// Reading the program or writing output failed.
    #[error("I/O error: {source}")]
    Io {
        ip: Option<usize>,
        #[source]
        source: std::io::Error,
    },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (timeout or interrupt).
    #[error("Execution aborted: cancelled")]
    Canceled,
}

impl MachineError {
    /// Index of the instruction that caused the error, when there is one.
    pub fn ip(&self) -> Option<usize> {
        match self {
            MachineError::MemoryOverflow { ip, .. } => Some(*ip),
            MachineError::UnbalancedBrackets { fault } => fault.ip(),
            MachineError::Io { ip, .. } => *ip,
            MachineError::StepLimitExceeded { .. } | MachineError::Canceled => None,
        }
    }
}

/// How the bracket structure was found to be broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketFault {
    /// The program holds a different number of `[` and `]`.
    CountMismatch { open: usize, close: usize },
    /// Forward scan from this `[` ran off the end of the program.
    UnmatchedOpen { ip: usize },
    /// Backward scan from this `]` ran off the start of the program.
    UnmatchedClose { ip: usize },
}

impl BracketFault {
    pub fn ip(&self) -> Option<usize> {
        match self {
            BracketFault::CountMismatch { .. } => None,
            BracketFault::UnmatchedOpen { ip } | BracketFault::UnmatchedClose { ip } => Some(*ip),
        }
    }
}

impl fmt::Display for BracketFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketFault::CountMismatch { open, close } => {
                write!(f, "{open} '[' against {close} ']'")
            }
            BracketFault::UnmatchedOpen { ip } => {
                write!(f, "'[' at instruction {ip} has no matching ']'")
            }
            BracketFault::UnmatchedClose { ip } => {
                write!(f, "']' at instruction {ip} has no matching '['")
            }
        }
    }
}

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone, Default)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// Count `[` and `]` in the whole program.
pub fn count_brackets(code: &[u8]) -> (usize, usize) {
    code.iter().fold((0, 0), |(open, close), &b| match b {
        b'[' => (open + 1, close),
        b']' => (open, close + 1),
        _ => (open, close),
    })
}

/// The global pre-check: fail when the bracket counts differ.
///
/// Equal counts do not prove the nesting is sound; that is discovered lazily
/// while running.
pub fn check_balance(code: &[u8]) -> Result<(), MachineError> {
    let (open, close) = count_brackets(code);
    if open != close {
        return Err(MachineError::UnbalancedBrackets {
            fault: BracketFault::CountMismatch { open, close },
        });
    }
    Ok(())
}

/// Read a whole program from `reader`.
pub fn read_program<R: Read>(mut reader: R) -> Result<Vec<u8>, MachineError> {
    let mut code = Vec::new();
    reader
        .read_to_end(&mut code)
        .map_err(|source| MachineError::Io { ip: None, source })?;
    Ok(code)
}

/// Read a program to completion and run it on a fresh default machine,
/// returning everything emitted by `.`.
pub fn execute<R: Read>(reader: R) -> Result<Vec<u8>, MachineError> {
    let code = read_program(reader)?;
    let mut output = Vec::new();
    Machine::new().execute(&code, &mut output)?;
    Ok(output)
}

fn is_instruction(b: u8) -> bool {
    matches!(b, b'>' | b'<' | b'+' | b'-' | b'.' | b',' | b'[' | b']')
}

/// Scan forward from the `[` at `open` for its partner.
fn find_close(code: &[u8], open: usize) -> Result<usize, MachineError> {
    let mut depth = 1usize;
    for (i, &b) in code.iter().enumerate().skip(open + 1) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(MachineError::UnbalancedBrackets {
        fault: BracketFault::UnmatchedOpen { ip: open },
    })
}

/// Scan backward from the `]` at `close` for its partner.
fn find_open(code: &[u8], close: usize) -> Result<usize, MachineError> {
    let mut depth = 1usize;
    for i in (0..close).rev() {
        match code[i] {
            b']' => depth += 1,
            b'[' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(MachineError::UnbalancedBrackets {
        fault: BracketFault::UnmatchedClose { ip: close },
    })
}

/// A single-tape interpreter.
///
/// The machine keeps its tape between runs only so callers can inspect the
/// final memory; every run starts from a zeroed tape.
pub struct Machine {
    tape: Tape,
    steps: usize,
}

impl Machine {
    /// A machine with [`DEFAULT_TAPE_SIZE`] cells.
    pub fn new() -> Self {
        Self::with_tape_size(DEFAULT_TAPE_SIZE)
    }

    /// A machine with a custom tape length (at least one cell).
    pub fn with_tape_size(tape_size: usize) -> Self {
        Self {
            tape: Tape::new(tape_size),
            steps: 0,
        }
    }

    /// Memory as left by the last run.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Instructions dispatched by the last run (skipped bytes excluded).
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Run `code`, writing each `.` byte to `output`.
    pub fn execute<W: Write>(&mut self, code: &[u8], output: &mut W) -> Result<(), MachineError> {
        self.run(code, output, false, None)
    }

    /// Run with cooperative cancellation and an optional step limit.
    pub fn execute_with_control<W: Write>(
        &mut self,
        code: &[u8],
        output: &mut W,
        control: &StepControl,
    ) -> Result<(), MachineError> {
        self.run(code, output, false, Some(control))
    }

    /// Debug-run the program, writing a step-by-step table to `table`
    /// instead of producing output. Pointer and memory evolve exactly as
    /// they would in a real run; `.` is logged rather than emitted.
    pub fn execute_debug<W: Write>(&mut self, code: &[u8], table: &mut W) -> Result<(), MachineError> {
        self.run(code, table, true, None)
    }

    /// Debug-run with cooperative cancellation and an optional step limit.
    pub fn execute_debug_with_control<W: Write>(
        &mut self,
        code: &[u8],
        table: &mut W,
        control: &StepControl,
    ) -> Result<(), MachineError> {
        self.run(code, table, true, Some(control))
    }

    fn run<W: Write>(
        &mut self,
        code: &[u8],
        out: &mut W,
        debug: bool,
        control: Option<&StepControl>,
    ) -> Result<(), MachineError> {
        self.tape.reset();
        self.steps = 0;
        let debug_mode = debug;
        debug!(tape_size = self.tape.len(), program_len = code.len(), debug_mode, "starting run");

        let result = self.dispatch(code, out, debug, control);
        match &result {
            Ok(()) => debug!(steps = self.steps, "run finished"),
            Err(e) => warn!(steps = self.steps, error = %e, "run aborted"),
        }
        result
    }

    fn dispatch<W: Write>(
        &mut self,
        code: &[u8],
        out: &mut W,
        debug: bool,
        control: Option<&StepControl>,
    ) -> Result<(), MachineError> {
        check_balance(code)?;

        let table_err = |source| MachineError::Io { ip: None, source };
        if debug {
            writeln!(out, "STEP | IP  | PTR | CELL | INSTR | ACTION").map_err(table_err)?;
            writeln!(out, "-----+-----+-----+------+-------+------------------------------------------------")
                .map_err(table_err)?;
        }

        let mut ip = 0usize;
        while ip < code.len() {
            let instr = code[ip];
            if !is_instruction(instr) {
                ip += 1;
                continue;
            }

            if let Some(ctrl) = control {
                if ctrl.cancel_flag.load(Ordering::Relaxed) {
                    return Err(MachineError::Canceled);
                }
                if let Some(max) = ctrl.max_steps {
                    if self.steps >= max {
                        return Err(MachineError::StepLimitExceeded { limit: max });
                    }
                }
            }

            let (ptr_before, cell_before) = (self.tape.pointer(), self.tape.current());
            let mut action: Option<String> = if debug { Some(String::new()) } else { None };
            let overflow = |e: OutOfBounds| MachineError::MemoryOverflow {
                ip,
                ptr: e.ptr,
                op: instr as char,
            };
            let mut next = ip + 1;

            match instr {
                b'>' => {
                    self.tape.move_right().map_err(overflow)?;
                    if let Some(a) = action.as_mut() { *a = format!("Moved pointer head to index {}", self.tape.pointer()); }
                }
                b'<' => {
                    self.tape.move_left().map_err(overflow)?;
                    if let Some(a) = action.as_mut() { *a = format!("Moved pointer head to index {}", self.tape.pointer()); }
                }
                b'+' => {
                    let after = self.tape.increment();
                    if let Some(a) = action.as_mut() { *a = format!("Increment cell[{ptr_before}] from {cell_before} to {after}"); }
                }
                b'-' => {
                    let after = self.tape.decrement();
                    if let Some(a) = action.as_mut() { *a = format!("Decrement cell[{ptr_before}] from {cell_before} to {after}"); }
                }
                b'.' => {
                    if let Some(a) = action.as_mut() {
                        *a = format!("Output byte {cell_before} (suppressed in debug)");
                    } else {
                        out.write_all(&[cell_before])
                            .map_err(|source| MachineError::Io { ip: Some(ip), source })?;
                    }
                }
                b',' => {
                    if let Some(a) = action.as_mut() { *a = "No-op (input is reserved)".to_string(); }
                }
                b'[' => {
                    if cell_before == 0 {
                        let close = find_close(code, ip)?;
                        trace!(ip, close, "cell is 0, skipping loop body");
                        if let Some(a) = action.as_mut() { *a = format!("Cell is 0; skip to matching ']' at IP {close}"); }
                        next = close + 1;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Enter loop (cell != 0)".to_string();
                    }
                }
                b']' => {
                    // Always return to the '[' so the loop condition is re-evaluated there.
                    let open = find_open(code, ip)?;
                    trace!(ip, open, "returning to loop head");
                    if let Some(a) = action.as_mut() { *a = format!("Return to matching '[' at IP {open}"); }
                    next = open;
                }
                _ => unreachable!("non-instruction bytes are skipped above"),
            }

            if let Some(a) = action {
                writeln!(
                    out,
                    "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}",
                    self.steps, ip, ptr_before, cell_before, instr as char, a
                )
                .map_err(table_err)?;
            }

            self.steps += 1;
            ip = next;
        }

        Ok(())
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
