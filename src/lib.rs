//! A bounded-tape Brainfuck machine.
//!
//! The interpreter works directly on raw instruction bytes over a fixed-size
//! tape of `u8` cells. See [`machine`] for the exact semantics and [`Tape`]
//! for the memory model.
//!
//! ```
//! let out = bf_machine::execute(&b"+++."[..]).unwrap();
//! assert_eq!(out, vec![3]);
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod machine;
pub mod tape;

pub use config::MachineConfig;
pub use machine::{BracketFault, Machine, MachineError, StepControl, execute};
pub use tape::{DEFAULT_TAPE_SIZE, OutOfBounds, Tape};
