pub mod check;
pub mod run;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::machine::read_program;

/// Resolve the program bytes: `--file`, else concatenated positional parts,
/// else everything on stdin. Errors are reported here; `Err` carries the exit code.
pub(crate) fn load_program(program: &str, file: Option<&Path>, code: &[String]) -> Result<Vec<u8>, i32> {
    let loaded = if let Some(path) = file {
        fs::read(path).map_err(|e| format!("failed to read code file {}: {e}", path.display()))
    } else if !code.is_empty() {
        Ok(code.concat().into_bytes())
    } else {
        read_program(io::stdin().lock()).map_err(|e| format!("failed reading stdin: {e}"))
    };

    match loaded {
        Ok(bytes) => {
            debug!(len = bytes.len(), "program loaded");
            Ok(bytes)
        }
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            Err(1)
        }
    }
}
