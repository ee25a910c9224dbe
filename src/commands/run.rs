use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use tracing::{info, warn};

use crate::cli_util::print_machine_error;
use crate::commands::load_program;
use crate::config::MachineConfig;
use crate::machine::{Machine, MachineError, StepControl};

/// Run a program; bytes emitted by `.` go to stdout unmodified
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Print a step-by-step table of operations instead of program output
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Read the program from PATH instead of positional CODE
    #[arg(short = 'f', long = "file", conflicts_with = "code")]
    pub file: Option<PathBuf>,

    /// Program text; parts are concatenated. Reads stdin when omitted
    #[arg(value_name = "CODE", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Number of tape cells (fallback BFM_TAPE_SIZE, then config; default 30000)
    #[arg(long = "tape-size", value_name = "CELLS")]
    pub tape_size: Option<usize>,

    /// Wall-clock timeout in milliseconds (fallback BFM_TIMEOUT_MS, then config; default none)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps before abort (fallback BFM_MAX_STEPS, then config; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<usize>,
}

/// How the main thread stopped waiting on the worker.
enum Abort {
    Timeout,
    Interrupt,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    let RunArgs {
        debug,
        file,
        code,
        tape_size,
        timeout_ms,
        max_steps,
    } = args;

    if tape_size == Some(0) {
        eprintln!("{program}: --tape-size must be at least 1");
        return 2;
    }

    let code = match load_program(program, file.as_deref(), &code) {
        Ok(code) => code,
        Err(exit) => return exit,
    };

    // Resolve limits: flags -> env -> config file -> defaults
    let cfg = MachineConfig::load();
    let tape_size = tape_size.unwrap_or(cfg.tape_size);
    let timeout_ms = timeout_ms.or(cfg.timeout_ms);
    let max_steps = max_steps.or(cfg.max_steps);
    let debug_mode = debug;
    info!(tape_size, ?max_steps, ?timeout_ms, debug_mode, "resolved machine settings");

    // Ctrl+C raises the same flag a timeout does; the worker stops at its next step.
    let cancel = Arc::new(AtomicBool::new(false));
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        let interrupted = interrupted.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::Relaxed);
            cancel.store(true, Ordering::Relaxed);
        }) {
            warn!(error = %e, "failed to set ctrl+c handler");
        }
    }

    // Execute on a worker thread with cooperative cancellation
    let (tx, rx) = mpsc::channel::<(Result<(), MachineError>, usize)>();
    let ctrl = StepControl::new(max_steps, cancel.clone());
    let program_owned = code.clone();
    let started = Instant::now();

    thread::spawn(move || {
        let mut machine = Machine::with_tape_size(tape_size);
        let mut out = BufWriter::new(io::stdout().lock());
        let mut res = if debug {
            machine.execute_debug_with_control(&program_owned, &mut out, &ctrl)
        } else {
            machine.execute_with_control(&program_owned, &mut out, &ctrl)
        };
        // Keep whatever was emitted before a failure.
        if let Err(source) = out.flush() {
            if res.is_ok() {
                res = Err(MachineError::Io { ip: None, source });
            }
        }
        let _ = tx.send((res, machine.steps()));
    });

    let mut aborted = None;
    let received = match timeout_ms {
        Some(ms) => match rx.recv_timeout(Duration::from_millis(ms)) {
            Ok(done) => Some(done),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                aborted = Some(Abort::Timeout);
                cancel.store(true, Ordering::Relaxed);
                // The worker sees the flag before its next step.
                rx.recv().ok()
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => None,
        },
        None => rx.recv().ok(),
    };

    let Some((result, steps)) = received else {
        eprintln!("{program}: worker thread exited without a result");
        return 1;
    };
    if aborted.is_none() && interrupted.load(Ordering::Relaxed) {
        aborted = Some(Abort::Interrupt);
    }
    info!(steps, elapsed_ms = started.elapsed().as_millis() as u64, "run complete");

    let exit_code = match (result, aborted) {
        (Ok(()), _) => 0,
        (Err(MachineError::Canceled), Some(Abort::Timeout)) => {
            let ms = timeout_ms.unwrap_or_default();
            warn!(steps, "wall-clock timeout");
            eprintln!("Execution aborted: wall-clock timeout exceeded ({ms} ms)");
            1
        }
        (Err(MachineError::Canceled), _) => {
            warn!(steps, "interrupted");
            eprintln!("Execution aborted: interrupted");
            130
        }
        (Err(err @ MachineError::StepLimitExceeded { .. }), _) => {
            warn!(steps, "step limit reached");
            eprintln!("{err}");
            1
        }
        (Err(err), _) => {
            print_machine_error(Some(program), &code, &err);
            1
        }
    };

    let _ = io::stderr().flush();
    exit_code
}
