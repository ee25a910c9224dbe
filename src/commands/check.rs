use std::path::PathBuf;

use clap::Args;

use crate::cli_util::print_machine_error;
use crate::commands::load_program;
use crate::machine::{check_balance, count_brackets};

/// Check that a program's `[` and `]` counts agree without running it
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Read the program from PATH instead of positional CODE
    #[arg(short = 'f', long = "file", conflicts_with = "code")]
    pub file: Option<PathBuf>,

    /// Program text; parts are concatenated. Reads stdin when omitted
    #[arg(value_name = "CODE", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,
}

pub fn run(program: &str, args: CheckArgs) -> i32 {
    let code = match load_program(program, args.file.as_deref(), &args.code) {
        Ok(code) => code,
        Err(exit) => return exit,
    };

    match check_balance(&code) {
        Ok(()) => {
            let (open, _) = count_brackets(&code);
            println!("ok: {open} bracket pair(s)");
            0
        }
        Err(err) => {
            print_machine_error(Some(program), &code, &err);
            1
        }
    }
}
