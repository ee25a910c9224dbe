use std::env;
use std::io::{self, IsTerminal};

use bf_machine::commands::{check, run};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "bfm", version, about = "Run Brainfuck programs on a bounded tape", arg_required_else_help = true)]
struct Cli {
    /// Log more to stderr (-v info, -vv debug, -vvv trace); BFM_LOG overrides
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(run::RunArgs),
    Check(check::CheckArgs),
}

fn install_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("BFM_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(fmt_layer).init();
}

fn main() {
    // We still pull the program name for error prefixes
    let program = env::args().next().unwrap_or_else(|| String::from("bfm"));

    let cli = Cli::parse();
    install_tracing(cli.verbose);

    let code = match cli.command {
        Command::Run(args) => run::run(&program, args),
        Command::Check(args) => check::run(&program, args),
    };

    std::process::exit(code);
}
