//! Filament CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use filament_runtime::Repl;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    trace: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--trace" => config.trace = true,
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {other}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
    }
    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }
    if config.show_version {
        println!("filament {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut repl = Repl::new()?;
    if config.trace {
        repl.session_mut().set_tracing(true);
    }

    for file in &config.files {
        repl.load_file(file)?;
    }

    if config.batch_mode {
        return Ok(());
    }

    if !config.files.is_empty() {
        repl = repl.without_banner();
    }
    repl.run()?;
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mFilament\x1b[0m - Rule scripting for control devices

\x1b[1mUSAGE:\x1b[0m
    filament [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Rule files to load before starting the shell

\x1b[1mOPTIONS:\x1b[0m
    -h, --help       Print help information
    -V, --version    Print version information
    -b, --batch      Load files and exit (no shell)
    --trace          Print a step trace after each run

\x1b[1mFILE FORMAT:\x1b[0m
    `event NAME` lines register events; everything else is rule text.
    Plain `if` rules run on load, `on` rules wait for their event.

\x1b[1mEXAMPLES:\x1b[0m
    filament                  Start the interactive shell
    filament home.fil         Load home.fil, then start the shell
    filament -b checks.fil    Run checks.fil and exit"
    );
}
