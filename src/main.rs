use clap::Parser;
use clap::error::ErrorKind;
use galaxy::cli::{self, Cli};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_failure(err),
    };

    init_tracing(cli.debug);

    if cli.version {
        println!("{}", cli::version_line());
        return ExitCode::SUCCESS;
    }
    if cli.command.is_none() {
        println!("{}", cli::usage());
        return ExitCode::SUCCESS;
    }

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("Error: reading current directory: {err}");
            return ExitCode::from(galaxy::error::FATAL_EXIT_CODE);
        }
    };

    let mut stdout = io::stdout().lock();
    match galaxy::run(&cli, &cwd, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(galaxy::report(&mut stdout, &err, cli.debug)),
    }
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "galaxy=debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Help is a success; any other parse failure is invalid usage.
fn parse_failure(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        _ => {
            println!("{}", err.to_string().trim_end());
            println!();
            println!("{}", cli::usage());
            ExitCode::from(galaxy::error::ErrorCode::InvalidUsage.exit_code())
        }
    }
}
