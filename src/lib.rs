// galaxy - CLI for the Galaxy console slot API
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Command-line client for the Galaxy console slot API.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod slot;

use crate::cli::Cli;
use crate::commands::{Command, Context, dispatch};
use crate::config::Settings;
use crate::error::{CommandError, ErrorCode, command_error, exit_code_for};
use crate::filter::SlotFilter;
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Runs one command and writes the slot report to `out`.
pub fn run<W: Write>(cli: &Cli, cwd: &Path, out: &mut W) -> Result<()> {
    let command: Command = match cli.command.as_deref() {
        Some(name) => name.parse()?,
        None => return Err(CommandError::invalid_usage("You must specify a command.").into()),
    };
    let filter = cli.filter()?;
    let settings = config::resolve(cwd, cli.overrides())?;
    if settings.debug {
        print_settings(out, &settings, &filter)?;
    }

    let ctx = Context::new(&settings)?;
    let mut slots = dispatch(&ctx, command, &filter, &cli.args)?;

    if settings.debug {
        writeln!(out)?;
    }
    slot::render(out, &mut slots)?;
    Ok(())
}

fn print_settings<W: Write>(out: &mut W, settings: &Settings, filter: &SlotFilter) -> Result<()> {
    writeln!(out, "console={}", settings.console_url)?;
    writeln!(out, "ssh_command={}", settings.ssh_command)?;
    for (key, value) in filter.iter() {
        writeln!(out, "{key}={value}")?;
    }
    Ok(())
}

/// Prints a failed run the way the exit code implies and returns that code.
pub fn report<W: Write>(out: &mut W, err: &anyhow::Error, debug: bool) -> u8 {
    match command_error(err) {
        Some(command_err) => {
            let _ = writeln!(out, "{}", command_err.message);
            if command_err.code == ErrorCode::InvalidUsage {
                let _ = writeln!(out);
                let _ = writeln!(out, "{}", cli::usage());
            }
            if debug {
                let _ = writeln!(out);
                let _ = writeln!(out, "exit: {}", command_err.code.name());
            }
        }
        None => eprintln!("Error: {err:#}"),
    }
    exit_code_for(err)
}
