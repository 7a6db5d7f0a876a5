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

//! The seven slot commands and the table that maps each to its handler.

use crate::client::{ConsoleClient, RequestBody};
use crate::config::Settings;
use crate::error::CommandError;
use crate::filter::SlotFilter;
use crate::slot::Slot;
use anyhow::{Context as _, Result, anyhow, bail};
use reqwest::Method;
use serde::Serialize;
use std::fmt;
use std::process;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Show,
    Assign,
    Clear,
    Start,
    Stop,
    Restart,
    Ssh,
}

pub type Handler = fn(&Context, &SlotFilter, &[String]) -> Result<Vec<Slot>>;

const HANDLERS: [(Command, Handler); 7] = [
    (Command::Show, show),
    (Command::Assign, assign),
    (Command::Clear, clear),
    (Command::Start, start),
    (Command::Stop, stop),
    (Command::Restart, restart),
    (Command::Ssh, ssh),
];

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Show,
        Command::Assign,
        Command::Clear,
        Command::Start,
        Command::Stop,
        Command::Restart,
        Command::Ssh,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Show => "show",
            Command::Assign => "assign",
            Command::Clear => "clear",
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Restart => "restart",
            Command::Ssh => "ssh",
        }
    }

    pub fn handler(self) -> Handler {
        HANDLERS
            .iter()
            .find(|(command, _)| *command == self)
            .map(|(_, handler)| *handler)
            .unwrap_or(show)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.name() == s)
            .ok_or_else(|| CommandError::invalid_usage(format!("Unsupported command: {s}")))
    }
}

/// What a handler needs besides its filter and arguments.
#[derive(Debug, Clone)]
pub struct Context {
    pub client: ConsoleClient,
    pub ssh_command: String,
}

impl Context {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: ConsoleClient::new(&settings.console_url, settings.debug)?,
            ssh_command: settings.ssh_command.clone(),
        })
    }
}

/// Body of an `assign` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub binary: String,
    pub config: String,
}

impl Assignment {
    /// Takes a binary and a config in either order; the config is the one
    /// starting with `@`.
    pub fn from_args(args: &[String]) -> Result<Self, CommandError> {
        let [first, second] = args else {
            return Err(CommandError::invalid_usage(
                "You must specify a binary and config to assign.",
            ));
        };
        let (binary, config) = if first.starts_with('@') {
            (second, first)
        } else {
            (first, second)
        };
        Ok(Self {
            binary: binary.clone(),
            config: config.clone(),
        })
    }
}

pub fn dispatch(
    ctx: &Context,
    command: Command,
    filter: &SlotFilter,
    args: &[String],
) -> Result<Vec<Slot>> {
    debug!(%command, args = args.len(), "dispatching command");
    (command.handler())(ctx, filter, args)
}

fn no_args(command: Command, args: &[String]) -> Result<(), CommandError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::invalid_usage(format!(
            "You can not pass arguments to {command}."
        )))
    }
}

fn show(ctx: &Context, filter: &SlotFilter, args: &[String]) -> Result<Vec<Slot>> {
    no_args(Command::Show, args)?;
    ctx.client.request(filter, Method::GET, None, None)
}

fn assign(ctx: &Context, filter: &SlotFilter, args: &[String]) -> Result<Vec<Slot>> {
    let assignment = Assignment::from_args(args)?;
    let body = RequestBody::Json(
        serde_json::to_value(&assignment).context("serializing assignment")?,
    );
    ctx.client
        .request(filter, Method::PUT, Some("assignment"), Some(&body))
}

fn clear(ctx: &Context, filter: &SlotFilter, args: &[String]) -> Result<Vec<Slot>> {
    no_args(Command::Clear, args)?;
    ctx.client
        .request(filter, Method::DELETE, Some("assignment"), None)
}

fn start(ctx: &Context, filter: &SlotFilter, args: &[String]) -> Result<Vec<Slot>> {
    lifecycle(ctx, filter, args, Command::Start)
}

fn stop(ctx: &Context, filter: &SlotFilter, args: &[String]) -> Result<Vec<Slot>> {
    lifecycle(ctx, filter, args, Command::Stop)
}

fn restart(ctx: &Context, filter: &SlotFilter, args: &[String]) -> Result<Vec<Slot>> {
    lifecycle(ctx, filter, args, Command::Restart)
}

fn lifecycle(
    ctx: &Context,
    filter: &SlotFilter,
    args: &[String],
    command: Command,
) -> Result<Vec<Slot>> {
    no_args(command, args)?;
    let body = RequestBody::Text(command.name().to_string());
    ctx.client
        .request(filter, Method::PUT, Some("lifecycle"), Some(&body))
}

/// Opens a session on the first matching slot. Nothing matching is not an error.
fn ssh(ctx: &Context, filter: &SlotFilter, args: &[String]) -> Result<Vec<Slot>> {
    no_args(Command::Ssh, args)?;
    let slots = ctx.client.fetch_slots(filter, Method::GET, None, None)?;
    let Some(slot) = slots.first() else {
        debug!("no slot matched, not launching ssh");
        return Ok(Vec::new());
    };
    launch_ssh(&ctx.ssh_command, slot.host())?;
    Ok(Vec::new())
}

/// Runs `<ssh_command> <host>` with inherited stdio and waits for it.
pub fn launch_ssh(ssh_command: &str, host: &str) -> Result<()> {
    let mut words = ssh_command.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| anyhow!("ssh command is empty"))?;

    debug!(program, host, "launching ssh session");
    let status = process::Command::new(program)
        .args(words)
        .arg(host)
        .status()
        .with_context(|| format!("launching `{ssh_command} {host}`"))?;

    if !status.success() {
        bail!("`{ssh_command} {host}` exited with {status}");
    }
    Ok(())
}
